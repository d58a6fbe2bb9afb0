use std::collections::HashMap;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use time::macros::datetime;

use super::*;
use crate::config::RemoteTimeouts;

// =============================================================
// parse_rows
// =============================================================

#[test]
fn parse_timestamptz_rows() {
    let json = serde_json::json!([
        {
            "id": 7,
            "uuid": "3f1c2d8e-0000-4000-8000-000000000001",
            "display_name": "Ada",
            "message": "Congrats on the launch!",
            "created_at": "2026-10-17T18:23:24.123456+00:00"
        }
    ])
    .to_string();

    let rows = parse_rows(&json).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id.as_str(), "3f1c2d8e-0000-4000-8000-000000000001");
    assert_eq!(rows[0].display_name, "Ada");
    assert_eq!(rows[0].message, "Congrats on the launch!");
    assert_eq!(rows[0].created_at, datetime!(2026-10-17 18:23:24.123456 UTC));
}

#[test]
fn parse_numeric_id_when_uuid_absent() {
    let json = r#"[{"id":42,"display_name":"Grace","message":"hi","created_at":"2026-01-02T03:04:05Z"}]"#;
    let rows = parse_rows(json).unwrap();
    assert_eq!(rows[0].id.as_str(), "42");
}

#[test]
fn parse_zoneless_timestamp_as_utc() {
    let json = r#"[{"id":"a","display_name":"Grace","message":"hi","created_at":"2026-01-02T03:04:05.5"}]"#;
    let rows = parse_rows(json).unwrap();
    assert_eq!(rows[0].created_at, datetime!(2026-01-02 03:04:05.5 UTC));
}

#[test]
fn parse_zoneless_timestamp_without_fraction() {
    assert_eq!(parse_timestamp("2026-01-02T03:04:05"), Some(datetime!(2026-01-02 03:04:05 UTC)));
}

#[test]
fn parse_empty_array() {
    assert!(parse_rows("[]").unwrap().is_empty());
}

#[test]
fn parse_row_without_id_is_unknown() {
    let json = r#"[{"display_name":"Grace","message":"hi","created_at":"2026-01-02T03:04:05Z"}]"#;
    assert!(matches!(parse_rows(json), Err(StoreError::Unknown(m)) if m.contains("no id")));
}

#[test]
fn parse_bad_timestamp_is_unknown() {
    let json = r#"[{"id":1,"display_name":"Grace","message":"hi","created_at":"yesterday"}]"#;
    assert!(matches!(parse_rows(json), Err(StoreError::Unknown(m)) if m.contains("yesterday")));
}

#[test]
fn parse_invalid_json_is_unknown() {
    assert!(matches!(parse_rows("not json"), Err(StoreError::Unknown(_))));
}

// =============================================================
// classify_error
// =============================================================

#[test]
fn classify_unique_violation() {
    let body = r#"{"code":"23505","details":null,"hint":null,"message":"duplicate key value violates unique constraint \"signatures_name_message_key\""}"#;
    assert_eq!(classify_error(409, body), StoreError::Duplicate);
}

#[test]
fn classify_not_null_violation() {
    let body = r#"{"code":"23502","message":"null value in column \"message\" violates not-null constraint"}"#;
    assert_eq!(classify_error(400, body), StoreError::RequiredField);
}

#[test]
fn classify_row_level_security_as_permission() {
    let body = r#"{"code":"42501","message":"new row violates row-level security policy for table \"signatures\""}"#;
    assert!(matches!(classify_error(401, body), StoreError::Permission(m) if m.contains("row-level security")));
}

#[test]
fn classify_forbidden_status_as_permission() {
    assert!(matches!(classify_error(403, ""), StoreError::Permission(m) if m == "HTTP 403"));
}

#[test]
fn classify_permission_message_as_permission() {
    let body = r#"{"code":"XX000","message":"Permission denied for schema public"}"#;
    assert!(matches!(classify_error(400, body), StoreError::Permission(_)));
}

#[test]
fn classify_gateway_failure_as_connectivity() {
    assert!(matches!(classify_error(503, "upstream unavailable"), StoreError::Connectivity(m) if m == "upstream unavailable"));
}

#[test]
fn classify_other_errors_verbatim() {
    let body = r#"{"code":"PGRST204","message":"Could not find the 'mesage' column of 'signatures' in the schema cache"}"#;
    assert_eq!(
        classify_error(400, body),
        StoreError::Unknown("Could not find the 'mesage' column of 'signatures' in the schema cache".into())
    );
}

#[test]
fn classify_plain_text_body_verbatim() {
    assert_eq!(classify_error(500, "  boom  "), StoreError::Unknown("boom".into()));
}

// =============================================================
// HTTP round trips against a fake REST endpoint
// =============================================================

async fn spawn_fake(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn config_for(url: &str) -> RemoteConfig {
    RemoteConfig {
        url: url.to_string(),
        anon_key: "anon".into(),
        table: "signatures".into(),
        timeouts: RemoteTimeouts { request_secs: 2, connect_secs: 1, init_deadline_secs: 1 },
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some("anon")
        && headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer anon")
}

async fn list_handler(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> (StatusCode, String) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, r#"{"code":"42501","message":"permission denied"}"#.into());
    }
    if query.contains_key("limit") {
        return (StatusCode::OK, "[]".into());
    }
    if query.get("order").map(String::as_str) != Some("created_at.desc") {
        return (StatusCode::BAD_REQUEST, r#"{"code":"PGRST100","message":"missing order"}"#.into());
    }
    let body = serde_json::json!([
        { "id": 2, "display_name": "Grace", "message": "second", "created_at": "2026-10-17T10:00:00+00:00" },
        { "id": 1, "display_name": "Ada", "message": "first", "created_at": "2026-10-16T10:00:00+00:00" }
    ]);
    (StatusCode::OK, body.to_string())
}

async fn insert_handler(headers: HeaderMap, Json(rows): Json<Vec<serde_json::Value>>) -> (StatusCode, String) {
    if headers.get("prefer").and_then(|v| v.to_str().ok()) != Some("return=representation") {
        return (StatusCode::CREATED, String::new());
    }
    let row = &rows[0];
    if row["message"] == "taken" {
        return (
            StatusCode::CONFLICT,
            r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#.into(),
        );
    }
    let body = serde_json::json!([{
        "id": 3,
        "display_name": row["display_name"],
        "message": row["message"],
        "created_at": "2026-10-18T09:00:00+00:00"
    }]);
    (StatusCode::CREATED, body.to_string())
}

fn fake_router() -> Router {
    Router::new().route("/rest/v1/signatures", get(list_handler).post(insert_handler))
}

#[tokio::test]
async fn connect_and_list_against_fake_endpoint() {
    let url = spawn_fake(fake_router()).await;
    let table = PostgrestTable::connect(&config_for(&url)).await.unwrap();

    let rows = table.select_all_desc("created_at").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].display_name, "Grace");
    assert_eq!(rows[1].display_name, "Ada");
}

#[tokio::test]
async fn insert_returns_representation() {
    let url = spawn_fake(fake_router()).await;
    let table = PostgrestTable::new(&config_for(&url)).unwrap();

    let row = NewSignature { display_name: "Ada".into(), message: "Congrats on the launch!".into() };
    let created = table.insert(&row).await.unwrap().unwrap();
    assert_eq!(created.id.as_str(), "3");
    assert_eq!(created.message, "Congrats on the launch!");
}

#[tokio::test]
async fn insert_duplicate_is_classified() {
    let url = spawn_fake(fake_router()).await;
    let table = PostgrestTable::new(&config_for(&url)).unwrap();

    let row = NewSignature { display_name: "Ada".into(), message: "taken".into() };
    assert_eq!(table.insert(&row).await, Err(StoreError::Duplicate));
}

#[tokio::test]
async fn wrong_key_is_permission_error() {
    let url = spawn_fake(fake_router()).await;
    let mut config = config_for(&url);
    config.anon_key = "wrong".into();

    let result = PostgrestTable::connect(&config).await;
    assert!(matches!(result, Err(StoreError::Permission(_))));
}

#[tokio::test]
async fn unreachable_remote_is_connectivity_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let table = PostgrestTable::new(&config_for(&format!("http://{addr}"))).unwrap();
    let result = table.select_all_desc("created_at").await;
    assert!(matches!(result, Err(StoreError::Connectivity(_))));
}

#[tokio::test]
async fn slow_remote_misses_init_deadline() {
    let router = Router::new().route(
        "/rest/v1/signatures",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "[]"
        }),
    );
    let url = spawn_fake(router).await;

    let result = PostgrestTable::connect(&config_for(&url)).await;
    assert!(matches!(result, Err(StoreError::Connectivity(m)) if m.contains("not ready")));
}
