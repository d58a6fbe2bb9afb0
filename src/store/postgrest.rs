//! Supabase REST client for the signatures table.
//!
//! Thin HTTP wrapper over PostgREST's `/rest/v1/<table>` endpoint. Pure
//! parsing in `parse_rows` and `classify_error` for testability.

use reqwest::Method;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use super::{NewSignature, RemoteTable, SignatureId, SignatureRecord, StoreError};
use crate::config::RemoteConfig;

const REST_PATH: &str = "rest/v1";

/// Postgres `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres `not_null_violation`.
const NOT_NULL_VIOLATION: &str = "23502";
/// Postgres `insufficient_privilege`, also raised by row-level security.
const INSUFFICIENT_PRIVILEGE: &str = "42501";

// =============================================================================
// CLIENT
// =============================================================================

pub struct PostgrestTable {
    http: reqwest::Client,
    table_url: String,
    anon_key: String,
}

impl PostgrestTable {
    /// Build the HTTP client without touching the network.
    ///
    /// # Errors
    ///
    /// Returns `Connectivity` if the HTTP client cannot be constructed.
    pub fn new(config: &RemoteConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()
            .map_err(|e| StoreError::Connectivity(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            http,
            table_url: format!("{}/{REST_PATH}/{}", config.url, config.table),
            anon_key: config.anon_key.clone(),
        })
    }

    /// Build the client and confirm the table answers within the init deadline.
    ///
    /// # Errors
    ///
    /// Returns `Connectivity` when the deadline expires or the remote is
    /// unreachable, otherwise the classified remote error.
    pub async fn connect(config: &RemoteConfig) -> Result<Self, StoreError> {
        let table = Self::new(config)?;
        let deadline = config.timeouts.init_deadline();
        match tokio::time::timeout(deadline, table.probe()).await {
            Ok(result) => result.map(|()| table),
            Err(_) => Err(StoreError::Connectivity(format!(
                "remote store not ready after {}s",
                deadline.as_secs()
            ))),
        }
    }

    async fn probe(&self) -> Result<(), StoreError> {
        let response = self
            .request(Method::GET)
            .query(&[("select", "*"), ("limit", "1")])
            .send()
            .await
            .map_err(transport_error)?;
        read_body(response).await.map(|_| ())
    }

    fn request(&self, method: Method) -> reqwest::RequestBuilder {
        self.http
            .request(method, &self.table_url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }
}

#[async_trait::async_trait]
impl RemoteTable for PostgrestTable {
    async fn select_all_desc(&self, order_column: &str) -> Result<Vec<SignatureRecord>, StoreError> {
        let order = format!("{order_column}.desc");
        let response = self
            .request(Method::GET)
            .query(&[("select", "*"), ("order", order.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        let text = read_body(response).await?;
        parse_rows(&text)
    }

    async fn insert(&self, row: &NewSignature) -> Result<Option<SignatureRecord>, StoreError> {
        let response = self
            .request(Method::POST)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await
            .map_err(transport_error)?;

        let text = read_body(response).await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(parse_rows(&text)?.into_iter().next())
    }
}

/// Read the body, turning non-2xx responses into classified errors.
async fn read_body(response: reqwest::Response) -> Result<String, StoreError> {
    let status = response.status().as_u16();
    let text = response.text().await.map_err(transport_error)?;
    if !(200..300).contains(&status) {
        return Err(classify_error(status, &text));
    }
    Ok(text)
}

fn transport_error(e: reqwest::Error) -> StoreError {
    StoreError::Connectivity(e.to_string())
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for SignatureId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => SignatureId::new(s),
            RawId::Number(n) => SignatureId::new(n.to_string()),
        }
    }
}

#[derive(serde::Deserialize)]
struct SignatureRow {
    #[serde(default)]
    uuid: Option<RawId>,
    #[serde(default)]
    id: Option<RawId>,
    display_name: String,
    message: String,
    created_at: String,
}

#[derive(serde::Deserialize, Default)]
struct ApiError {
    code: Option<String>,
    message: Option<String>,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_rows(json: &str) -> Result<Vec<SignatureRecord>, StoreError> {
    let rows: Vec<SignatureRow> = serde_json::from_str(json)
        .map_err(|e| StoreError::Unknown(format!("unexpected response from remote store: {e}")))?;

    rows.into_iter().map(into_record).collect()
}

fn into_record(row: SignatureRow) -> Result<SignatureRecord, StoreError> {
    let id = row
        .uuid
        .or(row.id)
        .ok_or_else(|| StoreError::Unknown("signature row has no id".into()))?;
    let created_at = parse_timestamp(&row.created_at)
        .ok_or_else(|| StoreError::Unknown(format!("invalid created_at: {}", row.created_at)))?;

    Ok(SignatureRecord { id: id.into(), display_name: row.display_name, message: row.message, created_at })
}

/// Accept `timestamptz` (RFC 3339) and zone-less `timestamp` columns (UTC).
fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"),
    )
    .ok()
    .map(PrimitiveDateTime::assume_utc)
}

fn classify_error(status: u16, body: &str) -> StoreError {
    let api: ApiError = serde_json::from_str(body).unwrap_or_default();
    let message = api.message.filter(|m| !m.is_empty()).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() { format!("HTTP {status}") } else { trimmed.to_string() }
    });

    match api.code.as_deref() {
        Some(UNIQUE_VIOLATION) => return StoreError::Duplicate,
        Some(NOT_NULL_VIOLATION) => return StoreError::RequiredField,
        Some(INSUFFICIENT_PRIVILEGE) => return StoreError::Permission(message),
        _ => {}
    }

    if matches!(status, 401 | 403) || message.to_lowercase().contains("permission") {
        return StoreError::Permission(message);
    }
    if matches!(status, 502..=504) {
        return StoreError::Connectivity(message);
    }
    StoreError::Unknown(message)
}

#[cfg(test)]
#[path = "postgrest_test.rs"]
mod tests;
