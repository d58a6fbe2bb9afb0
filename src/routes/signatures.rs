//! Signature routes: page shell, list fragment, JSON list, and submission.
//!
//! ERROR HANDLING
//! ==============
//! List failures never surface raw remote text: HTML endpoints degrade to the
//! empty state with a generic notice, the JSON endpoint returns the error code
//! with the same generic message. Submission failures carry the fixed copy
//! chosen by the flow.
//!
//! CONTENT NEGOTIATION
//! ===================
//! The page script posts with `Accept: application/json` and applies the JSON
//! outcome in place. A plain form post (no script) asks for `text/html` and
//! gets the whole page back with the notice shown, the overlay open, and the
//! rejected input refilled.

use axum::Form;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::flow::{self, CLOSE_OVERLAY_AFTER_MS, FlowState, Notice, NoticeKind, SubmissionFlow, SubmitError};
use crate::render::{LIST_FAILED_TEXT, PAGE_SCRIPT, PageView, render_list, render_load_failed, render_page};
use crate::state::AppState;
use crate::store::{SignatureRecord, StoreError};

#[derive(Debug, Deserialize)]
pub struct SignatureForm {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub message: String,
    /// Identifies the form instance for re-entrancy checks.
    #[serde(default)]
    pub form_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub ok: bool,
    pub state: FlowState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    /// Whether the same submission may succeed if sent again.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
    pub notice: Notice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_overlay_after_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureRecord>,
    /// Re-rendered list after a successful submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_html: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListErrorResponse {
    pub code: &'static str,
    pub message: &'static str,
}

/// `GET /` — page shell with the current list.
pub async fn page(State(state): State<AppState>) -> Html<String> {
    let list_html = current_list_html(&state, "initial load").await;
    let form_id = Uuid::new_v4().to_string();
    Html(render_page(&PageView {
        list_html: &list_html,
        form_id: &form_id,
        trigger_label: idle_label(),
        ..PageView::default()
    }))
}

/// `GET /signatures.js` — page behavior script.
pub async fn script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript; charset=utf-8")], PAGE_SCRIPT)
}

/// `GET /signatures` — list fragment for `.signatures-container`.
pub async fn list_fragment(State(state): State<AppState>) -> Html<String> {
    Html(current_list_html(&state, "fragment refresh").await)
}

/// `GET /api/signatures` — the collection as JSON, newest first.
pub async fn list_json(State(state): State<AppState>) -> Response {
    match state.store.list().await {
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            let body = ListErrorResponse { code: e.error_code(), message: LIST_FAILED_TEXT };
            (store_error_to_status(&e), Json(body)).into_response()
        }
    }
}

/// `POST /signatures` — run one submission and return the outcome.
pub async fn submit(headers: HeaderMap, State(state): State<AppState>, Form(form): Form<SignatureForm>) -> Response {
    let form_id = form
        .form_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .unwrap_or_else(Uuid::new_v4);

    let outcome = flow::submit(&state.store, &state.forms, form_id, &form.display_name, &form.message).await;

    let (status, code, retryable, signature) = match outcome.result {
        Ok(created) => (StatusCode::OK, None, false, created),
        Err(ref e) => (submit_error_to_status(e), Some(e.error_code()), e.retryable(), None),
    };

    let list_html = outcome.refreshed.map(|refreshed| match refreshed {
        Ok(records) => render_list(&records),
        Err(e) => {
            error!(error = %e, "signature list refresh after submit failed");
            render_load_failed()
        }
    });

    let ok = status == StatusCode::OK;
    if wants_html(&headers) {
        let list_html = match list_html {
            Some(html) => html,
            None => current_list_html(&state, "reload after rejected submit").await,
        };
        let (refill_name, refill_message) = if ok { ("", "") } else { (form.display_name.trim(), form.message.trim()) };
        let form_id = form_id.to_string();
        let page = render_page(&PageView {
            list_html: &list_html,
            form_id: &form_id,
            trigger_label: idle_label(),
            error: (outcome.notice.kind == NoticeKind::Error).then_some(outcome.notice.text.as_str()),
            success: (outcome.notice.kind == NoticeKind::Success).then_some(outcome.notice.text.as_str()),
            display_name: refill_name,
            message: refill_message,
            modal_open: true,
        });
        return (status, Html(page)).into_response();
    }

    let body = SubmitResponse {
        ok,
        state: outcome.state,
        code,
        retryable,
        notice: outcome.notice,
        close_overlay_after_ms: ok.then_some(CLOSE_OVERLAY_AFTER_MS),
        signature,
        list_html,
    };
    (status, Json(body)).into_response()
}

/// True when the client prefers a page over JSON, as a plain form post does.
fn wants_html(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let position = |media: &str| accept.find(media);
    match (position("text/html"), position("application/json")) {
        (Some(html), Some(json)) => html < json,
        (Some(_), None) => true,
        _ => false,
    }
}

/// List markup, degraded to the load-failed state on error.
async fn current_list_html(state: &AppState, context: &'static str) -> String {
    match state.store.list().await {
        Ok(records) => render_list(&records),
        Err(e) => {
            error!(error = %e, context, "signature list unavailable");
            render_load_failed()
        }
    }
}

fn idle_label() -> &'static str {
    SubmissionFlow::default().trigger_label()
}

pub(crate) fn store_error_to_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::Duplicate => StatusCode::CONFLICT,
        StoreError::RequiredField => StatusCode::BAD_REQUEST,
        StoreError::Permission(_) => StatusCode::FORBIDDEN,
        StoreError::Connectivity(_) => StatusCode::BAD_GATEWAY,
        StoreError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn submit_error_to_status(err: &SubmitError) -> StatusCode {
    match err {
        SubmitError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SubmitError::InFlight => StatusCode::CONFLICT,
        SubmitError::Store(e) => store_error_to_status(e),
    }
}

#[cfg(test)]
#[path = "signatures_test.rs"]
mod tests;
