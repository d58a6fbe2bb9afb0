//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The page shell is served at `/`. The list fragment and form submission
//! live at `/signatures`; `/api/signatures` returns the raw collection as JSON.
//! The page's behavior script is served from `/signatures.js`.

pub mod signatures;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::render::SCRIPT_PATH;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(signatures::page))
        .route("/signatures", get(signatures::list_fragment).post(signatures::submit))
        .route(SCRIPT_PATH, get(signatures::script))
        .route("/api/signatures", get(signatures::list_json))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
