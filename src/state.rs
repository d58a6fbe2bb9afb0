//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the signature store (wrapping the remote table built at startup) and
//! the registry of forms with a submission in flight.

use std::sync::Arc;

use crate::flow::FormRegistry;
use crate::store::SignatureStore;

/// Clone is required by Axum; inner fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: SignatureStore,
    pub forms: Arc<FormRegistry>,
}

impl AppState {
    #[must_use]
    pub fn new(store: SignatureStore) -> Self {
        Self { store, forms: Arc::new(FormRegistry::new()) }
    }
}
