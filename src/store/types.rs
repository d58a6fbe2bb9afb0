//! Signature records and store errors.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// =============================================================================
// ERROR
// =============================================================================

/// Failures reported by a [`super::RemoteTable`], already classified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Exact duplicate of an existing name+message pair.
    #[error("signature already exists")]
    Duplicate,

    /// The remote rejected a row with a missing required column.
    #[error("missing required information")]
    RequiredField,

    /// The remote denied the operation.
    #[error("permission denied: {0}")]
    Permission(String),

    /// The remote could not be reached, timed out, or a gateway failed.
    #[error("connection failed: {0}")]
    Connectivity(String),

    /// Any other remote-reported failure; carries the remote message verbatim.
    #[error("{0}")]
    Unknown(String),
}

impl crate::error::ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Duplicate => "E_DUPLICATE",
            Self::RequiredField => "E_REQUIRED_FIELD",
            Self::Permission(_) => "E_PERMISSION",
            Self::Connectivity(_) => "E_CONNECTIVITY",
            Self::Unknown(_) => "E_UNKNOWN",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// Opaque identifier assigned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureId(String);

impl SignatureId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SignatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One guestbook entry as persisted by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub id: SignatureId,
    pub display_name: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Row sent on insert. The remote assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSignature {
    pub display_name: String,
    pub message: String,
}

impl From<&crate::validate::ValidSignature> for NewSignature {
    fn from(sig: &crate::validate::ValidSignature) -> Self {
        Self { display_name: sig.display_name().to_owned(), message: sig.message().to_owned() }
    }
}

/// Order records by `created_at`, newest first. Stable for equal timestamps.
pub fn sort_newest_first(records: &mut [SignatureRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
