//! Shared error conventions.
//!
//! Every error that can reach an HTTP response implements [`ErrorCode`] so
//! routes can attach a stable machine code next to the human message.

/// Stable machine-readable code for an error category.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
