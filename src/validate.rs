//! Local pre-flight validation for signature submissions.
//!
//! Inputs are trimmed here and nowhere else. A [`ValidSignature`] can only be
//! obtained through [`validate`], so the store never sees an unchecked pair.

/// Maximum message length in UTF-16 code units, the unit a browser's
/// `maxlength` and `String.length` count in.
pub const MAX_MESSAGE_CHARS: usize = 280;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please fill in both your name and message.")]
    MissingField,
    #[error("Message must be 280 characters or less.")]
    MessageTooLong { units: usize },
}

impl crate::error::ErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        "E_VALIDATION"
    }
}

/// A trimmed name/message pair that passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSignature {
    display_name: String,
    message: String,
}

impl ValidSignature {
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Trim and check a raw form submission.
///
/// # Errors
///
/// Returns [`ValidationError::MissingField`] when either field is empty after
/// trimming, and [`ValidationError::MessageTooLong`] when the trimmed message
/// exceeds [`MAX_MESSAGE_CHARS`].
pub fn validate(display_name: &str, message: &str) -> Result<ValidSignature, ValidationError> {
    let display_name = display_name.trim();
    let message = message.trim();

    if display_name.is_empty() || message.is_empty() {
        return Err(ValidationError::MissingField);
    }

    let units = utf16_len(message);
    if units > MAX_MESSAGE_CHARS {
        return Err(ValidationError::MessageTooLong { units });
    }

    Ok(ValidSignature { display_name: display_name.to_owned(), message: message.to_owned() })
}

/// Length as the page's textarea counts it.
#[must_use]
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
