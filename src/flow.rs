//! Per-form state machine for signing the guestbook.
//!
//! DESIGN
//! ======
//! `Idle → Submitting → (Success | Failed) → Idle`. Local validation guards
//! the first edge; a failed validation never leaves `Idle` and never reaches
//! the store. While a form is `Submitting` its trigger is disabled and a
//! second `begin` is refused, which is the only serialization: list refreshes
//! are not ordered against submissions.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is caught here and mapped to one fixed user-facing string
//! per category. Only the unknown category carries remote text, verbatim.
//! Nothing is retried.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::ErrorCode;
use crate::store::{SignatureRecord, SignatureStore, StoreError};
use crate::validate::{ValidSignature, ValidationError, validate};

pub const TRIGGER_IDLE_LABEL: &str = "Sign Yearbook";
pub const TRIGGER_BUSY_LABEL: &str = "Signing...";

pub const SUCCESS_NOTICE_MS: u64 = 3_000;
pub const ERROR_NOTICE_MS: u64 = 5_000;
/// Delay before the overlay holding the form closes after a success.
pub const CLOSE_OVERLAY_AFTER_MS: u64 = 1_500;

pub const SUCCESS_TEXT: &str = "Your signature has been added!";
pub const DUPLICATE_TEXT: &str = "You have already signed with this exact name and message.";
pub const REQUIRED_FIELD_TEXT: &str = "Missing required information. Please fill in both fields.";
pub const PERMISSION_TEXT: &str = "Permission error. Please refresh the page and try again.";
pub const CONNECTIVITY_TEXT: &str = "Connection problem. Please check your internet and try again.";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("A signature is already being submitted.")]
    InFlight,
}

impl ErrorCode for SubmitError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::InFlight => "E_IN_FLIGHT",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.retryable(),
            Self::Validation(_) | Self::InFlight => false,
        }
    }
}

impl SubmitError {
    /// Fixed copy shown in the error banner.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Store(StoreError::Duplicate) => DUPLICATE_TEXT.to_owned(),
            Self::Store(StoreError::RequiredField) => REQUIRED_FIELD_TEXT.to_owned(),
            Self::Store(StoreError::Permission(_)) => PERMISSION_TEXT.to_owned(),
            Self::Store(StoreError::Connectivity(_)) => CONNECTIVITY_TEXT.to_owned(),
            Self::Store(StoreError::Unknown(message)) => format!("Database error: {message}"),
            Self::InFlight => self.to_string(),
        }
    }
}

// =============================================================================
// NOTICES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient banner content plus how long it stays visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub dismiss_after_ms: u64,
}

impl Notice {
    #[must_use]
    pub fn success() -> Self {
        Self { kind: NoticeKind::Success, text: SUCCESS_TEXT.to_owned(), dismiss_after_ms: SUCCESS_NOTICE_MS }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, text: text.into(), dismiss_after_ms: ERROR_NOTICE_MS }
    }

    #[must_use]
    pub fn from_error(err: &SubmitError) -> Self {
        Self::error(err.user_message())
    }
}

// =============================================================================
// STATE MACHINE
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    #[default]
    Idle,
    Submitting,
    Success,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionFlow {
    state: FlowState,
    notice: Option<Notice>,
}

impl SubmissionFlow {
    #[must_use]
    pub fn state(&self) -> FlowState {
        self.state
    }

    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    #[must_use]
    pub fn trigger_enabled(&self) -> bool {
        self.state != FlowState::Submitting
    }

    #[must_use]
    pub fn trigger_label(&self) -> &'static str {
        if self.trigger_enabled() { TRIGGER_IDLE_LABEL } else { TRIGGER_BUSY_LABEL }
    }

    /// `Idle → Submitting`, guarded by local validation.
    ///
    /// A pending notice is dismissed first, as if its display duration had
    /// elapsed.
    ///
    /// # Errors
    ///
    /// [`SubmitError::InFlight`] while already submitting (state unchanged);
    /// [`SubmitError::Validation`] when the input is rejected (state stays
    /// `Idle` with an error notice).
    pub fn begin(&mut self, display_name: &str, message: &str) -> Result<ValidSignature, SubmitError> {
        if self.state == FlowState::Submitting {
            return Err(SubmitError::InFlight);
        }
        self.settle();
        self.notice = None;

        match validate(display_name, message) {
            Ok(signature) => {
                self.state = FlowState::Submitting;
                Ok(signature)
            }
            Err(e) => {
                let err = SubmitError::from(e);
                self.notice = Some(Notice::from_error(&err));
                Err(err)
            }
        }
    }

    /// `Submitting → Success | Failed`, recording the matching notice.
    ///
    /// # Errors
    ///
    /// Returns the store failure wrapped as [`SubmitError::Store`].
    pub fn finish<T>(&mut self, result: Result<T, StoreError>) -> Result<T, SubmitError> {
        if self.state != FlowState::Submitting {
            warn!(state = ?self.state, "finish called outside of a submission");
        }
        match result {
            Ok(value) => {
                self.state = FlowState::Success;
                self.notice = Some(Notice::success());
                Ok(value)
            }
            Err(e) => {
                let err = SubmitError::from(e);
                self.state = FlowState::Failed;
                self.notice = Some(Notice::from_error(&err));
                Err(err)
            }
        }
    }

    /// `Success | Failed → Idle` once the notice has been shown.
    pub fn settle(&mut self) {
        if matches!(self.state, FlowState::Success | FlowState::Failed) {
            self.state = FlowState::Idle;
            self.notice = None;
        }
    }
}

// =============================================================================
// FORM REGISTRY
// =============================================================================

/// Flows keyed by form instance. Only forms with a submission in flight are
/// retained; settled forms are dropped.
#[derive(Default)]
pub struct FormRegistry {
    forms: Mutex<HashMap<Uuid, SubmissionFlow>>,
}

impl FormRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// See [`SubmissionFlow::begin`].
    pub fn begin(&self, form_id: Uuid, display_name: &str, message: &str) -> Result<ValidSignature, SubmitError> {
        let mut forms = self
            .forms
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let flow = forms.entry(form_id).or_default();
        let result = flow.begin(display_name, message);
        if flow.state() != FlowState::Submitting {
            forms.remove(&form_id);
        }
        result
    }

    /// Finish and settle the form's submission, returning the final state
    /// and the notice to display.
    pub fn finish<T>(&self, form_id: Uuid, result: Result<T, StoreError>) -> (FlowState, Notice, Result<T, SubmitError>) {
        let mut forms = self
            .forms
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut flow = forms.remove(&form_id).unwrap_or_default();
        let result = flow.finish(result);
        let state = flow.state();
        let notice = flow.notice().cloned().unwrap_or_else(Notice::success);
        flow.settle();
        (state, notice, result)
    }

    fn abandon(&self, form_id: Uuid) {
        self.forms
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&form_id);
    }
}

/// Releases a form's in-flight slot if the submission is dropped before the
/// store answers (for example when the client disconnects).
struct InFlightGuard<'a> {
    registry: &'a FormRegistry,
    form_id: Uuid,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(form_id = %self.form_id, "submission abandoned before completion");
            self.registry.abandon(self.form_id);
        }
    }
}

// =============================================================================
// DRIVER
// =============================================================================

/// Everything the UI needs after one submit action.
#[derive(Debug)]
pub struct Submission {
    /// `Success`/`Failed`, or `Idle` when refused before reaching the store.
    pub state: FlowState,
    pub notice: Notice,
    pub result: Result<Option<SignatureRecord>, SubmitError>,
    /// Full re-list after a success. `None` when nothing was submitted.
    pub refreshed: Option<Result<Vec<SignatureRecord>, StoreError>>,
}

/// Run one submit action for `form_id` against the store.
///
/// On success the collection is re-listed in full; there is no optimistic
/// insert into the previous list.
pub async fn submit(
    store: &SignatureStore,
    registry: &FormRegistry,
    form_id: Uuid,
    display_name: &str,
    message: &str,
) -> Submission {
    let signature = match registry.begin(form_id, display_name, message) {
        Ok(signature) => signature,
        Err(e) => {
            return Submission { state: FlowState::Idle, notice: Notice::from_error(&e), result: Err(e), refreshed: None };
        }
    };

    let mut guard = InFlightGuard { registry, form_id, armed: true };
    let created = store.create(&signature).await;
    guard.disarm();
    let (state, notice, result) = registry.finish(form_id, created);

    let refreshed = if result.is_ok() { Some(store.list().await) } else { None };

    Submission { state, notice, result, refreshed }
}

#[cfg(test)]
#[path = "flow_test.rs"]
mod tests;
