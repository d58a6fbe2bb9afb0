//! HTML rendering for the signature list and page shell.
//!
//! DESIGN
//! ======
//! Rendering is a pure function of its input: the same collection always
//! produces the same markup, and the whole list is re-rendered on every
//! refresh. All user-supplied text passes through [`escape_html`].

use std::fmt::Write as _;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

use crate::flow::{CONNECTIVITY_TEXT, ERROR_NOTICE_MS, SUCCESS_NOTICE_MS, TRIGGER_BUSY_LABEL};
use crate::store::SignatureRecord;
use crate::store::types::sort_newest_first;
use crate::validate::{MAX_MESSAGE_CHARS, utf16_len};

/// Number of card color variants cycled through by position.
pub const CARD_VARIANTS: usize = 5;

pub const EMPTY_STATE_TEXT: &str = "No signatures yet. Be the first to sign!";
pub const LIST_FAILED_TEXT: &str = "Could not load signatures.";

// =============================================================================
// ESCAPING
// =============================================================================

/// Escape text for use in element content and quoted attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// =============================================================================
// DATES
// =============================================================================

/// `Oct 17, 2026` in UTC.
#[must_use]
pub fn format_date(ts: OffsetDateTime) -> String {
    let utc = ts.to_offset(time::UtcOffset::UTC);
    utc.format(format_description!("[month repr:short] [day padding:none], [year]"))
        .unwrap_or_else(|_| utc.date().to_string())
}

fn datetime_attr(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.to_string())
}

// =============================================================================
// LIST
// =============================================================================

/// Render the inner markup of `.signatures-container`.
#[must_use]
pub fn render_list(records: &[SignatureRecord]) -> String {
    if records.is_empty() {
        return render_empty();
    }

    let mut ordered = records.to_vec();
    sort_newest_first(&mut ordered);

    let mut out = String::new();
    for (index, record) in ordered.iter().enumerate() {
        out.push_str(&render_card(index, record));
    }
    out
}

#[must_use]
pub fn render_empty() -> String {
    format!("<div class=\"signatures-empty\"><p>{EMPTY_STATE_TEXT}</p></div>")
}

/// Degraded list after a failed load: generic notice plus the empty state.
#[must_use]
pub fn render_load_failed() -> String {
    format!("<p class=\"signatures-error\" role=\"alert\">{LIST_FAILED_TEXT}</p>{}", render_empty())
}

fn render_card(index: usize, record: &SignatureRecord) -> String {
    let variant = (index % CARD_VARIANTS) + 1;
    let mut out = String::new();
    let _ = write!(
        out,
        "<blockquote class=\"signature-card signature-card--{variant}\" data-signature-id=\"{id}\">\
         <p class=\"signature-card__quote\">&quot;{message}&quot;</p>\
         <cite class=\"signature-card__author\">{name}</cite>\
         <time class=\"signature-card__date\" datetime=\"{datetime}\">{date}</time>\
         </blockquote>",
        id = escape_html(record.id.as_str()),
        message = escape_html(&record.message),
        name = escape_html(&record.display_name),
        datetime = datetime_attr(record.created_at),
        date = format_date(record.created_at),
    );
    out
}

/// Error notice inside the form; `None` renders it hidden.
#[must_use]
pub fn render_error_banner(text: Option<&str>) -> String {
    render_notice("signature-error", "alert", ERROR_NOTICE_MS, text)
}

/// Success notice inside the form; `None` renders it hidden.
#[must_use]
pub fn render_success_banner(text: Option<&str>) -> String {
    render_notice("signature-success", "status", SUCCESS_NOTICE_MS, text)
}

fn render_notice(id: &str, role: &str, dismiss_after_ms: u64, text: Option<&str>) -> String {
    let open = format!("<div id=\"{id}\" class=\"{id}\" role=\"{role}\" data-dismiss-after-ms=\"{dismiss_after_ms}\"");
    match text {
        Some(text) => format!("{open}>{}</div>", escape_html(text)),
        None => format!("{open} hidden></div>"),
    }
}

// =============================================================================
// PAGE SHELL
// =============================================================================

/// Path the page loads its behavior script from.
pub const SCRIPT_PATH: &str = "/signatures.js";

/// Modal, character counter and in-place submission for the page shell.
pub const PAGE_SCRIPT: &str = include_str!("../assets/signatures.js");

/// Everything the page shell shows besides static chrome.
#[derive(Debug, Default)]
pub struct PageView<'a> {
    /// Output of [`render_list`], [`render_load_failed`] or [`render_empty`].
    pub list_html: &'a str,
    pub form_id: &'a str,
    pub trigger_label: &'a str,
    pub error: Option<&'a str>,
    pub success: Option<&'a str>,
    /// Values to refill after a rejected submission.
    pub display_name: &'a str,
    pub message: &'a str,
    /// Render the overlay open, as after a submission without script.
    pub modal_open: bool,
}

/// Full page: sign button, modal overlay with the form and notices, and list.
#[must_use]
pub fn render_page(view: &PageView<'_>) -> String {
    let form_id = escape_html(view.form_id);
    let trigger_label = escape_html(view.trigger_label);
    let busy_label = escape_html(TRIGGER_BUSY_LABEL);
    let offline_text = escape_html(CONNECTIVITY_TEXT);
    let display_name = escape_html(view.display_name);
    let message = escape_html(view.message);
    let counter = utf16_len(view.message);
    let error_banner = render_error_banner(view.error);
    let success_banner = render_success_banner(view.success);
    let list_html = view.list_html;
    let modal_hidden = if view.modal_open { "false" } else { "true" };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Yearbook</title>
<script src="{SCRIPT_PATH}" defer></script>
</head>
<body>
<main>
<section class="signatures">
<button id="sign-button" type="button">{trigger_label}</button>
<div class="signatures-container">{list_html}</div>
</section>
<div id="signature-modal" class="signature-modal" aria-hidden="{modal_hidden}">
<div class="signature-modal__backdrop"></div>
<div class="signature-modal__dialog" role="dialog" aria-modal="true">
<button class="signature-modal__close" type="button" aria-label="Close">&times;</button>
<form id="signature-form" method="post" action="/signatures" data-offline-text="{offline_text}">
<input type="hidden" name="form_id" value="{form_id}">
<label for="display_name">Name</label>
<input id="display_name" name="display_name" type="text" value="{display_name}" required>
<label for="message">Message</label>
<textarea id="message" name="message" maxlength="{MAX_MESSAGE_CHARS}" required>{message}</textarea>
<p class="signature-form__counter"><span id="char-counter">{counter}</span>/{MAX_MESSAGE_CHARS}</p>
{error_banner}
{success_banner}
<button class="signature-form__submit" type="submit" data-idle-label="{trigger_label}" data-busy-label="{busy_label}">{trigger_label}</button>
</form>
</div>
</div>
</main>
</body>
</html>
"#
    )
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
