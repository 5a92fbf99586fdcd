//! Usage log models.
//!
//! Every validation attempt against a widget key, allowed or denied,
//! produces exactly one `usage_log` row (unless the write itself fails,
//! which is swallowed). The table serves two purposes:
//!
//! 1. Audit trail: who tried to render what, from where, and what happened.
//! 2. Rate limiting: the rolling 60-second count of rows per key is the
//!    authoritative input for the `rate_limited` check. The counters on the
//!    `widget_keys` row are advisory only.
//!
//! Rows are append-only: nothing in the validator path updates or deletes
//! them.

use uuid::Uuid;

/// Result string recorded for a successful validation.
pub const RESULT_SUCCESS: &str = "success";

/// Result string recorded when a lead is captured through the key.
pub const RESULT_LEAD_CAPTURED: &str = "lead_captured";

/// A usage log row about to be inserted.
///
/// `widget_key_id` and `contractor_id` are `None` when the key string could
/// not be resolved at all (the `invalid_key` case still gets logged).
#[derive(Debug, Clone)]
pub struct NewUsageLogEntry {
    pub widget_key_id: Option<Uuid>,
    pub contractor_id: Option<Uuid>,

    /// Calculator type as requested by the caller, recorded verbatim even
    /// when it failed validation
    pub calculator_type: String,

    /// One of the validator reason codes, [`RESULT_SUCCESS`], or
    /// [`RESULT_LEAD_CAPTURED`]
    pub validation_result: String,

    pub visitor_ip: Option<String>,
    pub referer: Option<String>,
    pub domain: Option<String>,
}
