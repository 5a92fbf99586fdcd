//! Usage log writes and the rolling rate-limit window.
//!
//! Log writes are best-effort: a failed insert is logged at warn and
//! swallowed, because an audit-trail hiccup must never change a validation
//! outcome or fail an HTTP response. The window count, by contrast, is a
//! real query — it is the authoritative rate-limit input.

use crate::{db::DbPool, models::usage_log::NewUsageLogEntry};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Length of the rolling rate-limit window.
pub const RATE_WINDOW_SECONDS: i64 = 60;

/// Append a usage log entry, swallowing any failure.
///
/// Every validation attempt (and every captured lead) calls this exactly
/// once. The insert failing is an acceptable, bounded inconsistency: the
/// log is advisory for rate limiting, not a ledger.
pub async fn log_attempt(pool: &DbPool, entry: NewUsageLogEntry) {
    let result = sqlx::query(
        r#"
        INSERT INTO usage_log (
            widget_key_id,
            contractor_id,
            calculator_type,
            validation_result,
            visitor_ip,
            referer,
            domain
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(entry.widget_key_id)
    .bind(entry.contractor_id)
    .bind(&entry.calculator_type)
    .bind(&entry.validation_result)
    .bind(&entry.visitor_ip)
    .bind(&entry.referer)
    .bind(&entry.domain)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!("usage log write failed (swallowed): {e}");
    }
}

/// Count validation attempts for a key within the trailing 60-second window.
///
/// Two concurrent validations can both read a count just under the budget
/// and both pass; that race is accepted — this is an anti-abuse heuristic,
/// not a hard quota.
pub async fn attempts_in_window(
    pool: &DbPool,
    widget_key_id: Uuid,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let window_start = now - Duration::seconds(RATE_WINDOW_SECONDS);

    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM usage_log WHERE widget_key_id = $1 AND created_at > $2",
    )
    .bind(widget_key_id)
    .bind(window_start)
    .fetch_one(pool)
    .await
}
