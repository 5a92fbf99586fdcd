//! Widget key issuance and management.
//!
//! Keys are bearer tokens pasted into third-party HTML, so they get real
//! entropy: 24 characters over a 36-symbol alphabet is about 124 bits,
//! which makes guessing infeasible and collisions astronomically rare.
//! Rare is not never, though - an insert hitting the unique constraint is
//! retried with a fresh key, and only ever surfaced as a distinct
//! retryable error. An existing key is never overwritten.

use crate::{
    db::DbPool,
    error::AppError,
    models::widget_key::{CalculatorType, IssueKeyRequest, WidgetKey},
};
use rand::Rng;
use uuid::Uuid;

/// Fixed prefix on every issued key, handy for log scrubbing and support.
const KEY_PREFIX: &str = "wgt_";

/// Random characters after the prefix.
const KEY_RANDOM_LEN: usize = 24;

const KEY_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// How many fresh keys to try before giving up on a collision streak.
const MAX_ISSUE_ATTEMPTS: u32 = 3;

/// Issue a new widget key for an authenticated contractor.
///
/// Validates the calculator type against the fixed enumeration (400 on
/// anything else), generates a random key, and inserts it with defaults:
/// active, rate limit 100/min, zero usage. On a unique-constraint collision
/// the insert is retried with a new key; after [`MAX_ISSUE_ATTEMPTS`] the
/// distinct [`AppError::KeyCollision`] is returned so the caller knows a
/// plain retry is safe.
pub async fn issue_key(
    pool: &DbPool,
    contractor_id: Uuid,
    request: &IssueKeyRequest,
) -> Result<WidgetKey, AppError> {
    let calculator = CalculatorType::parse(&request.calculator_type).ok_or_else(|| {
        AppError::InvalidRequest(format!(
            "Unknown calculator type '{}'",
            request.calculator_type
        ))
    })?;

    let domain = request
        .domain
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    for attempt in 1..=MAX_ISSUE_ATTEMPTS {
        let token = generate_key();

        let inserted = sqlx::query_as::<_, WidgetKey>(
            r#"
            INSERT INTO widget_keys (key, contractor_id, calculator_type, domain)
            VALUES ($1, $2, $3, $4)
            RETURNING id, key, contractor_id, calculator_type, domain, is_active,
                      rate_limit_per_minute, usage_count, last_used_at, created_at
            "#,
        )
        .bind(&token)
        .bind(contractor_id)
        .bind(calculator.as_str())
        .bind(domain)
        .fetch_one(pool)
        .await;

        match inserted {
            Ok(key) => return Ok(key),
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!("widget key collision on attempt {attempt}, regenerating");
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::KeyCollision)
}

/// List all widget keys owned by a contractor, newest first.
pub async fn list_keys(pool: &DbPool, contractor_id: Uuid) -> Result<Vec<WidgetKey>, AppError> {
    let keys = sqlx::query_as::<_, WidgetKey>(
        "SELECT id, key, contractor_id, calculator_type, domain, is_active,
                rate_limit_per_minute, usage_count, last_used_at, created_at
         FROM widget_keys
         WHERE contractor_id = $1
         ORDER BY created_at DESC",
    )
    .bind(contractor_id)
    .fetch_all(pool)
    .await?;

    Ok(keys)
}

/// Deactivate a widget key (disable without deleting).
///
/// Filters by BOTH id and contractor_id, so a key belonging to someone else
/// looks identical to a key that doesn't exist - 404 either way, no key
/// enumeration.
pub async fn deactivate_key(
    pool: &DbPool,
    contractor_id: Uuid,
    key_id: Uuid,
) -> Result<(), AppError> {
    let result =
        sqlx::query("UPDATE widget_keys SET is_active = false WHERE id = $1 AND contractor_id = $2")
            .bind(key_id)
            .bind(contractor_id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::WidgetKeyNotFound);
    }

    Ok(())
}

/// Generate a fresh widget key token.
///
/// Format: `wgt_` + 24 random lowercase-alphanumeric characters, drawn
/// uniformly from a 36-symbol alphabet (≈124 bits).
pub fn generate_key() -> String {
    let mut rng = rand::rng();
    let mut token = String::with_capacity(KEY_PREFIX.len() + KEY_RANDOM_LEN);
    token.push_str(KEY_PREFIX);
    for _ in 0..KEY_RANDOM_LEN {
        let idx = rng.random_range(0..KEY_ALPHABET.len());
        token.push(KEY_ALPHABET[idx] as char);
    }
    token
}

/// Ready-to-paste embed snippet for an issued key.
pub fn embed_snippet(base_url: &str, key: &str, calculator_type: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!(
        r#"<script src="{base}/embed.js" data-widget-key="{key}" data-calculator="{calculator_type}" async></script>"#
    )
}

/// True when the error is a Postgres unique-constraint violation.
fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_have_the_documented_shape() {
        let key = generate_key();
        assert!(key.starts_with("wgt_"));
        assert_eq!(key.len(), KEY_PREFIX.len() + KEY_RANDOM_LEN);
        assert!(
            key[KEY_PREFIX.len()..]
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn generated_keys_differ_across_draws() {
        // 124 bits of entropy; any repeat here means the generator is broken
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(generate_key()));
        }
    }

    #[test]
    fn snippet_carries_key_and_calculator_attributes() {
        let snippet = embed_snippet("https://app.example.com/", "wgt_abc", "roofing");
        assert!(snippet.contains(r#"src="https://app.example.com/embed.js""#));
        assert!(snippet.contains(r#"data-widget-key="wgt_abc""#));
        assert!(snippet.contains(r#"data-calculator="roofing""#));
        assert!(snippet.contains("async"));
    }
}
