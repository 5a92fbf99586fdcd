//! Lead capture from embedded widgets.
//!
//! The iframe that submits here was only mounted after passing the full
//! validation pipeline, so this endpoint deliberately re-checks only that
//! the key is known and active - not subscription, domain, or rate limit.
//! That is a documented trust boundary (the iframe origin is ours), not an
//! oversight. What it never trusts is the caller's idea of who owns the
//! lead: `contractor_id` always comes from the resolved key row.

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        lead::{CaptureLeadRequest, Lead},
        usage_log::{NewUsageLogEntry, RESULT_LEAD_CAPTURED},
        widget_key::WidgetKey,
    },
    services::usage,
};

/// Capture a lead submitted by a validated widget.
///
/// # Steps
///
/// 1. Hard input validation (400 before any database read)
/// 2. Resolve widget key (404 if unknown)
/// 3. Reject disabled keys (403)
/// 4. Insert the lead, attributed to the key's contractor
/// 5. Best-effort `lead_captured` usage log entry
pub async fn capture_lead(pool: &DbPool, request: &CaptureLeadRequest) -> Result<Lead, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::InvalidRequest("Name is required".to_string()));
    }
    if !is_valid_email(&request.email) {
        return Err(AppError::InvalidRequest(
            "A valid email address is required".to_string(),
        ));
    }

    let key = sqlx::query_as::<_, WidgetKey>(
        "SELECT id, key, contractor_id, calculator_type, domain, is_active,
                rate_limit_per_minute, usage_count, last_used_at, created_at
         FROM widget_keys
         WHERE key = $1",
    )
    .bind(&request.widget_key)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::WidgetKeyNotFound)?;

    if !key.is_active {
        return Err(AppError::WidgetKeyDisabled);
    }

    // contractor_id comes from the key row, never from the request body
    let lead = sqlx::query_as::<_, Lead>(
        r#"
        INSERT INTO leads (
            contractor_id,
            widget_key_id,
            source,
            calculator_type,
            name,
            email,
            phone,
            address,
            project_details,
            estimated_value,
            status
        )
        VALUES ($1, $2, 'website_widget', $3, $4, $5, $6, $7, $8, $9, 'new')
        RETURNING id, contractor_id, widget_key_id, source, calculator_type,
                  name, email, phone, address, project_details, estimated_value,
                  status, created_at
        "#,
    )
    .bind(key.contractor_id)
    .bind(key.id)
    .bind(&request.calculator_type)
    .bind(request.name.trim())
    .bind(request.email.trim())
    .bind(&request.phone)
    .bind(&request.address)
    .bind(&request.project_details)
    .bind(request.estimated_value)
    .fetch_one(pool)
    .await?;

    usage::log_attempt(
        pool,
        NewUsageLogEntry {
            widget_key_id: Some(key.id),
            contractor_id: Some(key.contractor_id),
            calculator_type: request.calculator_type.clone(),
            validation_result: RESULT_LEAD_CAPTURED.to_string(),
            visitor_ip: None,
            referer: None,
            domain: None,
        },
    )
    .await;

    Ok(lead)
}

/// Basic email shape check: non-empty local part, one '@', and a domain
/// containing a dot that is neither its first nor last character. This is
/// deliverability's problem beyond that.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.find('.') {
        Some(0) => false,
        Some(_) => !domain.ends_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("jane.doe+quotes@mail.example.com"));
        assert!(is_valid_email("  padded@example.com  "));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@b.com@c.com"));
        assert!(!is_valid_email("a@b."));
        assert!(!is_valid_email(""));
    }
}
