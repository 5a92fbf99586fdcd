//! Widget validation - the admission-control decision engine.
//!
//! Every load of an embedded calculator on a third-party page goes through
//! [`validate`]. The decision is an ordered, short-circuiting pipeline:
//!
//! 1. key exists          → `invalid_key`
//! 2. key active          → `key_disabled`
//! 3. subscription active → `subscription_inactive` / `subscription_unverified`
//! 4. calculator allowed  → `calculator_not_allowed`
//! 5. domain lock         → `domain_mismatch`
//! 6. rate limit          → `rate_limited`
//!
//! The first failing check wins; nothing past it is evaluated. The
//! subscription check runs on every single call — no caching of a prior
//! "active" result — so a lapsed contractor's widgets stop rendering on the
//! next page load, not on key rotation.
//!
//! Each check is a pure function over already-loaded values; this module's
//! async glue only loads data and applies them in order. Every call writes
//! one usage log row (best-effort) whether it is allowed or denied.

use crate::{
    db::DbPool,
    models::{
        contractor::{Contractor, ContractorProfile},
        subscription::SubscriptionStatus,
        usage_log::{NewUsageLogEntry, RESULT_SUCCESS},
        widget_key::WidgetKey,
    },
    services::{subscription, usage},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Why a validation was denied.
///
/// Serialized as snake_case strings on the wire; these are the values the
/// embed loader keys its error panels on, and the values recorded in the
/// usage log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// No widget key row matches the supplied token
    InvalidKey,
    /// Key exists but was deactivated by its owner
    KeyDisabled,
    /// Owning contractor's subscription is not active
    SubscriptionInactive,
    /// Subscription status could not be read; fail closed, never open
    SubscriptionUnverified,
    /// Key is bound to a different calculator type
    CalculatorNotAllowed,
    /// Key is domain-locked and the caller's domain doesn't match
    DomainMismatch,
    /// Too many attempts inside the rolling 60-second window
    RateLimited,
}

impl ReasonCode {
    /// Wire name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::InvalidKey => "invalid_key",
            ReasonCode::KeyDisabled => "key_disabled",
            ReasonCode::SubscriptionInactive => "subscription_inactive",
            ReasonCode::SubscriptionUnverified => "subscription_unverified",
            ReasonCode::CalculatorNotAllowed => "calculator_not_allowed",
            ReasonCode::DomainMismatch => "domain_mismatch",
            ReasonCode::RateLimited => "rate_limited",
        }
    }

    /// HTTP status the validate endpoint answers with for this denial.
    pub fn http_status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ReasonCode::InvalidKey => StatusCode::NOT_FOUND,
            ReasonCode::KeyDisabled
            | ReasonCode::CalculatorNotAllowed
            | ReasonCode::DomainMismatch => StatusCode::FORBIDDEN,
            ReasonCode::SubscriptionInactive | ReasonCode::SubscriptionUnverified => {
                StatusCode::PAYMENT_REQUIRED
            }
            ReasonCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Non-technical message safe to show inside a third-party page.
    pub fn message(&self) -> &'static str {
        match self {
            ReasonCode::InvalidKey => "Widget key not found",
            ReasonCode::KeyDisabled => "This widget key has been disabled",
            ReasonCode::SubscriptionInactive => "The site owner's subscription is not active",
            ReasonCode::SubscriptionUnverified => "Subscription status could not be verified",
            ReasonCode::CalculatorNotAllowed => {
                "This widget key does not allow the requested calculator"
            }
            ReasonCode::DomainMismatch => "This widget key is not authorized for this domain",
            ReasonCode::RateLimited => "Rate limit exceeded, please try again shortly",
        }
    }
}

/// Outcome of a validation call.
#[derive(Debug, Clone)]
pub enum Decision {
    /// Widget may render; carries the owning contractor's public profile
    Allowed(ContractorProfile),
    /// Widget must not render, with the specific reason and display message
    Denied { reason: ReasonCode, message: String },
}

impl Decision {
    fn denied(reason: ReasonCode) -> Self {
        Decision::Denied {
            reason,
            message: reason.message().to_string(),
        }
    }
}

/// A validation request as received from the embed loader.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationRequest {
    pub widget_key: String,
    pub calculator_type: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub visitor_ip: Option<String>,
    #[serde(default)]
    pub referer: Option<String>,
}

/// Run the full admission-control pipeline for one widget load.
///
/// Returns `Ok(Decision)` for every admission outcome, allowed or denied;
/// `Err` only for infrastructure failures in the key store itself (which
/// the handler surfaces as a 500 — still a refusal to render).
pub async fn validate(pool: &DbPool, request: &ValidationRequest) -> Result<Decision, sqlx::Error> {
    let now = Utc::now();
    let caller_domain = effective_domain(request.domain.as_deref(), request.referer.as_deref());

    // Step 1: resolve the key. An unknown key is still logged, with null
    // key/contractor ids.
    let key = sqlx::query_as::<_, WidgetKey>(
        "SELECT id, key, contractor_id, calculator_type, domain, is_active,
                rate_limit_per_minute, usage_count, last_used_at, created_at
         FROM widget_keys
         WHERE key = $1",
    )
    .bind(&request.widget_key)
    .fetch_optional(pool)
    .await?;

    let Some(key) = key else {
        log_outcome(pool, request, None, ReasonCode::InvalidKey.as_str()).await;
        return Ok(Decision::denied(ReasonCode::InvalidKey));
    };

    // Step 2: active flag
    if let Err(reason) = check_active(&key) {
        log_outcome(pool, request, Some(&key), reason.as_str()).await;
        return Ok(Decision::denied(reason));
    }

    // Step 3: subscription, re-checked on every call. A provider read
    // error denies with its own reason - fail closed, never open.
    let reason = match subscription::fetch_status(pool, key.contractor_id).await {
        Ok(status) => check_subscription(status.as_ref(), now).err(),
        Err(e) => {
            tracing::warn!("subscription lookup failed for {}: {e}", key.contractor_id);
            Some(ReasonCode::SubscriptionUnverified)
        }
    };
    if let Some(reason) = reason {
        log_outcome(pool, request, Some(&key), reason.as_str()).await;
        return Ok(Decision::denied(reason));
    }

    // Step 4: calculator authorization
    if let Err(reason) = check_calculator(&key.calculator_type, &request.calculator_type) {
        log_outcome(pool, request, Some(&key), reason.as_str()).await;
        return Ok(Decision::denied(reason));
    }

    // Step 5: domain lock (opt-in; skipped when either side is absent)
    if let Err(reason) = check_domain(key.domain.as_deref(), caller_domain.as_deref()) {
        log_outcome(pool, request, Some(&key), reason.as_str()).await;
        return Ok(Decision::denied(reason));
    }

    // Step 6: rate limit, only consulted when the key was used within the
    // window. The count query races under concurrency; accepted, this is
    // an anti-abuse heuristic rather than a hard quota.
    if within_rate_window(key.last_used_at, now) {
        let attempts = usage::attempts_in_window(pool, key.id, now).await?;
        if let Err(reason) = check_rate(attempts, key.rate_limit_per_minute) {
            log_outcome(pool, request, Some(&key), reason.as_str()).await;
            return Ok(Decision::denied(reason));
        }
    }

    // All checks passed. Load the public profile for the response.
    let contractor = sqlx::query_as::<_, Contractor>(
        "SELECT id, key_hash, business_name, email, is_active, created_at
         FROM contractors
         WHERE id = $1",
    )
    .bind(key.contractor_id)
    .fetch_optional(pool)
    .await?;

    let Some(contractor) = contractor else {
        // Orphaned key row; treat like an unknown key rather than leaking
        // the dangling reference.
        log_outcome(pool, request, Some(&key), ReasonCode::InvalidKey.as_str()).await;
        return Ok(Decision::denied(ReasonCode::InvalidKey));
    };

    record_success(pool, &key).await;
    log_outcome(pool, request, Some(&key), RESULT_SUCCESS).await;

    Ok(Decision::Allowed(contractor.into()))
}

/// Best-effort bump of the advisory usage stats on the key row.
///
/// Lost updates under concurrency and write failures are both acceptable;
/// neither may fail the validation response.
async fn record_success(pool: &DbPool, key: &WidgetKey) {
    let result = sqlx::query(
        "UPDATE widget_keys SET usage_count = usage_count + 1, last_used_at = NOW() WHERE id = $1",
    )
    .bind(key.id)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!("usage stats update failed for key {} (swallowed): {e}", key.id);
    }
}

/// Append the usage log row for this attempt (best-effort, swallowed).
async fn log_outcome(
    pool: &DbPool,
    request: &ValidationRequest,
    key: Option<&WidgetKey>,
    result: &str,
) {
    usage::log_attempt(
        pool,
        NewUsageLogEntry {
            widget_key_id: key.map(|k| k.id),
            contractor_id: key.map(|k| k.contractor_id),
            calculator_type: request.calculator_type.clone(),
            validation_result: result.to_string(),
            visitor_ip: request.visitor_ip.clone(),
            referer: request.referer.clone(),
            domain: request.domain.clone(),
        },
    )
    .await;
}

// ---------------------------------------------------------------------------
// Pure checks. Each takes already-loaded values and returns Ok(()) to
// continue the pipeline or Err(reason) to terminate it.
// ---------------------------------------------------------------------------

/// The domain the caller is embedding from: the explicitly supplied value
/// wins, otherwise the hostname parsed out of the referer URL.
pub fn effective_domain(domain: Option<&str>, referer: Option<&str>) -> Option<String> {
    if let Some(d) = domain {
        if !d.is_empty() {
            return Some(d.to_string());
        }
    }
    referer
        .and_then(|r| url::Url::parse(r).ok())
        .and_then(|u| u.host_str().map(|h| h.to_string()))
}

/// Step 2: the key's active flag.
pub fn check_active(key: &WidgetKey) -> Result<(), ReasonCode> {
    if key.is_active {
        Ok(())
    } else {
        Err(ReasonCode::KeyDisabled)
    }
}

/// Step 3: derived subscription boolean. A missing row (contractor never
/// subscribed) denies the same way an expired one does.
pub fn check_subscription(
    status: Option<&SubscriptionStatus>,
    now: DateTime<Utc>,
) -> Result<(), ReasonCode> {
    match status {
        Some(s) if s.is_active(now) => Ok(()),
        _ => Err(ReasonCode::SubscriptionInactive),
    }
}

/// Step 4: calculator authorization. "all" is the wildcard; otherwise the
/// key's type must equal the requested type exactly.
pub fn check_calculator(key_type: &str, requested: &str) -> Result<(), ReasonCode> {
    if key_type == "all" || key_type == requested {
        Ok(())
    } else {
        Err(ReasonCode::CalculatorNotAllowed)
    }
}

/// Step 5: domain lock. Opt-in on both sides: no lock, or no caller domain,
/// skips the check. Matching is a case-insensitive substring test, so a
/// lock on "example.com" admits "shop.example.com".
pub fn check_domain(lock: Option<&str>, caller: Option<&str>) -> Result<(), ReasonCode> {
    match (lock, caller) {
        (Some(lock), Some(caller)) if !lock.is_empty() => {
            if caller.to_lowercase().contains(&lock.to_lowercase()) {
                Ok(())
            } else {
                Err(ReasonCode::DomainMismatch)
            }
        }
        _ => Ok(()),
    }
}

/// Whether the rate-limit count query needs to run at all: only when the
/// key was last used inside the trailing window. A cold key skips the
/// count entirely.
pub fn within_rate_window(last_used_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_used_at {
        Some(t) => now - t < Duration::seconds(usage::RATE_WINDOW_SECONDS),
        None => false,
    }
}

/// Step 6: the budget check over the window count.
pub fn check_rate(attempts_in_window: i64, rate_limit_per_minute: i32) -> Result<(), ReasonCode> {
    if attempts_in_window >= i64::from(rate_limit_per_minute) {
        Err(ReasonCode::RateLimited)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn key(calculator_type: &str) -> WidgetKey {
        WidgetKey {
            id: Uuid::new_v4(),
            key: "wgt_abcdefghij0123456789klmn".to_string(),
            contractor_id: Uuid::new_v4(),
            calculator_type: calculator_type.to_string(),
            domain: None,
            is_active: true,
            rate_limit_per_minute: 100,
            usage_count: 0,
            last_used_at: None,
            created_at: Utc::now(),
        }
    }

    fn active_subscription(now: DateTime<Utc>) -> SubscriptionStatus {
        SubscriptionStatus {
            contractor_id: Uuid::new_v4(),
            status: "active".to_string(),
            current_period_end: now + Duration::days(30),
            cancel_at_period_end: false,
            updated_at: now,
        }
    }

    #[test]
    fn active_key_passes_active_check() {
        assert!(check_active(&key("roofing")).is_ok());
    }

    #[test]
    fn disabled_key_is_denied_regardless_of_anything_else() {
        let mut k = key("roofing");
        k.is_active = false;
        assert_eq!(check_active(&k), Err(ReasonCode::KeyDisabled));
    }

    #[test]
    fn missing_subscription_row_denies() {
        assert_eq!(
            check_subscription(None, Utc::now()),
            Err(ReasonCode::SubscriptionInactive)
        );
    }

    #[test]
    fn expired_subscription_denies_even_with_active_status() {
        let now = Utc::now();
        let mut s = active_subscription(now);
        s.current_period_end = now - Duration::seconds(1);
        assert_eq!(
            check_subscription(Some(&s), now),
            Err(ReasonCode::SubscriptionInactive)
        );
    }

    #[test]
    fn active_subscription_passes() {
        let now = Utc::now();
        let s = active_subscription(now);
        assert!(check_subscription(Some(&s), now).is_ok());
    }

    #[test]
    fn wildcard_key_allows_any_calculator() {
        assert!(check_calculator("all", "roofing").is_ok());
        assert!(check_calculator("all", "concrete").is_ok());
    }

    #[test]
    fn matching_calculator_allowed_mismatch_denied() {
        assert!(check_calculator("roofing", "roofing").is_ok());
        assert_eq!(
            check_calculator("roofing", "concrete"),
            Err(ReasonCode::CalculatorNotAllowed)
        );
    }

    #[test]
    fn subdomain_satisfies_domain_lock() {
        assert!(check_domain(Some("example.com"), Some("shop.example.com")).is_ok());
    }

    #[test]
    fn unrelated_domain_fails_lock() {
        assert_eq!(
            check_domain(Some("example.com"), Some("other.com")),
            Err(ReasonCode::DomainMismatch)
        );
    }

    #[test]
    fn domain_lock_is_opt_in_on_both_sides() {
        // no lock stored
        assert!(check_domain(None, Some("anything.com")).is_ok());
        // lock stored but caller supplied nothing
        assert!(check_domain(Some("example.com"), None).is_ok());
        // empty lock behaves like no lock
        assert!(check_domain(Some(""), Some("other.com")).is_ok());
    }

    #[test]
    fn domain_match_ignores_case() {
        assert!(check_domain(Some("Example.COM"), Some("shop.example.com")).is_ok());
    }

    #[test]
    fn rate_check_skipped_for_cold_keys() {
        let now = Utc::now();
        assert!(!within_rate_window(None, now));
        assert!(!within_rate_window(Some(now - Duration::seconds(61)), now));
    }

    #[test]
    fn rate_check_applies_to_recently_used_keys() {
        let now = Utc::now();
        assert!(within_rate_window(Some(now - Duration::seconds(5)), now));
    }

    #[test]
    fn sixth_call_over_a_budget_of_five_is_denied() {
        // five prior attempts in the window against a budget of 5
        assert_eq!(check_rate(5, 5), Err(ReasonCode::RateLimited));
        assert!(check_rate(4, 5).is_ok());
    }

    #[test]
    fn explicit_domain_wins_over_referer() {
        let d = effective_domain(Some("host.example.com"), Some("https://other.com/page"));
        assert_eq!(d.as_deref(), Some("host.example.com"));
    }

    #[test]
    fn referer_hostname_used_when_domain_absent() {
        let d = effective_domain(None, Some("https://shop.example.com/quote?x=1"));
        assert_eq!(d.as_deref(), Some("shop.example.com"));
    }

    #[test]
    fn garbage_referer_yields_no_domain() {
        assert_eq!(effective_domain(None, Some("not a url")), None);
        assert_eq!(effective_domain(Some(""), None), None);
    }

    #[test]
    fn reason_codes_serialize_to_wire_names() {
        for reason in [
            ReasonCode::InvalidKey,
            ReasonCode::KeyDisabled,
            ReasonCode::SubscriptionInactive,
            ReasonCode::SubscriptionUnverified,
            ReasonCode::CalculatorNotAllowed,
            ReasonCode::DomainMismatch,
            ReasonCode::RateLimited,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.as_str()));
        }
    }

    #[test]
    fn reason_codes_map_to_expected_statuses() {
        use axum::http::StatusCode;
        assert_eq!(ReasonCode::InvalidKey.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ReasonCode::KeyDisabled.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ReasonCode::SubscriptionInactive.http_status(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            ReasonCode::SubscriptionUnverified.http_status(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            ReasonCode::CalculatorNotAllowed.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ReasonCode::DomainMismatch.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ReasonCode::RateLimited.http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
