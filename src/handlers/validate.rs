//! Widget validation endpoint.
//!
//! `POST /widget-validate` is the gate every embedded calculator passes
//! through on every page load. It is public (called from arbitrary
//! third-party origins) and answers with its own `{valid, ...}` envelope:
//! denials are ordinary business outcomes here, not errors.

use crate::{AppState, services::validator};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Validate a widget key for rendering.
///
/// # Request Body
///
/// ```json
/// {
///   "widget_key": "wgt_k2j9x0q8v7m3n1p5r6t4w8y2",
///   "calculator_type": "roofing",
///   "domain": "shop.example.com",
///   "referer": "https://shop.example.com/quote"
/// }
/// ```
///
/// # Responses
///
/// - **200** `{"valid": true, "contractor": {"id", "business_name", "email"}}`
/// - **404** `invalid_key`, **403** `key_disabled` / `calculator_not_allowed`
///   / `domain_mismatch`, **402** `subscription_inactive` /
///   `subscription_unverified`, **429** `rate_limited` — all as
///   `{"valid": false, "reason", "error"}`
/// - **500** same shape with reason `internal_error` when the key store
///   itself fails (still a refusal to render — the gate fails closed)
pub async fn validate_widget(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut request): Json<validator::ValidationRequest>,
) -> Response {
    // Fall back to the proxy-provided client address when the loader did
    // not supply one.
    if request.visitor_ip.is_none() {
        request.visitor_ip = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|ip| ip.trim().to_string());
    }

    match validator::validate(&state.pool, &request).await {
        Ok(validator::Decision::Allowed(contractor)) => (
            StatusCode::OK,
            Json(json!({
                "valid": true,
                "contractor": contractor
            })),
        )
            .into_response(),
        Ok(validator::Decision::Denied { reason, message }) => {
            tracing::debug!(
                "widget validation denied: key={} reason={}",
                request.widget_key,
                reason.as_str()
            );
            (
                reason.http_status(),
                Json(json!({
                    "valid": false,
                    "reason": reason,
                    "error": message
                })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("widget validation failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "valid": false,
                    "reason": "internal_error",
                    "error": "Validation is temporarily unavailable"
                })),
            )
                .into_response()
        }
    }
}
