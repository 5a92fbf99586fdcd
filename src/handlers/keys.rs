//! Widget key issuance and management HTTP handlers.
//!
//! All routes here sit behind the contractor auth middleware:
//! - POST /widget-key-generate - issue a new key + embed snippet
//! - GET /widget-keys - list the caller's keys with usage stats
//! - POST /widget-keys/{id}/deactivate - disable a key without deleting it

use crate::{
    AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::widget_key::{IssueKeyRequest, IssueKeyResponse, WidgetKeyResponse},
    services::key_issuer,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

/// Issue a new widget key.
///
/// # Request Body
///
/// ```json
/// {
///   "calculator_type": "roofing",
///   "domain": "example.com"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: the key and a paste-ready embed snippet
/// - **Error (400)**: calculator type outside the fixed enumeration
/// - **Error (401)**: missing/invalid contractor API key
/// - **Error (500, retryable)**: key collision after retries
///
/// ```json
/// {
///   "success": true,
///   "widget_key": "wgt_k2j9x0q8v7m3n1p5r6t4w8y2",
///   "embed_code": "<script src=\"...\" data-widget-key=\"...\" ...></script>"
/// }
/// ```
pub async fn generate_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<IssueKeyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let key = key_issuer::issue_key(&state.pool, auth.contractor_id, &request).await?;

    tracing::info!(
        "issued widget key for {} ({})",
        auth.business_name,
        key.calculator_type
    );

    let embed_code =
        key_issuer::embed_snippet(&state.config.widget_base_url, &key.key, &key.calculator_type);

    Ok((
        StatusCode::CREATED,
        Json(IssueKeyResponse {
            success: true,
            widget_key: key.key,
            embed_code,
        }),
    ))
}

/// List the authenticated contractor's widget keys, newest first.
///
/// Returns every key the caller owns, active or not, with its usage stats.
pub async fn list_keys(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<WidgetKeyResponse>>, AppError> {
    let keys = key_issuer::list_keys(&state.pool, auth.contractor_id).await?;

    Ok(Json(keys.into_iter().map(Into::into).collect()))
}

/// Deactivate a widget key (soft delete).
///
/// Embedded widgets using this key start failing validation on their next
/// page load. Returns 404 when the key doesn't exist or belongs to another
/// contractor - the two cases are indistinguishable on purpose.
pub async fn deactivate_key(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(key_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    key_issuer::deactivate_key(&state.pool, auth.contractor_id, key_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
