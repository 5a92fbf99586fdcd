//! Lead capture HTTP handler.
//!
//! `POST /widget-lead-capture` is called by the widget iframe after a
//! visitor submits the calculator form. Public + CORS like validation; the
//! widget key in the body is the only credential.

use crate::{
    AppState,
    error::AppError,
    models::lead::{CaptureLeadRequest, CaptureLeadResponse},
    services::lead_capture,
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// Capture a lead from an embedded widget.
///
/// # Request Body
///
/// ```json
/// {
///   "widget_key": "wgt_k2j9x0q8v7m3n1p5r6t4w8y2",
///   "calculator_type": "roofing",
///   "name": "Jane Homeowner",
///   "email": "jane@example.com",
///   "project_details": {"roof_area_sqft": 1800}
/// }
/// ```
///
/// # Responses
///
/// - **201 Created**: `{"success": true, "lead_id": "..."}`
/// - **400**: missing name, or email failing the shape check (rejected
///   before any database read)
/// - **404**: unknown widget key
/// - **403**: key disabled
pub async fn capture_lead(
    State(state): State<AppState>,
    Json(request): Json<CaptureLeadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let lead = lead_capture::capture_lead(&state.pool, &request).await?;

    tracing::info!(
        "captured lead {} for contractor {}",
        lead.id,
        lead.contractor_id
    );

    Ok((
        StatusCode::CREATED,
        Json(CaptureLeadResponse {
            success: true,
            lead_id: lead.id,
        }),
    ))
}
