//! Lead data models and API request/response types.
//!
//! Leads are form submissions captured by an embedded calculator widget and
//! attributed to the contractor that owns the widget key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a lead record from the database.
///
/// # Database Table
///
/// Maps to the `leads` table.
///
/// # Attribution
///
/// `contractor_id` is always derived server-side from the resolved widget
/// key. The capture request carries no contractor field at all, so a lead
/// can never be spoofed into another contractor's pipeline.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Lead {
    /// Unique identifier for this lead
    pub id: Uuid,

    /// Contractor that owns the widget key the lead came through
    pub contractor_id: Uuid,

    /// Widget key that captured this lead
    pub widget_key_id: Uuid,

    /// Acquisition channel, always "website_widget" for this path
    pub source: String,

    /// Calculator the visitor was using
    pub calculator_type: String,

    /// Visitor name
    pub name: String,

    /// Visitor email (shape-checked at capture time)
    pub email: String,

    pub phone: Option<String>,
    pub address: Option<String>,

    /// Calculator-specific structured payload (measurements, selections)
    pub project_details: serde_json::Value,

    /// Estimate the calculator produced, if any
    pub estimated_value: Option<f64>,

    /// Pipeline status, "new" at creation; later transitions happen in the
    /// CRM screens, not here
    pub status: String,

    /// Timestamp when the lead was captured
    pub created_at: DateTime<Utc>,
}

/// Request body for the lead capture endpoint.
///
/// # JSON Example
///
/// ```json
/// {
///   "widget_key": "wgt_k2j9x0q8v7m3n1p5r6t4w8y2",
///   "calculator_type": "roofing",
///   "name": "Jane Homeowner",
///   "email": "jane@example.com",
///   "phone": "555-0100",
///   "project_details": {"roof_area_sqft": 1800, "material": "asphalt"},
///   "estimated_value": 12400.0
/// }
/// ```
///
/// Note the absence of any contractor field: attribution comes from the
/// widget key alone.
#[derive(Debug, Deserialize)]
pub struct CaptureLeadRequest {
    pub widget_key: String,
    pub calculator_type: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub project_details: serde_json::Value,
    #[serde(default)]
    pub estimated_value: Option<f64>,
}

/// Response body for successful lead capture.
#[derive(Debug, Serialize)]
pub struct CaptureLeadResponse {
    pub success: bool,
    pub lead_id: Uuid,
}
