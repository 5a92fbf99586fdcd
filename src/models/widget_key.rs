//! Widget key data models and API request/response types.
//!
//! This module defines:
//! - `WidgetKey`: Database entity representing an embeddable widget key
//! - `CalculatorType`: The closed set of calculator trades a key can unlock
//! - Request/response types for the key issuance and management endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of calculator trades a widget key may be bound to.
///
/// `All` is the wildcard: a key bound to `All` validates for any requested
/// calculator type. Every other variant authorizes exactly one trade.
///
/// Serialized as lowercase strings ("roofing", "all", ...) on the wire and
/// in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculatorType {
    Roofing,
    Concrete,
    Fencing,
    Decking,
    Painting,
    Flooring,
    Hvac,
    Solar,
    All,
}

impl CalculatorType {
    /// Stable lowercase name used on the wire and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculatorType::Roofing => "roofing",
            CalculatorType::Concrete => "concrete",
            CalculatorType::Fencing => "fencing",
            CalculatorType::Decking => "decking",
            CalculatorType::Painting => "painting",
            CalculatorType::Flooring => "flooring",
            CalculatorType::Hvac => "hvac",
            CalculatorType::Solar => "solar",
            CalculatorType::All => "all",
        }
    }

    /// Parse a calculator type from its wire name.
    ///
    /// Returns `None` for anything outside the fixed enumeration, which the
    /// endpoints turn into a 400 before touching the key store.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "roofing" => Some(CalculatorType::Roofing),
            "concrete" => Some(CalculatorType::Concrete),
            "fencing" => Some(CalculatorType::Fencing),
            "decking" => Some(CalculatorType::Decking),
            "painting" => Some(CalculatorType::Painting),
            "flooring" => Some(CalculatorType::Flooring),
            "hvac" => Some(CalculatorType::Hvac),
            "solar" => Some(CalculatorType::Solar),
            "all" => Some(CalculatorType::All),
            _ => None,
        }
    }
}

/// Represents a widget key record from the database.
///
/// # Database Table
///
/// Maps to the `widget_keys` table. Each key:
/// - Belongs to one contractor (via `contractor_id`)
/// - Authorizes one calculator type, or all of them
/// - May optionally be locked to a hostname substring
///
/// # Usage Counters
///
/// `usage_count` and `last_used_at` are advisory: they are updated
/// best-effort after each successful validation and may lose updates under
/// concurrency. The `usage_log` table is the authoritative input for rate
/// limiting.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WidgetKey {
    /// Unique identifier for this widget key
    pub id: Uuid,

    /// Public bearer token embedded in third-party HTML.
    ///
    /// Format: `wgt_` followed by 24 random lowercase-alphanumeric
    /// characters. Globally unique, generated once, never reused.
    pub key: String,

    /// Foreign key to the contractor that owns this key
    ///
    /// This ensures keys are isolated per contractor. Leads captured through
    /// this key are always attributed to this contractor, never to an
    /// identifier supplied by the caller.
    pub contractor_id: Uuid,

    /// Calculator trade this key authorizes ("all" for the wildcard)
    pub calculator_type: String,

    /// Optional domain lock.
    ///
    /// When set, validation requires the caller's hostname to contain this
    /// value as a substring. When NULL the key works on any domain.
    pub domain: Option<String>,

    /// Whether this key is currently active
    ///
    /// Contractors deactivate keys instead of deleting them, so history in
    /// `usage_log` and `leads` stays intact.
    pub is_active: bool,

    /// Validation attempts allowed per rolling 60-second window
    pub rate_limit_per_minute: i32,

    /// Advisory count of successful validations
    pub usage_count: i64,

    /// Timestamp of the most recent successful validation
    pub last_used_at: Option<DateTime<Utc>>,

    /// Timestamp when this key was created
    pub created_at: DateTime<Utc>,
}

/// Request body for issuing a new widget key.
///
/// # JSON Example
///
/// ```json
/// {
///   "calculator_type": "roofing",
///   "domain": "example.com"
/// }
/// ```
///
/// # Validation
///
/// - `calculator_type`: Required, must be in the fixed enumeration
///   (including "all"); anything else is a 400
/// - `domain`: Optional hostname substring to lock the key to
#[derive(Debug, Deserialize)]
pub struct IssueKeyRequest {
    /// Requested calculator type, validated against [`CalculatorType`]
    pub calculator_type: String,

    /// Optional domain lock
    #[serde(default)]
    pub domain: Option<String>,
}

/// Response body for successful key issuance.
///
/// # JSON Example
///
/// ```json
/// {
///   "success": true,
///   "widget_key": "wgt_k2j9x0q8v7m3n1p5r6t4w8y2",
///   "embed_code": "<script src=\"https://app.example.com/embed.js\" ...></script>"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct IssueKeyResponse {
    pub success: bool,

    /// The newly issued public token
    pub widget_key: String,

    /// Ready-to-paste script tag carrying the key and calculator type
    pub embed_code: String,
}

/// Response body for key listing and deactivation endpoints.
///
/// Strips `contractor_id` (implied by the authenticated caller) and the
/// internal row plumbing; keeps the usage stats contractors care about.
#[derive(Debug, Serialize)]
pub struct WidgetKeyResponse {
    pub id: Uuid,
    pub key: String,
    pub calculator_type: String,
    pub domain: Option<String>,
    pub is_active: bool,
    pub rate_limit_per_minute: i32,
    pub usage_count: i64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<WidgetKey> for WidgetKeyResponse {
    fn from(k: WidgetKey) -> Self {
        Self {
            id: k.id,
            key: k.key,
            calculator_type: k.calculator_type,
            domain: k.domain,
            is_active: k.is_active,
            rate_limit_per_minute: k.rate_limit_per_minute,
            usage_count: k.usage_count,
            last_used_at: k.last_used_at,
            created_at: k.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_variant() {
        for t in [
            CalculatorType::Roofing,
            CalculatorType::Concrete,
            CalculatorType::Fencing,
            CalculatorType::Decking,
            CalculatorType::Painting,
            CalculatorType::Flooring,
            CalculatorType::Hvac,
            CalculatorType::Solar,
            CalculatorType::All,
        ] {
            assert_eq!(CalculatorType::parse(t.as_str()), Some(t));
        }
    }

    #[test]
    fn parse_rejects_unknown_trades() {
        assert_eq!(CalculatorType::parse("plumbing"), None);
        assert_eq!(CalculatorType::parse("ALL"), None);
        assert_eq!(CalculatorType::parse(""), None);
    }

    #[test]
    fn serde_names_match_wire_strings() {
        let json = serde_json::to_string(&CalculatorType::Roofing).unwrap();
        assert_eq!(json, "\"roofing\"");
        let parsed: CalculatorType = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(parsed, CalculatorType::All);
    }
}
