//! Contractor model for authentication and widget ownership.
//!
//! Contractors are the principals of this system: they own widget keys,
//! receive leads, and hold the subscription that gates their widgets.
//! Their API keys are stored in the database as SHA-256 hashes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Represents a contractor record from the database.
///
/// # Database Table
///
/// Maps to the `contractors` table with columns:
/// - `id`: Unique identifier (UUID)
/// - `key_hash`: SHA-256 hash of the contractor's API key
/// - `business_name`: Name of the contracting business
/// - `email`: Primary contact email
/// - `is_active`: Whether the account is currently enabled
/// - `created_at`: When the account was created
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Contractor {
    /// Unique identifier for this contractor
    pub id: Uuid,

    /// SHA-256 hash of the contractor's API key (64 hex characters)
    ///
    /// When a request comes in with "Bearer abc123", we:
    /// 1. Hash "abc123" with SHA-256
    /// 2. Look up this hash in the database
    /// 3. If found and active, authenticate the request
    pub key_hash: String,

    /// Human-readable name of the contracting business
    pub business_name: String,

    /// Primary contact email for the business
    pub email: String,

    /// Whether this contractor account is currently active
    ///
    /// Inactive contractors are rejected during authentication. This provides a way to revoke access without deleting the record.
    pub is_active: bool,

    /// Timestamp when this contractor was created
    pub created_at: DateTime<Utc>,
}

/// Public contractor profile returned by a successful widget validation.
///
/// This is the subset of contractor data the embed loader is allowed to
/// see. The key hash and active flag never leave the server.
#[derive(Debug, Clone, Serialize)]
pub struct ContractorProfile {
    pub id: Uuid,
    pub business_name: String,
    pub email: String,
}

impl From<Contractor> for ContractorProfile {
    fn from(c: Contractor) -> Self {
        Self {
            id: c.id,
            business_name: c.business_name,
            email: c.email,
        }
    }
}
