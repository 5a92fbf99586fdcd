//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Delegates to a service (validation, issuance, capture)
//! 3. Returns HTTP response (JSON, status code)

/// Embed loader script asset
pub mod embed;
/// Health check endpoint
pub mod health;
/// Widget key issuance and management endpoints
pub mod keys;
/// Lead capture endpoint
pub mod leads;
/// Widget validation endpoint
pub mod validate;
