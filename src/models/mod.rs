//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables.

/// Authenticated contractor principal
pub mod contractor;
/// Lead captured from an embedded widget
pub mod lead;
/// Subscription status read model
pub mod subscription;
/// Append-only validation attempt log
pub mod usage_log;
/// Widget key entity and calculator types
pub mod widget_key;
