//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle database access, validation, and the admission-control
//! decision procedure.

pub mod key_issuer;
pub mod lead_capture;
pub mod subscription;
pub mod usage;
pub mod validator;
