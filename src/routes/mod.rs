//! Router Module Index
//!
//! Splits the routing table by access level. Access control is applied per
//! module with axum layers, so a protected endpoint cannot be mounted without
//! its guard.

/// Routes open to everyone. Handlers read the optional `CurrentUser` context
/// and decide themselves when a login is needed (e.g. commenting).
pub mod public;

/// Post management routes, wrapped in the `admin_guard` middleware.
pub mod admin;
