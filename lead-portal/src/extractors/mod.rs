//! Axum extractors for the lead portal
//!
//! - [`RequireSession`] - session token or a redirect to login
//! - [`OptionalSession`] - session token if present

pub mod session;

pub use session::{LoginRedirect, OptionalSession, RequireSession};
