//! Middleware layers for the lead portal
//!
//! - Session cookie handling (access token in, cookie changes out)

pub mod session;

pub use session::{
    SameSite, SessionCookie, SessionLayer, SessionMiddleware, SessionSettings, SessionToken,
    SESSION_COOKIE_NAME,
};
