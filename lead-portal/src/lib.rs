//! Lead portal
//!
//! Login and signup pages plus an administrative dashboard for contact-form
//! submissions. Accounts, sessions and tables live in a hosted backend; this
//! crate owns form state, field validation, submission orchestration and the
//! HTMX front end that drives them.
//!
//! # Layout
//!
//! - [`forms`] - field validation, per-instance form state and the login/signup
//!   submission controllers
//! - [`admin`] - the submission list controller and CSV export
//! - [`clients`] - account and records service traits with hosted HTTP clients
//! - [`navigation`] - navigation collaborator and deferred navigation
//! - [`handlers`], [`template`], [`middleware`], [`extractors`] - the axum surface
//! - [`config`] - figment-backed configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use lead_portal::{config::PortalConfig, handlers, state::PortalState};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = PortalConfig::default();
//! let state = PortalState::hosted(config)?;
//! let app = handlers::router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod admin;
pub mod clients;
pub mod config;
pub mod extractors;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod navigation;
pub mod state;
pub mod template;

pub use config::PortalConfig;
pub use state::PortalState;
