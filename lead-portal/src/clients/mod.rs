//! Service clients for the hosted backend.
//!
//! Controllers never talk to the network directly: they receive an
//! [`AccountService`] and a [`RecordsStore`] at construction, so tests can
//! substitute fakes.
//!
//! ## Available Clients
//!
//! - [`HostedAccountClient`] - sign in, sign up, session checks and sign out
//! - [`HostedRecordsClient`] - insert, query and delete rows of a table
//!
//! # Usage
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), lead_portal::clients::ClientError> {
//! use lead_portal::clients::{AccountService, HostedAccountClient, HostedBackend};
//! use lead_portal::config::BackendConfig;
//!
//! let backend = HostedBackend::new(&BackendConfig::default())?;
//! let account = HostedAccountClient::new(backend);
//! let identity = account.create_session("ann@example.com", "Secret123").await?;
//! # Ok(())
//! # }
//! ```

mod account;
mod error;
mod hosted;
mod records;

pub use account::{
    AccountService, AuthSession, Identity, ProfileHints, SessionEvent, SessionHub,
    SessionSubscription,
};
pub use error::ClientError;
pub use hosted::{HostedAccountClient, HostedBackend, HostedRecordsClient};
pub use records::{decode_rows, RecordsStore};

#[cfg(test)]
pub use account::MockAccountService;
#[cfg(test)]
pub use records::MockRecordsStore;
