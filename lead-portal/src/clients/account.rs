//! Account service: identities, sessions and session-change notifications.

use super::error::ClientError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

/// Capacity of the session-change broadcast channel.
const SESSION_EVENT_CAPACITY: usize = 16;

/// An authenticated account issued by the account service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Identity id assigned by the service.
    pub id: String,
    /// Email the identity was registered with.
    pub email: String,
    /// Display name from the identity's metadata, if any.
    pub full_name: Option<String>,
}

/// An active session for an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Bearer token for authenticated calls.
    pub access_token: String,
    /// Token used to obtain a new access token.
    pub refresh_token: Option<String>,
    /// When the access token stops being accepted.
    pub expires_at: Option<DateTime<Utc>>,
    /// The identity the session belongs to.
    pub identity: Identity,
}

impl AuthSession {
    /// Session restored from a bare access token (the identity is filled in
    /// once the service validates the token).
    #[must_use]
    pub fn from_token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            identity: Identity {
                id: String::new(),
                email: String::new(),
                full_name: None,
            },
        }
    }

    /// Whether the access token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }
}

/// Extra profile data attached to a new identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileHints {
    /// Full name entered on the signup form.
    pub full_name: String,
}

/// Session lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was created.
    SignedIn(AuthSession),
    /// The session's token was replaced.
    TokenRefreshed(AuthSession),
    /// The session ended or was found invalid.
    SignedOut,
}

impl SessionEvent {
    /// Session carried by the event, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) => Some(session),
            Self::SignedOut => None,
        }
    }
}

/// Fan-out point for session-change notifications.
#[derive(Debug, Clone)]
pub struct SessionHub {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionHub {
    /// Create a hub with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self { sender }
    }

    /// Deliver an event to every live subscription.
    pub fn publish(&self, event: SessionEvent) {
        // No subscribers is not an error
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(delivered, "Published session event");
    }

    /// Open a new subscription.
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of subscriptions that have not been released.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for one session-change subscription.
///
/// The subscription stays registered until [`release`](Self::release) is
/// called or the handle is dropped.
#[derive(Debug)]
pub struct SessionSubscription {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl SessionSubscription {
    /// Wait for the next event. Returns `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Session subscription lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take an already delivered event without waiting.
    pub fn try_next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Session subscription lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Unregister the subscription.
    pub fn release(self) {
        tracing::trace!("Session subscription released");
    }
}

/// Account service collaborator.
///
/// `Err(ClientError::Rejected(_))` is a service-reported failure; every other
/// error is unexpected (transport, decoding).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns error if the service refuses the credentials or cannot be reached.
    async fn create_session(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>, ClientError>;

    /// Register a new identity. `redirect_to` is where the confirmation email
    /// sends the user.
    ///
    /// # Errors
    ///
    /// Returns error if the service refuses the registration or cannot be reached.
    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        hints: &ProfileHints,
        redirect_to: &str,
    ) -> Result<Option<Identity>, ClientError>;

    /// The currently active session, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the session cannot be checked.
    async fn current_session(&self) -> Result<Option<AuthSession>, ClientError>;

    /// Subscribe to session lifecycle events.
    fn subscribe_session_changes(&self) -> SessionSubscription;

    /// End the current session.
    ///
    /// # Errors
    ///
    /// Returns error if the service refuses or cannot be reached.
    async fn end_session(&self) -> Result<(), ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(token: &str) -> AuthSession {
        AuthSession {
            access_token: token.to_string(),
            refresh_token: None,
            expires_at: None,
            identity: Identity {
                id: "user-1".to_string(),
                email: "admin@example.com".to_string(),
                full_name: None,
            },
        }
    }

    #[tokio::test]
    async fn test_hub_delivers_to_subscribers() {
        let hub = SessionHub::new();
        let mut subscription = hub.subscribe();

        hub.publish(SessionEvent::SignedIn(session("t1")));
        hub.publish(SessionEvent::SignedOut);

        let first = subscription.next().await.unwrap();
        assert_eq!(first.session().unwrap().access_token, "t1");
        assert_eq!(subscription.next().await, Some(SessionEvent::SignedOut));
    }

    #[test]
    fn test_try_next_drains_without_waiting() {
        let hub = SessionHub::new();
        let mut subscription = hub.subscribe();
        assert_eq!(subscription.try_next(), None);

        hub.publish(SessionEvent::SignedIn(session("t2")));
        let event = subscription.try_next().unwrap();
        assert_eq!(event.session().unwrap().access_token, "t2");
        assert_eq!(subscription.try_next(), None);
    }

    #[test]
    fn test_release_unregisters_subscription() {
        let hub = SessionHub::new();
        let first = hub.subscribe();
        let second = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        first.release();
        assert_eq!(hub.subscriber_count(), 1);

        drop(second);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_publish_without_subscribers_is_ignored() {
        let hub = SessionHub::new();
        hub.publish(SessionEvent::SignedOut);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscription_ends_when_hub_dropped() {
        let hub = SessionHub::new();
        let mut subscription = hub.subscribe();
        drop(hub);
        assert_eq!(subscription.next().await, None);
    }

    #[test]
    fn test_session_expiry() {
        let mut s = session("t");
        assert!(!s.is_expired());
        s.expires_at = Some(Utc::now() - chrono::Duration::seconds(1));
        assert!(s.is_expired());
    }
}
