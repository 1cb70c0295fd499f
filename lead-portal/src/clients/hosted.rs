//! HTTP clients for the hosted backend.
//!
//! The auth endpoints follow the GoTrue REST API (`/auth/v1/...`) and the
//! table endpoints follow PostgREST (`/rest/v1/{table}`).

use super::account::{
    AccountService, AuthSession, Identity, ProfileHints, SessionEvent, SessionHub,
    SessionSubscription,
};
use super::error::ClientError;
use super::records::RecordsStore;
use crate::config::BackendConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Shared connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct HostedBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HostedBackend {
    /// Build the shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns error if the backend URL is empty or the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, ClientError> {
        if config.url.trim().is_empty() {
            return Err(ClientError::NotConfigured("backend url"));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{path}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(bearer.unwrap_or(self.api_key.as_str()))
    }
}

/// Pass 2xx responses through and turn everything else into a [`ClientError`].
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = rejection_message(&body).unwrap_or_else(|| status.to_string());

    if status.is_server_error() {
        Err(ClientError::Transport(message))
    } else {
        Err(ClientError::Rejected(message))
    }
}

fn rejection_message(body: &Value) -> Option<String> {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(ToString::to_string)
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: WireMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct WireMetadata {
    #[serde(default)]
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSession {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: WireUser,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignupResponse {
    Session(WireSession),
    User(WireUser),
    Wrapped {
        #[serde(default)]
        user: Option<WireUser>,
    },
}

impl From<WireUser> for Identity {
    fn from(user: WireUser) -> Self {
        Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
            full_name: user.user_metadata.full_name,
        }
    }
}

impl From<WireSession> for AuthSession {
    fn from(wire: WireSession) -> Self {
        let expires_at = wire
            .expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .or_else(|| {
                wire.expires_in
                    .map(|secs| Utc::now() + chrono::Duration::seconds(secs))
            });

        Self {
            access_token: wire.access_token,
            refresh_token: wire.refresh_token,
            expires_at,
            identity: wire.user.into(),
        }
    }
}

/// Account service backed by the hosted auth API.
///
/// Holds at most one session, like a browser tab would.
#[derive(Debug)]
pub struct HostedAccountClient {
    backend: HostedBackend,
    session: RwLock<Option<AuthSession>>,
    hub: SessionHub,
}

impl HostedAccountClient {
    /// Client without a session.
    #[must_use]
    pub fn new(backend: HostedBackend) -> Self {
        Self {
            backend,
            session: RwLock::new(None),
            hub: SessionHub::new(),
        }
    }

    /// Client resuming a session from a stored access token.
    #[must_use]
    pub fn with_token(backend: HostedBackend, access_token: &str) -> Self {
        let client = Self::new(backend);
        *client.session.write() = Some(AuthSession::from_token(access_token));
        client
    }

    fn store(&self, session: AuthSession) {
        *self.session.write() = Some(session.clone());
        self.hub.publish(SessionEvent::SignedIn(session));
    }

    fn clear(&self) {
        if self.session.write().take().is_some() {
            self.hub.publish(SessionEvent::SignedOut);
        }
    }
}

#[async_trait]
impl AccountService for HostedAccountClient {
    async fn create_session(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>, ClientError> {
        let response = self
            .backend
            .request(Method::POST, "auth/v1/token", None)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let wire: WireSession = check(response).await?.json().await?;
        let session = AuthSession::from(wire);
        let identity = session.identity.clone();
        tracing::info!(identity_id = %identity.id, "Session created");
        self.store(session);

        Ok(Some(identity))
    }

    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        hints: &ProfileHints,
        redirect_to: &str,
    ) -> Result<Option<Identity>, ClientError> {
        let response = self
            .backend
            .request(Method::POST, "auth/v1/signup", None)
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email, "password": password, "data": hints }))
            .send()
            .await?;

        let parsed: SignupResponse = check(response).await?.json().await?;
        let identity = match parsed {
            SignupResponse::Session(wire) => {
                let session = AuthSession::from(wire);
                let identity = session.identity.clone();
                self.store(session);
                Some(identity)
            }
            SignupResponse::User(user) => Some(user.into()),
            SignupResponse::Wrapped { user } => user.map(Identity::from),
        };

        if let Some(identity) = &identity {
            tracing::info!(identity_id = %identity.id, "Identity created");
        }
        Ok(identity)
    }

    async fn current_session(&self) -> Result<Option<AuthSession>, ClientError> {
        let Some(session) = self.session.read().clone() else {
            return Ok(None);
        };

        if session.is_expired() {
            tracing::debug!("Stored session expired");
            self.clear();
            return Ok(None);
        }

        let response = self
            .backend
            .request(Method::GET, "auth/v1/user", Some(&session.access_token))
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            tracing::debug!("Stored session rejected by the auth service");
            self.clear();
            return Ok(None);
        }

        let user: WireUser = check(response).await?.json().await?;
        let session = AuthSession {
            identity: user.into(),
            ..session
        };
        *self.session.write() = Some(session.clone());

        Ok(Some(session))
    }

    fn subscribe_session_changes(&self) -> SessionSubscription {
        self.hub.subscribe()
    }

    async fn end_session(&self) -> Result<(), ClientError> {
        let token = self.session.read().as_ref().map(|s| s.access_token.clone());

        if let Some(token) = token {
            let response = self
                .backend
                .request(Method::POST, "auth/v1/logout", Some(&token))
                .send()
                .await?;
            check(response).await?;
        }

        self.clear();
        Ok(())
    }
}

/// Records store backed by the hosted table API.
#[derive(Debug, Clone)]
pub struct HostedRecordsClient {
    backend: HostedBackend,
    access_token: Option<String>,
}

impl HostedRecordsClient {
    /// Client using the public API key only.
    #[must_use]
    pub const fn new(backend: HostedBackend) -> Self {
        Self {
            backend,
            access_token: None,
        }
    }

    /// Client acting on behalf of a signed-in identity.
    #[must_use]
    pub fn with_token(backend: HostedBackend, access_token: &str) -> Self {
        Self {
            backend,
            access_token: Some(access_token.to_string()),
        }
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.backend.request(
            method,
            &format!("rest/v1/{table}"),
            self.access_token.as_deref(),
        )
    }
}

#[async_trait]
impl RecordsStore for HostedRecordsClient {
    async fn insert(&self, table: &str, record: Value) -> Result<(), ClientError> {
        let response = self
            .table(Method::POST, table)
            .header("Prefer", "return=minimal")
            .json(&record)
            .send()
            .await?;
        check(response).await?;

        tracing::debug!(table, "Inserted record");
        Ok(())
    }

    async fn query(
        &self,
        table: &str,
        sort_field: &str,
        ascending: bool,
    ) -> Result<Vec<Value>, ClientError> {
        let direction = if ascending { "asc" } else { "desc" };
        let order = format!("{sort_field}.{direction}");
        let response = self
            .table(Method::GET, table)
            .query(&[("select", "*"), ("order", order.as_str())])
            .send()
            .await?;

        let rows: Vec<Value> = check(response).await?.json().await?;
        tracing::debug!(table, rows = rows.len(), "Queried records");
        Ok(rows)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), ClientError> {
        let filter = format!("eq.{id}");
        let response = self
            .table(Method::DELETE, table)
            .query(&[("id", filter.as_str())])
            .send()
            .await?;
        check(response).await?;

        tracing::info!(table, id, "Deleted record");
        Ok(())
    }
}
