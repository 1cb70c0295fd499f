//! Session cookie middleware
//!
//! Reads the access token from the session cookie into request extensions,
//! and writes the cookie back when a handler asks for it through a
//! [`SessionCookie`] response extension.

use crate::config::SessionCookieConfig;
use axum::{
    body::Body,
    extract::Request,
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderValue,
    },
    response::Response,
};
use serde::Deserialize;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Session cookie name
pub const SESSION_COOKIE_NAME: &str = "lead_portal_session";

/// Access token found in the session cookie of the current request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionToken(pub String);

impl SessionToken {
    /// The raw access token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Cookie change requested by a handler, carried as a response extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionCookie {
    /// Store this access token.
    Set(String),
    /// Remove the cookie.
    Clear,
}

/// SameSite cookie policy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// Strict same-site policy
    Strict,
    /// Lax same-site policy
    #[default]
    Lax,
}

impl SameSite {
    /// Convert to cookie attribute string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
        }
    }
}

/// Cookie attributes used by the middleware
#[derive(Clone, Debug)]
pub struct SessionSettings {
    /// Cookie name
    pub cookie_name: String,
    /// Cookie path
    pub cookie_path: String,
    /// Secure cookie (HTTPS only)
    pub secure: bool,
    /// SameSite policy
    pub same_site: SameSite,
    /// Cookie lifetime in seconds
    pub max_age_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&SessionCookieConfig::default())
    }
}

impl From<&SessionCookieConfig> for SessionSettings {
    fn from(config: &SessionCookieConfig) -> Self {
        Self {
            cookie_name: config.cookie_name.clone(),
            cookie_path: "/".to_string(),
            secure: config.secure,
            same_site: config.same_site,
            max_age_secs: config.max_age_seconds,
        }
    }
}

/// Layer for session middleware
#[derive(Clone, Debug, Default)]
pub struct SessionLayer {
    settings: SessionSettings,
}

impl SessionLayer {
    /// Create session layer with custom settings
    #[must_use]
    pub const fn with_settings(settings: SessionSettings) -> Self {
        Self { settings }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionMiddleware {
            inner,
            settings: self.settings.clone(),
        }
    }
}

/// Session middleware that maps the cookie to a [`SessionToken`] and back
#[derive(Clone, Debug)]
pub struct SessionMiddleware<S> {
    inner: S,
    settings: SessionSettings,
}

impl<S> Service<Request> for SessionMiddleware<S>
where
    S: Service<Request, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let settings = self.settings.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if let Some(token) = extract_session_token(&req, &settings.cookie_name) {
                req.extensions_mut().insert(SessionToken(token));
            }

            let mut response = inner.call(req).await?;

            if let Some(change) = response.extensions_mut().remove::<SessionCookie>() {
                set_session_cookie(&mut response, &change, &settings);
            }

            Ok(response)
        })
    }
}

/// Extract the access token from request cookies
fn extract_session_token(req: &Request, cookie_name: &str) -> Option<String> {
    let cookie_header = req.headers().get(COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    cookie_str.split(';').find_map(|cookie| {
        let (name, value) = cookie.trim().split_once('=')?;
        let value = value.trim();
        (name.trim() == cookie_name && !value.is_empty()).then(|| value.to_string())
    })
}

/// Write the requested cookie change to the response
fn set_session_cookie(response: &mut Response<Body>, change: &SessionCookie, settings: &SessionSettings) {
    let (value, max_age) = match change {
        SessionCookie::Set(token) => (token.as_str(), settings.max_age_secs),
        SessionCookie::Clear => ("", 0),
    };

    let mut cookie_value = format!(
        "{}={}; Path={}; Max-Age={}; SameSite={}; HttpOnly",
        settings.cookie_name,
        value,
        settings.cookie_path,
        max_age,
        settings.same_site.as_str()
    );

    if settings.secure {
        cookie_value.push_str("; Secure");
    }

    match cookie_value.parse::<HeaderValue>() {
        Ok(header_value) => {
            response.headers_mut().append(SET_COOKIE, header_value);
        }
        Err(err) => tracing::warn!(error = %err, "Session cookie not representable as a header"),
    }
}
