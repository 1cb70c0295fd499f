//! Session extractors
//!
//! Read the [`SessionToken`] placed in request extensions by
//! [`SessionLayer`](crate::middleware::SessionLayer).

use crate::handlers::redirect_response;
use crate::middleware::SessionToken;
use crate::state::PortalState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRequest;
use std::convert::Infallible;

/// Extractor for routes that need a signed-in user
///
/// Without a session cookie the request is sent to the login route:
/// - For HTMX requests: `HX-Redirect` header
/// - For regular requests: 303 redirect
///
/// The token is not validated here; the admin controller checks it with
/// the account service on mount.
#[derive(Debug, Clone)]
pub struct RequireSession(pub SessionToken);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
    PortalState: FromRef<S>,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(token) = parts.extensions.get::<SessionToken>().cloned() {
            return Ok(Self(token));
        }

        let is_htmx = HxRequest::from_request_parts(parts, state)
            .await
            .is_ok_and(|HxRequest(is_htmx)| is_htmx);
        let state = PortalState::from_ref(state);
        tracing::debug!(path = %parts.uri.path(), "No session cookie, redirecting to login");

        Err(LoginRedirect {
            login_route: state.config.routes.login.clone(),
            is_htmx,
        })
    }
}

/// Optional session extractor
///
/// Returns `None` without a session cookie rather than failing.
#[derive(Debug, Clone)]
pub struct OptionalSession(pub Option<SessionToken>);

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<SessionToken>().cloned()))
    }
}

/// Rejection sending the user to the login route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    /// Login route
    pub login_route: String,
    /// Whether the request came from htmx
    pub is_htmx: bool,
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        redirect_response(&self.login_route, self.is_htmx)
    }
}
