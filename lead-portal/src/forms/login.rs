//! Login form controller.

use super::field::FieldValue;
use super::state::{FormState, SubmissionStatus, UNEXPECTED_ERROR};
use super::validate::LoginField;
use crate::clients::{AccountService, ClientError};
use crate::navigation::Navigator;
use std::sync::Arc;

/// Result of a [`LoginForm::submit`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Invalid,
    /// The attempt ran and left a terminal status.
    Attempted,
}

/// One login form instance.
pub struct LoginForm {
    state: FormState<LoginField>,
    account: Arc<dyn AccountService>,
    navigator: Arc<dyn Navigator>,
    landing_route: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("state", &self.state)
            .field("landing_route", &self.landing_route)
            .finish_non_exhaustive()
    }
}

impl LoginForm {
    /// Create a form that signs in through `account` and sends the user to
    /// `landing_route` afterwards.
    #[must_use]
    pub fn new(
        account: Arc<dyn AccountService>,
        navigator: Arc<dyn Navigator>,
        landing_route: impl Into<String>,
    ) -> Self {
        Self {
            state: FormState::new(),
            account,
            navigator,
            landing_route: landing_route.into(),
        }
    }

    /// Form state.
    #[must_use]
    pub const fn state(&self) -> &FormState<LoginField> {
        &self.state
    }

    /// Account service the form signs in with.
    #[must_use]
    pub fn account(&self) -> &Arc<dyn AccountService> {
        &self.account
    }

    /// Forward a change event.
    pub fn on_change(&mut self, field: LoginField, value: impl Into<FieldValue>) {
        self.state.on_change(field, value.into());
    }

    /// Forward a blur event.
    pub fn on_blur(&mut self, field: LoginField, value: impl Into<FieldValue>) {
        self.state.on_blur(field, value.into());
    }

    /// Validate and, if everything is valid, sign in.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if !self.state.validate_all().is_empty() {
            tracing::debug!("Login blocked by validation");
            return SubmitOutcome::Invalid;
        }

        let email = self.state.values().text(LoginField::Email).to_string();
        let password = self.state.values().text(LoginField::Password).to_string();

        let guard = self.state.begin_submission();
        let status = match self.account.create_session(&email, &password).await {
            Ok(Some(identity)) => {
                tracing::info!(identity_id = %identity.id, "Login succeeded");
                self.navigator.navigate_to(&self.landing_route);
                SubmissionStatus::Succeeded
            }
            Ok(None) => {
                tracing::debug!("Login succeeded without an identity");
                SubmissionStatus::Succeeded
            }
            Err(ClientError::Rejected(message)) => {
                tracing::info!(reason = %message, "Login rejected");
                SubmissionStatus::Failed(message)
            }
            Err(err) => {
                tracing::error!(error = %err, "Login error");
                SubmissionStatus::Failed(UNEXPECTED_ERROR.to_string())
            }
        };
        guard.complete(status);

        SubmitOutcome::Attempted
    }
}
