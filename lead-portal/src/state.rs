//! Shared application state for the HTTP layer.

use crate::admin::{AdminListController, AdminSettings};
use crate::clients::{
    AccountService, ClientError, HostedAccountClient, HostedBackend, HostedRecordsClient,
    RecordsStore,
};
use crate::config::PortalConfig;
use crate::forms::{FormRegistry, LoginForm, SignupForm, SignupSettings};
use crate::navigation::Navigator;
use std::sync::Arc;

/// Builds service clients for one request.
///
/// The account client keeps the session it works with, so each form
/// instance and each admin request gets its own.
pub trait BackendConnector: Send + Sync {
    /// Account service, resuming the session of `access_token` if given.
    fn account(&self, access_token: Option<&str>) -> Arc<dyn AccountService>;

    /// Records store acting for `access_token`, or with the public key.
    fn records(&self, access_token: Option<&str>) -> Arc<dyn RecordsStore>;
}

/// Connector for the hosted backend.
#[derive(Debug, Clone)]
pub struct HostedConnector {
    backend: HostedBackend,
}

impl HostedConnector {
    /// Connector sharing one HTTP client.
    #[must_use]
    pub const fn new(backend: HostedBackend) -> Self {
        Self { backend }
    }
}

impl BackendConnector for HostedConnector {
    fn account(&self, access_token: Option<&str>) -> Arc<dyn AccountService> {
        let backend = self.backend.clone();
        match access_token {
            Some(token) => Arc::new(HostedAccountClient::with_token(backend, token)),
            None => Arc::new(HostedAccountClient::new(backend)),
        }
    }

    fn records(&self, access_token: Option<&str>) -> Arc<dyn RecordsStore> {
        let backend = self.backend.clone();
        match access_token {
            Some(token) => Arc::new(HostedRecordsClient::with_token(backend, token)),
            None => Arc::new(HostedRecordsClient::new(backend)),
        }
    }
}

/// State shared by every handler.
#[derive(Clone)]
pub struct PortalState {
    /// Loaded configuration.
    pub config: Arc<PortalConfig>,
    connector: Arc<dyn BackendConnector>,
    /// Live login form instances.
    pub login_forms: Arc<FormRegistry<LoginForm>>,
    /// Live signup form instances.
    pub signup_forms: Arc<FormRegistry<SignupForm>>,
}

impl std::fmt::Debug for PortalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalState")
            .field("config", &self.config)
            .field("login_forms", &self.login_forms)
            .field("signup_forms", &self.signup_forms)
            .finish_non_exhaustive()
    }
}

impl PortalState {
    /// State with a custom connector.
    #[must_use]
    pub fn new(config: PortalConfig, connector: Arc<dyn BackendConnector>) -> Self {
        let ttl = config.forms.ttl();
        Self {
            config: Arc::new(config),
            connector,
            login_forms: Arc::new(FormRegistry::new(ttl)),
            signup_forms: Arc::new(FormRegistry::new(ttl)),
        }
    }

    /// State talking to the hosted backend named in `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is not configured or its HTTP client
    /// cannot be built.
    pub fn hosted(config: PortalConfig) -> Result<Self, ClientError> {
        let backend = HostedBackend::new(&config.backend)?;
        Ok(Self::new(config, Arc::new(HostedConnector::new(backend))))
    }

    /// Build a login form reporting to `navigator`.
    #[must_use]
    pub fn login_form(&self, navigator: Arc<dyn Navigator>) -> LoginForm {
        LoginForm::new(
            self.connector.account(None),
            navigator,
            self.config.routes.landing.clone(),
        )
    }

    /// Build a signup form reporting to `navigator`.
    #[must_use]
    pub fn signup_form(&self, navigator: Arc<dyn Navigator>) -> SignupForm {
        SignupForm::new(
            self.connector.account(None),
            self.connector.records(None),
            navigator,
            self.signup_settings(),
        )
    }

    /// Build an admin controller acting for `access_token`.
    #[must_use]
    pub fn admin_controller(
        &self,
        access_token: &str,
        navigator: Arc<dyn Navigator>,
    ) -> AdminListController {
        AdminListController::new(
            self.connector.account(Some(access_token)),
            self.connector.records(Some(access_token)),
            navigator,
            AdminSettings {
                submissions_table: self.config.backend.submissions_table.clone(),
                login_route: self.config.routes.login.clone(),
            },
        )
    }

    fn signup_settings(&self) -> SignupSettings {
        SignupSettings {
            profiles_table: self.config.backend.profiles_table.clone(),
            login_route: self.config.routes.login.clone(),
            email_redirect_target: self.config.routes.email_redirect_target(),
            redirect_delay: self.config.forms.signup_redirect_delay(),
        }
    }
}
