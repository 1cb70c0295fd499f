//! Configuration for the lead portal.

use crate::middleware::SameSite;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix for overrides (`LEAD_PORTAL_SERVER__PORT=8080`).
pub const ENV_PREFIX: &str = "LEAD_PORTAL_";

/// Portal configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortalConfig {
    /// HTTP listener configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Hosted backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Route paths used for navigation.
    #[serde(default)]
    pub routes: RouteConfig,
    /// Form instance configuration.
    #[serde(default)]
    pub forms: FormConfig,
    /// Session cookie configuration.
    #[serde(default)]
    pub session: SessionCookieConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Hosted backend (auth + records API) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the hosted project, e.g. `https://xyz.supabase.co`.
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// Public API key sent as the `apikey` header.
    #[serde(default)]
    pub api_key: String,
    /// Table receiving profile rows on signup.
    #[serde(default = "default_profiles_table")]
    pub profiles_table: String,
    /// Table holding contact-form submissions.
    #[serde(default = "default_submissions_table")]
    pub submissions_table: String,
    /// HTTP timeout for backend calls in seconds.
    #[serde(default = "default_backend_timeout")]
    pub timeout_seconds: u64,
}

/// Route paths used by navigation.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    /// Login page.
    #[serde(default = "default_login_route")]
    pub login: String,
    /// Signup page.
    #[serde(default = "default_signup_route")]
    pub signup: String,
    /// Landing route after a successful login.
    #[serde(default = "default_landing_route")]
    pub landing: String,
    /// Admin dashboard.
    #[serde(default = "default_admin_route")]
    pub admin: String,
    /// Public origin used to build email redirect targets.
    #[serde(default = "default_public_origin")]
    pub public_origin: String,
}

/// Form instance configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FormConfig {
    /// How long an untouched form instance stays in the registry.
    #[serde(default = "default_form_ttl")]
    pub ttl_seconds: u64,
    /// Delay before navigating to login after a successful signup.
    #[serde(default = "default_signup_redirect_delay")]
    pub signup_redirect_delay_ms: u64,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionCookieConfig {
    /// Cookie name.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Only send the cookie over HTTPS.
    #[serde(default = "default_secure")]
    pub secure: bool,
    /// Cookie lifetime in seconds.
    #[serde(default = "default_cookie_max_age")]
    pub max_age_seconds: u64,
    /// SameSite policy, `lax` or `strict`.
    #[serde(default)]
    pub same_site: SameSite,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_request_timeout() -> u64 {
    30
}

fn default_backend_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_profiles_table() -> String {
    "users".to_string()
}

fn default_submissions_table() -> String {
    "contact_submissions".to_string()
}

const fn default_backend_timeout() -> u64 {
    10
}

fn default_login_route() -> String {
    "/login".to_string()
}

fn default_signup_route() -> String {
    "/signup".to_string()
}

fn default_landing_route() -> String {
    "/".to_string()
}

fn default_admin_route() -> String {
    "/admin".to_string()
}

fn default_public_origin() -> String {
    "http://localhost:3000".to_string()
}

const fn default_form_ttl() -> u64 {
    1800 // 30 minutes
}

const fn default_signup_redirect_delay() -> u64 {
    2000
}

fn default_cookie_name() -> String {
    crate::middleware::SESSION_COOKIE_NAME.to_string()
}

const fn default_secure() -> bool {
    !cfg!(debug_assertions)
}

const fn default_cookie_max_age() -> u64 {
    3600 // matches the backend's default access token lifetime
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            api_key: String::new(),
            profiles_table: default_profiles_table(),
            submissions_table: default_submissions_table(),
            timeout_seconds: default_backend_timeout(),
        }
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            login: default_login_route(),
            signup: default_signup_route(),
            landing: default_landing_route(),
            admin: default_admin_route(),
            public_origin: default_public_origin(),
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_form_ttl(),
            signup_redirect_delay_ms: default_signup_redirect_delay(),
        }
    }
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secure: default_secure(),
            max_age_seconds: default_cookie_max_age(),
            same_site: SameSite::default(),
        }
    }
}

impl FormConfig {
    /// Registry TTL as a [`Duration`].
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Post-signup redirect delay as a [`Duration`].
    #[must_use]
    pub const fn signup_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.signup_redirect_delay_ms)
    }
}

impl RouteConfig {
    /// Absolute URL the confirmation email should send the user back to.
    #[must_use]
    pub fn email_redirect_target(&self) -> String {
        format!(
            "{}{}",
            self.public_origin.trim_end_matches('/'),
            self.login
        )
    }
}

impl PortalConfig {
    /// Load configuration from `config/default.toml`, `config/local.toml`
    /// and `LEAD_PORTAL_*` environment variables, in that order.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::extract(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Toml::file("config/local.toml"))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    /// Load configuration from a single TOML file plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::extract(
            Figment::new()
                .merge(Toml::file(path.as_ref()))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    fn extract(figment: Figment) -> Result<Self, Box<figment::Error>> {
        figment.extract().map_err(Box::new)
    }

    /// Address the HTTP listener binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
