//! Deployment environment → backend URL configuration.
//!
//! # Design
//! `Settings` is an immutable value passed to client constructors. A process
//! may additionally [`install`] one `Settings` value at startup; clients built
//! with `from_installed` then all share that configuration. Installation
//! happens at most once and the value is read-only afterwards.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

/// Request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub const ENV_VAR: &str = "DASHBOARD_ENV";
pub const API_URL_VAR: &str = "DASHBOARD_API_URL";
pub const AUTH_URL_VAR: &str = "DASHBOARD_AUTH_URL";
pub const TIMEOUT_VAR: &str = "DASHBOARD_HTTP_TIMEOUT_SECS";

static INSTALLED: OnceLock<Arc<Settings>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Staging,
    Development,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Staging => "staging",
            Environment::Development => "development",
        }
    }

    /// Built-in backend URLs for this environment.
    pub fn service_urls(self) -> ServiceUrls {
        let (api, auth) = match self {
            Environment::Production => (
                "https://api.dashboard.example.com",
                "https://auth.dashboard.example.com",
            ),
            Environment::Staging => (
                "https://api.staging.dashboard.example.com",
                "https://auth.staging.dashboard.example.com",
            ),
            Environment::Development => ("http://127.0.0.1:3000", "http://127.0.0.1:3000"),
        };
        ServiceUrls {
            api: api.to_string(),
            auth: auth.to_string(),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" | "dev" => Ok(Environment::Development),
            _ => Err(ConfigError::UnknownEnvironment(s.to_string())),
        }
    }
}

/// Base URLs of the resource backend (`api`) and the login service (`auth`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUrls {
    pub api: String,
    pub auth: String,
}

/// Backend URLs and request timeout for one deployment environment.
///
/// Immutable once built; passed by reference to `ResourceClient::new` and
/// `AuthClient::new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    environment: Environment,
    urls: ServiceUrls,
    timeout: Duration,
}

impl Settings {
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            urls: environment.service_urls(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_urls(mut self, urls: ServiceUrls) -> Self {
        self.urls = urls;
        self
    }

    /// Replace the request timeout. A zero timeout is rejected.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(format!("{timeout:?}")));
        }
        self.timeout = timeout;
        Ok(self)
    }

    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from any key → value source. Missing keys fall back to
    /// production and its built-in URLs.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup(ENV_VAR) {
            Some(name) => name.parse()?,
            None => Environment::Production,
        };
        let mut settings = Self::for_environment(environment);
        if let Some(api) = lookup(API_URL_VAR) {
            settings.urls.api = api;
        }
        if let Some(auth) = lookup(AUTH_URL_VAR) {
            settings.urls.auth = auth;
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            settings = settings
                .with_timeout(Duration::from_secs(secs))
                .map_err(|_| ConfigError::InvalidTimeout(raw))?;
        }
        Ok(settings)
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn api_base_url(&self) -> &str {
        &self.urls.api
    }

    pub fn auth_base_url(&self) -> &str {
        &self.urls.auth
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Install the process-wide settings. Succeeds once per process.
pub fn install(settings: Settings) -> Result<Arc<Settings>, ConfigError> {
    let settings = Arc::new(settings);
    INSTALLED
        .set(Arc::clone(&settings))
        .map_err(|_| ConfigError::AlreadyInstalled)?;
    info!(environment = %settings.environment, "dashboard settings installed");
    Ok(settings)
}

/// The settings passed to [`install`].
pub fn installed() -> Result<Arc<Settings>, ConfigError> {
    INSTALLED.get().cloned().ok_or(ConfigError::NotInstalled)
}
