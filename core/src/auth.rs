//! Client for the login service.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::{self, Settings};
use crate::error::{AuthError, ConfigError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};

/// Login methods the service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginProvider {
    Basic,
    Facebook,
}

impl LoginProvider {
    /// Providers this client will actually use.
    pub const SUPPORTED: &'static [LoginProvider] = &[LoginProvider::Basic];

    pub fn as_str(self) -> &'static str {
        match self {
            LoginProvider::Basic => "basic",
            LoginProvider::Facebook => "facebook",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            LoginProvider::Basic => "auth/login/basic",
            LoginProvider::Facebook => "auth/login/facebook",
        }
    }

    pub fn is_supported(self) -> bool {
        Self::SUPPORTED.contains(&self)
    }
}

impl fmt::Display for LoginProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoginProvider {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(LoginProvider::Basic),
            "facebook" => Ok(LoginProvider::Facebook),
            other => Err(AuthError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Synchronous client for the login service.
///
/// Exchanges credentials for the token every `ResourceClient` needs. Holds
/// only the auth base URL and a transport.
#[derive(Debug, Clone)]
pub struct AuthClient<T = UreqTransport> {
    base_url: String,
    transport: T,
}

impl AuthClient<UreqTransport> {
    pub fn new(settings: &Settings) -> Self {
        Self::with_transport(settings.auth_base_url(), UreqTransport::new(settings.timeout()))
    }

    /// Client built from the process-wide settings, see [`config::install`].
    pub fn from_installed() -> Result<Self, ConfigError> {
        let settings = config::installed()?;
        Ok(Self::new(&settings))
    }
}

impl<T: Transport> AuthClient<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Log in with `provider` and return the issued token.
    pub fn login<P>(&self, payload: &P, provider: &str) -> Result<String, AuthError>
    where
        P: Serialize + ?Sized,
    {
        let provider = provider.parse::<LoginProvider>().inspect_err(|e| error!("{e}"))?;
        let request = self.build_login(payload, provider)?;
        let response = self.transport.execute(&request).map_err(|e| {
            warn!(%provider, error = %e, "login request failed");
            AuthError::AuthenticationFailed {
                status: None,
                reason: e.to_string(),
                source: Some(e),
            }
        })?;
        self.parse_login(response)
    }

    pub fn login_basic<P>(&self, payload: &P) -> Result<String, AuthError>
    where
        P: Serialize + ?Sized,
    {
        self.login(payload, LoginProvider::Basic.as_str())
    }

    pub fn build_login<P>(&self, payload: &P, provider: LoginProvider) -> Result<HttpRequest, AuthError>
    where
        P: Serialize + ?Sized,
    {
        if !provider.is_supported() {
            let err = AuthError::UnsupportedProvider(provider.to_string());
            error!("{err}");
            return Err(err);
        }
        let body = serde_json::to_string(payload).map_err(|e| AuthError::AuthenticationFailed {
            status: None,
            reason: format!("invalid login payload: {e}"),
            source: None,
        })?;
        let url = format!("{}/{}", self.base_url, provider.path());
        debug!(%provider, url = %url, "login request built");

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url,
            query: Vec::new(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<String, AuthError> {
        if response.status >= 400 {
            warn!(status = response.status, "login rejected");
            return Err(AuthError::AuthenticationFailed {
                status: Some(response.status),
                reason: format!("HTTP {}", response.status),
                source: None,
            });
        }
        let token = serde_json::from_str::<Value>(&response.body)
            .ok()
            .and_then(|body| match body.get("token") {
                Some(Value::String(token)) if !token.is_empty() => Some(token.clone()),
                _ => None,
            });
        token.ok_or_else(|| {
            error!("token not found in response");
            AuthError::TokenMissing
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::error::ErrorCategory;
    use crate::http::testing::ScriptedTransport;
    use crate::types::BasicCredentials;

    const BASE_URL: &str = "https://auth.dashboard.test/";

    fn client(transport: &ScriptedTransport) -> AuthClient<&ScriptedTransport> {
        AuthClient::with_transport(BASE_URL, transport)
    }

    #[test]
    fn basic_login_returns_token() {
        let transport = ScriptedTransport::new().respond(200, r#"{"token":"xyz"}"#);
        let token = client(&transport)
            .login(&json!({"user": "a", "pass": "b"}), "basic")
            .unwrap();
        assert_eq!(token, "xyz");

        let sent = transport.requests().remove(0);
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.url, "https://auth.dashboard.test/auth/login/basic");
        let body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"user": "a", "pass": "b"}));
    }

    #[test]
    fn login_basic_accepts_typed_credentials() {
        let transport = ScriptedTransport::new().respond(200, r#"{"token":"t1","expires":3600}"#);
        let credentials = BasicCredentials {
            username: "chef".to_string(),
            password: "hunter2".to_string(),
        };
        assert_eq!(client(&transport).login_basic(&credentials).unwrap(), "t1");
    }

    #[test]
    #[traced_test]
    fn missing_token_is_a_contract_error() {
        let transport = ScriptedTransport::new().respond(200, "{}");
        let err = client(&transport).login(&json!({}), "basic").unwrap_err();
        assert!(matches!(err, AuthError::TokenMissing));
        assert_eq!(err.category(), ErrorCategory::Contract);
        assert!(logs_contain("token not found in response"));
    }

    #[test]
    fn empty_or_non_string_token_is_missing() {
        for body in [r#"{"token":""}"#, r#"{"token":42}"#, "not json", ""] {
            let transport = ScriptedTransport::new().respond(200, body);
            let err = client(&transport).login(&json!({}), "basic").unwrap_err();
            assert!(matches!(err, AuthError::TokenMissing), "{body}");
        }
    }

    #[test]
    #[traced_test]
    fn unknown_provider_fails_without_network() {
        let transport = ScriptedTransport::new();
        let err = client(&transport).login(&json!({}), "oauth2").unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedProvider(ref p) if p == "oauth2"));
        assert_eq!(err.category(), ErrorCategory::InvalidRequest);
        assert!(transport.requests().is_empty());
        assert!(logs_contain("oauth2 login is currently not supported"));
    }

    #[test]
    fn known_but_disabled_provider_is_unsupported() {
        let transport = ScriptedTransport::new();
        let err = client(&transport).login(&json!({}), "facebook").unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedProvider(ref p) if p == "facebook"));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn rejected_login_is_unauthorized() {
        let transport = ScriptedTransport::new().respond(401, r#"{"detail":"bad credentials"}"#);
        let err = client(&transport).login(&json!({}), "basic").unwrap_err();
        assert!(matches!(err, AuthError::AuthenticationFailed { status: Some(401), .. }));
        assert_eq!(err.category(), ErrorCategory::Unauthorized);
    }

    #[test]
    fn transport_failure_is_authentication_failure() {
        let transport = ScriptedTransport::new().fail("timed out");
        let err = client(&transport).login(&json!({}), "basic").unwrap_err();
        assert!(matches!(err, AuthError::AuthenticationFailed { status: None, ref reason, .. } if reason == "timed out"));
        assert_eq!(err.category(), ErrorCategory::Unauthorized);
        let source = std::error::Error::source(&err).expect("transport error kept as source");
        assert_eq!(source.to_string(), "timed out");
    }

    #[test]
    fn provider_paths() {
        assert_eq!(LoginProvider::Basic.path(), "auth/login/basic");
        assert_eq!(LoginProvider::Facebook.path(), "auth/login/facebook");
        assert!(LoginProvider::Basic.is_supported());
        assert!(!LoginProvider::Facebook.is_supported());
    }
}
