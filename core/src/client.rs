//! Generic client for the resource backend.
//!
//! # Design
//! `ResourceClient` holds a token, a base URL, an endpoint registry and a
//! transport. [`ResourceClient::invoke`] is the single entry point: it
//! resolves the operation name, builds an `HttpRequest`, executes it and
//! parses the `HttpResponse`. The build and parse halves are public so a
//! caller can drive its own transport.

use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::endpoint::EndpointRegistry;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{ApiResponse, Parameters};

/// Parameter name the client's token is sent under.
pub const TOKEN_PARAM: &str = "token";

/// Everything except RFC 3986 unreserved characters is escaped in a path
/// segment.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Synchronous client for the resource backend.
///
/// Every call sends the token as the `token` parameter. Operation names are
/// resolved through the endpoint registry, the built-in dashboard table
/// unless replaced with [`ResourceClient::with_registry`].
#[derive(Debug, Clone)]
pub struct ResourceClient<T = UreqTransport> {
    token: String,
    base_url: String,
    registry: Arc<EndpointRegistry>,
    transport: T,
}

impl ResourceClient<UreqTransport> {
    /// Client for the resource backend configured in `settings`.
    pub fn new(token: impl Into<String>, settings: &Settings) -> Self {
        Self::with_transport(
            token,
            settings.api_base_url(),
            UreqTransport::new(settings.timeout()),
        )
    }
}

impl<T: Transport> ResourceClient<T> {
    pub fn with_transport(token: impl Into<String>, base_url: &str, transport: T) -> Self {
        Self {
            token: token.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            registry: EndpointRegistry::dashboard(),
            transport,
        }
    }

    /// Replace the built-in endpoint table.
    pub fn with_registry(mut self, registry: Arc<EndpointRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Run `operation` against the backend.
    pub fn invoke(&self, operation: &str, parameters: &Parameters) -> Result<ApiResponse, ApiError> {
        let request = self.build_request(operation, parameters)?;
        let response = self.transport.execute(&request).map_err(|e| {
            warn!(operation, error = %e, "request failed before a response arrived");
            ApiError::Transport(e)
        })?;
        self.parse_response(response).inspect_err(|e| {
            warn!(operation, error = %e, "backend rejected request");
        })
    }

    /// Build the request for `operation` without touching the network.
    pub fn build_request(&self, operation: &str, parameters: &Parameters) -> Result<HttpRequest, ApiError> {
        let endpoint = self.registry.lookup(operation)?;
        let mut remaining = parameters.clone();

        let mut path_values = Parameters::new();
        for name in endpoint.template.placeholders() {
            match remaining.remove(name) {
                None => {
                    return Err(ApiError::MissingPathParameter {
                        operation: operation.to_string(),
                        parameter: name.to_string(),
                    })
                }
                Some(Value::Null | Value::Array(_) | Value::Object(_)) => {
                    return Err(ApiError::InvalidPathParameter {
                        operation: operation.to_string(),
                        parameter: name.to_string(),
                    })
                }
                Some(Value::String(s)) if matches!(s.as_str(), "" | "." | "..") => {
                    return Err(ApiError::InvalidPathParameter {
                        operation: operation.to_string(),
                        parameter: name.to_string(),
                    })
                }
                Some(value) => {
                    path_values.insert(name.to_string(), value);
                }
            }
        }
        let path = endpoint
            .template
            .render(|name| path_values.get(name).map(path_segment))
            .map_err(|name| ApiError::MissingPathParameter {
                operation: operation.to_string(),
                parameter: name.to_string(),
            })?;

        remaining.insert(TOKEN_PARAM.to_string(), Value::String(self.token.clone()));

        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let body = serde_json::to_string(&remaining).map_err(ApiError::Serialization)?;
        debug!(operation, method = %endpoint.method, url = %url, "request built");

        Ok(HttpRequest {
            method: endpoint.method,
            url,
            query: query_pairs(&remaining),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    /// Turn a backend response into a value or an `ApiError`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<ApiResponse, ApiError> {
        if response.status >= 400 {
            return Err(ApiError::Http {
                status: response.status,
                body: response.body,
            });
        }
        if response.body.trim().is_empty() {
            return Ok(ApiResponse::Text(response.body));
        }
        match serde_json::from_str(&response.body) {
            Ok(value) => Ok(ApiResponse::Json(value)),
            Err(_) => Ok(ApiResponse::Text(response.body)),
        }
    }
}

/// Text form of a scalar parameter: strings as-is, anything else as JSON.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Percent-encoded path segment for a scalar path parameter.
fn path_segment(value: &Value) -> String {
    utf8_percent_encode(&scalar_text(value), PATH_SEGMENT_ENCODE_SET).to_string()
}

/// Flatten parameters into query pairs. Null values are dropped and arrays
/// repeat their key once per element.
fn query_pairs(parameters: &Parameters) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(parameters.len());
    for (key, value) in parameters {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|item| !item.is_null()) {
                    pairs.push((key.clone(), scalar_text(item)));
                }
            }
            other => pairs.push((key.clone(), scalar_text(other))),
        }
    }
    pairs
}
