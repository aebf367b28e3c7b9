//! Response values and domain DTOs for the dashboard backends.
//!
//! # Design
//! `ResourceClient::invoke` is untyped and returns an [`ApiResponse`]. The
//! DTOs mirror the mock-server's schema but are defined independently;
//! integration tests catch any schema drift between the two crates.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Request parameters for one `invoke` call.
pub type Parameters = serde_json::Map<String, Value>;

/// Successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// The body parsed as JSON. `{}` and `[]` are kept as JSON.
    Json(Value),
    /// The body was empty or not JSON.
    Text(String),
}

impl ApiResponse {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Text(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Text(_) => None,
        }
    }

    /// Decode a JSON body into `T`. A text body is decoded as a JSON string.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let value = match self {
            ApiResponse::Json(value) => value,
            ApiResponse::Text(text) => Value::String(text),
        };
        serde_json::from_value(value).map_err(ApiError::Deserialization)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Menu {
    pub id: u64,
    pub name: String,
    pub restaurant_id: u64,
    #[serde(default)]
    pub items: Vec<String>,
}

/// Fields accepted by `update_menu`. Omitted fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMenu {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Restaurant {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: u64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Payload for the `basic` login provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}
