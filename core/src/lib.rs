//! Synchronous clients for the dashboard's resource backend and login service.
//!
//! # Overview
//! [`ResourceClient`] resolves operation names such as `get_menu` against an
//! [`EndpointRegistry`], fills the URL template from the call parameters,
//! attaches the token and issues the request. [`AuthClient`] exchanges
//! credentials for that token.
//!
//! # Design
//! - Every operation is split into a pure build step and a pure parse step
//!   around a [`Transport`], so request building is testable offline.
//! - Backend URLs come from an explicit [`Settings`] value, optionally
//!   installed once per process with [`config::install`].
//! - Errors carry an [`ErrorCategory`] so callers can handle "unauthorized"
//!   uniformly across both clients.

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod types;

pub use auth::{AuthClient, LoginProvider};
pub use client::ResourceClient;
pub use config::{Environment, ServiceUrls, Settings};
pub use endpoint::{EndpointDefinition, EndpointRegistry, UrlTemplate};
pub use error::{ApiError, AuthError, ConfigError, ErrorCategory, RegistryError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use types::{ApiResponse, BasicCredentials, Menu, Parameters, Restaurant, Tag, UpdateMenu, User};
