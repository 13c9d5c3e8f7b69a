//! Declarative REST API client core.
//!
//! # Overview
//! An API is declared as a set of named endpoints, each an HTTP method and a
//! URL template such as `posts/{id}/comments`. A `Client` binds call
//! arguments to an endpoint, sends the request through a `Transport`, and
//! post-processes the response: optional JSON decoding and either a typed
//! `ApiError` or `None` for failed calls. `AsyncClient` runs the same calls on
//! a worker pool and hands back `CallHandle`s.
//!
//! # Design
//! - Endpoints are immutable and shared by every client built from the same
//!   `EndpointSet`; clients are immutable after construction.
//! - Binding is pure: `Endpoint::prepare` produces an `HttpRequest` without
//!   I/O, so every request can be inspected in tests.
//! - Call arguments are split by name: template placeholders first, then the
//!   reserved `data` and `payload` bodies, the rest as query parameters.
//! - `declare_api!` generates a named client type with one method per
//!   endpoint.

pub mod args;
pub mod async_client;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
mod macros;
pub mod template;
pub mod transport;
pub mod types;

pub use args::{partition, Args, Partition, DATA, PAYLOAD};
pub use async_client::{AsyncClient, CallHandle, DEFAULT_WORKERS};
pub use client::{CallHooks, Client, ClientBuilder};
pub use config::ClientConfig;
pub use endpoint::{Endpoint, EndpointSet};
pub use error::{ApiError, Error, Result, TemplateError};
pub use http::{HttpRequest, HttpResponse, Method};
pub use template::Template;
pub use transport::{Transport, UreqTransport};
pub use types::{Auth, Response};

#[doc(hidden)]
pub mod __private {
    pub use paste;
    pub use serde_json;
}
