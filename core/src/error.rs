//! Error types for bound endpoint calls.
//!
//! # Design
//! Template problems and API failures get their own structured types because
//! callers treat them differently: a `TemplateError` is a bug at the call
//! site and is always returned, while an `ApiError` is subject to the
//! client's `throw_on_error` policy. Transport failures carry the
//! collaborator's message unchanged.

use std::time::Duration;

use thiserror::Error;

use crate::http::Method;

/// Problems with a URL template, either at declaration or at call time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A placeholder in the template had no matching call argument.
    #[error("missing value for placeholder `{0}`")]
    MissingPlaceholder(String),

    /// The template has an unbalanced brace, an empty `{}` or a placeholder
    /// name that is not an identifier.
    #[error("malformed template `{template}` at byte {position}")]
    Malformed { template: String, position: usize },

    /// A placeholder uses one of the reserved argument names.
    #[error("placeholder `{0}` collides with a reserved argument name")]
    ReservedPlaceholder(String),
}

/// A failed API call: non-success status, or a body that was not valid JSON
/// while JSON decoding was enabled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error when invoking `{endpoint}` ({method}): HTTP {status}: {body}")]
pub struct ApiError {
    pub endpoint: String,
    pub method: Method,
    pub status: u16,
    /// Raw response text, whether or not it parses as JSON.
    pub body: String,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The transport could not complete the exchange (connection refused,
    /// timeout, unreadable body).
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("no endpoint named `{0}`")]
    UnknownEndpoint(String),

    /// A request body could not be encoded.
    #[error("encoding failed: {0}")]
    Encode(String),

    /// A response could not be decoded into the requested type.
    #[error("decoding failed: {0}")]
    Decode(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("call did not complete within {0:?}")]
    Timeout(Duration),

    #[error("worker exited before delivering a result")]
    WorkerLost,
}

impl Error {
    /// The API failure behind this error, if any.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
