//! Credentials and decoded responses.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Credential attached to every request a client sends.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Auth {
    /// HTTP basic authentication.
    Basic { username: String, password: String },
    /// `Authorization: Bearer <token>`.
    Bearer(String),
}

impl Auth {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Auth::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Auth::Bearer(token.into())
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        match self {
            Auth::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
            }
            Auth::Bearer(token) => format!("Bearer {token}"),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Auth::Bearer(_) => f.debug_tuple("Bearer").field(&"<redacted>").finish(),
        }
    }
}

/// Body of a successful call.
///
/// `Json` when the client decodes JSON, `Text` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Json(Value),
    Text(String),
}

impl Response {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Response::Json(value) => Some(value),
            Response::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Response::Text(text) => Some(text),
            Response::Json(_) => None,
        }
    }

    /// Deserialize the body into `T`, parsing raw text as JSON first.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Response::Json(value) => serde_json::from_value(value),
            Response::Text(text) => serde_json::from_str(&text),
        }
        .map_err(|e| Error::Decode(e.to_string()))
    }
}
