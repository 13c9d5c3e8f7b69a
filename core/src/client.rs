//! Synchronous client that dispatches bound endpoint calls.
//!
//! # Design
//! `Client` is immutable once built: base URL, credential, the two policy
//! flags, the shared `EndpointSet`, a `Transport` and optional hooks. Every
//! call runs the same linear pipeline:
//!
//! 1. `CallHooks::prepare` may rewrite the arguments.
//! 2. `Endpoint::prepare` binds them into an `HttpRequest` (template errors
//!    stop here, before any I/O).
//! 3. The transport executes the request.
//! 4. `decode` turns the response into `Result<Response, ApiError>`.
//! 5. `CallHooks::finalize` may rewrite that outcome.
//! 6. The error policy either returns the `ApiError` or replaces it with
//!    `None`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::args::Args;
use crate::config::ClientConfig;
use crate::endpoint::{Endpoint, EndpointSet};
use crate::error::{ApiError, Error, Result};
use crate::http::{HttpResponse, Method};
use crate::transport::{Transport, UreqTransport};
use crate::types::{Auth, Response};

/// Per-client callbacks around every call.
///
/// Both methods default to passing their input through.
pub trait CallHooks: Send + Sync {
    /// Runs before the arguments are bound to the endpoint.
    fn prepare(&self, endpoint: &str, args: Args) -> Args {
        let _ = endpoint;
        args
    }

    /// Runs on the decoded outcome, before the error policy.
    fn finalize(
        &self,
        endpoint: &str,
        outcome: Result<Response, ApiError>,
    ) -> Result<Response, ApiError> {
        let _ = endpoint;
        outcome
    }
}

struct NoHooks;

impl CallHooks for NoHooks {}

#[derive(Clone)]
pub struct Client {
    base_url: String,
    auth: Option<Auth>,
    load_json: bool,
    throw_on_error: bool,
    endpoints: Arc<EndpointSet>,
    transport: Arc<dyn Transport>,
    hooks: Arc<dyn CallHooks>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .field("load_json", &self.load_json)
            .field("throw_on_error", &self.throw_on_error)
            .field("endpoints", &self.endpoints.names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    pub fn load_json(&self) -> bool {
        self.load_json
    }

    pub fn throw_on_error(&self) -> bool {
        self.throw_on_error
    }

    pub fn endpoints(&self) -> &Arc<EndpointSet> {
        &self.endpoints
    }

    /// Call the endpoint declared as `name`.
    ///
    /// Returns `Ok(None)` for a failed call when `throw_on_error` is off.
    pub fn call(&self, name: &str, args: Args) -> Result<Option<Response>> {
        let endpoint = self
            .endpoints
            .lookup(name)
            .ok_or_else(|| Error::UnknownEndpoint(name.to_string()))?;
        self.invoke(name, endpoint, args)
    }

    /// Call an endpoint that is not part of the declared set. `name` is only
    /// used for hooks, logs and errors.
    pub fn invoke(&self, name: &str, endpoint: &Endpoint, args: Args) -> Result<Option<Response>> {
        let args = self.hooks.prepare(name, args);
        let request = endpoint.prepare(&self.base_url, self.auth.as_ref(), args)?;
        debug!(
            endpoint = name,
            method = %request.method,
            url = %request.url,
            "dispatching request"
        );

        let response = self.transport.execute(&request)?;
        debug!(endpoint = name, status = response.status, "received response");

        let outcome = self.decode(name, endpoint.method(), response);
        let outcome = self.hooks.finalize(name, outcome);
        self.apply_error_policy(outcome)
    }

    fn decode(&self, name: &str, method: Method, response: HttpResponse) -> Result<Response, ApiError> {
        let failure = |response: HttpResponse| ApiError {
            endpoint: name.to_string(),
            method,
            status: response.status,
            body: response.body,
        };

        if !response.is_success() {
            return Err(failure(response));
        }
        if !self.load_json {
            return Ok(Response::Text(response.body));
        }
        match serde_json::from_str(&response.body) {
            Ok(value) => Ok(Response::Json(value)),
            Err(e) => {
                debug!(endpoint = name, error = %e, "response body is not valid JSON");
                Err(failure(response))
            }
        }
    }

    fn apply_error_policy(&self, outcome: Result<Response, ApiError>) -> Result<Option<Response>> {
        match outcome {
            Ok(response) => Ok(Some(response)),
            Err(err) if self.throw_on_error => Err(err.into()),
            Err(err) => {
                warn!(
                    endpoint = %err.endpoint,
                    status = err.status,
                    "suppressing failed call"
                );
                Ok(None)
            }
        }
    }
}

/// Builder for `Client`.
///
/// Defaults follow the declarative surface: no auth, no JSON decoding,
/// errors suppressed, a `ureq` transport without timeout.
pub struct ClientBuilder {
    base_url: String,
    auth: Option<Auth>,
    load_json: bool,
    throw_on_error: bool,
    endpoints: Arc<EndpointSet>,
    transport: Option<Arc<dyn Transport>>,
    hooks: Option<Arc<dyn CallHooks>>,
    timeout: Option<Duration>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .field("load_json", &self.load_json)
            .field("throw_on_error", &self.throw_on_error)
            .field("endpoints", &self.endpoints.names().collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth: None,
            load_json: false,
            throw_on_error: false,
            endpoints: Arc::default(),
            transport: None,
            hooks: None,
            timeout: None,
        }
    }

    /// Start from a loaded configuration. Endpoints still have to be added.
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut builder = Self::new(config.base_url.clone())
            .load_json(config.load_json)
            .throw_on_error(config.throw_on_error);
        builder.auth = config.auth.clone();
        builder.timeout = config.timeout();
        builder
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn load_json(mut self, load_json: bool) -> Self {
        self.load_json = load_json;
        self
    }

    pub fn throw_on_error(mut self, throw_on_error: bool) -> Self {
        self.throw_on_error = throw_on_error;
        self
    }

    /// Use a shared, pre-declared endpoint set.
    pub fn endpoints(mut self, endpoints: Arc<EndpointSet>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn endpoint(mut self, name: impl Into<String>, endpoint: Endpoint) -> Self {
        Arc::make_mut(&mut self.endpoints).insert(name, endpoint);
        self
    }

    pub fn transport(self, transport: impl Transport + 'static) -> Self {
        self.shared_transport(Arc::new(transport))
    }

    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn hooks(mut self, hooks: impl CallHooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    /// Timeout for the default transport. Ignored when a transport is set
    /// explicitly.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Client> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("base URL must not be empty".to_string()));
        }
        let transport = match self.transport {
            Some(transport) => transport,
            None => match self.timeout {
                Some(timeout) => Arc::new(UreqTransport::with_timeout(timeout)),
                None => Arc::new(UreqTransport::new()),
            },
        };
        Ok(Client {
            base_url: self.base_url,
            auth: self.auth,
            load_json: self.load_json,
            throw_on_error: self.throw_on_error,
            endpoints: self.endpoints,
            transport,
            hooks: self.hooks.unwrap_or_else(|| Arc::new(NoHooks)),
        })
    }
}
