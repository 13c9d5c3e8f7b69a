//! Endpoint descriptors and the registry a client is declared with.
//!
//! # Design
//! An `Endpoint` is an immutable `(method, template)` pair. Binding it to a
//! call is `Endpoint::prepare`: partition the arguments, substitute the
//! template, encode the body and produce an `HttpRequest`. Nothing here
//! performs I/O, so every request a client would send can be inspected in
//! tests.
//!
//! An `EndpointSet` is the named registry a client type is declared with.
//! It is shared behind an `Arc` by every client built from it.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use tracing::{trace, warn};

use crate::args::{encode_pairs, partition, render_value, Args, DATA, PAYLOAD};
use crate::error::{Error, Result, TemplateError};
use crate::http::{HttpRequest, Method};
use crate::template::Template;
use crate::types::Auth;

const CONTENT_TYPE: &str = "content-type";
const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";
const TEXT: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    method: Method,
    template: Template,
}

impl Endpoint {
    /// Declare an endpoint.
    ///
    /// Fails if the template is malformed or names a placeholder `data` or
    /// `payload`, which would be ambiguous with the reserved body arguments.
    pub fn new(method: Method, template: &str) -> Result<Self> {
        let template = Template::parse(template)?;
        if let Some(reserved) = template
            .placeholders()
            .iter()
            .find(|name| *name == DATA || *name == PAYLOAD)
        {
            return Err(TemplateError::ReservedPlaceholder(reserved.clone()).into());
        }
        Ok(Self { method, template })
    }

    /// Declare an endpoint from a verb string such as `"get"`.
    pub fn parse(verb: &str, template: &str) -> Result<Self> {
        Self::new(Method::from_str(verb)?, template)
    }

    pub fn get(template: &str) -> Result<Self> {
        Self::new(Method::Get, template)
    }

    pub fn post(template: &str) -> Result<Self> {
        Self::new(Method::Post, template)
    }

    pub fn put(template: &str) -> Result<Self> {
        Self::new(Method::Put, template)
    }

    pub fn delete(template: &str) -> Result<Self> {
        Self::new(Method::Delete, template)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Bind call arguments into a request against `base_url`.
    ///
    /// The URL is `base_url` followed by the substituted template with no
    /// separator handling. A missing placeholder fails here, before any
    /// request exists.
    pub fn prepare(&self, base_url: &str, auth: Option<&Auth>, args: Args) -> Result<HttpRequest> {
        let parts = partition(&self.template, args);
        trace!(
            template = %self.template,
            placeholders = ?parts.placeholders,
            params = ?parts.params,
            "partitioned call arguments"
        );
        let path = self.template.render(&parts.placeholders)?;

        let mut headers = Vec::new();
        let body = match (parts.payload, parts.data) {
            (Some(payload), data) => {
                if data.is_some() {
                    warn!(template = %self.template, "both `payload` and `data` given, dropping `data`");
                }
                headers.push((CONTENT_TYPE.to_string(), JSON.to_string()));
                Some(serde_json::to_string(&payload).map_err(|e| Error::Encode(e.to_string()))?)
            }
            (None, Some(Value::Object(fields))) => {
                let pairs = encode_pairs(&fields);
                headers.push((CONTENT_TYPE.to_string(), FORM.to_string()));
                Some(serde_urlencoded::to_string(pairs).map_err(|e| Error::Encode(e.to_string()))?)
            }
            (None, Some(data)) => {
                headers.push((CONTENT_TYPE.to_string(), TEXT.to_string()));
                Some(render_value(&data))
            }
            (None, None) => None,
        };

        Ok(HttpRequest {
            method: self.method,
            url: format!("{base_url}{path}"),
            auth: auth.cloned(),
            query: encode_pairs(&parts.params),
            headers,
            body,
        })
    }
}

/// Named endpoints a client type is declared with.
///
/// Declaring a name twice replaces the earlier endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointSet {
    endpoints: BTreeMap<String, Arc<Endpoint>>,
}

impl EndpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, name: impl Into<String>, endpoint: Endpoint) -> Self {
        self.insert(name, endpoint);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, endpoint: Endpoint) {
        self.endpoints.insert(name.into(), Arc::new(endpoint));
    }

    /// Declare an endpoint from a verb string, e.g. `declare("posts", "get", "posts/")`.
    pub fn declare(self, name: impl Into<String>, verb: &str, template: &str) -> Result<Self> {
        Ok(self.endpoint(name, Endpoint::parse(verb, template)?))
    }

    pub fn get(self, name: impl Into<String>, template: &str) -> Result<Self> {
        Ok(self.endpoint(name, Endpoint::get(template)?))
    }

    pub fn post(self, name: impl Into<String>, template: &str) -> Result<Self> {
        Ok(self.endpoint(name, Endpoint::post(template)?))
    }

    pub fn put(self, name: impl Into<String>, template: &str) -> Result<Self> {
        Ok(self.endpoint(name, Endpoint::put(template)?))
    }

    pub fn delete(self, name: impl Into<String>, template: &str) -> Result<Self> {
        Ok(self.endpoint(name, Endpoint::delete(template)?))
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<Endpoint>> {
        self.endpoints.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
