//! The seam between bound calls and the HTTP library that performs them.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use ureq::{Agent, RequestBuilder};

use crate::error::{Error, Result};
use crate::http::{HttpRequest, HttpResponse, Method};

/// Bytes that may not appear literally in a URI. Reserved delimiters and
/// existing `%XX` escapes are left alone.
const URI_UNSAFE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Percent-encode what a URI cannot carry, keeping valid escapes intact.
///
/// A `%` that does not start a `%XX` escape becomes `%25`.
pub fn requote(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let mut rest = url;
    while let Some(at) = rest.find('%') {
        out.extend(utf8_percent_encode(&rest[..at], URI_UNSAFE));
        let escaped = rest
            .get(at + 1..at + 3)
            .is_some_and(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()));
        out.push_str(if escaped { "%" } else { "%25" });
        rest = &rest[at + 1..];
    }
    out.extend(utf8_percent_encode(rest, URI_UNSAFE));
    out
}

/// Executes a bound request.
///
/// Implementations return 4xx/5xx responses as data; only failures to
/// complete the exchange are errors.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Transport whose requests give up after `timeout` in total.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply query, auth and headers, which every request state accepts.
fn decorate<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (name, value) in &request.query {
        builder = builder.query(name, value);
    }
    if let Some(auth) = &request.auth {
        builder = builder.header("authorization", auth.header_value());
    }
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = requote(&request.url);
        let url = url.as_str();
        let body = request.body.as_deref().map(str::as_bytes);

        let result = match (request.method, body) {
            (Method::Get, None) => decorate(self.agent.get(url), request).call(),
            (Method::Get, Some(body)) => decorate(self.agent.get(url), request)
                .force_send_body()
                .send(body),
            (Method::Delete, None) => decorate(self.agent.delete(url), request).call(),
            (Method::Delete, Some(body)) => decorate(self.agent.delete(url), request)
                .force_send_body()
                .send(body),
            (Method::Post, Some(body)) => decorate(self.agent.post(url), request).send(body),
            (Method::Post, None) => decorate(self.agent.post(url), request).send_empty(),
            (Method::Put, Some(body)) => decorate(self.agent.put(url), request).send(body),
            (Method::Put, None) => decorate(self.agent.put(url), request).send_empty(),
        };
        let mut response = result.map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
