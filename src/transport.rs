//! HTTP transport seam.
//!
//! [`Transport`] is the crate's only network boundary: five verbs over
//! JSON, no retries, no backoff. [`HttpTransport`] is the reqwest-backed
//! implementation; [`AuthTransport`] wraps any transport and injects the
//! current session token into the query arguments.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::form_urlencoded;

use crate::error::{Error, Result};
use crate::session::SessionStore;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Query parameter name carrying the session token.
const SESSION_ARG: &str = "session";

/// HTTP verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Ordered query arguments.
///
/// A pair with no value renders as the bare key (`?debug` style flags);
/// everything else renders percent-encoded as `key=value`. Insertion order
/// is preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryArgs {
    pairs: Vec<(String, Option<String>)>,
}

impl QueryArgs {
    /// No arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `key=value` pair.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.pairs.push((key.into(), Some(value.to_string())));
        self
    }

    /// Append a bare flag.
    pub fn flag(&mut self, key: impl Into<String>) -> &mut Self {
        self.pairs.push((key.into(), None));
        self
    }

    /// Whether any pair uses the given key.
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Whether no arguments are set.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Render as a query string without the leading `?`.
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| match value {
                Some(value) => form_urlencoded::Serializer::new(String::new())
                    .append_pair(key, value)
                    .finish(),
                None => form_urlencoded::byte_serialize(key.as_bytes()).collect(),
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Append these arguments to a URL.
    pub fn apply(&self, url: &str) -> String {
        if self.is_empty() {
            url.to_string()
        } else {
            format!("{url}?{}", self.to_query_string())
        }
    }
}

/// Asynchronous HTTP boundary: send a verb to a URL and get a JSON value
/// back, or a transport error. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request.
    async fn send(
        &self,
        method: Method,
        url: &str,
        args: &QueryArgs,
        body: Option<Value>,
    ) -> Result<Value>;

    /// GET without a body.
    async fn get(&self, url: &str, args: &QueryArgs) -> Result<Value> {
        self.send(Method::Get, url, args, None).await
    }

    /// POST with a JSON body.
    async fn post(&self, url: &str, args: &QueryArgs, body: Value) -> Result<Value> {
        self.send(Method::Post, url, args, Some(body)).await
    }

    /// PUT with an optional JSON body.
    async fn put(&self, url: &str, args: &QueryArgs, body: Option<Value>) -> Result<Value> {
        self.send(Method::Put, url, args, body).await
    }

    /// PATCH with a JSON body.
    async fn patch(&self, url: &str, args: &QueryArgs, body: Value) -> Result<Value> {
        self.send(Method::Patch, url, args, Some(body)).await
    }

    /// DELETE without a body.
    async fn delete(&self, url: &str, args: &QueryArgs) -> Result<Value> {
        self.send(Method::Delete, url, args, None).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(
        &self,
        method: Method,
        url: &str,
        args: &QueryArgs,
        body: Option<Value>,
    ) -> Result<Value> {
        (**self).send(method, url, args, body).await
    }
}

/// Reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Build a transport with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cachepoint/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        args: &QueryArgs,
        body: Option<Value>,
    ) -> Result<Value> {
        let full_url = args.apply(url);
        debug!(%method, url = %full_url, "dispatching request");

        let mut request = self
            .client
            .request(method.into(), &full_url)
            .timeout(self.timeout);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::status(status.as_u16(), text));
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }

        // Some endpoints answer with plain-text messages; pass those through
        // as strings rather than failing the request.
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

/// Transport wrapper that injects the session token.
///
/// Adds `session=<token>` to the query arguments unless the caller already
/// set one. Fails with [`Error::NotLoggedIn`] before any network dispatch
/// when no session record exists.
#[derive(Clone)]
pub struct AuthTransport<T> {
    inner: T,
    sessions: SessionStore,
}

impl<T> AuthTransport<T> {
    /// Wrap a transport with session injection from the given store.
    pub fn new(inner: T, sessions: SessionStore) -> Self {
        Self { inner, sessions }
    }
}

#[async_trait]
impl<T: Transport> Transport for AuthTransport<T> {
    async fn send(
        &self,
        method: Method,
        url: &str,
        args: &QueryArgs,
        body: Option<Value>,
    ) -> Result<Value> {
        let mut args = args.clone();
        if !args.contains(SESSION_ARG) {
            args.set(SESSION_ARG, self.sessions.token()?);
        }
        self.inner.send(method, url, &args, body).await
    }
}
