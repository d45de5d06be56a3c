//! Transport adapter: one request against the CPO or CAI service.
//!
//! [`Transport`] is the seam to the network. [`call`] layers status checking and
//! decoding on top of it and never fails: every problem becomes an unsuccessful
//! [`Outcome`] holding the target type's null variant.

pub mod http;

pub use http::HttpTransport;

use crate::codec;
use crate::model::NullVariant;
use crate::utils::error::{Error, Result};
use crate::utils::fs::UploadFile;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt;

/// Longest piece of a failed response body quoted in diagnostics.
const SNIPPET_CHARS: usize = 200;

/// Logical service a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Portfolio optimization
    Cpo,
    /// Model training and inference
    Cai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            | Method::Get => "GET",
            | Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One multipart form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, file: UploadFile },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FormPart::Text { name: name.into(), value: value.into() }
    }

    pub fn file(name: impl Into<String>, file: UploadFile) -> Self {
        FormPart::File { name: name.into(), file }
    }

    pub fn name(&self) -> &str {
        match self {
            | FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(String),
    Multipart(Vec<FormPart>),
}

/// A request addressed to one endpoint; `path` is relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub endpoint: Endpoint,
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
}

impl Request {
    pub fn get(endpoint: Endpoint, path: impl Into<String>) -> Self {
        Self { endpoint, method: Method::Get, path: path.into(), body: RequestBody::Empty }
    }

    pub fn post_json(endpoint: Endpoint, path: impl Into<String>, body: String) -> Self {
        Self { endpoint, method: Method::Post, path: path.into(), body: RequestBody::Json(body) }
    }

    pub fn post_form(endpoint: Endpoint, path: impl Into<String>, parts: Vec<FormPart>) -> Self {
        Self { endpoint, method: Method::Post, path: path.into(), body: RequestBody::Multipart(parts) }
    }
}

/// Status and body of an HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

impl RawReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single exchange. Errors are reserved for failures below HTTP
/// (connect, timeout, TLS); any status code is a successful exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<RawReply>;
}

/// Result of [`call`]: `value` is the null variant whenever `success` is false.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub success: bool,
    pub value: T,
    pub message: Option<String>,
}

impl<T: NullVariant> Outcome<T> {
    fn ok(value: T) -> Self {
        let message = value.diagnostic().map(str::to_string);
        Self { success: true, value, message }
    }

    fn failed(message: String) -> Self {
        Self { success: false, value: T::null(message.clone()), message: Some(message) }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Sends `request` and decodes the reply into `T`.
///
/// A decodable reply is a success even when it is an empty object or a sentinel.
pub async fn call<T>(transport: &dyn Transport, request: Request) -> Outcome<T>
where
    T: DeserializeOwned + NullVariant,
{
    let method = request.method;
    let path = request.path.clone();
    log::debug!("{} {} -> {:?}", method, path, request.endpoint);

    let reply = match transport.execute(request).await {
        | Ok(reply) => reply,
        | Err(e) => {
            let message = format!("{} {}: {}", method, path, e);
            log::warn!("{}", message);
            return Outcome::failed(message);
        }
    };

    if !reply.is_success() {
        let err = Error::HttpStatus {
            method: method.to_string(),
            path,
            status: reply.status,
            snippet: snippet(&reply.body),
        };
        log::warn!("{}", err);
        return Outcome::failed(err.to_string());
    }

    match codec::decode::<T>(&reply.body) {
        | Ok(value) => Outcome::ok(value),
        | Err(e) => {
            let message = format!("{} {}: {}", method, path, e);
            log::warn!("{}", message);
            Outcome::failed(message)
        }
    }
}

/// Percent-encodes one path segment so `/`, `?` and `#` in ids stay inside it.
pub fn path_segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect::<String>().replace('+', "%20")
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= SNIPPET_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(SNIPPET_CHARS).collect();
    cut.push_str("...");
    cut
}
