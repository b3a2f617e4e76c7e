//! Transport seam
//!
//! The client never talks HTTP directly; it builds [`TransportRequest`]s and
//! hands them to a [`Transport`]. `halcyon-client` ships a reqwest-backed
//! implementation and `halcyon-test-utils` a scripted mock.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{HalError, HalResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    /// `text/uri-list` body, one URI per line.
    UriList(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl TransportRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, url).with_body(RequestBody::Json(body))
    }

    pub fn put(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, url).with_body(RequestBody::Json(body))
    }

    pub fn patch(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Patch, url).with_body(RequestBody::Json(body))
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.query.extend(pairs);
        self
    }
}

/// Status plus decoded body. Empty bodies decode to `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

impl TransportResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail unless the status is 2xx.
    pub fn error_for_status(self) -> HalResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(HalError::from_status(self.status, self.body))
        }
    }

    /// Body observation: any 2xx yields the body, anything else fails.
    pub fn into_body(self) -> HalResult<Value> {
        self.error_for_status().map(|response| response.body)
    }

    /// Response observation used by create/update/patch: 200-207 pass, 500
    /// maps to `ServerError`, every other status to `UnexpectedStatus`.
    pub fn into_checked(self) -> HalResult<Self> {
        match self.status {
            200..=207 => Ok(self),
            500 => Err(HalError::from_status(self.status, self.body)),
            status => Err(HalError::UnexpectedStatus {
                status,
                body: self.body,
            }),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `request`. Errors are reserved for failures below HTTP
    /// (connection, timeout, decoding); non-2xx statuses come back as
    /// responses.
    async fn execute(&self, request: TransportRequest) -> HalResult<TransportResponse>;
}
