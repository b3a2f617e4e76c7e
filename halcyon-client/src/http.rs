//! reqwest-backed [`Transport`].

use async_trait::async_trait;
use halcyon_core::constants::URI_LIST_CONTENT_TYPE;
use halcyon_core::{
    ConfigError, HalConfig, HalError, HalResult, Method, RequestBody, Transport, TransportRequest,
    TransportResponse,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;

const HAL_ACCEPT: &str = "application/hal+json, application/json";

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport applying the configured timeout and default headers.
    pub fn new(config: &HalConfig) -> HalResult<Self> {
        let headers = build_default_headers(config)?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()
            .map_err(HalError::transport)?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn build_default_headers(config: &HalConfig) -> HalResult<HeaderMap> {
    let invalid = |reason: String| {
        HalError::Config(ConfigError::InvalidValue {
            field: "headers",
            reason,
        })
    };

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(HAL_ACCEPT));
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| invalid(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value).map_err(|e| invalid(format!("{name}: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Decode a response body: empty bodies and 204 become `null`, non-JSON text
/// is kept as a string value.
fn decode_body(status: u16, bytes: &[u8]) -> Value {
    if status == 204 || bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> HalResult<TransportResponse> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::UriList(uris) => builder
                .header(CONTENT_TYPE, URI_LIST_CONTENT_TYPE)
                .body(uris),
        };

        let response = builder.send().await.map_err(HalError::transport)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(HalError::transport)?;
        Ok(TransportResponse::new(status, decode_body(status, &bytes)))
    }
}
