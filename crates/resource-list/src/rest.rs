//! # REST Transport
//!
//! [`RestTransport`] talks to a PostgREST-style database-as-a-service API.
//!
//! - Every request carries the `apikey` header and, when the [`AuthProvider`]
//!   has one, `Authorization: Bearer <token>`.
//! - Data requests are `GET <base>/<endpoint>?select=..&<filters>&order=..&limit=..&offset=..`.
//! - Count requests are `HEAD` with `Prefer: count=exact`; the total arrives in
//!   `Content-Range` and is parsed by [`count::total_count_or_zero`](crate::count::total_count_or_zero).
//! - Writes send `Prefer: return=representation` and return the affected rows.

use crate::count;
use crate::error::TransportError;
use crate::query::{CountRequest, DataRequest, WriteMethod, WriteRequest};
use crate::transport::{resolve_token, AuthProvider, MissingTokenPolicy, Transport};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const PREFER: &str = "prefer";
const API_KEY: &str = "apikey";

/// Connection settings for [`RestTransport`].
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL of the REST API, e.g. `https://project.example.co/rest/v1`.
    pub base_url: String,
    pub api_key: String,
    pub missing_token: MissingTokenPolicy,
    /// Per-request timeout. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            missing_token: MissingTokenPolicy::default(),
            timeout: None,
        }
    }
}

/// HTTP implementation of [`Transport`].
#[derive(Clone)]
pub struct RestTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    missing_token: MissingTokenPolicy,
    auth: Arc<dyn AuthProvider>,
}

impl RestTransport {
    pub fn new(config: RestConfig, auth: Arc<dyn AuthProvider>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            missing_token: config.missing_token,
            auth,
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    fn headers(&self) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY, header_value(&self.api_key)?);
        if let Some(token) = resolve_token(self.auth.as_ref(), self.missing_token)? {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
        }
        Ok(headers)
    }

    /// The `GET` request for a window of rows.
    pub fn data_request(&self, request: &DataRequest) -> Result<RequestBuilder, TransportError> {
        Ok(self
            .client
            .get(self.endpoint_url(&request.endpoint))
            .headers(self.headers()?)
            .query(&request.query_pairs()))
    }

    /// The `HEAD` request whose `Content-Range` carries the total.
    pub fn count_request(&self, request: &CountRequest) -> Result<RequestBuilder, TransportError> {
        Ok(self
            .client
            .head(self.endpoint_url(&request.endpoint))
            .headers(self.headers()?)
            .header(PREFER, "count=exact")
            .query(&request.query_pairs()))
    }

    pub fn write_request(&self, request: &WriteRequest) -> Result<RequestBuilder, TransportError> {
        let url = self.endpoint_url(&request.endpoint);
        let builder = match request.method {
            WriteMethod::Insert => self.client.post(url),
            WriteMethod::Patch => self.client.patch(url),
        };
        Ok(builder
            .headers(self.headers()?)
            .header(PREFER, "return=representation")
            .query(&request.query_pairs())
            .json(&request.body))
    }
}

fn header_value(value: &str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(value)
        .map_err(|e| TransportError::InvalidRequest(format!("invalid header value: {e}")))
}

async fn send(builder: RequestBuilder) -> Result<Response, TransportError> {
    let response = builder
        .send()
        .await
        .map_err(|e| TransportError::Network(e.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let error = TransportError::Status {
        status: status.as_u16(),
        message: error_message(status, &body),
    };
    warn!(error = %error, "Request failed");
    Err(error)
}

/// Human-readable message of a failed response.
///
/// PostgREST errors are JSON objects with a `message` field; anything else is
/// passed through, and an empty body falls back to the status reason.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::String(message)) = fields.get("message") {
            return message.clone();
        }
    }
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown status")
            .to_string()
    } else {
        body.to_string()
    }
}

async fn json_rows(response: Response) -> Result<Vec<Value>, TransportError> {
    match response
        .json::<Value>()
        .await
        .map_err(|e| TransportError::Decode(e.to_string()))?
    {
        Value::Array(rows) => Ok(rows),
        Value::Object(row) => Ok(vec![Value::Object(row)]),
        other => Err(TransportError::Decode(format!(
            "expected rows, got {other}"
        ))),
    }
}

#[async_trait]
impl Transport for RestTransport {
    #[instrument(skip(self, request), fields(endpoint = %request.endpoint, offset = request.offset))]
    async fn fetch_rows(&self, request: &DataRequest) -> Result<Vec<Value>, TransportError> {
        debug!("Sending data request");
        let response = send(self.data_request(request)?).await?;
        json_rows(response).await
    }

    #[instrument(skip(self, request), fields(endpoint = %request.endpoint))]
    async fn fetch_count(&self, request: &CountRequest) -> Result<u64, TransportError> {
        debug!("Sending count request");
        let response = send(self.count_request(request)?).await?;
        let header = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok());
        Ok(count::total_count_or_zero(header))
    }

    #[instrument(skip(self, request), fields(endpoint = %request.endpoint, method = ?request.method))]
    async fn write(&self, request: &WriteRequest) -> Result<Vec<Value>, TransportError> {
        debug!(body = %request.body, "Sending write request");
        let response = send(self.write_request(request)?).await?;
        json_rows(response).await
    }
}
