//! HTTP transport for the XML mailing endpoint.
//!
//! # Design
//! Requests and responses are plain data. `Transact` builds an `HttpRequest`,
//! hands it to a `Transport`, and interprets the returned `HttpResponse`
//! itself. A transport only reports failures to complete the exchange; any
//! status code, 5xx included, comes back as a response so the caller can
//! decide what it means.
//!
//! `UreqTransport` is the production implementation. Tests substitute their
//! own `Transport` to replay recorded responses without a network.

use tracing::debug;

use crate::config::TransactConfig;
use crate::error::TransactError;

/// An HTTP POST described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    /// A POST of an XML document with the headers the endpoint expects.
    pub fn xml(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: vec![
                ("Content-Type".to_string(), "text/xml".to_string()),
                ("Accept".to_string(), "*/*".to_string()),
            ],
            body: body.into(),
        }
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one blocking HTTP exchange.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransactError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransactError> {
        (**self).send(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &TransactConfig) -> Self {
        // Status codes are interpreted by the caller, not raised as errors.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout())
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransactError> {
        debug!(url = %request.url, bytes = request.body.len(), "posting request");

        let mut builder = self.agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let mut response = builder
            .send(request.body.as_bytes())
            .map_err(|e| TransactError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| TransactError::Transport(e.to_string()))?;
        // A body that is not UTF-8 cannot be a usable response document.
        let body = String::from_utf8(bytes)
            .map_err(|e| TransactError::Parse(format!("response body is not UTF-8: {e}")))?;

        Ok(HttpResponse { status, headers, body })
    }
}
