//! Transactional send: one request/response cycle per `query`.
//!
//! # Design
//! `Transact` owns the request data, the configuration, and a transport.
//! `query` renders the request, posts it, and parses the reply, then stores
//! the outcome in a `QueryState`. All other accessors only read that state,
//! so the raw request and response documents stay available for
//! diagnostics after the call returns.
//!
//! `query` takes `&mut self`. Callers sharing an instance across threads
//! must serialize access themselves; one instance per send is the intended
//! use.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::TransactConfig;
use crate::error::TransactError;
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::request::MailingRequest;
use crate::response::MailingResponse;
use crate::types::{Recipient, TransactOptions};

/// Returned by `error_message` while there is no parsed response.
pub const NOT_EXECUTED_MESSAGE: &str = "Query has not been executed.";

/// Outcome of the most recent `query`.
#[derive(Debug)]
pub enum QueryState {
    Unqueried,
    /// The endpoint answered with a parseable document, successful or not.
    Answered {
        request_xml: String,
        response_xml: String,
        response: MailingResponse,
    },
    /// The request was rendered but no usable response document came back.
    Failed {
        request_xml: String,
        error: TransactError,
    },
}

/// A transactional send bound to one campaign and recipient list.
pub struct Transact<T = UreqTransport> {
    config: TransactConfig,
    request: MailingRequest,
    transport: T,
    state: QueryState,
}

impl Transact<UreqTransport> {
    pub fn new(
        config: TransactConfig,
        campaign_id: impl Into<String>,
        recipients: Vec<Recipient>,
        options: TransactOptions,
    ) -> Self {
        let transport = UreqTransport::new(&config);
        Self::with_transport(config, campaign_id, recipients, options, transport)
    }
}

impl<T: Transport> Transact<T> {
    pub fn with_transport(
        config: TransactConfig,
        campaign_id: impl Into<String>,
        recipients: Vec<Recipient>,
        options: TransactOptions,
        transport: T,
    ) -> Self {
        Self {
            config,
            request: MailingRequest::new(campaign_id, recipients, options),
            transport,
            state: QueryState::Unqueried,
        }
    }

    pub fn request(&self) -> &MailingRequest {
        &self.request
    }

    pub fn config(&self) -> &TransactConfig {
        &self.config
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Run one full request/response cycle, replacing any earlier outcome.
    ///
    /// A reply with a non-zero `STATUS` is still `Ok`; read it through
    /// `is_success` and `error_message`. Transport failures, non-2xx
    /// statuses, and unparseable bodies are returned as errors and also
    /// remain visible through `last_error`.
    pub fn query(&mut self) -> Result<(), TransactError> {
        let request_xml = self.request.to_xml()?;
        let endpoint = self.config.endpoint();
        debug!(
            endpoint = %endpoint,
            campaign_id = %self.request.campaign_id,
            recipients = self.request.recipients.len(),
            "sending transactional mailing"
        );

        let outcome = self
            .transport
            .send(&HttpRequest::xml(endpoint, request_xml.as_str()))
            .and_then(check_status)
            .and_then(|http| {
                let response = MailingResponse::parse(&http.body)?;
                Ok((http.body, response))
            });

        match outcome {
            Ok((response_xml, response)) => {
                if response.is_success() {
                    info!(
                        campaign_id = %response.campaign_id,
                        transaction_id = %response.transaction_id,
                        emails_sent = ?response.emails_sent,
                        "mailing accepted"
                    );
                } else {
                    info!(
                        status = response.status,
                        error = %response.error_string,
                        "mailing rejected by remote service"
                    );
                }
                self.state = QueryState::Answered {
                    request_xml,
                    response_xml,
                    response,
                };
                Ok(())
            }
            Err(error) => {
                warn!(error = %error, "mailing query failed");
                self.state = QueryState::Failed {
                    request_xml,
                    error: error.clone(),
                };
                Err(error)
            }
        }
    }

    pub fn response(&self) -> Option<&MailingResponse> {
        match &self.state {
            QueryState::Answered { response, .. } => Some(response),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<&TransactError> {
        match &self.state {
            QueryState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// True only when a response was parsed and its `STATUS` is `0`.
    pub fn is_success(&self) -> bool {
        self.response().is_some_and(MailingResponse::is_success)
    }

    /// `ERROR_STRING` of a failed response, `None` for a successful one, and
    /// `NOT_EXECUTED_MESSAGE` when there is no parsed response at all.
    pub fn error_message(&self) -> Option<&str> {
        match self.response() {
            Some(response) => response.error_message(),
            None => Some(NOT_EXECUTED_MESSAGE),
        }
    }

    /// The raw response body of the last query, or `""` when none was parsed.
    pub fn response_xml(&self) -> &str {
        match &self.state {
            QueryState::Answered { response_xml, .. } => response_xml,
            _ => "",
        }
    }

    /// The request document sent by the last query.
    ///
    /// Empty before any query and after a reply that could not be parsed.
    pub fn query_xml(&self) -> &str {
        match &self.state {
            QueryState::Failed {
                error: TransactError::Parse(_),
                ..
            } => "",
            QueryState::Answered { request_xml, .. } | QueryState::Failed { request_xml, .. } => request_xml,
            QueryState::Unqueried => "",
        }
    }

    /// Write the request document to `path`, replacing any existing file.
    ///
    /// Before the first query the current request is rendered on demand.
    /// Afterwards the document that was actually sent is written, even when
    /// the reply could not be parsed.
    pub fn save_xml(&self, path: impl AsRef<Path>) -> Result<PathBuf, TransactError> {
        let path = path.as_ref();
        let xml = match &self.state {
            QueryState::Unqueried => self.request.to_xml()?,
            QueryState::Answered { request_xml, .. } | QueryState::Failed { request_xml, .. } => request_xml.clone(),
        };
        std::fs::write(path, xml)?;
        debug!(path = %path.display(), "saved request document");
        Ok(path.to_path_buf())
    }
}

/// Map non-2xx statuses to `HttpStatus`.
fn check_status(response: HttpResponse) -> Result<HttpResponse, TransactError> {
    if response.is_success() {
        return Ok(response);
    }
    Err(TransactError::HttpStatus {
        status: response.status,
        body: response.body,
    })
}
