//! Error types for the transactional mailing client.
//!
//! # Design
//! Only conditions that leave the caller without a usable response document
//! are errors. A response that parses but reports `STATUS != 0` is a remote
//! failure and is read through `Transact::is_success` and
//! `Transact::error_message` instead. Transport and HTTP status failures get
//! separate variants so callers can tell "the service said no" apart from
//! "the service was never reached".

use std::sync::Arc;

use thiserror::Error;

/// Errors returned by the request assembler, response interpreter, and
/// transport.
///
/// `Clone` so a failed query can both return the error and keep it in the
/// client's state.
#[derive(Debug, Clone, Error)]
pub enum TransactError {
    /// The HTTP exchange itself failed (connection refused, DNS, timeout).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response body is not well-formed XML or lacks required fields.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The request document could not be rendered.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Configuration values are missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Writing the request document to disk failed.
    #[error("i/o error: {0}")]
    Io(#[source] Arc<std::io::Error>),
}

impl From<std::io::Error> for TransactError {
    fn from(e: std::io::Error) -> Self {
        TransactError::Io(Arc::new(e))
    }
}

impl From<quick_xml::Error> for TransactError {
    fn from(e: quick_xml::Error) -> Self {
        TransactError::Parse(e.to_string())
    }
}
