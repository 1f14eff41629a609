//! Client core for the XML transactional mailing API (`XTMail`).
//!
//! # Overview
//! Renders `XTMAILING` request documents from a campaign id and recipient
//! list, posts them over HTTP, and interprets the `XTMAILING_RESPONSE` reply
//! into a success/failure verdict with an error message.
//!
//! # Design
//! - `MailingRequest` assembles the request as an owned `Element` tree.
//! - `MailingResponse` parses replies; only `STATUS` decides the verdict.
//! - `Transact` runs one request/response cycle per `query` and keeps both
//!   raw documents for inspection.
//! - HTTP goes through the `Transport` trait. `UreqTransport` is the default;
//!   tests plug in their own.
//! - `TransactConfig` is an explicit value, never global state.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod response;
pub mod types;
pub mod xml;

pub use client::{QueryState, Transact, NOT_EXECUTED_MESSAGE};
pub use config::TransactConfig;
pub use error::TransactError;
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use request::MailingRequest;
pub use response::MailingResponse;
pub use types::{Personalization, Recipient, RecipientDetail, TransactOptions};
pub use xml::Element;
