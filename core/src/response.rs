//! Response interpreter for `XTMAILING_RESPONSE` documents.

use std::str::FromStr;

use crate::error::TransactError;
use crate::types::RecipientDetail;
use crate::xml::Element;

pub const ROOT: &str = "XTMAILING_RESPONSE";

/// A parsed reply from the transactional endpoint.
///
/// Only `status` decides the verdict. Counts and per-recipient details are
/// carried for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailingResponse {
    pub campaign_id: String,
    pub transaction_id: String,
    pub recipients_received: Option<u32>,
    pub emails_sent: Option<u32>,
    pub number_errors: Option<u32>,
    pub status: i32,
    pub error_code: Option<i32>,
    pub error_string: String,
    pub recipient_details: Vec<RecipientDetail>,
}

impl MailingResponse {
    /// Parse a response body. Fails when the body is not XML, the root is
    /// not `XTMAILING_RESPONSE`, or `STATUS` is missing or not an integer.
    pub fn parse(xml: &str) -> Result<Self, TransactError> {
        let root = Element::parse(xml)?;
        if root.name() != ROOT {
            return Err(TransactError::Parse(format!(
                "expected <{ROOT}> root, found <{}>",
                root.name()
            )));
        }

        let status = root
            .child_text("STATUS")
            .ok_or_else(|| TransactError::Parse("missing STATUS".to_string()))?;
        let status = status
            .trim()
            .parse::<i32>()
            .map_err(|_| TransactError::Parse(format!("STATUS is not an integer: {status:?}")))?;

        let recipient_details = root
            .children_named("RECIPIENT_DETAIL")
            .map(|detail| RecipientDetail {
                email: owned_text(detail, "EMAIL"),
                send_status: number(detail, "SEND_STATUS"),
                error_code: number(detail, "ERROR_CODE"),
                error_string: owned_text(detail, "ERROR_STRING"),
            })
            .collect();

        Ok(Self {
            campaign_id: owned_text(&root, "CAMPAIGN_ID"),
            transaction_id: owned_text(&root, "TRANSACTION_ID"),
            recipients_received: number(&root, "RECIPIENTS_RECEIVED"),
            emails_sent: number(&root, "EMAILS_SENT"),
            number_errors: number(&root, "NUMBER_ERRORS"),
            status,
            error_code: number(&root, "ERROR_CODE"),
            error_string: owned_text(&root, "ERROR_STRING"),
            recipient_details,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }

    /// `ERROR_STRING` verbatim on failure, `None` on success.
    pub fn error_message(&self) -> Option<&str> {
        if self.is_success() {
            None
        } else {
            Some(&self.error_string)
        }
    }

    /// Recipients the service reported as not sent.
    pub fn failed_recipients(&self) -> impl Iterator<Item = &RecipientDetail> {
        self.recipient_details
            .iter()
            .filter(|d| d.send_status.is_some_and(|s| s != 0))
    }
}

fn owned_text(element: &Element, name: &str) -> String {
    element.child_text(name).unwrap_or_default().to_string()
}

// Blank and non-numeric values both read as absent.
fn number<T: FromStr>(element: &Element, name: &str) -> Option<T> {
    element.child_text(name).and_then(|t| t.trim().parse().ok())
}
