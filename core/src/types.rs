//! Domain types for the transactional mailing API.
//!
//! # Design
//! Request-side types derive `Deserialize` so recipient lists can come
//! straight from JSON or TOML fixtures. Response-side types are filled in by
//! the response interpreter from the XML tree and are never serialized back.

use serde::{Deserialize, Serialize};

/// A named substitution value merged into the template for one recipient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Personalization {
    pub tag_name: String,
    pub value: String,
}

impl Personalization {
    pub fn new(tag_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            value: value.into(),
        }
    }
}

/// One addressee of a transactional send.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipient {
    pub email: String,
    #[serde(default)]
    pub personalizations: Vec<Personalization>,
}

impl Recipient {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            personalizations: Vec::new(),
        }
    }

    pub fn with_personalization(mut self, tag_name: impl Into<String>, value: impl Into<String>) -> Self {
        self.personalizations.push(Personalization::new(tag_name, value));
        self
    }
}

/// Per-request options.
///
/// A non-empty `save_columns` list emits a `SAVE_COLUMNS` block and limits
/// each recipient's personalizations to the listed tag names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactOptions {
    #[serde(default)]
    pub save_columns: Vec<String>,
}

impl TransactOptions {
    pub fn with_save_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            save_columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn saves_columns(&self) -> bool {
        !self.save_columns.is_empty()
    }
}

/// Delivery outcome for one recipient as reported by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientDetail {
    pub email: String,
    pub send_status: Option<i32>,
    pub error_code: Option<i32>,
    pub error_string: String,
}
