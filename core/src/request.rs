//! Request assembler for `XTMAILING` documents.
//!
//! # Design
//! `MailingRequest` is plain data. Every `add_*` method returns a new
//! `Element` built from its inputs and never touches a shared document, so
//! the same request can be rendered any number of times with identical
//! output. Absent input is reported as `None` instead of an error; callers
//! decide whether "nothing to append" matters to them.

use crate::error::TransactError;
use crate::types::{Personalization, Recipient, TransactOptions};
use crate::xml::Element;

pub const ROOT: &str = "XTMAILING";
const BODY_TYPE: &str = "HTML";

/// Everything needed to render one transactional send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailingRequest {
    pub campaign_id: String,
    pub recipients: Vec<Recipient>,
    pub options: TransactOptions,
}

impl MailingRequest {
    pub fn new(campaign_id: impl Into<String>, recipients: Vec<Recipient>, options: TransactOptions) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            recipients,
            options,
        }
    }

    /// The `XTMAILING` root with its fixed header fields and, when
    /// configured, the `SAVE_COLUMNS` block. No recipients.
    fn header(&self) -> Element {
        let root = Element::new(ROOT)
            .with_child(Element::text("CAMPAIGN_ID", self.campaign_id.as_str()))
            .with_child(Element::text("SHOW_ALL_SEND_DETAIL", "true"))
            .with_child(Element::text("SEND_AS_BATCH", "false"))
            .with_child(Element::text("NO_RETRY_ON_FAILURE", "false"));

        if !self.options.saves_columns() {
            return root;
        }
        let columns = self
            .options
            .save_columns
            .iter()
            .map(|name| Element::text("COLUMN_NAME", name.as_str()));
        root.with_child(Element::new("SAVE_COLUMNS").with_children(columns))
    }

    /// Render one `RECIPIENT` element.
    ///
    /// Returns `None` when there is no recipient or its email is empty.
    pub fn add_recipient(&self, recipient: Option<&Recipient>) -> Option<Element> {
        let recipient = recipient.filter(|r| !r.email.is_empty())?;
        let element = Element::new("RECIPIENT")
            .with_child(Element::text("EMAIL", recipient.email.as_str()))
            .with_child(Element::text("BODY_TYPE", BODY_TYPE));

        if recipient.personalizations.is_empty() {
            Some(element)
        } else {
            Some(self.add_personalizations(element, &recipient.personalizations))
        }
    }

    /// Append one `PERSONALIZATION` block per pair, in input order.
    ///
    /// With save columns configured, only tags named in that list are kept.
    /// Tag names compare case-sensitively.
    pub fn add_personalizations(&self, recipient: Element, personalizations: &[Personalization]) -> Element {
        let blocks = personalizations
            .iter()
            .filter(|p| !self.options.saves_columns() || self.options.save_columns.contains(&p.tag_name))
            .map(|p| {
                Element::new("PERSONALIZATION")
                    .with_child(Element::text("TAG_NAME", p.tag_name.as_str()))
                    .with_child(Element::text("VALUE", p.value.as_str()))
            });
        recipient.with_children(blocks)
    }

    /// Render the full `XTMAILING` element with `recipients` appended in order.
    ///
    /// Returns `None` when no list is given. An empty list yields a document
    /// with no `RECIPIENT` elements.
    pub fn add_recipients(&self, recipients: Option<&[Recipient]>) -> Option<Element> {
        let recipients = recipients?;
        let rendered = recipients.iter().filter_map(|r| self.add_recipient(Some(r)));
        Some(self.header().with_children(rendered))
    }

    pub fn to_element(&self) -> Element {
        let rendered = self.recipients.iter().filter_map(|r| self.add_recipient(Some(r)));
        self.header().with_children(rendered)
    }

    /// Serialize to the exact wire document posted to the endpoint.
    pub fn to_xml(&self) -> Result<String, TransactError> {
        self.to_element().to_document()
    }

    /// Read a serialized request back into its data form.
    pub fn from_xml(xml: &str) -> Result<Self, TransactError> {
        let root = Element::parse(xml)?;
        if root.name() != ROOT {
            return Err(TransactError::Parse(format!(
                "expected <{ROOT}> root, found <{}>",
                root.name()
            )));
        }

        let save_columns: Vec<String> = root
            .child("SAVE_COLUMNS")
            .map(|block| {
                block
                    .children_named("COLUMN_NAME")
                    .map(|c| c.text_content().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let recipients: Vec<Recipient> = root
            .children_named("RECIPIENT")
            .map(|r| Recipient {
                email: r.child_text("EMAIL").unwrap_or_default().to_string(),
                personalizations: r
                    .children_named("PERSONALIZATION")
                    .map(|p| Personalization {
                        tag_name: p.child_text("TAG_NAME").unwrap_or_default().to_string(),
                        value: p.child_text("VALUE").unwrap_or_default().to_string(),
                    })
                    .collect(),
            })
            .collect();

        Ok(Self {
            campaign_id: root.child_text("CAMPAIGN_ID").unwrap_or_default().to_string(),
            recipients,
            options: TransactOptions { save_columns },
        })
    }
}
