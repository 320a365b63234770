//! The parsed message as a whole.

use chrono::{DateTime, FixedOffset};

use super::address::EmailAddress;
use super::entry::{ContentType, Entry};
use crate::parser::Parser;

/// A decomposed email message: envelope fields plus the MIME entry tree.
///
/// Built once by [`Parser::parse`] and read-only afterwards, except for the
/// free-form [`comment`](Document::comment) annotation.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub(crate) raw: Vec<u8>,
    pub(crate) return_path: String,
    pub(crate) from: EmailAddress,
    pub(crate) to: EmailAddress,
    pub(crate) subject: String,
    pub(crate) date: Option<DateTime<FixedOffset>>,
    pub(crate) root: Option<Entry>,
    comment: Option<String>,
}

impl Document {
    /// Parse with the default [`Parser`] settings.
    pub fn parse(raw: &[u8]) -> Self {
        Parser::new().parse(raw)
    }

    /// The bytes this document was parsed from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn return_path(&self) -> &str {
        &self.return_path
    }

    pub fn from(&self) -> &EmailAddress {
        &self.from
    }

    pub fn to(&self) -> &EmailAddress {
        &self.to
    }

    /// Decoded subject with runs of spaces collapsed.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// `None` when the `Date:` header was missing or not understood.
    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        self.date
    }

    /// Whole-message MIME node; `None` when headers never ended.
    pub fn root(&self) -> Option<&Entry> {
        self.root.as_ref()
    }

    /// Content leaves in discovery order. Never contains a multipart node.
    pub fn entries(&self) -> Vec<&Entry> {
        self.root
            .as_ref()
            .map(|root| root.leaves().collect())
            .unwrap_or_default()
    }

    /// First `text/plain` leaf, decoded.
    pub fn text_body(&self) -> Option<&str> {
        self.entries()
            .into_iter()
            .find(|e| e.content_type == ContentType::TextPlain)
            .and_then(|e| e.text())
    }

    pub fn set_comment(&mut self, text: impl Into<String>) {
        self.comment = Some(text.into());
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}
