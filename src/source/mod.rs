//! Message sources: numbered collections of raw RFC 822 messages.
//!
//! Ids are 1-based sequence numbers in storage order, the way an IMAP
//! client numbers the messages of a selected mailbox.

pub mod maildir;
pub mod mbox;

use std::path::Path;

use crate::error::{MaildocError, Result};
use crate::model::document::Document;
use crate::parser::Parser;

pub use maildir::MaildirSource;
pub use mbox::MboxSource;

/// Which messages a [`MessageSource::search`] should return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchCriteria {
    #[default]
    All,
    /// Messages not yet marked as read.
    Unseen,
}

/// A mailbox from which raw messages can be fetched by id.
pub trait MessageSource {
    /// Number of messages in the source.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes of message `id`, without any mailbox framing.
    fn fetch(&mut self, id: u32) -> Result<Vec<u8>>;

    /// Ids of the messages matching `criteria`, ascending.
    fn search(&mut self, criteria: SearchCriteria) -> Result<Vec<u32>>;

    /// Fetch message `id` and parse it.
    fn fetch_document(&mut self, id: u32, parser: &Parser) -> Result<Document> {
        let raw = self.fetch(id)?;
        Ok(parser.parse(&raw))
    }
}

/// Open a directory as a Maildir or a file as an mbox.
pub fn open(path: impl AsRef<Path>) -> Result<Box<dyn MessageSource>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MaildocError::FileNotFound(path.to_path_buf()));
    }
    if path.is_dir() {
        Ok(Box::new(MaildirSource::open(path)?))
    } else {
        Ok(Box::new(MboxSource::open(path)?))
    }
}

/// Map a 1-based id to a vector index.
pub(crate) fn index_of(id: u32, len: usize) -> Result<usize> {
    match (id as usize).checked_sub(1) {
        Some(idx) if idx < len => Ok(idx),
        _ => Err(MaildocError::MessageNotFound(id)),
    }
}

/// Ids (1-based) of the messages for which `is_unseen` holds, or all of them.
pub(crate) fn select_ids<T>(
    messages: &[T],
    criteria: SearchCriteria,
    is_unseen: impl Fn(&T) -> bool,
) -> Vec<u32> {
    messages
        .iter()
        .enumerate()
        .filter(|(_, m)| match criteria {
            SearchCriteria::All => true,
            SearchCriteria::Unseen => is_unseen(m),
        })
        .map(|(idx, _)| idx as u32 + 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_of() {
        assert_eq!(index_of(1, 3).unwrap(), 0);
        assert_eq!(index_of(3, 3).unwrap(), 2);
        assert!(matches!(index_of(0, 3), Err(MaildocError::MessageNotFound(0))));
        assert!(matches!(index_of(4, 3), Err(MaildocError::MessageNotFound(4))));
    }

    #[test]
    fn test_select_ids() {
        let seen = [true, false, true, false];
        assert_eq!(select_ids(&seen, SearchCriteria::All, |s| !s), vec![1, 2, 3, 4]);
        assert_eq!(select_ids(&seen, SearchCriteria::Unseen, |s| !s), vec![2, 4]);
    }

    #[test]
    fn test_open_missing_path() {
        let err = open("/definitely/not/a/mailbox").err().unwrap();
        assert!(matches!(err, MaildocError::FileNotFound(_)));
    }
}
