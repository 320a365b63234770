//! Maildir directories: one file per message under `cur/` and `new/`.
//!
//! File names follow `<unique>[:2,<flags>]`; the `S` flag marks a message
//! as seen. Anything still in `new/` has not been looked at by a client.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MaildocError, Result};

use super::{index_of, select_ids, MessageSource, SearchCriteria};

/// One message file of a Maildir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaildirMessage {
    pub path: PathBuf,
    pub seen: bool,
}

/// A Maildir listed once at open time, ordered by file name.
#[derive(Debug)]
pub struct MaildirSource {
    root: PathBuf,
    messages: Vec<MaildirMessage>,
}

impl MaildirSource {
    /// List `cur/` and `new/` of the Maildir at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let cur = root.join("cur");
        let new = root.join("new");
        if !cur.is_dir() || !new.is_dir() {
            return Err(MaildocError::InvalidMaildir(root));
        }

        let mut messages = Vec::new();
        for (dir, is_new) in [(&cur, false), (&new, true)] {
            for (path, name) in list_files(dir)? {
                let seen = !is_new && has_seen_flag(&name);
                messages.push(MaildirMessage { path, seen });
            }
        }
        messages.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

        debug!(path = %root.display(), count = messages.len(), "Listed Maildir");
        Ok(Self { root, messages })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn messages(&self) -> &[MaildirMessage] {
        &self.messages
    }
}

impl MessageSource for MaildirSource {
    fn len(&self) -> usize {
        self.messages.len()
    }

    fn fetch(&mut self, id: u32) -> Result<Vec<u8>> {
        let msg = &self.messages[index_of(id, self.messages.len())?];
        std::fs::read(&msg.path).map_err(|e| MaildocError::io(&msg.path, e))
    }

    fn search(&mut self, criteria: SearchCriteria) -> Result<Vec<u32>> {
        Ok(select_ids(&self.messages, criteria, |m| !m.seen))
    }
}

/// Regular, non-hidden files of `dir` with their names.
fn list_files(dir: &Path) -> Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| MaildocError::io(dir, e))? {
        let entry = entry.map_err(|e| MaildocError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !entry.path().is_file() {
            continue;
        }
        files.push((entry.path(), name));
    }
    Ok(files)
}

/// Whether the info part after `:2,` contains the `S` flag.
fn has_seen_flag(file_name: &str) -> bool {
    file_name
        .find(":2,")
        .is_some_and(|i| file_name[i + 3..].contains('S'))
}
