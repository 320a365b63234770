//! Streaming mbox scanner.
//!
//! Reads the file line-by-line with a large buffer and records where each
//! message starts and ends. Message bodies are only read on `fetch`.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{MaildocError, Result};
use crate::parser::eml::strip_envelope_line;
use crate::parser::header_value;

use super::{index_of, select_ids, MessageSource, SearchCriteria};

/// Size of the internal read buffer (1 MB for fast sequential reads on modern SSDs).
const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Default maximum message size in bytes (256 MB).
pub const MAX_MESSAGE_SIZE: u64 = 256 * 1024 * 1024;

/// Location and read state of one message inside the mbox file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MboxMessage {
    /// Byte offset of the `From ` separator line.
    pub offset: u64,
    /// Length in bytes, separator line included.
    pub length: u64,
    /// `Status:` header carries the `R` (read) flag.
    pub seen: bool,
}

/// An mbox file indexed by a single sequential scan.
///
/// The scanner is tolerant of:
///
/// - Mixed `\n` and `\r\n` line endings
/// - `From ` lines not preceded by a blank line (logs a warning)
/// - Truncated messages at EOF
/// - UTF-8 BOM at the start of the file
#[derive(Debug)]
pub struct MboxSource {
    path: PathBuf,
    messages: Vec<MboxMessage>,
    max_message_size: u64,
}

impl MboxSource {
    /// Scan `path` and record every message boundary.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| MaildocError::io(&path, e))?;
        let messages = scan(BufReader::with_capacity(READ_BUFFER_SIZE, file))
            .map_err(|e| MaildocError::io(&path, e))?;
        debug!(path = %path.display(), count = messages.len(), "Scanned mbox");
        Ok(Self {
            path,
            messages,
            max_message_size: MAX_MESSAGE_SIZE,
        })
    }

    /// Cap the number of bytes `fetch` reads per message; longer messages
    /// are truncated with a warning.
    pub fn with_max_message_size(mut self, max_message_size: u64) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn messages(&self) -> &[MboxMessage] {
        &self.messages
    }
}

impl MessageSource for MboxSource {
    fn len(&self) -> usize {
        self.messages.len()
    }

    fn fetch(&mut self, id: u32) -> Result<Vec<u8>> {
        let msg = self.messages[index_of(id, self.messages.len())?];
        let length = if msg.length > self.max_message_size {
            warn!(
                id,
                offset = msg.offset,
                length = msg.length,
                max_size = self.max_message_size,
                "Message exceeds maximum size, truncating body"
            );
            self.max_message_size
        } else {
            msg.length
        };
        let raw = read_message_at(&self.path, msg.offset, length)?;
        Ok(strip_envelope_line(&raw).to_vec())
    }

    fn search(&mut self, criteria: SearchCriteria) -> Result<Vec<u32>> {
        Ok(select_ids(&self.messages, criteria, |m| !m.seen))
    }
}

/// Walk the stream once, returning message boundaries and read flags.
fn scan(mut reader: impl BufRead) -> std::io::Result<Vec<MboxMessage>> {
    let mut messages: Vec<MboxMessage> = Vec::new();
    let mut current: Option<MboxMessage> = None;
    let mut current_offset: u64 = 0;
    let mut prev_line_was_empty = true;
    let mut first_line = true;
    let mut in_headers = false;

    // Reusable line buffer
    let mut line_buf: Vec<u8> = Vec::with_capacity(4096);

    loop {
        line_buf.clear();
        let line_len = reader.read_until(b'\n', &mut line_buf)? as u64;
        if line_len == 0 {
            break; // EOF
        }

        if is_mbox_separator(&line_buf) {
            if !first_line && !prev_line_was_empty {
                warn!(
                    offset = current_offset,
                    "Found 'From ' separator without preceding blank line"
                );
            }
            if let Some(mut msg) = current.take() {
                msg.length = current_offset - msg.offset;
                messages.push(msg);
            }
            current = Some(MboxMessage {
                offset: current_offset,
                length: 0,
                seen: false,
            });
            in_headers = true;
        } else if in_headers {
            if is_blank_line(&line_buf) {
                in_headers = false;
            } else if let Some(msg) = current.as_mut() {
                let line = String::from_utf8_lossy(&line_buf);
                if let Some(status) = header_value(line.trim_end(), "Status") {
                    msg.seen = status.contains('R');
                }
            }
        } else if first_line {
            debug!("Data before the first 'From ' separator ignored");
        }

        prev_line_was_empty = is_blank_line(&line_buf);
        first_line = false;
        current_offset += line_len;
    }

    // Flush last message
    if let Some(mut msg) = current {
        msg.length = current_offset - msg.offset;
        messages.push(msg);
    }

    Ok(messages)
}

/// Read a single message at the given offset and length.
///
/// Uses `seek` to jump directly to the message without scanning the file.
pub fn read_message_at(path: impl AsRef<Path>, offset: u64, length: u64) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let length = usize::try_from(length).map_err(|_| MaildocError::MessageTooLarge(length))?;
    let mut file = File::open(path).map_err(|e| MaildocError::io(path, e))?;
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| MaildocError::io(path, e))?;
    let mut buffer = vec![0u8; length];
    file.read_exact(&mut buffer)
        .map_err(|e| MaildocError::io(path, e))?;
    Ok(buffer)
}

/// Check whether a line is an mbox separator (`From ` at the start).
fn is_mbox_separator(line: &[u8]) -> bool {
    // Skip BOM if present at very start
    let line = line.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(line);
    line.starts_with(b"From ")
}

/// Check whether a line is blank (empty or only whitespace / CR / LF).
fn is_blank_line(line: &[u8]) -> bool {
    line.iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b' ' || b == b'\t')
}

#[cfg(test)]
mod tests {
    use super::*;

    const MBOX: &str = "From a@example.com Thu Jan 01 00:00:00 2024\nSubject: one\nStatus: RO\n\nfirst\n\nFrom b@example.com Thu Jan 01 00:00:01 2024\nSubject: two\n\nsecond\n";

    #[test]
    fn test_is_mbox_separator() {
        assert!(is_mbox_separator(
            b"From user@example.com Thu Jan 01 00:00:00 2024\n"
        ));
        assert!(!is_mbox_separator(b"from user@example.com\n")); // lowercase
        assert!(!is_mbox_separator(b">From user@example.com\n")); // escaped
        assert!(!is_mbox_separator(b"From: user@example.com\n"));
        assert!(!is_mbox_separator(b"Subject: From here\n"));
    }

    #[test]
    fn test_is_mbox_separator_with_bom() {
        let mut line = vec![0xEF, 0xBB, 0xBF];
        line.extend_from_slice(b"From user@example.com Thu Jan 01 00:00:00 2024\n");
        assert!(is_mbox_separator(&line));
    }

    #[test]
    fn test_is_blank_line() {
        assert!(is_blank_line(b"\n"));
        assert!(is_blank_line(b"\r\n"));
        assert!(is_blank_line(b"  \n"));
        assert!(!is_blank_line(b"hello\n"));
    }

    #[test]
    fn test_scan_offsets_and_status() {
        let messages = scan(MBOX.as_bytes()).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].offset, 0);
        assert!(messages[0].seen);
        assert!(!messages[1].seen);
        assert_eq!(
            messages[0].length + messages[1].length,
            MBOX.len() as u64
        );
        assert!(MBOX[messages[1].offset as usize..].starts_with("From b@"));
    }

    #[test]
    fn test_scan_separator_without_blank_line() {
        let data = "From a Thu Jan 01 00:00:00 2024\nSubject: one\n\nbody\nFrom b Thu Jan 01 00:00:00 2024\nSubject: two\n\nbody\n";
        assert_eq!(scan(data.as_bytes()).unwrap().len(), 2);
    }

    #[test]
    fn test_scan_status_only_in_headers() {
        let data = "From a Thu Jan 01 00:00:00 2024\nSubject: one\n\nStatus: RO\n";
        let messages = scan(data.as_bytes()).unwrap();
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].seen);
    }

    #[test]
    fn test_scan_crlf() {
        let data = "From a Thu Jan 01 00:00:00 2024\r\nStatus: R\r\n\r\nbody\r\n\r\nFrom b Thu Jan 01 00:00:00 2024\r\n\r\nbody\r\n";
        let messages = scan(data.as_bytes()).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].seen);
    }

    #[test]
    fn test_scan_empty() {
        assert!(scan(&b""[..]).unwrap().is_empty());
    }

    #[test]
    fn test_fetch_strips_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.mbox");
        std::fs::write(&path, MBOX).unwrap();

        let mut source = MboxSource::open(&path).unwrap();
        assert_eq!(source.len(), 2);
        let raw = source.fetch(2).unwrap();
        assert!(raw.starts_with(b"Subject: two"));
        assert!(matches!(
            source.fetch(3),
            Err(MaildocError::MessageNotFound(3))
        ));
        assert_eq!(source.search(SearchCriteria::Unseen).unwrap(), vec![2]);
    }

    #[test]
    fn test_single_separator_spans_file() {
        let data = "From x\nSubject: big\n\nno further separator\nstill the same message\n";
        let messages = scan(data.as_bytes()).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].length, data.len() as u64);
    }

    #[test]
    fn test_fetch_truncates_oversized_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.mbox");
        let mut data = String::from("From x Thu Jan 01 00:00:00 2024\nSubject: big\n\n");
        data.push_str(&"y".repeat(4096));
        std::fs::write(&path, &data).unwrap();

        let mut source = MboxSource::open(&path).unwrap().with_max_message_size(64);
        assert_eq!(source.messages()[0].length, data.len() as u64);

        let raw = source.fetch(1).unwrap();
        assert_eq!(raw, &data.as_bytes()[32..64]);
        assert!(raw.starts_with(b"Subject: big"));
    }

    #[test]
    fn test_fetch_within_limit_is_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.mbox");
        std::fs::write(&path, MBOX).unwrap();

        let mut source = MboxSource::open(&path).unwrap();
        let raw = source.fetch(1).unwrap();
        assert!(raw.ends_with(b"first\n\n"));
    }
}
