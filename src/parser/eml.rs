//! Parser for individual `.eml` files (RFC 822 messages without MBOX framing).

use std::path::Path;

use crate::error::{MaildocError, Result};
use crate::model::document::Document;
use crate::parser::Parser;

/// Read and parse a single `.eml` file.
pub fn parse_eml(path: impl AsRef<Path>, parser: &Parser) -> Result<Document> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| MaildocError::io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "Parsing EML file");
    Ok(parser.parse(strip_envelope_line(&data)))
}

/// Skip a UTF-8 BOM and a leading MBOX `From ` separator line, if present.
///
/// Messages saved from an MBOX often keep their separator line, which is not
/// an RFC 822 header.
pub fn strip_envelope_line(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);

    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_from_line() {
        let data = b"From user@example.com Thu Jan 01 00:00:00 2024\nSubject: Test\n\nBody\n";
        assert!(strip_envelope_line(data).starts_with(b"Subject:"));
    }

    #[test]
    fn test_strip_keeps_from_header() {
        let data = b"From: user@example.com\nSubject: Test\n\nBody\n";
        assert_eq!(strip_envelope_line(data), data);
    }

    #[test]
    fn test_strip_bom() {
        let mut data = vec![0xEF, 0xBB, 0xBF];
        data.extend_from_slice(b"Subject: Test\n\nBody\n");
        assert!(strip_envelope_line(&data).starts_with(b"Subject:"));
    }

    #[test]
    fn test_parse_eml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("single.eml");
        std::fs::write(
            &path,
            "From: Test Sender <sender@example.com>\nSubject: Single EML Test\n\nHello\n",
        )
        .unwrap();

        let doc = parse_eml(&path, &Parser::new()).unwrap();
        assert_eq!(doc.subject(), "Single EML Test");
        assert_eq!(doc.from().name, "Test Sender");
    }

    #[test]
    fn test_parse_eml_missing_file() {
        let err = parse_eml("/definitely/not/here.eml", &Parser::new()).unwrap_err();
        assert!(matches!(err, MaildocError::FileNotFound(_)));
    }
}
