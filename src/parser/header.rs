//! Envelope header parsing: the top-level state machine over the header block.
//!
//! Extracts `From`, `To`, `Subject`, `Date` and `Return-Path`, handling folded
//! `Subject` and `From` values. `To` is read from its first line only;
//! continuation lines of `To` are ignored. When the blank line ending the
//! headers is reached the whole buffer is handed to the MIME entry parser.

use tracing::debug;

use crate::model::address::EmailAddress;
use crate::model::document::Document;
use crate::parser::date::parse_date;
use crate::parser::encoded_word::decode_encoded_word;
use crate::parser::mime::parse_entry;
use crate::parser::{decode_header_bytes, header_value, is_continuation, lines, ParseContext};

/// Header currently accumulating continuation lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderState {
    Other,
    InSubject,
    InFrom,
}

/// Parse a complete message into a [`Document`].
pub(crate) fn parse_document(raw: &[u8], ctx: &ParseContext<'_>) -> Document {
    let mut doc = Document::default();
    doc.raw = raw.to_vec();

    let mut state = HeaderState::Other;
    let mut buffer = String::new();
    let mut reached_body = false;

    for raw_line in lines(raw) {
        let line = decode_header_bytes(raw_line);

        if is_continuation(&line) {
            match state {
                HeaderState::InSubject => {
                    let part = decode_or_trim(&line, ctx);
                    buffer.push(' ');
                    buffer.push_str(&part);
                }
                HeaderState::InFrom => {
                    buffer.push(' ');
                    buffer.push_str(line.trim());
                }
                HeaderState::Other => {}
            }
            continue;
        }

        finish_state(&mut doc, &mut state, &mut buffer, ctx);

        if line.is_empty() {
            reached_body = true;
            break;
        }

        if let Some(value) = header_value(&line, "Return-Path") {
            doc.return_path = EmailAddress::extract_address(value);
        } else if let Some(value) = header_value(&line, "From") {
            buffer = value.trim().to_string();
            state = HeaderState::InFrom;
        } else if let Some(value) = header_value(&line, "To") {
            doc.to = EmailAddress::parse(value, ctx.decoder);
        } else if let Some(value) = header_value(&line, "Subject") {
            buffer = decode_encoded_word(&line, ctx.decoder)
                .map(|decoded| decoded.trim().to_string())
                .filter(|decoded| !decoded.is_empty())
                .unwrap_or_else(|| value.trim().to_string());
            state = HeaderState::InSubject;
        } else if let Some(value) = header_value(&line, "Date") {
            doc.date = parse_date(value.trim());
            if doc.date.is_none() {
                debug!(date = value.trim(), "Unparsable Date header");
            }
        }
    }

    if reached_body {
        doc.root = Some(parse_entry(raw, 0, ctx));
    } else {
        finish_state(&mut doc, &mut state, &mut buffer, ctx);
        debug!("No blank line after headers, message has no entries");
    }

    doc
}

/// Store the accumulated value of the header being folded, if any.
fn finish_state(
    doc: &mut Document,
    state: &mut HeaderState,
    buffer: &mut String,
    ctx: &ParseContext<'_>,
) {
    match std::mem::replace(state, HeaderState::Other) {
        HeaderState::InSubject => doc.subject = collapse_spaces(buffer),
        HeaderState::InFrom => doc.from = EmailAddress::parse(buffer, ctx.decoder),
        HeaderState::Other => {}
    }
    buffer.clear();
}

/// Decode a subject continuation line, falling back to its trimmed text.
fn decode_or_trim(line: &str, ctx: &ParseContext<'_>) -> String {
    decode_encoded_word(line, ctx.decoder)
        .map(|decoded| decoded.trim().to_string())
        .filter(|decoded| !decoded.is_empty())
        .unwrap_or_else(|| line.trim().to_string())
}

/// Trim and collapse every run of spaces to a single space.
fn collapse_spaces(s: &str) -> String {
    s.split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::EncodingRsDecoder;
    use crate::parser::DEFAULT_MAX_DEPTH;

    fn parse(raw: &str) -> Document {
        let decoder = EncodingRsDecoder::new();
        let ctx = ParseContext {
            decoder: &decoder,
            max_depth: DEFAULT_MAX_DEPTH,
        };
        parse_document(raw.as_bytes(), &ctx)
    }

    #[test]
    fn test_envelope_fields() {
        let doc = parse(
            "Return-Path: <bounce@example.com>\nFrom: John Doe <john@example.com>\nTo: Jane <jane@example.com>\nSubject: Hello World\nDate: Mon, 02 Jan 2023 15:04:05 +0200\n\nBody\n",
        );
        assert_eq!(doc.return_path(), "bounce@example.com");
        assert_eq!(doc.from().address, "john@example.com");
        assert_eq!(doc.from().name, "John Doe");
        assert_eq!(doc.to().address, "jane@example.com");
        assert_eq!(doc.to().name, "Jane");
        assert_eq!(doc.subject(), "Hello World");
        assert!(doc.date().is_some());
        assert_eq!(doc.entries().len(), 1);
    }

    #[test]
    fn test_folded_subject_matches_single_line() {
        let single = parse("Subject: =?UTF-8?Q?Caf=C3=A9=20du=20jour?=\n\nx\n");
        let folded = parse("Subject: =?UTF-8?Q?Caf=C3=A9?=\n =?UTF-8?Q?du?=\n\t=?UTF-8?Q?jour?=\n\nx\n");
        assert_eq!(single.subject(), "Café du jour");
        assert_eq!(folded.subject(), single.subject());

        let plain_single = parse("Subject: A long subject line\n\nx\n");
        let plain_folded = parse("Subject: A long\n    subject\n\tline\n\nx\n");
        assert_eq!(plain_single.subject(), plain_folded.subject());
    }

    #[test]
    fn test_subject_space_runs_collapsed() {
        let doc = parse("Subject: too    many   spaces\n\nx\n");
        assert_eq!(doc.subject(), "too many spaces");
    }

    #[test]
    fn test_folded_from() {
        let doc = parse("From: =?UTF-8?B?Sm9zw6kgR2FyY8OtYQ==?=\n <jose@example.com>\nSubject: x\n\nbody\n");
        assert_eq!(doc.from().address, "jose@example.com");
        assert_eq!(doc.from().name, "José García");
    }

    #[test]
    fn test_to_continuation_ignored() {
        let doc = parse("To: first@example.com\n second@example.com\n\nbody\n");
        assert_eq!(doc.to().address, "first@example.com");
    }

    #[test]
    fn test_case_insensitive_header_names() {
        let doc = parse("FROM: a@example.com\nsubject: lower\n\nbody\n");
        assert_eq!(doc.from().address, "a@example.com");
        assert_eq!(doc.subject(), "lower");
    }

    #[test]
    fn test_crlf_headers() {
        let doc = parse("Subject: crlf\r\nFrom: a@example.com\r\n\r\nbody\r\n");
        assert_eq!(doc.subject(), "crlf");
        assert_eq!(doc.from().address, "a@example.com");
        assert_eq!(doc.entries().len(), 1);
    }

    #[test]
    fn test_no_blank_line_keeps_envelope() {
        let doc = parse("From: a@example.com\nSubject: only headers\n");
        assert_eq!(doc.from().address, "a@example.com");
        assert_eq!(doc.subject(), "only headers");
        assert!(doc.root().is_none());
        assert!(doc.entries().is_empty());
    }

    #[test]
    fn test_unparsable_date_is_absent() {
        let doc = parse("Date: yesterday\nSubject: x\n\nbody\n");
        assert!(doc.date().is_none());
        assert_eq!(doc.subject(), "x");
    }

    #[test]
    fn test_collapse_spaces() {
        assert_eq!(collapse_spaces("  a  b   c "), "a b c");
        assert_eq!(collapse_spaces(""), "");
    }
}
