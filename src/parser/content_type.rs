//! `Content-Type` and `Content-Transfer-Encoding` header parsing.

use tracing::trace;

use crate::charset::CharsetDecoder;
use crate::model::entry::{ContentType, TransferEncoding};
use crate::parser::encoded_word::decode_encoded_word;
use crate::parser::{decode_header_bytes, header_value, is_continuation, lines};

/// Parsed `Content-Type` header of one MIME section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentTypeFrame {
    pub content_type: ContentType,
    /// Type string as written (first `;`-separated token).
    pub mime_type: String,
    pub name: Option<String>,
    /// Present for well-formed multipart headers.
    pub boundary: Option<String>,
    pub charset: Option<String>,
}

/// Parse the `Content-Type` header of a section's header block.
///
/// Scanning stops at the first blank line. Folded continuation lines are
/// joined with `;`. Without a `Content-Type` header the classification is
/// [`ContentType::Undefined`].
pub fn parse_content_type(headers: &[u8], decoder: &dyn CharsetDecoder) -> ContentTypeFrame {
    let mut buffer: Option<String> = None;

    for raw_line in lines(headers) {
        let line = decode_header_bytes(raw_line);

        if let Some(value) = buffer.as_mut() {
            if is_continuation(&line) {
                value.push(';');
                value.push_str(&line);
                continue;
            }
            break;
        }

        if line.is_empty() {
            break;
        }
        if let Some(value) = header_value(&line, "Content-Type") {
            buffer = Some(value.trim().to_string());
        }
    }

    match buffer {
        Some(value) => frame_from_value(&value, decoder),
        None => ContentTypeFrame::default(),
    }
}

/// Split an unfolded header value into type and attributes.
fn frame_from_value(value: &str, decoder: &dyn CharsetDecoder) -> ContentTypeFrame {
    let mut value = value.to_string();
    while value.contains(";;") {
        value = value.replace(";;", ";");
    }

    let mut tokens = value.trim().split(';');
    let mime_type = tokens.next().unwrap_or_default().trim().to_string();
    let mut frame = ContentTypeFrame {
        content_type: ContentType::classify(&mime_type),
        mime_type,
        ..Default::default()
    };

    for attr in tokens {
        let attr = attr.trim();
        if let Some(boundary) = attr.strip_prefix("boundary=") {
            frame.boundary = non_empty(boundary.trim().replace('"', ""));
        } else if let Some(name) = attr.strip_prefix("name=") {
            let name = name.trim();
            frame.name = decode_encoded_word(name, decoder)
                .filter(|decoded| !decoded.is_empty())
                .or_else(|| non_empty(name.replace('"', "")));
        } else if let Some(charset) = attr.strip_prefix("charset=") {
            frame.charset = non_empty(charset.trim().replace('"', ""));
        } else {
            trace!(attribute = attr, "Ignoring Content-Type attribute");
        }
    }

    frame
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Detect base64 transfer encoding in a section's header block.
///
/// Any other `Content-Transfer-Encoding` (or none) means no transfer decoding.
pub fn parse_transfer_encoding(headers: &[u8]) -> TransferEncoding {
    let mut result = TransferEncoding::Plain;
    for raw_line in lines(headers) {
        let line = decode_header_bytes(raw_line);
        if line.is_empty() {
            break;
        }
        if let Some(value) = header_value(&line, "Content-Transfer-Encoding") {
            if value.to_ascii_lowercase().contains("base64") {
                result = TransferEncoding::Base64;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::EncodingRsDecoder;

    fn frame(headers: &str) -> ContentTypeFrame {
        parse_content_type(headers.as_bytes(), &EncodingRsDecoder::new())
    }

    #[test]
    fn test_simple_text_plain() {
        let f = frame("Content-Type: text/plain; charset=\"utf-8\"\nSubject: x\n");
        assert_eq!(f.content_type, ContentType::TextPlain);
        assert_eq!(f.mime_type, "text/plain");
        assert_eq!(f.charset.as_deref(), Some("utf-8"));
        assert_eq!(f.boundary, None);
    }

    #[test]
    fn test_folded_multipart_boundary() {
        let f = frame(
            "MIME-Version: 1.0\r\nContent-Type: multipart/mixed;\r\n\tboundary=\"----=_Part_1\"\r\nFrom: a@b.c\r\n\r\nbody",
        );
        assert_eq!(f.content_type, ContentType::MultipartMixed);
        assert_eq!(f.boundary.as_deref(), Some("----=_Part_1"));
    }

    #[test]
    fn test_folded_value_at_end_of_block() {
        let f = frame("Content-Type: multipart/alternative;\n boundary=abc");
        assert_eq!(f.content_type, ContentType::MultipartAlternative);
        assert_eq!(f.boundary.as_deref(), Some("abc"));
    }

    #[test]
    fn test_encoded_name() {
        let f = frame("Content-Type: image/png; name=\"=?UTF-8?B?w6lsw6k=?=.png\"\n");
        assert_eq!(f.content_type, ContentType::ImagePng);
        assert_eq!(f.name.as_deref(), Some("élé"));
    }

    #[test]
    fn test_plain_name_unquoted() {
        let f = frame("Content-Type: application/pdf; name=\"report.pdf\"\n");
        assert_eq!(f.content_type, ContentType::Binary);
        assert_eq!(f.name.as_deref(), Some("report.pdf"));
    }

    #[test]
    fn test_attributes_are_case_sensitive() {
        let f = frame("Content-Type: multipart/mixed; Boundary=abc\n");
        assert_eq!(f.content_type, ContentType::MultipartMixed);
        assert_eq!(f.boundary, None);
    }

    #[test]
    fn test_missing_header_is_undefined() {
        let f = frame("Subject: hi\n\nContent-Type: text/plain\n");
        assert_eq!(f.content_type, ContentType::Undefined);
        assert_eq!(f.mime_type, "");
    }

    #[test]
    fn test_lowercase_header_name() {
        let f = frame("content-type: text/html\n");
        assert_eq!(f.content_type, ContentType::TextOther);
    }

    #[test]
    fn test_transfer_encoding() {
        assert_eq!(
            parse_transfer_encoding(b"Content-Transfer-Encoding: BASE64\n"),
            TransferEncoding::Base64
        );
        assert_eq!(
            parse_transfer_encoding(b"Content-Transfer-Encoding: quoted-printable\n"),
            TransferEncoding::Plain
        );
        assert_eq!(
            parse_transfer_encoding(b"Subject: x\n\nContent-Transfer-Encoding: base64\n"),
            TransferEncoding::Plain
        );
    }
}
