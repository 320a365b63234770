//! Boundary-based splitting of multipart sections.

use tracing::warn;

use crate::charset::CharsetDecoder;
use crate::parser::content_type::parse_content_type;
use crate::parser::{find_bytes, preview};

/// Dominant line delimiter of a buffer.
///
/// `"\r\n"` when the first newline is preceded by a carriage return,
/// `"\n"` otherwise, `None` when the buffer has no newline at all.
pub fn primary_line_delimiter(data: &[u8]) -> Option<&'static str> {
    let lf = data.iter().position(|&b| b == b'\n')?;
    match find_bytes(data, b"\r\n", 0) {
        Some(crlf) if crlf < lf => Some("\r\n"),
        _ => Some("\n"),
    }
}

/// Split a multipart section (headers + body) into its sub-sections.
///
/// The boundary is read again from the section's own headers. Each returned
/// slice starts at its `--boundary` line and is trimmed. Preamble and
/// epilogue are dropped. An empty result means no parts, or that the section
/// was malformed (logged).
pub fn split_multipart<'a>(section: &'a [u8], decoder: &dyn CharsetDecoder) -> Vec<&'a [u8]> {
    let Some(delimiter) = primary_line_delimiter(section) else {
        warn!("Line delimiter not found in multipart section");
        return Vec::new();
    };

    let Some(boundary) = parse_content_type(section, decoder).boundary else {
        warn!(section = %preview(section), "Boundary tag not found");
        return Vec::new();
    };

    let begin = format!("--{boundary}{delimiter}");
    let end = format!("--{boundary}--");

    let mut starts = Vec::new();
    let mut from = 0;
    while let Some(pos) = find_bytes(section, begin.as_bytes(), from) {
        starts.push(pos);
        from = pos + begin.len();
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let stop = match starts.get(i + 1) {
                Some(&next) => next,
                None => find_bytes(section, end.as_bytes(), start + 1).unwrap_or(section.len()),
            };
            section[start..stop].trim_ascii()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::EncodingRsDecoder;

    fn split(section: &str) -> Vec<String> {
        split_multipart(section.as_bytes(), &EncodingRsDecoder::new())
            .into_iter()
            .map(|part| String::from_utf8_lossy(part).into_owned())
            .collect()
    }

    #[test]
    fn test_primary_line_delimiter() {
        assert_eq!(primary_line_delimiter(b"a\r\nb\nc"), Some("\r\n"));
        assert_eq!(primary_line_delimiter(b"a\nb\r\nc"), Some("\n"));
        assert_eq!(primary_line_delimiter(b"abc"), None);
        assert_eq!(primary_line_delimiter(b"abc\r"), None);
    }

    #[test]
    fn test_split_two_parts() {
        let parts = split(
            "Content-Type: multipart/mixed; boundary=\"XX\"\n\npreamble\n--XX\nContent-Type: text/plain\n\none\n--XX\nContent-Type: text/html\n\n<b>two</b>\n--XX--\nepilogue\n",
        );
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], "--XX\nContent-Type: text/plain\n\none");
        assert_eq!(parts[1], "--XX\nContent-Type: text/html\n\n<b>two</b>");
    }

    #[test]
    fn test_split_crlf() {
        let parts = split(
            "Content-Type: multipart/mixed; boundary=b1\r\n\r\n--b1\r\nContent-Type: text/plain\r\n\r\nhi\r\n--b1--\r\n",
        );
        assert_eq!(parts, vec!["--b1\r\nContent-Type: text/plain\r\n\r\nhi".to_string()]);
    }

    #[test]
    fn test_missing_end_marker_runs_to_end() {
        let parts = split("Content-Type: multipart/mixed; boundary=q\n\n--q\n\nlast part\n");
        assert_eq!(parts, vec!["--q\n\nlast part".to_string()]);
    }

    #[test]
    fn test_missing_boundary_yields_nothing() {
        assert!(split("Content-Type: multipart/mixed\n\n--q\n\nbody\n").is_empty());
    }

    #[test]
    fn test_no_delimiter_yields_nothing() {
        assert!(split("Content-Type: multipart/mixed; boundary=q").is_empty());
    }

    #[test]
    fn test_zero_parts() {
        assert!(split("Content-Type: multipart/mixed; boundary=q\n\nno markers here\n").is_empty());
    }
}
