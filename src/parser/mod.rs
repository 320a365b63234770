//! RFC 822 / MIME parsing: envelope headers, encoded-words, dates,
//! content-type frames, multipart splitting and the MIME entry tree.
//!
//! Everything here works on an in-memory buffer and never fails: malformed
//! input degrades to empty or absent values and is reported through
//! `tracing`.

pub mod content_type;
pub mod date;
pub mod eml;
pub mod encoded_word;
pub mod header;
pub mod mime;
pub mod multipart;

use std::borrow::Cow;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::charset::{CharsetDecoder, EncodingRsDecoder};
use crate::config::ParserConfig;
use crate::model::document::Document;

pub use mime::DEFAULT_MAX_DEPTH;

/// Message parser: the charset capability plus the nesting limit.
///
/// A `Parser` holds no per-message state, so one instance can parse any
/// number of messages, from several threads if the decoder allows it.
pub struct Parser {
    decoder: Box<dyn CharsetDecoder + Send + Sync>,
    max_depth: usize,
}

impl Parser {
    /// Parser with the `encoding_rs` decoder and the default depth limit.
    pub fn new() -> Self {
        Self {
            decoder: Box::new(EncodingRsDecoder::new()),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Build a parser from the `[parser]` configuration section.
    pub fn from_config(config: &ParserConfig) -> Self {
        Self {
            decoder: Box::new(EncodingRsDecoder::with_default_label(
                &config.default_charset,
            )),
            max_depth: config.max_depth,
        }
    }

    /// Replace the charset decoder.
    pub fn with_decoder(mut self, decoder: impl CharsetDecoder + Send + Sync + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Limit MIME nesting; nodes deeper than this are not descended into.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parse one complete message.
    pub fn parse(&self, raw: &[u8]) -> Document {
        header::parse_document(raw, &self.context())
    }

    fn context(&self) -> ParseContext<'_> {
        ParseContext {
            decoder: self.decoder.as_ref(),
            max_depth: self.max_depth,
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed parser settings threaded through the recursive descent.
#[derive(Clone, Copy)]
pub(crate) struct ParseContext<'a> {
    pub decoder: &'a dyn CharsetDecoder,
    pub max_depth: usize,
}

/// Line iterator accepting both `\n` and `\r\n` endings.
///
/// A trailing newline does not produce an extra empty line.
pub(crate) struct Lines<'a> {
    rest: &'a [u8],
}

pub(crate) fn lines(bytes: &[u8]) -> Lines<'_> {
    Lines { rest: bytes }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.rest.is_empty() {
            return None;
        }
        let (line, rest) = match self.rest.iter().position(|&b| b == b'\n') {
            Some(pos) => (&self.rest[..pos], &self.rest[pos + 1..]),
            None => (self.rest, &self.rest[self.rest.len()..]),
        };
        self.rest = rest;
        Some(line.strip_suffix(b"\r").unwrap_or(line))
    }
}

/// Decode one raw header line to text.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every byte).
pub(crate) fn decode_header_bytes(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            Cow::Owned(decoded.into_owned())
        }
    }
}

/// `true` for a folded continuation line (leading space or tab).
pub(crate) fn is_continuation(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}

/// Return the value after `name:` if `line` starts with that header name.
///
/// Header names compare case-insensitively.
pub(crate) fn header_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let prefix = line.get(..name.len())?;
    if !prefix.eq_ignore_ascii_case(name) {
        return None;
    }
    line[name.len()..].strip_prefix(':')
}

/// Find `needle` in `haystack` starting at byte `from`.
pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + from)
}

const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Base64-decode, skipping every byte outside the standard alphabet.
///
/// Line breaks and stray characters are common in real bodies, so they are
/// ignored instead of rejected. A dangling single character is dropped.
pub(crate) fn decode_base64_lenient(input: &[u8]) -> Vec<u8> {
    let mut cleaned: Vec<u8> = input
        .iter()
        .copied()
        .filter(|b| b.is_ascii_alphanumeric() || *b == b'+' || *b == b'/')
        .collect();
    if cleaned.len() % 4 == 1 {
        cleaned.pop();
    }
    match LENIENT_BASE64.decode(&cleaned) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Base64 payload could not be decoded");
            Vec::new()
        }
    }
}

/// First bytes of a section as text, for log fields.
pub(crate) fn preview(bytes: &[u8]) -> String {
    String::from_utf8_lossy(&bytes[..bytes.len().min(100)]).into_owned()
}
