//! Charset conversion capability.
//!
//! The MIME core never converts bytes to text itself: every conversion goes
//! through a [`CharsetDecoder`], so callers can swap in their own tables.
//! [`EncodingRsDecoder`] is the default and is backed by `encoding_rs`.

use encoding_rs::Encoding;
use tracing::warn;

/// Converts bytes in a named charset to Unicode text.
///
/// Implementations must never fail: unknown or malformed charset names fall
/// back to a best-effort conversion.
pub trait CharsetDecoder {
    /// Decode `bytes` declared as `charset` (may be empty when undeclared).
    fn decode(&self, bytes: &[u8], charset: &str) -> String;
}

impl<F> CharsetDecoder for F
where
    F: Fn(&[u8], &str) -> String,
{
    fn decode(&self, bytes: &[u8], charset: &str) -> String {
        self(bytes, charset)
    }
}

/// Default decoder built on the WHATWG encoding labels of `encoding_rs`.
///
/// - Empty charset: the configured default encoding (UTF-8 unless changed).
/// - Known label: decoded with replacement characters for invalid sequences.
/// - Unknown label: Latin-1 passthrough, each byte becomes one code point.
#[derive(Debug, Clone, Copy)]
pub struct EncodingRsDecoder {
    default: &'static Encoding,
}

impl EncodingRsDecoder {
    /// Decoder whose default (undeclared) charset is UTF-8.
    pub fn new() -> Self {
        Self {
            default: encoding_rs::UTF_8,
        }
    }

    /// Decoder using `label` for parts that declare no charset.
    ///
    /// An unrecognized label keeps UTF-8 and logs a warning.
    pub fn with_default_label(label: &str) -> Self {
        match Encoding::for_label(label.trim().as_bytes()) {
            Some(default) => Self { default },
            None => {
                warn!(charset = label, "Unknown default charset, keeping UTF-8");
                Self::new()
            }
        }
    }

    /// Name of the encoding used for undeclared charsets.
    pub fn default_name(&self) -> &'static str {
        self.default.name()
    }
}

impl Default for EncodingRsDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CharsetDecoder for EncodingRsDecoder {
    fn decode(&self, bytes: &[u8], charset: &str) -> String {
        let label = charset.trim();
        if label.is_empty() {
            let (decoded, _, _) = self.default.decode(bytes);
            return decoded.into_owned();
        }

        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => {
                let (decoded, _, had_errors) = encoding.decode(bytes);
                if had_errors {
                    tracing::debug!(
                        charset = label,
                        "Invalid byte sequences replaced while decoding"
                    );
                }
                decoded.into_owned()
            }
            None => {
                warn!(
                    charset = label,
                    "Unknown charset, passing bytes through as Latin-1"
                );
                latin1(bytes)
            }
        }
    }
}

/// Map every byte to the code point of the same value.
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
