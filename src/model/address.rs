//! Sender/recipient address extraction.

use crate::charset::CharsetDecoder;
use crate::parser::encoded_word::decode_encoded_word;

/// A parsed email address.
///
/// # Examples
/// - `"John Doe <john@example.com>"` → `name = "John Doe"`, `address = "john@example.com"`
/// - `"john@example.com"` → `name = ""`, `address = "john@example.com"`
#[derive(Debug, Clone, Default, serde::Serialize, PartialEq, Eq)]
pub struct EmailAddress {
    /// The bare email address (`user@domain`).
    pub address: String,
    /// Human-readable display name (may be empty).
    pub name: String,
}

impl EmailAddress {
    /// Parse a single address header value.
    pub fn parse(raw: &str, decoder: &dyn CharsetDecoder) -> Self {
        Self {
            address: Self::extract_address(raw),
            name: Self::extract_name(raw, decoder),
        }
    }

    /// Text inside the last `<…>`, or the token after the last whitespace.
    pub fn extract_address(raw: &str) -> String {
        let trimmed = raw.trim();
        if let Some(angle_start) = trimmed.rfind('<') {
            let inner = &trimmed[angle_start + 1..];
            let angle_end = inner.find('>').unwrap_or(inner.len());
            return inner[..angle_end].trim().to_string();
        }
        trimmed
            .rsplit(char::is_whitespace)
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// Display name before `<`, RFC 2047 decoded when it is an encoded-word.
    ///
    /// Empty unless the value has both `<` and `>`.
    pub fn extract_name(raw: &str, decoder: &dyn CharsetDecoder) -> String {
        let (Some(angle_start), true) = (raw.find('<'), raw.contains('>')) else {
            return String::new();
        };
        let name_part = raw[..angle_start].trim();
        decode_encoded_word(name_part, decoder)
            .map(|decoded| decoded.trim().to_string())
            .filter(|decoded| !decoded.is_empty())
            .unwrap_or_else(|| strip_quotes(name_part))
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_empty() && self.name.is_empty()
    }

    /// Format for display: `"Name <address>"` or just `"address"`.
    pub fn display(&self) -> String {
        if self.name.is_empty() {
            self.address.clone()
        } else {
            format!("{} <{}>", self.name, self.address)
        }
    }
}

/// Strip surrounding double-quotes and trim whitespace.
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
