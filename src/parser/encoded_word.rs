//! RFC 2047 encoded-word decoding (`=?charset?B|Q?payload?=`).
//!
//! Only the first encoded-word of a value is decoded. Callers fold header
//! lines individually, so a multi-word subject is decoded line by line.

use tracing::debug;

use crate::charset::CharsetDecoder;
use crate::parser::decode_base64_lenient;

/// Decode the first encoded-word found in `value`.
///
/// Returns `None` when `value` does not contain four `?` delimiters, the
/// charset is empty, the method is neither `B` nor `Q`, or a `B` payload
/// yields no bytes.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?="` → `"Hola"`
pub fn decode_encoded_word(value: &str, decoder: &dyn CharsetDecoder) -> Option<String> {
    let charset_pos = value.find('?')?;
    let method_pos = charset_pos + 1 + value[charset_pos + 1..].find('?')?;

    let charset = value[charset_pos + 1..method_pos].to_uppercase();
    if charset.is_empty() {
        return None;
    }

    let Some(method) = value[method_pos + 1..].chars().next() else {
        debug!(value, "Encoded-word too short to hold a method");
        return None;
    };
    let is_base64 = match method.to_ascii_uppercase() {
        'B' => true,
        'Q' => false,
        _ => return None,
    };

    let content_pos = method_pos + 1 + value[method_pos + 1..].find('?')?;
    let content_end = content_pos + 1 + value[content_pos + 1..].find('?')?;

    let payload: String = value[content_pos + 1..content_end]
        .chars()
        .filter(|&c| c != '\r' && c != '\n')
        .collect();

    let bytes = if is_base64 {
        let bytes = decode_base64_lenient(payload.as_bytes());
        if bytes.is_empty() {
            debug!(value, "B encoded-word payload decodes to nothing");
            return None;
        }
        bytes
    } else {
        decode_q(&payload)
    };

    Some(decoder.decode(&bytes, &charset))
}

/// Decode the Q payload: `=XX` hex escapes, every other char as one Latin-1 byte.
///
/// Runs of `==` are padding artifacts and are removed first. `_` is kept
/// literally.
fn decode_q(payload: &str) -> Vec<u8> {
    let mut input = payload.to_string();
    while input.contains("==") {
        input = input.replace("==", "");
    }

    let chars: Vec<char> = input.chars().collect();
    let mut result = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '=' && chars.len() > i + 2 {
            match (chars[i + 1].to_digit(16), chars[i + 2].to_digit(16)) {
                (Some(hi), Some(lo)) => result.push((hi * 16 + lo) as u8),
                _ => debug!(
                    escape = %chars[i..i + 3].iter().collect::<String>(),
                    "Skipping invalid Q escape"
                ),
            }
            i += 3;
        } else {
            result.push(u8::try_from(c).unwrap_or(b'?'));
            i += 1;
        }
    }
    result
}
