//! MIME entry parsing: builds the [`Entry`] tree of one section.
//!
//! A section is classified by its own headers, then either decoded as a
//! leaf or split into children that are parsed recursively.

use tracing::{debug, warn};

use crate::model::entry::{Entry, TransferEncoding};
use crate::parser::content_type::{parse_content_type, parse_transfer_encoding};
use crate::parser::multipart::split_multipart;
use crate::parser::{decode_base64_lenient, find_bytes, preview, ParseContext};

/// Maximum depth for recursive multipart parsing (to prevent stack overflow on adversarial input).
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Split a section at its first blank line into trimmed `(headers, body)`.
///
/// Both `\n\n` and `\r\n\r\n` count; whichever comes first wins.
pub fn split_section(section: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = match (
        find_bytes(section, b"\n\n", 0),
        find_bytes(section, b"\r\n\r\n", 0),
    ) {
        (Some(lf), Some(crlf)) => lf.min(crlf),
        (lf, crlf) => lf.or(crlf)?,
    };
    Some((section[..pos].trim_ascii(), section[pos..].trim_ascii()))
}

/// Parse one section into an entry; `depth` is 0 for the whole message.
pub(crate) fn parse_entry(section: &[u8], depth: usize, ctx: &ParseContext<'_>) -> Entry {
    let (headers, body, has_body) = match split_section(section) {
        Some((headers, body)) => (headers, body, true),
        None => (section.trim_ascii(), &section[..0], false),
    };

    let frame = parse_content_type(headers, ctx.decoder);
    let mut entry = Entry {
        raw_headers: headers.to_vec(),
        content_type: frame.content_type,
        mime_type: frame.mime_type,
        name: frame.name,
        charset: frame.charset,
        transfer_encoding: parse_transfer_encoding(headers),
        ..Default::default()
    };

    if !has_body {
        debug!(depth, "Section has no blank line, payload is empty");
        if !entry.is_container() {
            decode_leaf(&mut entry, ctx);
        }
        return entry;
    }

    let is_multipart = entry.is_container();
    match (frame.boundary.is_some(), is_multipart) {
        (false, false) => {
            entry.raw_body = body.to_vec();
            decode_leaf(&mut entry, ctx);
        }
        (false, true) => {
            entry.raw_body = body.to_vec();
            warn!(
                depth,
                content_type = %entry.content_type,
                section = %preview(section),
                "Multipart section without boundary, skipping"
            );
        }
        (true, _) if depth >= ctx.max_depth => {
            warn!(
                depth,
                max_depth = ctx.max_depth,
                "MIME nesting limit reached, not descending"
            );
            entry.raw_body = body.to_vec();
            entry.truncated = true;
        }
        (true, true) => {
            entry.children = split_multipart(section, ctx.decoder)
                .into_iter()
                .map(|part| parse_entry(part, depth + 1, ctx))
                .collect();
        }
        (true, false) => {
            // Boundary on a non-multipart type: the body is one wrapped section.
            debug!(
                depth,
                content_type = %entry.content_type,
                "Boundary on non-multipart section, parsing body as nested entry"
            );
            let child = parse_entry(body, depth + 1, ctx);
            entry.children.push(child);
        }
    }

    entry
}

/// Transfer-decode and, for text types, charset-decode the leaf payload.
fn decode_leaf(entry: &mut Entry, ctx: &ParseContext<'_>) {
    let payload = match entry.transfer_encoding {
        TransferEncoding::Base64 => decode_base64_lenient(&entry.raw_body),
        TransferEncoding::Plain => entry.raw_body.clone(),
    };

    entry.content = if entry.content_type.is_text() {
        let charset = entry.charset.as_deref().unwrap_or("");
        ctx.decoder
            .decode(payload.trim_ascii(), charset)
            .into_bytes()
    } else {
        payload
    };
}
