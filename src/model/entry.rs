//! MIME node types: the content-type classification and the entry tree.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Closed classification of a `Content-Type` value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentType {
    TextPlain,
    TextOther,
    ImageJpeg,
    ImagePng,
    ImageOther,
    MultipartMixed,
    MultipartRelated,
    MultipartAlternative,
    MultipartOther,
    Binary,
    /// No `Content-Type` header was found.
    #[default]
    Undefined,
}

impl ContentType {
    /// Classify a MIME type string such as `"text/html"`.
    ///
    /// Matching is exact for the named subtypes and by prefix for the
    /// `text/`, `image/` and `multipart/` families. Everything else is
    /// [`ContentType::Binary`].
    pub fn classify(mime_type: &str) -> Self {
        let mime = mime_type.trim().to_ascii_lowercase();
        match mime.as_str() {
            "text/plain" => Self::TextPlain,
            "image/jpeg" => Self::ImageJpeg,
            "image/png" => Self::ImagePng,
            "multipart/mixed" => Self::MultipartMixed,
            "multipart/related" => Self::MultipartRelated,
            "multipart/alternative" => Self::MultipartAlternative,
            m if m.starts_with("text/") => Self::TextOther,
            m if m.starts_with("image/") => Self::ImageOther,
            m if m.starts_with("multipart/") => Self::MultipartOther,
            _ => Self::Binary,
        }
    }

    /// Canonical label of the variant.
    pub const fn label(self) -> &'static str {
        match self {
            Self::TextPlain => "text/plain",
            Self::TextOther => "text/*",
            Self::ImageJpeg => "image/jpeg",
            Self::ImagePng => "image/png",
            Self::ImageOther => "image/*",
            Self::MultipartMixed => "multipart/mixed",
            Self::MultipartRelated => "multipart/related",
            Self::MultipartAlternative => "multipart/alternative",
            Self::MultipartOther => "multipart/*",
            Self::Binary => "application/octet-stream",
            Self::Undefined => "undefined",
        }
    }

    /// Structural node whose body is a boundary-delimited list of parts.
    pub const fn is_multipart(self) -> bool {
        matches!(
            self,
            Self::MultipartMixed
                | Self::MultipartRelated
                | Self::MultipartAlternative
                | Self::MultipartOther
        )
    }

    /// Payload is charset-decoded to UTF-8.
    pub const fn is_text(self) -> bool {
        matches!(self, Self::TextPlain | Self::TextOther)
    }
}

impl FromStr for ContentType {
    type Err = Infallible;

    /// Inverse of [`ContentType::label`]; any other MIME string is classified.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == Self::Undefined.label() {
            return Ok(Self::Undefined);
        }
        Ok(Self::classify(s))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `Content-Transfer-Encoding` of a part, as far as decoding is concerned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferEncoding {
    /// No transfer decoding (7bit, 8bit, binary, quoted-printable, absent).
    #[default]
    Plain,
    Base64,
}

/// One MIME node.
///
/// Containers (multipart nodes) own their parts in `children` and never carry
/// `content`. Leaves carry the decoded payload: transfer-decoded, and for
/// text types converted to UTF-8.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    /// Header block of this section, trimmed.
    pub raw_headers: Vec<u8>,
    /// Body of this section, trimmed and still transfer-encoded. Empty when
    /// the body was parsed into `children`.
    pub raw_body: Vec<u8>,
    pub content_type: ContentType,
    /// Type string as written in the header (e.g. `"text/html"`).
    pub mime_type: String,
    /// `name=` parameter, RFC 2047 decoded.
    pub name: Option<String>,
    pub charset: Option<String>,
    pub transfer_encoding: TransferEncoding,
    pub content: Vec<u8>,
    pub children: Vec<Entry>,
    /// Descent stopped here because the nesting limit was reached.
    pub truncated: bool,
}

impl Entry {
    pub fn is_container(&self) -> bool {
        self.content_type.is_multipart()
    }

    /// Decoded text for text leaves, `None` for binary content.
    pub fn text(&self) -> Option<&str> {
        if !self.content_type.is_text() {
            return None;
        }
        std::str::from_utf8(&self.content).ok()
    }

    /// Depth-first (pre-order) view of every non-container node in this tree.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves { stack: vec![self] }
    }
}

/// Iterator returned by [`Entry::leaves`].
pub struct Leaves<'a> {
    stack: Vec<&'a Entry>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<&'a Entry> {
        while let Some(entry) = self.stack.pop() {
            self.stack.extend(entry.children.iter().rev());
            if !entry.is_container() {
                return Some(entry);
            }
        }
        None
    }
}
