//! `maildoc`: decompose RFC 822 / MIME email messages into envelope fields
//! and a tree of decoded content parts.
//!
//! This crate provides the core library for parsing raw messages, decoding
//! RFC 2047 encoded-words and transfer encodings, and reading messages from
//! mbox files and Maildir directories.

pub mod charset;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod source;

pub use charset::{CharsetDecoder, EncodingRsDecoder};
pub use error::{MaildocError, Result};
pub use model::address::EmailAddress;
pub use model::document::Document;
pub use model::entry::{ContentType, Entry, TransferEncoding};
pub use parser::Parser;
pub use source::{MessageSource, SearchCriteria};
