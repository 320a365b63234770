//! Core data model types: the parsed document, MIME entries and addresses.

pub mod address;
pub mod document;
pub mod entry;
