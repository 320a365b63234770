//! Extract the content leaves of a message as files.

use std::path::{Path, PathBuf};

use crate::error::{MaildocError, Result};
use crate::model::document::Document;
use crate::model::entry::{ContentType, Entry};

use super::sanitize_filename_part;

/// Write every content leaf of `document` into `output_dir`.
///
/// Leaves with a declared name keep it (sanitized); the others are called
/// `part<N>.<ext>` after their position in the leaf list. Existing files are
/// never overwritten. Empty leaves (e.g. wrappers) are skipped.
pub fn export_entries(
    document: &Document,
    output_dir: &Path,
    max_filename_len: usize,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir).map_err(|e| MaildocError::io(output_dir, e))?;
    let mut paths = Vec::new();

    for (idx, entry) in document.entries().into_iter().enumerate() {
        if entry.content.is_empty() {
            tracing::debug!(index = idx + 1, "Skipping empty entry");
            continue;
        }
        let filename = entry_filename(entry, idx + 1, max_filename_len);
        let path = unique_path(&output_dir.join(filename))?;
        std::fs::write(&path, &entry.content).map_err(|e| MaildocError::io(&path, e))?;
        tracing::debug!(path = %path.display(), bytes = entry.content.len(), "Exported entry");
        paths.push(path);
    }

    Ok(paths)
}

/// File name for a leaf: its declared name, else `part<N>.<ext>`.
pub fn entry_filename(entry: &Entry, number: usize, max_len: usize) -> String {
    match entry.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => sanitize_filename_part(name, max_len),
        _ => format!("part{number}.{}", extension_for(entry)),
    }
}

/// File extension matching the entry's media type.
fn extension_for(entry: &Entry) -> &str {
    match entry.content_type {
        ContentType::TextPlain => "txt",
        ContentType::ImageJpeg => "jpg",
        ContentType::ImagePng => "png",
        _ => entry
            .mime_type
            .split_once('/')
            .map(|(_, subtype)| subtype)
            .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin"),
    }
}

/// If `path` already exists, append a counter to make it unique.
fn unique_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parent = path.parent().unwrap_or(Path::new("."));

    for i in 1..1000 {
        let candidate = if ext.is_empty() {
            parent.join(format!("{stem}_{i}"))
        } else {
            parent.join(format!("{stem}_{i}.{ext}"))
        };
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(MaildocError::ExportError(format!(
        "no free file name for '{}'",
        path.display()
    )))
}
