//! Snippet extraction for sampled files.
//!
//! Extraction never fails: unreadable files yield an empty string and the
//! caller falls back to the file stem.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::panic;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::FileKind;
use crate::payload::{file_name, file_stem, truncate_chars, FileRecord};

/// Extracted evidence for one sampled file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub path: String,
    pub name: String,
    /// Lowercase extension with leading dot, e.g. ".md"
    pub ext: String,
    pub snippet: String,
}

impl From<Snippet> for FileRecord {
    fn from(s: Snippet) -> Self {
        FileRecord {
            path: s.path,
            name: s.name,
            snippet: s.snippet,
        }
    }
}

/// Read a file's text or metadata representation.
pub fn safe_read(path: &Path, max_bytes: usize) -> String {
    match FileKind::of(path) {
        Some(FileKind::Pdf) => read_pdf(path),
        Some(FileKind::Image) => image_meta_snippet(path),
        Some(FileKind::Text) | None => read_text_file(path, max_bytes),
    }
}

/// Build snippets for the given paths, in input order.
///
/// Each snippet is the extracted text (or the file stem when nothing could
/// be read) cut to `per_file_chars`. Whitespace-only snippets are dropped.
pub fn build_context_snippets(
    paths: &[PathBuf],
    per_file_chars: usize,
    max_read_bytes: usize,
) -> Vec<Snippet> {
    paths
        .par_iter()
        .filter_map(|p| {
            let mut text = safe_read(p, max_read_bytes);
            if text.is_empty() {
                text = file_stem(p);
            }
            let snippet = truncate_chars(&text, per_file_chars).to_string();
            if snippet.trim().is_empty() {
                debug!(path = %p.display(), "empty snippet");
                return None;
            }
            Some(Snippet {
                path: p.to_string_lossy().to_string(),
                name: file_name(p),
                ext: extension(p),
                snippet,
            })
        })
        .collect()
}

fn read_text_file(path: &Path, max_bytes: usize) -> String {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot open file");
            return String::new();
        }
    };

    let mut data = Vec::with_capacity(max_bytes.min(64 * 1024));
    if let Err(e) = file.take(max_bytes as u64).read_to_end(&mut data) {
        warn!(path = %path.display(), error = %e, "cannot read file");
        return String::new();
    }
    decode_utf8_ignoring_errors(&data)
}

/// Decode UTF-8, dropping invalid sequences (including a sequence cut off
/// by the read limit).
fn decode_utf8_ignoring_errors(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len());
    for chunk in data.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// PDFs above this size are not parsed.
const MAX_PDF_BYTES: u64 = 10 * 1024 * 1024;

/// Text of the first page, or "" when the file is too large or unparseable.
fn read_pdf(path: &Path) -> String {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > MAX_PDF_BYTES => {
            debug!(path = %path.display(), bytes = meta.len(), "pdf too large, skipping");
            return String::new();
        }
        Ok(_) => {}
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot stat pdf");
            return String::new();
        }
    }

    // pdf-extract panics on some malformed documents
    let extracted = panic::catch_unwind(|| pdf_extract::extract_text(path));
    match extracted {
        // pages are separated by form feeds
        Ok(Ok(text)) => text.split('\x0c').next().unwrap_or_default().trim().to_string(),
        Ok(Err(e)) => {
            debug!(path = %path.display(), error = %e, "pdf text extraction failed");
            String::new()
        }
        Err(_) => {
            warn!(path = %path.display(), "pdf parser panicked");
            String::new()
        }
    }
}

/// `image:<stem> • <W>x<H> • <camera>`, dropping the parts that can't be read.
fn image_meta_snippet(path: &Path) -> String {
    let base = format!("image:{}", file_stem(path));
    let (w, h) = match image::image_dimensions(path) {
        Ok(dims) => dims,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no image dimensions");
            return base;
        }
    };
    match camera_model(path) {
        Some(camera) => format!("{} • {}x{} • {}", base, w, h, camera),
        None => format!("{} • {}x{}", base, w, h),
    }
}

/// EXIF `Model`, else `Make`.
fn camera_model(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let exif = exif::Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()?;
    [exif::Tag::Model, exif::Tag::Make].iter().find_map(|tag| {
        let field = exif.get_field(*tag, exif::In::PRIMARY)?;
        match &field.value {
            exif::Value::Ascii(parts) => parts
                .first()
                .map(|p| String::from_utf8_lossy(p).trim().to_string())
                .filter(|s| !s.is_empty()),
            _ => None,
        }
    })
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}
