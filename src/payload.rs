//! Size-bounded JSON encoding of sampled file records.
//!
//! Every sampled file keeps some representation in the prompt: instead of
//! dropping records, the per-record snippet length is lowered step by step
//! until the serialized array fits `max_chars`, or the floor is reached.
//! Lengths are counted in chars, so multi-byte text is never split.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One sampled file as it appears in the prompt.
///
/// Field order is the serialized key order: `path`, `name`, `snippet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub snippet: String,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, name: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            snippet: snippet.into(),
        }
    }

    /// Copy of this record with the snippet cut to `max_chars` chars.
    fn truncated(&self, max_chars: usize) -> Self {
        Self {
            path: self.path.clone(),
            name: self.name.clone(),
            snippet: truncate_chars(&self.snippet, max_chars).to_string(),
        }
    }
}

/// Tuning knobs for [`encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShrinkLimits {
    /// Upper bound on the serialized payload, in chars
    pub max_chars: usize,
    /// Per-record snippet length the search never goes below
    pub min_per_file: usize,
    /// Per-record snippet length the search starts from
    pub start_per_file: usize,
    /// Decrement between attempts
    pub step: usize,
}

impl Default for ShrinkLimits {
    fn default() -> Self {
        Self {
            max_chars: 8000,
            min_per_file: 60,
            start_per_file: 120,
            step: 20,
        }
    }
}

/// The bounded payload handed to the prompt builder.
#[derive(Debug, Clone)]
pub struct EncodedPayload {
    /// Records with snippets truncated to `per_file`
    pub records: Vec<FileRecord>,
    /// Serialized JSON array of `records`
    pub json: String,
    /// Per-record snippet length that produced `json`
    pub per_file: usize,
    /// Records were built from file names only
    pub sparse: bool,
}

impl EncodedPayload {
    /// Serialized length in chars.
    pub fn char_len(&self) -> usize {
        self.json.chars().count()
    }

    /// Whether the payload fits the given bound.
    pub fn fits(&self, max_chars: usize) -> bool {
        self.char_len() <= max_chars
    }

    fn mark_sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }
}

/// Encode records into a JSON array no longer than `limits.max_chars`.
///
/// The per-record length walks down from `start_per_file` by `step` and
/// stops at `min_per_file`. If the bound still cannot be met at the floor,
/// the oversized payload is returned as is.
pub fn encode(records: &[FileRecord], limits: &ShrinkLimits) -> EncodedPayload {
    if records.is_empty() {
        return EncodedPayload {
            records: Vec::new(),
            json: "[]".to_string(),
            per_file: limits.start_per_file.max(limits.min_per_file),
            sparse: false,
        };
    }

    let floor = limits.min_per_file;
    let step = limits.step.max(1);
    let mut per_file = limits.start_per_file.max(floor);

    loop {
        let shrunk: Vec<FileRecord> = records.iter().map(|r| r.truncated(per_file)).collect();
        let json = to_json(&shrunk);
        let len = json.chars().count();

        debug!(per_file, len, max_chars = limits.max_chars, "payload attempt");

        if len <= limits.max_chars || per_file <= floor {
            return EncodedPayload {
                records: shrunk,
                json,
                per_file,
                sparse: false,
            };
        }

        per_file = per_file.saturating_sub(step).max(floor);
    }
}

/// Encode weak-signal records built from file names, flagged as sparse.
pub fn encode_fallback<P: AsRef<Path>>(paths: &[P], limits: &ShrinkLimits) -> EncodedPayload {
    encode(&fallback_records(paths), limits).mark_sparse(true)
}

/// Build records whose snippet is the file stem, for when nothing could be
/// extracted from the sampled files.
pub fn fallback_records<P: AsRef<Path>>(paths: &[P]) -> Vec<FileRecord> {
    paths
        .iter()
        .map(|p| {
            let p = p.as_ref();
            FileRecord {
                path: p.to_string_lossy().to_string(),
                name: file_name(p),
                snippet: file_stem(p),
            }
        })
        .collect()
}

fn to_json(records: &[FileRecord]) -> String {
    // A Vec of plain string structs always serializes.
    serde_json::to_string(records).unwrap_or_else(|_| "[]".to_string())
}

/// Longest prefix of `s` holding at most `max_chars` chars.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
