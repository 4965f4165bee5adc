//! Local folder sampling: which files are read and what evidence they yield.

mod extract;
mod walk;

pub use extract::{build_context_snippets, safe_read, Snippet};
pub use walk::list_files;

use phf::phf_set;
use std::path::Path;

static TEXT_EXTENSIONS: phf::Set<&'static str> = phf_set! {
    "txt", "md", "py", "js", "ts", "tsx", "json", "csv",
    "html", "css", "yml", "yaml", "toml",
};

static IMAGE_EXTENSIONS: phf::Set<&'static str> = phf_set! {
    "jpg", "jpeg", "png", "gif", "webp",
};

/// How a sampled file is turned into a snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Text,
    Pdf,
    Image,
}

impl FileKind {
    /// Classify a path by its (case-insensitive) extension.
    /// Returns None for files that are not sampled.
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::from_extension(&ext)
    }

    /// Classify a lowercase extension without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext == "pdf" {
            Some(FileKind::Pdf)
        } else if TEXT_EXTENSIONS.contains(ext) {
            Some(FileKind::Text)
        } else if IMAGE_EXTENSIONS.contains(ext) {
            Some(FileKind::Image)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Text => "text",
            FileKind::Pdf => "pdf",
            FileKind::Image => "image",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
