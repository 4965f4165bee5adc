//! Folder walk that samples candidate files.

use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::FileKind;
use crate::config::ScanConfig;

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "__pycache__",
    "venv",
    ".venv",
    "site-packages",
];

/// Collect up to `config.max_files` text and image files under `root`.
///
/// Entries are visited in file-name order so repeated runs sample the same
/// files. A `root` that is itself a file is returned when supported.
pub fn list_files(root: &Path, config: &ScanConfig) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if config.max_files == 0 {
        return Ok(files);
    }
    let excluded = config.exclusions()?;

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories
            if name.starts_with('.') {
                return false;
            }
            !SKIPPED_DIRS.contains(&name.as_ref())
        })
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if FileKind::of(path).is_none() {
            continue;
        }
        if excluded.is_match(path) {
            debug!(path = %path.display(), "excluded by pattern");
            continue;
        }

        files.push(path.to_path_buf());
        if files.len() >= config.max_files {
            break;
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, "content").unwrap();
    }

    #[test]
    fn test_list_files_filters_extensions() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "notes.md");
        touch(temp.path(), "photo.JPG");
        touch(temp.path(), "binary.exe");
        touch(temp.path(), "archive.zip");

        let files = list_files(temp.path(), &ScanConfig::default()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["notes.md", "photo.JPG"]);
    }

    #[test]
    fn test_list_files_skips_hidden_and_dependency_dirs() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "keep/plan.txt");
        touch(temp.path(), ".git/config.toml");
        touch(temp.path(), "node_modules/pkg/readme.md");
        touch(temp.path(), "target/debug/out.json");

        let files = list_files(temp.path(), &ScanConfig::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("keep/plan.txt"));
    }

    #[test]
    fn test_list_files_caps_count() {
        let temp = TempDir::new().unwrap();
        for i in 0..10 {
            touch(temp.path(), &format!("note-{:02}.txt", i));
        }
        let config = ScanConfig {
            max_files: 3,
            ..Default::default()
        };
        let files = list_files(temp.path(), &config).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files[0].ends_with("note-00.txt"));
        assert!(files[2].ends_with("note-02.txt"));
    }

    #[test]
    fn test_list_files_applies_exclusions() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "journal/private/secret.md");
        touch(temp.path(), "journal/public.md");
        let config = ScanConfig {
            excluded_paths: vec!["**/private/**".to_string()],
            ..Default::default()
        };
        let files = list_files(temp.path(), &config).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("journal/public.md"));
    }

    #[test]
    fn test_list_files_rejects_bad_exclusion() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "notes.md");
        let config = ScanConfig {
            excluded_paths: vec!["a/[".to_string()],
            ..Default::default()
        };
        assert!(list_files(temp.path(), &config).is_err());
    }

    #[test]
    fn test_list_files_accepts_single_file_root() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "solo.md");
        let files = list_files(&temp.path().join("solo.md"), &ScanConfig::default()).unwrap();
        assert_eq!(files.len(), 1);
    }
}
