//! Candidate file discovery under the import path.

use crate::error::ConfigError;
use glob::{MatchOptions, Pattern};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Mask that matches every file, extension or not.
pub const DEFAULT_FILTER: &str = "*.*";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// File name mask with `*` and `?` wildcards.
#[derive(Debug, Clone)]
pub enum NameFilter {
    Any,
    Pattern(Pattern),
}

impl NameFilter {
    pub fn new(mask: &str) -> Result<Self, ConfigError> {
        let mask = mask.trim();
        if mask.is_empty() || mask == "*" || mask == DEFAULT_FILTER {
            return Ok(NameFilter::Any);
        }
        // Only `*` and `?` are wildcards; brackets are literal and `**` means `*`.
        let mut escaped = String::with_capacity(mask.len());
        let mut prev_star = false;
        for c in mask.chars() {
            match c {
                '*' if prev_star => continue,
                '[' => escaped.push_str("[[]"),
                ']' => escaped.push_str("[]]"),
                _ => escaped.push(c),
            }
            prev_star = c == '*';
        }
        Pattern::new(&escaped)
            .map(NameFilter::Pattern)
            .map_err(|e| ConfigError::InvalidFilter(format!("{mask}: {e}")))
    }

    pub fn matches(&self, file_name: &str) -> bool {
        match self {
            NameFilter::Any => true,
            NameFilter::Pattern(p) => p.matches_with(file_name, MATCH_OPTIONS),
        }
    }
}

/// Lazy walk over the files below a root directory. Yields absolute paths,
/// never directories, and cannot be restarted.
pub struct FileEnumerator {
    walker: walkdir::IntoIter,
    filter: NameFilter,
}

/// Start enumerating files under `root` whose names match `filter`.
///
/// The root must be an existing directory. It is checked up front so an
/// unusable import path fails before any upload is attempted.
pub fn enumerate(root: &Path, filter: &str, recursive: bool) -> Result<FileEnumerator, ConfigError> {
    let not_accessible = |source| ConfigError::PathNotAccessible {
        path: root.to_path_buf(),
        source,
    };
    let metadata = fs::metadata(root).map_err(not_accessible)?;
    if !metadata.is_dir() {
        return Err(not_accessible(io::Error::new(
            io::ErrorKind::Other,
            "not a directory",
        )));
    }
    let root = root.canonicalize().map_err(not_accessible)?;
    let filter = NameFilter::new(filter)?;

    let mut walker = WalkDir::new(root).min_depth(1).follow_links(false);
    if !recursive {
        walker = walker.max_depth(1);
    }

    Ok(FileEnumerator {
        walker: walker.into_iter(),
        filter,
    })
}

impl Iterator for FileEnumerator {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "Skipping unreadable entry");
                    continue;
                }
            };
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }
            if self.filter.matches(&entry.file_name().to_string_lossy()) {
                return Some(entry.into_path());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn create_test_files(dir: &Path) {
        fs::write(dir.join("bug1.png"), b"png").unwrap();
        fs::write(dir.join("notes.txt"), b"hello").unwrap();
        fs::write(dir.join("README"), b"readme").unwrap();

        let nested = dir.join("nested").join("deeper");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.join("nested").join("shot.PNG"), b"png").unwrap();
        fs::write(nested.join("trace.log"), b"log").unwrap();
    }

    fn names(paths: &[PathBuf]) -> HashSet<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_top_level_only() {
        let temp_dir = TempDir::new().unwrap();
        create_test_files(temp_dir.path());

        let files: Vec<PathBuf> = enumerate(temp_dir.path(), DEFAULT_FILTER, false).unwrap().collect();
        assert_eq!(files.len(), 3);
        assert_eq!(
            names(&files),
            HashSet::from(["bug1.png".to_string(), "notes.txt".to_string(), "README".to_string()])
        );
    }

    #[test]
    fn test_recursive_includes_subdirectories_without_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        create_test_files(temp_dir.path());

        let files: Vec<PathBuf> = enumerate(temp_dir.path(), DEFAULT_FILTER, true).unwrap().collect();
        assert_eq!(files.len(), 5);
        let unique: HashSet<&PathBuf> = files.iter().collect();
        assert_eq!(unique.len(), 5);
        assert!(files.iter().all(|p| p.is_absolute() && p.is_file()));
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        create_test_files(temp_dir.path());

        let files: Vec<PathBuf> = enumerate(temp_dir.path(), "*.png", true).unwrap().collect();
        assert_eq!(
            names(&files),
            HashSet::from(["bug1.png".to_string(), "shot.PNG".to_string()])
        );
    }

    #[test]
    fn test_question_mark_and_literal_brackets() {
        let filter = NameFilter::new("bug?.png").unwrap();
        assert!(filter.matches("bug1.png"));
        assert!(!filter.matches("bug12.png"));

        let filter = NameFilter::new("[draft]*.txt").unwrap();
        assert!(filter.matches("[draft] notes.txt"));
        assert!(!filter.matches("d.txt"));

        let filter = NameFilter::new("a**b").unwrap();
        assert!(filter.matches("axxb"));
    }

    #[test]
    fn test_missing_root_fails_fast() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        assert!(matches!(
            enumerate(&missing, DEFAULT_FILTER, false),
            Err(ConfigError::PathNotAccessible { .. })
        ));
    }

    #[test]
    fn test_file_root_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let single = temp_dir.path().join("single.txt");
        fs::write(&single, "content").unwrap();
        match enumerate(&single, DEFAULT_FILTER, false) {
            Err(ConfigError::PathNotAccessible { path, .. }) => assert_eq!(path, single),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("a file root was accepted"),
        }
    }
}
