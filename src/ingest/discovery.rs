//! Dataset file discovery.
//!
//! Datasets are usually split over several files sharing a naming scheme.
//! A single `*` wildcard selects them:
//!
//! ```text
//! data/seyfried/*.sey        every .sey file in data/seyfried/
//! data/biwi/obsmat_*.txt     obsmat_eth.txt, obsmat_hotel.txt, ...
//! data/biwi/obsmat.txt       exactly this file
//! ```
//!
//! Matches are returned sorted by path so runs are reproducible.

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Expand a single-`*` file pattern.
///
/// The part before `*` is a directory plus an optional file-name prefix, the
/// part after it a file-name suffix. Without `*` the pattern is returned
/// unchanged (existence is checked by the reader).
///
/// # Errors
///
/// I/O errors from listing the directory.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let Some(star) = pattern.find('*') else {
        return Ok(vec![PathBuf::from(pattern)]);
    };

    let head = &pattern[..star];
    let suffix = &pattern[star + 1..];

    let (dir, prefix) = split_head(head);

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.len() >= prefix.len() + suffix.len()
            && name.starts_with(prefix.as_str())
            && name.ends_with(suffix)
        {
            files.push(dir.join(name));
        }
    }

    files.sort();
    tracing::debug!(pattern, matches = files.len(), "expanded file pattern");
    Ok(files)
}

/// Split `dir/prefix` into the directory to list and the name prefix.
fn split_head(head: &str) -> (PathBuf, String) {
    if head.is_empty() {
        return (PathBuf::from("."), String::new());
    }
    if head.ends_with('/') || head.ends_with(std::path::MAIN_SEPARATOR) {
        return (PathBuf::from(head), String::new());
    }

    let path = Path::new(head);
    let prefix = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    (dir, prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) {
        fs::write(dir.path().join(name), "").unwrap();
    }

    #[test]
    fn test_no_wildcard_passthrough() {
        let files = expand_pattern("some/file.txt").unwrap();
        assert_eq!(files, vec![PathBuf::from("some/file.txt")]);
    }

    #[test]
    fn test_suffix_match_sorted() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "b.sey");
        touch(&dir, "a.sey");
        touch(&dir, "c.txt");
        fs::create_dir(dir.path().join("d.sey")).unwrap();

        let pattern = format!("{}/*.sey", dir.path().display());
        let files = expand_pattern(&pattern).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.sey"), dir.path().join("b.sey")]
        );
    }

    #[test]
    fn test_prefix_and_suffix_match() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "obsmat_eth.txt");
        touch(&dir, "obsmat_hotel.txt");
        touch(&dir, "destinations.txt");

        let pattern = format!("{}/obsmat_*.txt", dir.path().display());
        let files = expand_pattern(&pattern).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("obsmat_eth.txt"));
        assert!(files[1].ends_with("obsmat_hotel.txt"));
    }

    #[test]
    fn test_missing_directory_is_error() {
        assert!(expand_pattern("/definitely/not/here/*.txt").is_err());
    }

    #[test]
    fn test_split_head() {
        assert_eq!(split_head(""), (PathBuf::from("."), String::new()));
        assert_eq!(split_head("data/"), (PathBuf::from("data/"), String::new()));
        assert_eq!(
            split_head("data/obs_"),
            (PathBuf::from("data"), "obs_".to_string())
        );
        assert_eq!(split_head("obs_"), (PathBuf::from("."), "obs_".to_string()));
    }
}
