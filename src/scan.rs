//! Input discovery.
//!
//! The input of a batch is either a single image file or a directory. A
//! directory contributes every file with a decodable extension (see
//! [`supported_input_extensions`]); by default only its top level, the whole
//! tree with `recursive`.
//!
//! Results are sorted by path so batch output and logs are stable between
//! runs. Unreadable entries inside the tree are logged and skipped.

use crate::imaging::supported_input_extensions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Input not found: {0}")]
    NotFound(PathBuf),
    #[error("Unsupported input file: {0}")]
    Unsupported(PathBuf),
}

/// Whether `path` has an extension we can decode (case-insensitive).
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| supported_input_extensions().contains(&ext.as_str()))
}

/// Every image under `input`, sorted by path.
pub fn collect_images(input: &Path, recursive: bool) -> Result<Vec<PathBuf>, ScanError> {
    if input.is_file() {
        return if is_supported_image(input) {
            Ok(vec![input.to_path_buf()])
        } else {
            Err(ScanError::Unsupported(input.to_path_buf()))
        };
    }
    if !input.is_dir() {
        return Err(ScanError::NotFound(input.to_path_buf()));
    }

    let walker = WalkDir::new(input)
        .follow_links(true)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 });

    let mut images: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_supported_image(path))
        .collect();
    images.sort();

    log::debug!("Found {} images in {}", images.len(), input.display());
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    fn names(paths: &[PathBuf], root: &Path) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        for name in ["b.jpg", "a.JPEG", "c.png", "notes.txt", "raw.cr3", "sub/d.tif"] {
            touch(&tmp.path().join(name));
        }
        tmp
    }

    #[test]
    fn top_level_only_by_default() {
        let tmp = fixture();
        let images = collect_images(tmp.path(), false).unwrap();
        assert_eq!(names(&images, tmp.path()), vec!["a.JPEG", "b.jpg", "c.png"]);
    }

    #[test]
    fn recursive_walks_subdirectories() {
        let tmp = fixture();
        let images = collect_images(tmp.path(), true).unwrap();
        assert_eq!(
            names(&images, tmp.path()),
            vec!["a.JPEG", "b.jpg", "c.png", "sub/d.tif"]
        );
    }

    #[test]
    fn single_file_input() {
        let tmp = fixture();
        let file = tmp.path().join("c.png");
        assert_eq!(collect_images(&file, false).unwrap(), vec![file]);
        assert!(matches!(
            collect_images(&tmp.path().join("notes.txt"), false),
            Err(ScanError::Unsupported(_))
        ));
    }

    #[test]
    fn missing_input() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            collect_images(&tmp.path().join("nope"), false),
            Err(ScanError::NotFound(_))
        ));
    }

    #[test]
    fn empty_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(collect_images(tmp.path(), true).unwrap().is_empty());
    }
}
