// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Directory resets and passthrough file copies.

use crate::Error;
use std::fs;
use std::path::Path;

/// Remove `path` if it exists, then create it (and its parents) empty.
pub fn reset_dir(path: &Path) -> Result<(), Error> {
    if path.exists() {
        log::warn!(
            "Directory {} already exists. Deleting and recreating it.",
            path.display()
        );
        fs::remove_dir_all(path).map_err(|e| Error::filesystem(path, e))?;
    }
    fs::create_dir_all(path).map_err(|e| Error::filesystem(path, e))
}

/// Create `path` and its parents if missing.
pub fn ensure_dir(path: &Path) -> Result<(), Error> {
    fs::create_dir_all(path).map_err(|e| Error::filesystem(path, e))
}

/// Remove `path` recursively, doing nothing if it is already gone.
pub fn remove_dir(path: &Path) -> Result<(), Error> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::filesystem(path, e)),
    }
}

/// Byte-for-byte copy of `src` to `dst`, creating `dst`'s parent.
///
/// `file_name` keys may contain subdirectories, so the parent is created on
/// demand rather than assumed.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64, Error> {
    if let Some(parent) = dst.parent()
        && !parent.as_os_str().is_empty()
        && !parent.is_dir()
    {
        ensure_dir(parent)?;
    }
    fs::copy(src, dst).map_err(|e| Error::filesystem(src, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reset_dir_clears_contents() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("coco_dataset");
        fs::create_dir_all(dir.join("images/train")).unwrap();
        fs::write(dir.join("stale.json"), "{}").unwrap();

        reset_dir(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_remove_dir_missing_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        assert!(remove_dir(&temp_dir.path().join("never_created")).is_ok());
    }

    #[test]
    fn test_copy_file_is_byte_identical() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("a.png");
        let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        fs::write(&src, &bytes).unwrap();

        let dst = temp_dir.path().join("out/nested/a.png");
        let copied = copy_file(&src, &dst).unwrap();

        assert_eq!(copied, bytes.len() as u64);
        assert_eq!(fs::read(&dst).unwrap(), bytes);
    }

    #[test]
    fn test_copy_missing_source_names_path() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("gone.png");

        match copy_file(&src, &temp_dir.path().join("dst.png")) {
            Err(Error::FilesystemError(p, _)) => assert_eq!(p, src),
            other => panic!("Expected FilesystemError, got {:?}", other),
        }
    }
}
