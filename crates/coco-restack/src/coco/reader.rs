// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Buffered COCO JSON reader.

use super::types::*;
use crate::Error;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;

/// Options for COCO reading.
#[derive(Debug, Clone, Default)]
pub struct CocoReadOptions {
    /// If true, reject files with orphan annotations.
    pub validate: bool,
}

/// COCO reader for dataset files.
///
/// # Example
///
/// ```rust,no_run
/// use coco_restack::coco::CocoReader;
///
/// let reader = CocoReader::new();
/// let dataset = reader.read_json("labels/publaynet/train.json")?;
/// println!("Loaded {} images", dataset.images.len());
/// # Ok::<(), coco_restack::Error>(())
/// ```
pub struct CocoReader {
    options: CocoReadOptions,
}

impl CocoReader {
    /// Create a new COCO reader with default options.
    pub fn new() -> Self {
        Self {
            options: CocoReadOptions::default(),
        }
    }

    /// Create a new COCO reader with custom options.
    pub fn with_options(options: CocoReadOptions) -> Self {
        Self { options }
    }

    /// Read a COCO dataset from a JSON file.
    ///
    /// A missing file is reported as [`Error::MissingInputFile`] and a parse
    /// failure as [`Error::MalformedJson`], both naming the path.
    pub fn read_json<P: AsRef<Path>>(&self, path: P) -> Result<CocoDataset, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::MissingInputFile(path.to_path_buf()),
            _ => Error::filesystem(path, e),
        })?;
        let reader = BufReader::with_capacity(64 * 1024, file);
        let dataset: CocoDataset = serde_json::from_reader(reader)
            .map_err(|e| Error::MalformedJson(path.to_path_buf(), e))?;

        log::debug!(
            "Read {} images and {} annotations from {}",
            dataset.images.len(),
            dataset.annotations.len(),
            path.display()
        );

        if self.options.validate {
            validate_dataset(&dataset)?;
        }

        Ok(dataset)
    }
}

impl Default for CocoReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that every annotation references an image in the same dataset.
pub fn validate_dataset(dataset: &CocoDataset) -> Result<(), Error> {
    let image_ids: HashSet<_> = dataset.images.iter().map(|i| i.id()).collect();

    for ann in &dataset.annotations {
        if !image_ids.contains(&ann.image_id()) {
            let id = ann.id().map_or_else(|| "without id".to_string(), |id| id.to_string());
            return Err(Error::VerificationFailed(format!(
                "Annotation {} references non-existent image_id {}",
                id,
                ann.image_id()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_reader_default() {
        let reader = CocoReader::new();
        assert!(!reader.options.validate);
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("val.json");

        match CocoReader::new().read_json(&path) {
            Err(Error::MissingInputFile(p)) => assert_eq!(p, path),
            other => panic!("Expected MissingInputFile, got {:?}", other),
        }
    }

    #[test]
    fn test_read_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("train.json");
        fs::write(&path, "{\"images\": [").unwrap();

        match CocoReader::new().read_json(&path) {
            Err(Error::MalformedJson(p, _)) => assert_eq!(p, path),
            other => panic!("Expected MalformedJson, got {:?}", other),
        }
    }

    #[test]
    fn test_read_with_validation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("orphans.json");
        fs::write(
            &path,
            r#"{
                "images": [{"id": 1, "file_name": "a.png", "width": 10, "height": 10}],
                "annotations": [{"id": 1, "image_id": 2, "category_id": 1, "bbox": [0, 0, 1, 1]}],
                "categories": [{"id": 1, "name": "text"}]
            }"#,
        )
        .unwrap();

        assert!(CocoReader::new().read_json(&path).is_ok());

        let strict = CocoReader::with_options(CocoReadOptions { validate: true });
        assert!(matches!(
            strict.read_json(&path),
            Err(Error::VerificationFailed(_))
        ));
    }

    #[test]
    fn test_validate_dataset_valid() {
        let mut dataset = CocoDataset {
            images: vec![CocoImage::new(1, "test.jpg")],
            annotations: vec![CocoAnnotation::new(1, 1)],
            ..Default::default()
        };

        assert!(validate_dataset(&dataset).is_ok());

        dataset
            .annotations
            .push(CocoAnnotation::try_from(serde_json::Map::from_iter([(
                "image_id".to_string(),
                serde_json::Value::from(5),
            )]))
            .unwrap());
        match validate_dataset(&dataset) {
            Err(Error::VerificationFailed(msg)) => assert!(msg.contains("without id")),
            other => panic!("Expected VerificationFailed, got {:?}", other),
        }
    }
}
