// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Buffered COCO JSON writer.

use super::types::CocoDataset;
use crate::Error;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Options for COCO writing.
#[derive(Debug, Clone, Default)]
pub struct CocoWriteOptions {
    /// Pretty-print JSON with indentation.
    pub pretty: bool,
}

/// COCO writer for generating annotation files.
///
/// # Example
///
/// ```rust,no_run
/// use coco_restack::coco::{CocoDataset, CocoWriter};
///
/// let writer = CocoWriter::new();
/// let dataset = CocoDataset::default();
/// writer.write_json(&dataset, "annotations/all.json")?;
/// # Ok::<(), coco_restack::Error>(())
/// ```
pub struct CocoWriter {
    options: CocoWriteOptions,
}

impl CocoWriter {
    /// Create a new COCO writer with default options.
    pub fn new() -> Self {
        Self {
            options: CocoWriteOptions::default(),
        }
    }

    /// Create a new COCO writer with custom options.
    pub fn with_options(options: CocoWriteOptions) -> Self {
        Self { options }
    }

    /// Write COCO dataset to a JSON file.
    ///
    /// # Arguments
    /// * `dataset` - The COCO dataset to write
    /// * `path` - Output file path, parent directories are created
    pub fn write_json<P: AsRef<Path>>(&self, dataset: &CocoDataset, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::filesystem(parent, e))?;
        }

        let file = File::create(path).map_err(|e| Error::filesystem(path, e))?;
        let mut writer = BufWriter::with_capacity(64 * 1024, file);

        if self.options.pretty {
            serde_json::to_writer_pretty(&mut writer, dataset)?;
        } else {
            serde_json::to_writer(&mut writer, dataset)?;
        }
        writer.flush().map_err(|e| Error::filesystem(path, e))?;

        log::debug!(
            "Wrote {} images and {} annotations to {}",
            dataset.images.len(),
            dataset.annotations.len(),
            path.display()
        );
        Ok(())
    }
}

impl Default for CocoWriter {
    fn default() -> Self {
        Self::new()
    }
}
