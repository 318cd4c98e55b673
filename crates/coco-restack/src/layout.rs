// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! On-disk layout of the source shards, the staging area and the final
//! re-split dataset.
//!
//! ```text
//! input_root/
//! ├── labels/publaynet/{train,val}.json
//! └── train-0/publaynet/train/<file_name>
//! staging_root/
//! ├── images/<file_name>
//! └── annotations/all.json
//! output_root/
//! ├── images/{train,val}/<file_name>
//! └── annotations/instances_{train,val}.json
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const SHARD_LABELS_DIR: &str = "labels/publaynet";
const SOURCE_IMAGES_DIR: &str = "train-0/publaynet/train";
const MERGED_FILE: &str = "all.json";

/// One of the two final partitions of the re-split dataset.
///
/// The input shards use the same names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Val];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "train" => Ok(Split::Train),
            "val" | "validation" => Ok(Split::Val),
            _ => Err(format!("unknown split '{}', expected train or val", s)),
        }
    }
}

/// Root directories of the three trees the pipeline touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    pub input_root: PathBuf,
    pub staging_root: PathBuf,
    pub output_root: PathBuf,
}

impl DatasetLayout {
    pub fn new(
        input_root: impl Into<PathBuf>,
        staging_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_root: input_root.into(),
            staging_root: staging_root.into(),
            output_root: output_root.into(),
        }
    }

    /// `input_root/labels/publaynet/<split>.json`
    pub fn shard_annotations(&self, split: Split) -> PathBuf {
        self.input_root
            .join(SHARD_LABELS_DIR)
            .join(format!("{}.json", split.as_str()))
    }

    /// Directory holding the source images of both shards.
    pub fn source_images_dir(&self) -> PathBuf {
        self.input_root.join(SOURCE_IMAGES_DIR)
    }

    pub fn staging_images_dir(&self) -> PathBuf {
        self.staging_root.join("images")
    }

    pub fn staging_annotations_dir(&self) -> PathBuf {
        self.staging_root.join("annotations")
    }

    /// The merged, filtered dataset written by the aggregator.
    pub fn merged_annotations(&self) -> PathBuf {
        self.staging_annotations_dir().join(MERGED_FILE)
    }

    pub fn output_annotations_dir(&self) -> PathBuf {
        self.output_root.join("annotations")
    }

    /// `output_root/images/<split>`
    pub fn output_images_dir(&self, split: Split) -> PathBuf {
        self.output_root.join("images").join(split.as_str())
    }

    /// `output_root/annotations/instances_<split>.json`
    pub fn output_annotations(&self, split: Split) -> PathBuf {
        output_annotations_in(&self.output_root, split)
    }
}

/// Annotation file of `split` under an arbitrary output root.
pub fn output_annotations_in(output_root: &Path, split: Split) -> PathBuf {
    output_root
        .join("annotations")
        .join(format!("instances_{}.json", split.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = DatasetLayout::new("in", "tmp", "out");

        assert_eq!(
            layout.shard_annotations(Split::Val),
            PathBuf::from("in/labels/publaynet/val.json")
        );
        assert_eq!(
            layout.source_images_dir(),
            PathBuf::from("in/train-0/publaynet/train")
        );
        assert_eq!(
            layout.merged_annotations(),
            PathBuf::from("tmp/annotations/all.json")
        );
        assert_eq!(
            layout.output_images_dir(Split::Train),
            PathBuf::from("out/images/train")
        );
        assert_eq!(
            layout.output_annotations(Split::Val),
            PathBuf::from("out/annotations/instances_val.json")
        );
    }

    #[test]
    fn test_split_from_str() {
        assert_eq!("train".parse::<Split>().unwrap(), Split::Train);
        assert_eq!("VAL".parse::<Split>().unwrap(), Split::Val);
        assert!("test".parse::<Split>().is_err());
    }
}
