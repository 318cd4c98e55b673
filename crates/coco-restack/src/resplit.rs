// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Stage two: randomly re-partition the merged dataset into train and val
//! splits and materialize the final layout.
//!
//! The partition is over images. Annotations follow their image, so every
//! annotation of the merged file lands in exactly one split and neither
//! split contains orphans.

use crate::{
    Error,
    coco::{CocoAnnotation, CocoDataset, CocoImage, CocoReadOptions, CocoReader, CocoWriter},
    fsutil::{copy_file, ensure_dir},
    layout::{DatasetLayout, Split},
    progress::progress_bar,
};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;

/// Options for the re-split stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ResplitOptions {
    /// Fraction of images assigned to train, in `[0, 1]`.
    pub train_ratio: f64,
    /// Fixed shuffle seed. `None` draws a fresh seed from the OS, so two runs
    /// produce different splits.
    pub seed: Option<u64>,
}

impl Default for ResplitOptions {
    fn default() -> Self {
        Self {
            train_ratio: DEFAULT_TRAIN_RATIO,
            seed: None,
        }
    }
}

/// Reject ratios outside `[0, 1]` (including NaN).
pub fn validate_ratio(train_ratio: f64) -> Result<(), Error> {
    if (0.0..=1.0).contains(&train_ratio) {
        Ok(())
    } else {
        Err(Error::InvalidParameters(format!(
            "train_ratio must be between 0.0 and 1.0, got {}",
            train_ratio
        )))
    }
}

/// Random source for a split: seeded when `seed` is given, entropy otherwise.
pub fn split_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Number of train images: `floor(len * train_ratio)`.
pub fn split_point(len: usize, train_ratio: f64) -> usize {
    ((len as f64 * train_ratio).floor() as usize).min(len)
}

/// Shuffle `images` and cut the permutation at [`split_point`].
pub fn split_images<R: Rng + ?Sized>(
    images: &[CocoImage],
    train_ratio: f64,
    rng: &mut R,
) -> (Vec<CocoImage>, Vec<CocoImage>) {
    let mut train = images.to_vec();
    train.shuffle(rng);
    let val = train.split_off(split_point(images.len(), train_ratio));
    (train, val)
}

/// The two datasets produced by a re-split.
#[derive(Debug, Clone)]
pub struct SplitDatasets {
    pub train: CocoDataset,
    pub val: CocoDataset,
}

impl SplitDatasets {
    pub fn get(&self, split: Split) -> &CocoDataset {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
        }
    }
}

fn annotations_of(annotations: &[CocoAnnotation], images: &[CocoImage]) -> Vec<CocoAnnotation> {
    let ids: HashSet<u64> = images.iter().map(|img| img.id()).collect();
    annotations
        .iter()
        .filter(|ann| ids.contains(&ann.image_id()))
        .cloned()
        .collect()
}

/// Partition `dataset` into train and val datasets sharing its `info`,
/// `licenses` and `categories`.
pub fn partition_dataset<R: Rng + ?Sized>(
    dataset: &CocoDataset,
    train_ratio: f64,
    rng: &mut R,
) -> SplitDatasets {
    let (train_images, val_images) = split_images(&dataset.images, train_ratio, rng);
    let train_annotations = annotations_of(&dataset.annotations, &train_images);
    let val_annotations = annotations_of(&dataset.annotations, &val_images);

    SplitDatasets {
        train: dataset.with_records(train_images, train_annotations),
        val: dataset.with_records(val_images, val_annotations),
    }
}

/// Counts and layout of a finished re-split.
#[derive(Debug, Clone, PartialEq)]
pub struct ResplitSummary {
    pub categories: Vec<String>,
    pub train_images: usize,
    pub train_annotations: usize,
    pub val_images: usize,
    pub val_annotations: usize,
    pub output_root: PathBuf,
}

impl ResplitSummary {
    fn from_splits(splits: &SplitDatasets, output_root: PathBuf) -> Self {
        Self {
            categories: splits
                .train
                .category_names()
                .into_iter()
                .map(String::from)
                .collect(),
            train_images: splits.train.images.len(),
            train_annotations: splits.train.annotations.len(),
            val_images: splits.val.images.len(),
            val_annotations: splits.val.annotations.len(),
            output_root,
        }
    }
}

impl fmt::Display for ResplitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset Summary:")?;
        writeln!(f, "---------------")?;
        writeln!(f, "Categories: {:?}", self.categories)?;
        writeln!(
            f,
            "Train set: {} images, {} annotations",
            self.train_images, self.train_annotations
        )?;
        writeln!(
            f,
            "Val set: {} images, {} annotations",
            self.val_images, self.val_annotations
        )?;
        writeln!(f)?;
        writeln!(f, "Directory structure:")?;
        writeln!(f, "{}/", self.output_root.display())?;
        writeln!(f, "├── images/")?;
        writeln!(f, "│   ├── train/")?;
        writeln!(f, "│   └── val/")?;
        writeln!(f, "└── annotations/")?;
        writeln!(f, "    ├── instances_train.json")?;
        writeln!(f, "    └── instances_val.json")
    }
}

/// Re-split `merged` and write the final layout under `layout.output_root`.
///
/// Both annotation files are written before any image is copied. Images are
/// read from `layout.staging_images_dir()`; one missing there aborts with
/// [`Error::MissingStagedImage`].
pub fn resplit(
    merged: &CocoDataset,
    layout: &DatasetLayout,
    options: &ResplitOptions,
) -> Result<ResplitSummary, Error> {
    validate_ratio(options.train_ratio)?;

    let mut rng = split_rng(options.seed);
    let splits = partition_dataset(merged, options.train_ratio, &mut rng);

    for split in Split::ALL {
        ensure_dir(&layout.output_images_dir(split))?;
    }
    ensure_dir(&layout.output_annotations_dir())?;

    let writer = CocoWriter::new();
    for split in Split::ALL {
        writer.write_json(splits.get(split), layout.output_annotations(split))?;
    }

    let staging_images = layout.staging_images_dir();
    for split in Split::ALL {
        let dataset = splits.get(split);
        let dst_dir = layout.output_images_dir(split);
        let bar = progress_bar(
            dataset.images.len(),
            match split {
                Split::Train => "Copying train images",
                Split::Val => "Copying val images",
            },
        );

        for img in &dataset.images {
            let src = staging_images.join(img.file_name());
            if !src.exists() {
                return Err(Error::MissingStagedImage(src));
            }
            copy_file(&src, &dst_dir.join(img.file_name()))?;
            bar.inc(1);
        }
        bar.finish_and_clear();
    }

    let summary = ResplitSummary::from_splits(&splits, layout.output_root.clone());
    log::info!(
        "Split {} images into {} train / {} val",
        merged.images.len(),
        summary.train_images,
        summary.val_images
    );
    Ok(summary)
}

/// Re-run the re-split from the merged file left in the staging area.
///
/// The merged file is rejected if it holds orphan annotations.
pub fn resplit_from_staging(
    layout: &DatasetLayout,
    options: &ResplitOptions,
) -> Result<ResplitSummary, Error> {
    let merged = CocoReader::with_options(CocoReadOptions { validate: true })
        .read_json(layout.merged_annotations())?;
    resplit(&merged, layout, options)
}
