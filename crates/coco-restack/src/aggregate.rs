// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Stage one: merge the train/val shards, drop records whose image file is
//! missing, and stage the survivors in a flat directory.

use crate::{
    Error,
    coco::{CocoDataset, CocoImage, CocoReader, CocoWriter},
    fsutil::{copy_file, ensure_dir},
    layout::{DatasetLayout, Split},
    progress::progress_bar,
};
use itertools::Itertools;
use std::collections::HashSet;
use std::path::Path;

/// Result of the aggregation stage.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Merged dataset holding only images present on disk.
    pub dataset: CocoDataset,
    /// Image records across both shards before filtering.
    pub source_images: usize,
    /// Annotation records across both shards before filtering.
    pub source_annotations: usize,
}

/// Concatenate two shards.
///
/// `info`, `licenses` and `categories` come from `train`. Image ids must be
/// unique across both shards since annotations reference images by id alone.
pub fn merge_shards(train: CocoDataset, val: CocoDataset) -> Result<CocoDataset, Error> {
    if let Some(id) = train
        .images
        .iter()
        .chain(val.images.iter())
        .map(|img| img.id())
        .duplicates()
        .next()
    {
        return Err(Error::DuplicateImageId(id));
    }

    let mut merged = train;
    merged.images.extend(val.images);
    merged.annotations.extend(val.annotations);
    Ok(merged)
}

/// File names of `images` that exist under `image_dir`.
pub fn existing_file_names(images: &[CocoImage], image_dir: &Path) -> HashSet<String> {
    let bar = progress_bar(images.len(), "Checking existing images");
    let mut existing = HashSet::new();

    for img in images {
        if image_dir.join(img.file_name()).exists() {
            existing.insert(img.file_name().to_string());
        } else {
            log::debug!("Image not found on disk: {}", img.file_name());
        }
        bar.inc(1);
    }

    bar.finish_and_clear();
    existing
}

/// Keep images whose file exists and the annotations that reference them.
pub fn filter_to_existing(mut dataset: CocoDataset, existing: &HashSet<String>) -> CocoDataset {
    dataset
        .images
        .retain(|img| existing.contains(img.file_name()));

    let image_ids: HashSet<u64> = dataset.images.iter().map(|img| img.id()).collect();
    dataset
        .annotations
        .retain(|ann| image_ids.contains(&ann.image_id()));

    dataset
}

/// Run the aggregation stage against `layout`.
///
/// Reads both shards, filters to images present in the source image
/// directory, copies them to `staging_root/images` and writes
/// `staging_root/annotations/all.json`.
pub fn aggregate(layout: &DatasetLayout) -> Result<Aggregation, Error> {
    let reader = CocoReader::new();
    let train = reader.read_json(layout.shard_annotations(Split::Train))?;
    let val = reader.read_json(layout.shard_annotations(Split::Val))?;

    let merged = merge_shards(train, val)?;
    let source_images = merged.images.len();
    let source_annotations = merged.annotations.len();
    log::info!(
        "Found total {} images and {} annotations",
        source_images,
        source_annotations
    );

    let source_dir = layout.source_images_dir();
    let existing = existing_file_names(&merged.images, &source_dir);
    let dataset = filter_to_existing(merged, &existing);

    log::info!(
        "Found {} existing images out of {}",
        existing.len(),
        source_images
    );
    let dropped = source_annotations - dataset.annotations.len();
    if dropped > 0 {
        log::warn!("Dropped {} annotations of missing images", dropped);
    }

    let staging_images = layout.staging_images_dir();
    ensure_dir(&staging_images)?;
    ensure_dir(&layout.staging_annotations_dir())?;

    let bar = progress_bar(dataset.images.len(), "Copying images");
    for img in &dataset.images {
        copy_file(
            &source_dir.join(img.file_name()),
            &staging_images.join(img.file_name()),
        )?;
        bar.inc(1);
    }
    bar.finish_and_clear();

    CocoWriter::new().write_json(&dataset, layout.merged_annotations())?;
    log::info!(
        "Staged {} images and {} annotations in {}",
        dataset.images.len(),
        dataset.annotations.len(),
        layout.staging_root.display()
    );

    Ok(Aggregation {
        dataset,
        source_images,
        source_annotations,
    })
}
