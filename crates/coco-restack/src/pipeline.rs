// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! End-to-end run: reset, aggregate, re-split, clean up.

use crate::{
    Error,
    aggregate::{Aggregation, aggregate},
    fsutil::{remove_dir, reset_dir},
    resplit::{ResplitSummary, resplit, resplit_from_staging},
    settings::PipelineConfig,
};

/// Outcome of a full pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Image records across both input shards.
    pub source_images: usize,
    /// Annotation records across both input shards.
    pub source_annotations: usize,
    pub summary: ResplitSummary,
}

/// Run both stages with `config`.
///
/// The staging and output roots are removed and recreated first, so a rerun
/// after a failure starts from a clean tree. The staging root is deleted on
/// success unless `keep_staging` is set. On failure whatever was written so
/// far is left in place.
pub fn run(config: &PipelineConfig) -> Result<RunReport, Error> {
    config.validate()?;
    let layout = config.layout();

    reset_dir(&layout.staging_root)?;
    reset_dir(&layout.output_root)?;

    log::info!(
        "Aggregating shards from {} into {}",
        layout.input_root.display(),
        layout.staging_root.display()
    );
    let Aggregation {
        dataset,
        source_images,
        source_annotations,
    } = aggregate(&layout)?;

    log::info!(
        "Re-splitting {} images into {}",
        dataset.images.len(),
        layout.output_root.display()
    );
    let summary = resplit(&dataset, &layout, &config.resplit_options())?;

    if config.keep_staging {
        log::info!("Keeping staging area {}", layout.staging_root.display());
    } else {
        remove_dir(&layout.staging_root)?;
    }

    Ok(RunReport {
        source_images,
        source_annotations,
        summary,
    })
}

/// Stage one alone. The staging root is reset first and kept afterwards.
pub fn run_aggregate(config: &PipelineConfig) -> Result<Aggregation, Error> {
    config.validate()?;
    let layout = config.layout();
    reset_dir(&layout.staging_root)?;
    aggregate(&layout)
}

/// Stage two alone, from the `all.json` a previous aggregation left behind.
pub fn run_resplit(config: &PipelineConfig) -> Result<ResplitSummary, Error> {
    config.validate()?;
    let layout = config.layout();
    let merged = layout.merged_annotations();
    if !merged.exists() {
        return Err(Error::MissingInputFile(merged));
    }
    reset_dir(&layout.output_root)?;
    resplit_from_staging(&layout, &config.resplit_options())
}
