// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! # COCO Restack
//!
//! Consolidates a partial download of the PubLayNet document layout dataset
//! into a self-consistent COCO dataset with a fresh train/val split.
//!
//! ## Stages
//!
//! - **Aggregate**: merge the `train` and `val` shards, drop every image whose
//!   file is missing on disk (and its annotations), copy the survivors into a
//!   staging area and write the merged `all.json`.
//! - **Re-split**: shuffle the merged images, assign `floor(len * ratio)` of
//!   them to train and the rest to val, and write
//!   `annotations/instances_{train,val}.json` plus `images/{train,val}/`.
//!
//! Records are carried through verbatim: fields the pipeline does not read
//! (segmentation, area, license, ...) are preserved byte for byte in value.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use coco_restack::{Error, PipelineConfig, pipeline};
//!
//! fn main() -> Result<(), Error> {
//!     let config = PipelineConfig {
//!         seed: Some(7),
//!         ..Default::default()
//!     };
//!     let report = pipeline::run(&config)?;
//!     println!("{}", report.summary);
//!     Ok(())
//! }
//! ```
//!
//! ## Tooling
//!
//! - [`verify::verify_output`] checks an output tree for orphans, overlaps and
//!   stray files.
//! - [`browse::Browser`] steps through an output tree and renders the boxes of
//!   each image.

pub mod aggregate;
pub mod browse;
pub mod coco;
mod error;
pub mod fsutil;
pub mod layout;
pub mod pipeline;
mod progress;
pub mod resplit;
pub mod settings;
pub mod verify;

pub use crate::{
    error::Error,
    layout::{DatasetLayout, Split},
    pipeline::RunReport,
    resplit::{ResplitOptions, ResplitSummary},
    settings::{ConfigOverrides, PipelineConfig},
    verify::VerificationReport,
};
