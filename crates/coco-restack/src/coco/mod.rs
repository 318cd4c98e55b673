// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! # COCO Dataset Format Support
//!
//! Reading and writing of COCO (Common Objects in Context) annotation files
//! as used by the PubLayNet document-layout dataset.
//!
//! Records are modelled loosely: the pipeline only needs image ids, file
//! names, annotation image ids and category names, so every other field is
//! carried through untouched.
//!
//! ## Example
//!
//! ```rust,no_run
//! use coco_restack::coco::{CocoReader, CocoWriter};
//!
//! # fn example() -> Result<(), coco_restack::Error> {
//! let dataset = CocoReader::new().read_json("labels/publaynet/train.json")?;
//! println!("Found {} images and {} annotations",
//!          dataset.images.len(), dataset.annotations.len());
//! CocoWriter::new().write_json(&dataset, "copy.json")?;
//! # Ok(())
//! # }
//! ```

mod reader;
mod types;
mod writer;

pub use types::{CocoAnnotation, CocoCategory, CocoDataset, CocoImage, CocoIndex};

pub use reader::{CocoReadOptions, CocoReader, validate_dataset};
pub use writer::{CocoWriteOptions, CocoWriter};
