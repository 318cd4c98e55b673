// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Consistency checks over a re-split output tree.
//!
//! Re-reads both split files and compares them against each other and
//! against the image directories on disk.

use crate::{
    Error,
    coco::{CocoDataset, CocoReader},
    layout::{Split, output_annotations_in},
};
use itertools::Itertools;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use walkdir::WalkDir;

const MAX_LISTED: usize = 5;

/// Findings for one split.
#[derive(Debug, Clone)]
pub struct SplitCheck {
    pub split: Split,
    pub images: usize,
    pub annotations: usize,
    /// `image_id` of every annotation whose image is not in the split.
    pub orphan_annotations: Vec<u64>,
    /// Image ids listed more than once.
    pub duplicate_image_ids: Vec<u64>,
    /// Listed images with no file in `images/<split>/`.
    pub missing_files: Vec<String>,
    /// Files in `images/<split>/` that no image record lists.
    pub unlisted_files: Vec<String>,
}

impl SplitCheck {
    pub fn is_valid(&self) -> bool {
        self.orphan_annotations.is_empty()
            && self.duplicate_image_ids.is_empty()
            && self.missing_files.is_empty()
            && self.unlisted_files.is_empty()
    }
}

/// Result of verifying an output tree.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub train: SplitCheck,
    pub val: SplitCheck,
    /// Image ids present in both splits.
    pub overlapping_image_ids: Vec<u64>,
    /// Whether both files carry identical category lists.
    pub categories_match: bool,
}

impl VerificationReport {
    /// Returns true if the verification passed all checks.
    pub fn is_valid(&self) -> bool {
        self.train.is_valid()
            && self.val.is_valid()
            && self.overlapping_image_ids.is_empty()
            && self.categories_match
    }

    /// One-line description of the first failing check.
    pub fn first_problem(&self) -> Option<String> {
        for check in [&self.train, &self.val] {
            if !check.orphan_annotations.is_empty() {
                return Some(format!(
                    "{} orphan annotations in {}",
                    check.orphan_annotations.len(),
                    check.split
                ));
            }
            if !check.duplicate_image_ids.is_empty() {
                return Some(format!(
                    "duplicate image ids in {}: {:?}",
                    check.split, check.duplicate_image_ids
                ));
            }
            if !check.missing_files.is_empty() {
                return Some(format!(
                    "{} images missing from images/{}",
                    check.missing_files.len(),
                    check.split
                ));
            }
            if !check.unlisted_files.is_empty() {
                return Some(format!(
                    "{} unlisted files in images/{}",
                    check.unlisted_files.len(),
                    check.split
                ));
            }
        }
        if !self.overlapping_image_ids.is_empty() {
            return Some(format!(
                "{} images appear in both splits",
                self.overlapping_image_ids.len()
            ));
        }
        if !self.categories_match {
            return Some("category lists differ between splits".to_string());
        }
        None
    }
}

fn write_names(f: &mut fmt::Formatter<'_>, label: &str, names: &[String]) -> fmt::Result {
    if names.is_empty() {
        return Ok(());
    }
    writeln!(f, "║   {}: {}", label, names.len())?;
    for name in names.iter().take(MAX_LISTED) {
        writeln!(f, "║              - {}", name)?;
    }
    if names.len() > MAX_LISTED {
        writeln!(f, "║              ... and {} more", names.len() - MAX_LISTED)?;
    }
    Ok(())
}

impl fmt::Display for SplitCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "║ {:<6} {} images, {} annotations",
            self.split, self.images, self.annotations
        )?;
        if !self.orphan_annotations.is_empty() {
            writeln!(
                f,
                "║   Orphan annotations: {}",
                self.orphan_annotations.len()
            )?;
        }
        if !self.duplicate_image_ids.is_empty() {
            writeln!(
                f,
                "║   Duplicate image ids: {:?}",
                self.duplicate_image_ids
            )?;
        }
        write_names(f, "Missing", &self.missing_files)?;
        write_names(f, "Unlisted", &self.unlisted_files)
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "╔══════════════════════════════════════════════════════════════╗"
        )?;
        writeln!(
            f,
            "║                  RE-SPLIT OUTPUT VERIFICATION                ║"
        )?;
        writeln!(
            f,
            "╠══════════════════════════════════════════════════════════════╣"
        )?;
        write!(f, "{}", self.train)?;
        write!(f, "{}", self.val)?;
        writeln!(
            f,
            "╠══════════════════════════════════════════════════════════════╣"
        )?;
        writeln!(
            f,
            "║ Shared images: {}",
            self.overlapping_image_ids.len()
        )?;
        writeln!(
            f,
            "║ Categories:    {}",
            if self.categories_match {
                "identical"
            } else {
                "DIFFER"
            }
        )?;
        let status = if self.is_valid() {
            "✓ PASSED"
        } else {
            "✗ FAILED"
        };
        writeln!(f, "║ Status: {}", status)?;
        writeln!(
            f,
            "╚══════════════════════════════════════════════════════════════╝"
        )
    }
}

/// Relative paths of the files under `dir`, with `/` separators.
fn files_under(dir: &Path) -> Vec<String> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(dir)
                .unwrap_or(e.path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .join("/")
        })
        .collect()
}

/// Check one split's records against its image directory.
pub fn check_split(dataset: &CocoDataset, images_dir: &Path, split: Split) -> SplitCheck {
    let image_ids: HashSet<u64> = dataset.images.iter().map(|img| img.id()).collect();
    let listed: HashSet<&str> = dataset.images.iter().map(|img| img.file_name()).collect();

    let orphan_annotations = dataset
        .annotations
        .iter()
        .map(|ann| ann.image_id())
        .filter(|image_id| !image_ids.contains(image_id))
        .collect();

    let duplicate_image_ids = dataset
        .images
        .iter()
        .map(|img| img.id())
        .duplicates()
        .sorted()
        .collect();

    let missing_files = dataset
        .images
        .iter()
        .filter(|img| !images_dir.join(img.file_name()).is_file())
        .map(|img| img.file_name().to_string())
        .sorted()
        .collect();

    let unlisted_files = files_under(images_dir)
        .into_iter()
        .filter(|name| !listed.contains(name.as_str()))
        .sorted()
        .collect();

    SplitCheck {
        split,
        images: dataset.images.len(),
        annotations: dataset.annotations.len(),
        orphan_annotations,
        duplicate_image_ids,
        missing_files,
        unlisted_files,
    }
}

/// Verify the split files and image directories under `output_root`.
pub fn verify_output(output_root: &Path) -> Result<VerificationReport, Error> {
    let reader = CocoReader::new();
    let train = reader.read_json(output_annotations_in(output_root, Split::Train))?;
    let val = reader.read_json(output_annotations_in(output_root, Split::Val))?;

    let images_dir = |split: Split| output_root.join("images").join(split.as_str());
    let train_check = check_split(&train, &images_dir(Split::Train), Split::Train);
    let val_check = check_split(&val, &images_dir(Split::Val), Split::Val);

    let train_ids: HashSet<u64> = train.images.iter().map(|img| img.id()).collect();
    let overlapping_image_ids = val
        .images
        .iter()
        .map(|img| img.id())
        .filter(|id| train_ids.contains(id))
        .sorted()
        .collect();

    let report = VerificationReport {
        train: train_check,
        val: val_check,
        overlapping_image_ids,
        categories_match: train.categories == val.categories,
    };

    if let Some(problem) = report.first_problem() {
        log::warn!("Verification of {}: {}", output_root.display(), problem);
    } else {
        log::info!("Verification of {} passed", output_root.display());
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coco::{CocoAnnotation, CocoCategory, CocoImage, CocoWriter};
    use std::fs;
    use tempfile::TempDir;

    fn image(id: u64, file_name: &str) -> CocoImage {
        CocoImage::new(id, file_name)
    }

    #[test]
    fn test_check_split_flags_problems() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.png"), b"a").unwrap();
        fs::write(temp_dir.path().join("stray.png"), b"x").unwrap();

        let dataset = CocoDataset {
            images: vec![image(1, "a.png"), image(2, "b.png"), image(2, "b.png")],
            annotations: vec![CocoAnnotation::new(10, 1), CocoAnnotation::new(11, 5)],
            ..Default::default()
        };

        let check = check_split(&dataset, temp_dir.path(), Split::Train);

        assert_eq!(check.orphan_annotations, vec![5]);
        assert_eq!(check.duplicate_image_ids, vec![2]);
        assert_eq!(check.missing_files, vec!["b.png", "b.png"]);
        assert_eq!(check.unlisted_files, vec!["stray.png"]);
        assert!(!check.is_valid());
    }

    #[test]
    fn test_verify_output_detects_overlap() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let categories = Some(vec![CocoCategory::new(1, "text")]);

        for (split, names) in [(Split::Train, ["a.png"]), (Split::Val, ["a.png"])] {
            let dir = root.join("images").join(split.as_str());
            fs::create_dir_all(&dir).unwrap();
            for name in names {
                fs::write(dir.join(name), b"a").unwrap();
            }
            let dataset = CocoDataset {
                categories: categories.clone(),
                images: vec![image(1, "a.png")],
                ..Default::default()
            };
            CocoWriter::new()
                .write_json(&dataset, output_annotations_in(root, split))
                .unwrap();
        }

        let report = verify_output(root).unwrap();
        assert!(report.train.is_valid());
        assert!(report.val.is_valid());
        assert!(report.categories_match);
        assert_eq!(report.overlapping_image_ids, vec![1]);
        assert!(!report.is_valid());
        assert!(report.to_string().contains("FAILED"));
    }

    #[test]
    fn test_verify_output_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            verify_output(temp_dir.path()),
            Err(Error::MissingInputFile(_))
        ));
    }
}
