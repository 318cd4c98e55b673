// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Pipeline configuration.
//!
//! Sources, lowest priority first:
//! 1. built-in defaults (paths relative to the working directory),
//! 2. `config.toml` in the user config directory,
//! 3. an explicit configuration file,
//! 4. `RESTACK_*` environment variables,
//! 5. command-line overrides.

use crate::{
    Error,
    layout::DatasetLayout,
    resplit::{DEFAULT_TRAIN_RATIO, ResplitOptions, validate_ratio},
};
use config::{Config, Environment, File};
use directories::ProjectDirs;
use itertools::Itertools;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_INPUT_ROOT: &str = "smaller_publaynet_dataset";
pub const DEFAULT_STAGING_ROOT: &str = "temp_dataset";
pub const DEFAULT_OUTPUT_ROOT: &str = "coco_dataset";

/// Resolved settings for a pipeline run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineConfig {
    pub input_root: PathBuf,
    pub staging_root: PathBuf,
    pub output_root: PathBuf,
    pub train_ratio: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Leave the staging tree in place after a successful run.
    #[serde(default)]
    pub keep_staging: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from(DEFAULT_INPUT_ROOT),
            staging_root: PathBuf::from(DEFAULT_STAGING_ROOT),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            train_ratio: DEFAULT_TRAIN_RATIO,
            seed: None,
            keep_staging: false,
        }
    }
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input_root: Option<PathBuf>,
    pub staging_root: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    pub train_ratio: Option<f64>,
    pub seed: Option<u64>,
    pub keep_staging: Option<bool>,
}

fn path_value(path: Option<&PathBuf>) -> Option<String> {
    path.map(|p| p.to_string_lossy().into_owned())
}

/// Absolute form of `path` with `.` and `..` folded away. The deepest
/// existing ancestor is canonicalized so symlinked roots compare equal.
fn resolved(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normal = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normal.pop();
            }
            other => normal.push(other),
        }
    }

    let mut existing = normal.as_path();
    let mut rest: Vec<OsString> = Vec::new();
    loop {
        if let Ok(mut canonical) = existing.canonicalize() {
            canonical.extend(rest.iter().rev());
            return canonical;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return normal,
        }
    }
}

/// `config.toml` in the platform config directory, if one can be determined.
pub fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("ai", "EdgeFirst", "coco-restack")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

impl PipelineConfig {
    /// Assemble the configuration from every source.
    ///
    /// `file`, when given, must exist. The user config file is optional.
    pub fn load(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, Error> {
        let defaults = PipelineConfig::default();
        let mut builder = Config::builder()
            .set_default("input_root", DEFAULT_INPUT_ROOT)?
            .set_default("staging_root", DEFAULT_STAGING_ROOT)?
            .set_default("output_root", DEFAULT_OUTPUT_ROOT)?
            .set_default("train_ratio", defaults.train_ratio)?
            .set_default("keep_staging", defaults.keep_staging)?;

        if let Some(user_file) = user_config_file() {
            log::debug!("Looking for user configuration at {}", user_file.display());
            builder = builder.add_source(File::from(user_file).required(false));
        }

        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(true));
        }

        let settings = builder
            .add_source(Environment::with_prefix("RESTACK").try_parsing(true))
            .set_override_option("input_root", path_value(overrides.input_root.as_ref()))?
            .set_override_option("staging_root", path_value(overrides.staging_root.as_ref()))?
            .set_override_option("output_root", path_value(overrides.output_root.as_ref()))?
            .set_override_option("train_ratio", overrides.train_ratio)?
            .set_override_option("seed", overrides.seed.map(|s| s.to_string()))?
            .set_override_option("keep_staging", overrides.keep_staging)?
            .build()?;

        let config: PipelineConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check the ratio and that no root lies inside another.
    ///
    /// Staging and output are wiped before they are written, so a root
    /// nested in another would lose the input or its own results.
    pub fn validate(&self) -> Result<(), Error> {
        validate_ratio(self.train_ratio)?;
        let roots = [
            ("input", &self.input_root),
            ("staging", &self.staging_root),
            ("output", &self.output_root),
        ]
        .map(|(name, path)| (name, path, resolved(path)));

        for ((a_name, a_path, a), (b_name, b_path, b)) in roots.iter().tuple_combinations() {
            if a.starts_with(b) || b.starts_with(a) {
                return Err(Error::InvalidParameters(format!(
                    "{} root {} and {} root {} overlap",
                    a_name,
                    a_path.display(),
                    b_name,
                    b_path.display()
                )));
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> DatasetLayout {
        DatasetLayout::new(&self.input_root, &self.staging_root, &self.output_root)
    }

    pub fn resplit_options(&self) -> ResplitOptions {
        ResplitOptions {
            train_ratio: self.train_ratio,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_working_directory_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.input_root, PathBuf::from("smaller_publaynet_dataset"));
        assert_eq!(config.staging_root, PathBuf::from("temp_dataset"));
        assert_eq!(config.output_root, PathBuf::from("coco_dataset"));
        assert_eq!(config.train_ratio, 0.8);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_then_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("restack.toml");
        std::fs::write(
            &file,
            "input_root = \"/data/publaynet\"\ntrain_ratio = 0.7\nseed = 11\n",
        )
        .unwrap();

        let overrides = ConfigOverrides {
            output_root: Some(PathBuf::from("/data/out")),
            seed: Some(99),
            ..Default::default()
        };
        let config = PipelineConfig::load(Some(&file), &overrides).unwrap();

        assert_eq!(config.input_root, PathBuf::from("/data/publaynet"));
        assert_eq!(config.output_root, PathBuf::from("/data/out"));
        assert_eq!(config.train_ratio, 0.7);
        assert_eq!(config.seed, Some(99));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        assert!(matches!(
            PipelineConfig::load(Some(&missing), &ConfigOverrides::default()),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_rejects_overlapping_roots() {
        let config = PipelineConfig {
            staging_root: PathBuf::from("coco_dataset"),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_rejects_nested_roots() {
        let temp_dir = TempDir::new().unwrap();
        let nested_input = PipelineConfig {
            input_root: temp_dir.path().join("output").join("publaynet"),
            staging_root: temp_dir.path().join("staging"),
            output_root: temp_dir.path().join("output"),
            ..Default::default()
        };
        assert!(matches!(
            nested_input.validate(),
            Err(Error::InvalidParameters(_))
        ));

        let dotted = PipelineConfig {
            output_root: temp_dir.path().join("staging").join("..").join("output"),
            ..nested_input.clone()
        };
        assert!(matches!(
            dotted.validate(),
            Err(Error::InvalidParameters(_))
        ));

        let working_dir = PipelineConfig {
            staging_root: PathBuf::from("."),
            ..Default::default()
        };
        assert!(matches!(
            working_dir.validate(),
            Err(Error::InvalidParameters(_))
        ));

        let siblings = PipelineConfig {
            input_root: temp_dir.path().join("input"),
            ..nested_input
        };
        assert!(siblings.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_ratio_override() {
        let overrides = ConfigOverrides {
            train_ratio: Some(1.2),
            ..Default::default()
        };
        assert!(matches!(
            PipelineConfig::load(None, &overrides),
            Err(Error::InvalidParameters(_))
        ));
    }
}
