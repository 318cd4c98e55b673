// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use std::path::PathBuf;

/// Error type for every dataset consolidation operation.
///
/// None of these are recovered from inside the pipeline: the first error
/// aborts the current stage and is surfaced to the caller with the offending
/// path when one is known.
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred outside of a specific dataset path.
    IoError(std::io::Error),
    /// JSON serialization error while writing a dataset file.
    JsonError(serde_json::Error),
    /// Configuration parsing or loading error.
    ConfigError(config::ConfigError),
    /// Image decoding or encoding error while rendering a preview.
    ImageError(image::ImageError),
    /// Interactive prompt error from the browser loop.
    PromptError(inquire::InquireError),
    /// A required annotation file does not exist.
    MissingInputFile(PathBuf),
    /// An annotation file exists but could not be parsed.
    MalformedJson(PathBuf, serde_json::Error),
    /// An image selected for a split is absent from the staging directory.
    MissingStagedImage(PathBuf),
    /// Directory creation, removal or file copy failed for the given path.
    FilesystemError(PathBuf, std::io::Error),
    /// The same image id appears more than once across the input shards.
    DuplicateImageId(u64),
    /// Invalid parameters provided to an operation.
    InvalidParameters(String),
    /// The output tree failed verification.
    VerificationFailed(String),
}

impl Error {
    /// Wraps an I/O error with the path it occurred on.
    pub(crate) fn filesystem(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Error::FilesystemError(path.into(), err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::ConfigError(err)
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageError(err)
    }
}

impl From<inquire::InquireError> for Error {
    fn from(err: inquire::InquireError) -> Self {
        Error::PromptError(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "I/O error: {}", e),
            Error::JsonError(e) => write!(f, "JSON error: {}", e),
            Error::ConfigError(e) => write!(f, "Configuration error: {}", e),
            Error::ImageError(e) => write!(f, "Image error: {}", e),
            Error::PromptError(e) => write!(f, "Prompt error: {}", e),
            Error::MissingInputFile(p) => write!(f, "Missing input file: {}", p.display()),
            Error::MalformedJson(p, e) => {
                write!(f, "Malformed JSON in {}: {}", p.display(), e)
            }
            Error::MissingStagedImage(p) => {
                write!(f, "Missing staged image: {}", p.display())
            }
            Error::FilesystemError(p, e) => {
                write!(f, "Filesystem error at {}: {}", p.display(), e)
            }
            Error::DuplicateImageId(id) => write!(f, "Duplicate image id: {}", id),
            Error::InvalidParameters(s) => write!(f, "Invalid parameters: {}", s),
            Error::VerificationFailed(s) => write!(f, "Verification failed: {}", s),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::JsonError(e) => Some(e),
            Error::ConfigError(e) => Some(e),
            Error::ImageError(e) => Some(e),
            Error::PromptError(e) => Some(e),
            Error::MalformedJson(_, e) => Some(e),
            Error::FilesystemError(_, e) => Some(e),
            _ => None,
        }
    }
}
