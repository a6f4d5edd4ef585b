#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the sponsor wall crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.

use std::path::{Path, PathBuf};

/// Unified error type returned by the library stages and the CLI.
///
/// Variants map onto the three failure kinds of a run: fatal configuration
/// problems ([`Error::Credential`], [`Error::Validation`], [`Error::Parse`]),
/// transport failures from the sponsorship API ([`Error::Service`]) and
/// rendering failures ([`Error::Render`], [`Error::OutputIo`]).
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Wraps I/O errors that occur while reading configuration or snapshots.
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// Location of the file being read.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors.
    #[error("failed to parse configuration: {source}")]
    Parse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Returned when the configuration or upstream data violates invariants.
    #[error("invalid configuration: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// Wraps JSON encoding and decoding errors for reports and snapshots.
    #[error("failed to process JSON: {source}")]
    Serialize {
        /// Underlying serde_json error.
        source: serde_json::Error
    },
    /// Wraps I/O errors that occur while writing generated artifacts.
    #[error("failed to write artifact at {path:?}: {source}")]
    OutputIo {
        /// Location of the artifact being produced.
        path:   PathBuf,
        /// Underlying I/O error reported by the operating system.
        source: std::io::Error
    },
    /// Service errors when interacting with the sponsorship API.
    #[error("service error: {message}")]
    Service {
        /// Human readable message describing the service error.
        message: String
    },
    /// No account login or API token could be resolved.
    #[error("missing credentials: {message}")]
    Credential {
        /// Explanation including the ways to provide the missing value.
        message: String
    },
    /// PNG rasterization failed for a single variant.
    #[error("failed to rasterize: {message}")]
    Render {
        /// Human readable message describing the rendering failure.
        message: String
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs a service error from the provided displayable value.
    pub fn service<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Service {
            message: message.into()
        }
    }

    /// Constructs a credential error from the provided displayable value.
    pub fn credential<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Credential {
            message: message.into()
        }
    }

    /// Constructs a rasterization error from the provided displayable value.
    pub fn render<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Render {
            message: message.into()
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// Intended for CLI contexts; the returned string matches the
    /// [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Parse {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

impl From<masterror::AppError> for Error {
    fn from(error: masterror::AppError) -> Self {
        Self::Service {
            message: error.to_string()
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the file that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::OutputIo`] variant capturing the failing path and
/// source.
///
/// # Parameters
///
/// * `path` - Location of the artifact that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn output_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::OutputIo {
        path: path.to_path_buf(),
        source
    }
}
