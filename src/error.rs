//! Errors that abort the processing of a model.

use std::{io, path::PathBuf};
use thiserror::Error;

/// Structural and configuration errors.
///
/// Numeric anomalies affecting single galaxies are not represented here; they are
/// collected as [`crate::pipeline::Anomaly`] values while the run continues.
#[derive(Error, Debug)]
pub enum NebularError {
    #[error("Unrecognised photoionization model `{model}` (available: {available})")]
    UnknownModel { model: String, available: String },

    #[error("Property `{property}` not recognised for model `{model}` (expected U, Z or ne)")]
    UnknownProperty { property: String, model: String },

    #[error("Limits file {} for model `{model}` not found", .path.display())]
    MissingLimitsFile { model: String, path: PathBuf },

    #[error("Grid file {} for model `{model}` not found", .path.display())]
    MissingGridFile { model: String, path: PathBuf },

    #[error("Malformed row at line {line} of grid file {}: {message}", .path.display())]
    MalformedRow {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Malformed row at line {line} of limits file {}: {message}", .path.display())]
    MalformedLimits {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Lower limit {lower} exceeds upper limit {upper} for property `{property}`")]
    InvalidLimits {
        property: String,
        lower: f64,
        upper: f64,
    },

    #[error(
        "Ionization parameter {log_u} at line {line} of grid file {} matches no U bin",
        .path.display()
    )]
    UnmatchedUBin {
        path: PathBuf,
        line: usize,
        log_u: f64,
    },

    #[error("Inconsistent input: {message}")]
    InconsistentInput { message: String },

    #[error("Could not access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl NebularError {
    pub fn inconsistent_input<S: Into<String>>(message: S) -> Self {
        Self::InconsistentInput {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NebularError>;
