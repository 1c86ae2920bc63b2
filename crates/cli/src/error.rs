//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// `run` needs a dataset section or a `--dataset` override
    #[error("No dataset configured in {}; add a [dataset] section or pass --dataset", config.display())]
    DatasetMissing { config: PathBuf },

    /// Sequence ended before the aligner produced a shift
    #[error("Time alignment did not converge after {frames} frames")]
    NotConverged { frames: u64 },

    /// Synthetic run recovered a different delay than the injected one
    #[error("Estimated IMU time shift {estimated:.3e} s differs from injected {expected:.3e} s")]
    ShiftMismatch { estimated: f64, expected: f64 },
}

impl CliError {
    pub fn dataset_missing(config: impl Into<PathBuf>) -> Self {
        Self::DatasetMissing {
            config: config.into(),
        }
    }
}
