//! Time aligner error types

use contracts::ContractError;
use thiserror::Error;

/// Errors raised by the time aligner
///
/// "Not converged yet" is never an error; it is reported through
/// `AlignmentResult::valid`.
#[derive(Debug, Error)]
pub enum AlignmentError {
    /// Configuration rejected at construction
    #[error("invalid time alignment config: {0}")]
    InvalidConfig(#[source] ContractError),

    /// IMU batch or frame data is malformed
    #[error("malformed time alignment input: {0}")]
    MalformedInput(#[source] ContractError),
}
