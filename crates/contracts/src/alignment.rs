//! AlignmentResult - time aligner output

use serde::{Deserialize, Serialize};

/// Outcome of one time alignment attempt
///
/// `valid = false` means "not determined yet", never "failed"; the shift is
/// then always zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    /// Whether `imu_time_shift` can be applied
    pub valid: bool,

    /// Offset to apply to IMU timestamps (seconds)
    pub imu_time_shift: f64,
}

impl AlignmentResult {
    /// Not enough information yet
    pub const fn pending() -> Self {
        Self {
            valid: false,
            imu_time_shift: 0.0,
        }
    }

    /// Alignment determined with the given shift
    pub const fn aligned(imu_time_shift: f64) -> Self {
        Self {
            valid: true,
            imu_time_shift,
        }
    }
}

/// Why an alignment attempt ended the way it did
///
/// Used as the `outcome` label of the attempt counter and by run summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentOutcome {
    /// First frame stored as reference
    Bootstrap,
    /// Tracker returned a non-valid status
    DegenerateTracking,
    /// Frame arrived without IMU samples
    EmptyImu,
    /// Window not full yet
    InsufficientData,
    /// IMU signal too flat to trust a correlation peak
    LowVariance,
    /// Shift estimated on this call
    Aligned,
    /// Shift was already known, cached result returned
    Cached,
}

impl AlignmentOutcome {
    pub const ALL: [AlignmentOutcome; 7] = [
        AlignmentOutcome::Bootstrap,
        AlignmentOutcome::DegenerateTracking,
        AlignmentOutcome::EmptyImu,
        AlignmentOutcome::InsufficientData,
        AlignmentOutcome::LowVariance,
        AlignmentOutcome::Aligned,
        AlignmentOutcome::Cached,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlignmentOutcome::Bootstrap => "bootstrap",
            AlignmentOutcome::DegenerateTracking => "degenerate_tracking",
            AlignmentOutcome::EmptyImu => "empty_imu",
            AlignmentOutcome::InsufficientData => "insufficient_data",
            AlignmentOutcome::LowVariance => "low_variance",
            AlignmentOutcome::Aligned => "aligned",
            AlignmentOutcome::Cached => "cached",
        }
    }
}

impl std::fmt::Display for AlignmentOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_has_zero_shift() {
        let result = AlignmentResult::pending();
        assert!(!result.valid);
        assert_eq!(result.imu_time_shift, 0.0);
        assert_eq!(result, AlignmentResult::default());
    }

    #[test]
    fn test_outcome_labels_are_unique() {
        let mut labels: Vec<_> = AlignmentOutcome::ALL.iter().map(|o| o.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), AlignmentOutcome::ALL.len());
        assert_eq!(
            serde_json::to_string(&AlignmentOutcome::EmptyImu).unwrap(),
            "\"empty_imu\""
        );
    }
}
