//! Tracker capability consumed by the temporal calibration.

use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};

use crate::FrameObservation;

/// Outcome of the geometric verification between two frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    /// Relative pose is trustworthy
    Valid,
    /// Not enough parallax between the frames
    LowDisparity,
    /// Too few feature matches survived
    FewMatches,
    /// Verification failed
    Invalid,
    /// Geometric verification is switched off
    Disabled,
}

impl TrackingStatus {
    #[inline]
    pub fn is_valid(self) -> bool {
        matches!(self, TrackingStatus::Valid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrackingStatus::Valid => "valid",
            TrackingStatus::LowDisparity => "low_disparity",
            TrackingStatus::FewMatches => "few_matches",
            TrackingStatus::Invalid => "invalid",
            TrackingStatus::Disabled => "disabled",
        }
    }
}

/// Result of monocular RANSAC between a reference and a current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RansacRotationResult {
    pub status: TrackingStatus,

    /// Rotation of the current frame relative to the reference frame.
    /// Only meaningful when `status` is [`TrackingStatus::Valid`].
    pub relative_rotation: UnitQuaternion<f64>,
}

impl RansacRotationResult {
    pub fn valid(relative_rotation: UnitQuaternion<f64>) -> Self {
        Self {
            status: TrackingStatus::Valid,
            relative_rotation,
        }
    }

    /// Result carrying no rotation information
    pub fn with_status(status: TrackingStatus) -> Self {
        Self {
            status,
            relative_rotation: UnitQuaternion::identity(),
        }
    }
}

/// Visual front-end capability: relative rotation between two frames
///
/// Implemented by the real feature tracker as well as by replay and
/// ground-truth sources.
pub trait Tracker {
    /// Run 2D-2D outlier rejection between `reference` and `current` and
    /// report the relative rotation.
    fn geometric_outlier_rejection_mono(
        &mut self,
        reference: &FrameObservation,
        current: &FrameObservation,
    ) -> RansacRotationResult;
}
