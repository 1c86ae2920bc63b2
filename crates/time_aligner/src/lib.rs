//! # Time Aligner
//!
//! Online temporal calibration between a camera and an IMU.
//!
//! Responsibilities:
//! - Reduce vision relative rotations and IMU angular rates to scalar signals
//! - Keep a fixed-size sliding window of paired samples
//! - Gate the window on IMU signal variance against the gyro noise level
//! - Cross-correlate both signals and report the IMU time shift
//!
//! ## Usage
//!
//! ```ignore
//! use time_aligner::{CrossCorrTimeAligner, TimeAlignmentConfig};
//!
//! let mut aligner = CrossCorrTimeAligner::new(TimeAlignmentConfig::default())?;
//!
//! for bundle in bundles {
//!     let result = aligner.estimate_time_alignment(
//!         &mut tracker,
//!         &bundle.frame,
//!         &bundle.imu.stamps,
//!         &bundle.imu.acc_gyr,
//!     )?;
//!     if result.valid {
//!         // shift IMU timestamps by result.imu_time_shift
//!         break;
//!     }
//! }
//! ```

mod aligner;
mod buffer;
mod correlation;
mod error;
mod signal;
mod variance;

pub use aligner::{AlignerPhase, CrossCorrTimeAligner};
pub use buffer::{CorrelationSample, CorrelationWindow};
pub use correlation::{
    cross_correlation, find_peak, minimum_overlap, overlap_cosine, CorrelationEstimate,
    CorrelationPeak, CrossCorrelationEstimator,
};
pub use error::AlignmentError;
pub use signal::{
    frame_rate_sample, imu_rate_ticks, integrate_rotation, interpolate_vision, reduce_rate,
    rotation_angle, ImuTick,
};
pub use variance::{sample_variance, GateDecision, VarianceGate};

// Re-export contracts types
pub use contracts::{
    AlignmentOutcome, AlignmentResult, FrameObservation, ImuAccGyr, ImuStamps,
    RansacRotationResult, RotationSignal, TimeAlignmentConfig, Tracker, TrackingStatus,
};
