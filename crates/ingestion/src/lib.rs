//! # Ingestion
//!
//! Data sources feeding the time aligner.
//!
//! Responsibilities:
//! - Read KITTI raw drives (camera timestamps, oxts orientation and IMU)
//! - Read the stereo pair's calibration (`calib_cam_to_cam.txt`)
//! - Split the IMU stream into per-frame batches
//! - Provide trackers with known rotations (ground truth, scripted)
//! - Generate synthetic sequences with an injected IMU delay
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{GroundTruthTracker, KittiRawSequence};
//!
//! let sequence = KittiRawSequence::load("2011_09_26_drive_0001_sync", "image_00")?;
//! let mut tracker = GroundTruthTracker::new(sequence.orientations());
//! for bundle in sequence.bundles(None, false)? {
//!     // feed bundle.frame / bundle.imu to the aligner
//! }
//! ```

mod bundle;
mod calibration;
mod error;
mod kitti;
mod synthetic;
mod tracker;

// Re-exports
pub use bundle::{bundle_frames, FrameBundle, ImuSample};
pub use calibration::{
    stereo_partner, CamToCamCalibration, CameraParams, StereoCalibration, CAM_TO_CAM_FILE,
};
pub use error::{IngestionError, Result};
pub use kitti::{parse_kitti_timestamp, KittiImage, KittiRawSequence, KittiStereo, OxtsRecord};
pub use synthetic::{SyntheticRun, SyntheticSequence, SyntheticSignal};
pub use tracker::{GroundTruthTracker, ScriptedTracker};
