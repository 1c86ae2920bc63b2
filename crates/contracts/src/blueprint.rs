//! CalibrationBlueprint - Config Loader output
//!
//! Describes one temporal calibration session: estimator settings and the
//! dataset replayed through it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::TimeAlignmentConfig;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete calibration session blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Stop after this many frames even without convergence
    #[serde(default)]
    pub max_frames: Option<u64>,

    /// Time aligner settings
    #[serde(default)]
    pub alignment: TimeAlignmentConfig,

    /// Recorded sequence to replay (optional for pure validation)
    #[serde(default)]
    pub dataset: Option<DatasetConfig>,
}

/// Supported dataset layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetFormat {
    /// KITTI raw drive (camera folders + oxts)
    #[default]
    KittiRaw,
}

/// Dataset location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Dataset layout
    #[serde(default)]
    pub format: DatasetFormat,

    /// Root folder of the drive
    pub path: PathBuf,

    /// Camera folder name inside the drive
    #[serde(default = "default_camera")]
    pub camera: String,

    /// Right camera of the stereo pair; when set the drive is loaded with
    /// both image lists and the cam-to-cam calibration
    #[serde(default)]
    pub right_camera: Option<String>,
}

fn default_camera() -> String {
    "image_00".to_string()
}
