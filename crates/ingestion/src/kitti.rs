//! KITTI raw sequence reader
//!
//! Layout of one drive directory:
//!
//! ```text
//! <root>/<camera>/timestamps.txt
//! <root>/<camera>/data/0000000000.png
//! <root>/oxts/timestamps.txt
//! <root>/oxts/data/0000000000.txt
//! <root>/../calib_cam_to_cam.txt    (stereo only)
//! ```
//!
//! Timestamps are `YYYY-MM-DD HH:MM:SS.fffffffff`. Each oxts record holds 30
//! space separated values: roll/pitch/yaw at 3-5, accelerations at 11-13 and
//! angular rates at 17-19.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::NaiveDateTime;
use contracts::{ContractError, FrameObservation, Timestamp};
use nalgebra::{UnitQuaternion, Vector3};
use tracing::{debug, info, instrument, warn};

use crate::bundle::{bundle_frames, FrameBundle, ImuSample};
use crate::calibration::{CamToCamCalibration, StereoCalibration, CAM_TO_CAM_FILE};
use crate::error::{IngestionError, Result};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const OXTS_FIELDS: usize = 30;
const OXTS_DIR: &str = "oxts";

/// Camera image reference, bytes are read on demand
#[derive(Debug, Clone, PartialEq)]
pub struct KittiImage {
    pub timestamp: Timestamp,
    pub path: PathBuf,
}

/// One GPS/IMU record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OxtsRecord {
    pub timestamp: Timestamp,
    /// Body orientation from roll/pitch/yaw
    pub orientation: UnitQuaternion<f64>,
    pub acc: Vector3<f64>,
    pub gyro: Vector3<f64>,
}

impl OxtsRecord {
    pub fn imu_sample(&self) -> ImuSample {
        ImuSample {
            timestamp: self.timestamp,
            acc: self.acc,
            gyro: self.gyro,
        }
    }
}

/// Second camera of a stereo drive
#[derive(Debug, Clone)]
pub struct KittiStereo {
    pub camera: String,
    pub images: Vec<KittiImage>,
    pub calibration: StereoCalibration,
}

/// A loaded KITTI raw drive
#[derive(Debug, Clone)]
pub struct KittiRawSequence {
    root: PathBuf,
    camera: String,
    images: Vec<KittiImage>,
    oxts: Vec<OxtsRecord>,
    stereo: Option<KittiStereo>,
}

impl KittiRawSequence {
    /// Read timestamps and oxts records of the drive at `root`.
    ///
    /// Oxts records whose timestamp does not increase are dropped.
    #[instrument(name = "kitti_load", skip(root), fields(root = %root.as_ref().display()))]
    pub fn load(root: impl AsRef<Path>, camera: &str) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let images = load_images(&root, camera)?;

        let oxts_dir = root.join(OXTS_DIR);
        let oxts_times = parse_timestamps(&oxts_dir.join("timestamps.txt"))?;
        let mut oxts: Vec<OxtsRecord> = Vec::with_capacity(oxts_times.len());
        let mut dropped = 0u64;
        for (index, timestamp) in oxts_times.into_iter().enumerate() {
            let path = oxts_dir.join("data").join(format!("{index:010}.txt"));
            let record = parse_oxts_record(&path, timestamp)?;
            if oxts.last().is_some_and(|last| last.timestamp >= timestamp) {
                dropped += 1;
                continue;
            }
            oxts.push(record);
        }

        if dropped > 0 {
            warn!(dropped, "dropped oxts records with non-increasing timestamps");
            metrics::counter!("ingestion_oxts_records_dropped_total").increment(dropped);
        }
        info!(
            camera,
            frames = images.len(),
            oxts = oxts.len(),
            "loaded KITTI raw sequence"
        );

        Ok(Self {
            root,
            camera: camera.to_string(),
            images,
            oxts,
            stereo: None,
        })
    }

    /// Load the drive with `left` as the aligned camera, plus the image list
    /// of `right` and the pair's calibration from `calib_cam_to_cam.txt`.
    #[instrument(name = "kitti_load_stereo", skip(root), fields(root = %root.as_ref().display()))]
    pub fn load_stereo(root: impl AsRef<Path>, left: &str, right: &str) -> Result<Self> {
        let root = root.as_ref();
        let mut sequence = Self::load(root, left)?;

        let right_images = load_images(root, right)?;
        if right_images.len() != sequence.images.len() {
            warn!(
                left = sequence.images.len(),
                right = right_images.len(),
                "stereo image lists differ in length, pairing up to the shorter one"
            );
        }

        let calibration_path =
            CamToCamCalibration::locate(root).ok_or_else(|| IngestionError::MissingFile {
                path: root.join(CAM_TO_CAM_FILE).display().to_string(),
            })?;
        let calibration = CamToCamCalibration::load(&calibration_path)?.stereo(left, right)?;
        info!(
            right,
            baseline_m = calibration.baseline(),
            "loaded stereo camera pair"
        );

        sequence.stereo = Some(KittiStereo {
            camera: right.to_string(),
            images: right_images,
            calibration,
        });
        Ok(sequence)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn camera(&self) -> &str {
        &self.camera
    }

    pub fn images(&self) -> &[KittiImage] {
        &self.images
    }

    pub fn oxts(&self) -> &[OxtsRecord] {
        &self.oxts
    }

    pub fn stereo(&self) -> Option<&KittiStereo> {
        self.stereo.as_ref()
    }

    /// Left/right images with the same index; empty for a mono drive
    pub fn stereo_pairs(&self) -> impl Iterator<Item = (&KittiImage, &KittiImage)> + '_ {
        let right = self.stereo.as_ref().map_or(&[][..], |s| s.images.as_slice());
        self.images.iter().zip(right)
    }

    pub fn imu_samples(&self) -> Vec<ImuSample> {
        self.oxts.iter().map(OxtsRecord::imu_sample).collect()
    }

    /// Orientation lookup table for the ground-truth tracker
    pub fn orientations(&self) -> Vec<(Timestamp, UnitQuaternion<f64>)> {
        self.oxts
            .iter()
            .map(|r| (r.timestamp, r.orientation))
            .collect()
    }

    /// Frame observations, optionally with the PNG bytes attached
    pub fn frames(&self, max_frames: Option<usize>, load_images: bool) -> Result<Vec<FrameObservation>> {
        let count = max_frames.map_or(self.images.len(), |max| max.min(self.images.len()));
        self.images[..count]
            .iter()
            .enumerate()
            .map(|(id, image)| {
                let bytes = if load_images {
                    let data = fs::read(&image.path)
                        .map_err(|e| IngestionError::io(image.path.display().to_string(), e))?;
                    Bytes::from(data)
                } else {
                    Bytes::new()
                };
                Ok(FrameObservation::new(id as u64, image.timestamp, bytes))
            })
            .collect()
    }

    /// Frames paired with their IMU batches
    pub fn bundles(&self, max_frames: Option<usize>, load_images: bool) -> Result<Vec<FrameBundle>> {
        let frames = self.frames(max_frames, load_images)?;
        let bundles = bundle_frames(frames, &self.imu_samples());
        debug!(bundles = bundles.len(), "bundled KITTI frames");
        Ok(bundles)
    }
}

/// Parse a KITTI timestamp line into nanoseconds since the Unix epoch
pub fn parse_kitti_timestamp(text: &str) -> Option<Timestamp> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
        .ok()?
        .and_utc()
        .timestamp_nanos_opt()
}

/// Timestamps and image paths of one camera folder
fn load_images(root: &Path, camera: &str) -> Result<Vec<KittiImage>> {
    let camera_dir = root.join(camera);
    let image_times = parse_timestamps(&camera_dir.join("timestamps.txt"))?;
    if image_times.is_empty() {
        return Err(IngestionError::EmptySequence {
            path: camera_dir.display().to_string(),
        });
    }
    Ok(image_times
        .into_iter()
        .enumerate()
        .map(|(index, timestamp)| KittiImage {
            timestamp,
            path: camera_dir.join("data").join(format!("{index:010}.png")),
        })
        .collect())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| IngestionError::io(path.display().to_string(), e))
}

fn parse_timestamps(path: &Path) -> Result<Vec<Timestamp>> {
    let content = read_file(path)?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            parse_kitti_timestamp(line).ok_or_else(|| {
                IngestionError::from(ContractError::dataset_parse(
                    path.display().to_string(),
                    index + 1,
                    format!("invalid timestamp '{}'", line.trim()),
                ))
            })
        })
        .collect()
}

fn parse_oxts_record(path: &Path, timestamp: Timestamp) -> Result<OxtsRecord> {
    let content = read_file(path)?;
    let parse_error =
        |message: String| ContractError::dataset_parse(path.display().to_string(), 1, message);

    let values = content
        .split_whitespace()
        .map(|field| {
            field
                .parse::<f64>()
                .map_err(|_| parse_error(format!("invalid number '{field}'")))
        })
        .collect::<std::result::Result<Vec<f64>, _>>()?;

    if values.len() != OXTS_FIELDS {
        return Err(parse_error(format!(
            "expected {OXTS_FIELDS} fields, got {}",
            values.len()
        ))
        .into());
    }

    Ok(OxtsRecord {
        timestamp,
        orientation: UnitQuaternion::from_euler_angles(values[3], values[4], values[5]),
        acc: Vector3::new(values[11], values[12], values[13]),
        gyro: Vector3::new(values[17], values[18], values[19]),
    })
}
