//! KITTI camera calibration (`calib_cam_to_cam.txt`)
//!
//! One `KEY: values` entry per line. For camera `xx` the file holds `S_xx`
//! (image size), `K_xx` (intrinsics, row major), `D_xx` (distortion),
//! `R_xx`/`T_xx` (maps points from camera 00 into camera xx) and the
//! rectified `S_rect_xx`, `R_rect_xx`, `P_rect_xx`. The file sits in the
//! date folder one level above the drive folders.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use contracts::ContractError;
use nalgebra::{Isometry3, Matrix3, Matrix3x4, Rotation3, Translation3, UnitQuaternion, Vector3};
use tracing::{debug, instrument};

use crate::error::{IngestionError, Result};

pub const CAM_TO_CAM_FILE: &str = "calib_cam_to_cam.txt";

/// Entries whose value is free text
const TEXT_KEYS: [&str; 1] = ["calib_time"];

/// Calibration of one camera
#[derive(Debug, Clone, PartialEq)]
pub struct CameraParams {
    /// Camera folder, e.g. `image_02`
    pub name: String,
    /// Raw image size (width, height) in pixels
    pub image_size: (u32, u32),
    pub intrinsics: Matrix3<f64>,
    /// Radial-tangential coefficients k1, k2, p1, p2, k3
    pub distortion: [f64; 5],
    /// Transform taking points from camera 00 into this camera
    pub cam_pose_ref: Isometry3<f64>,
    pub rectified_size: Option<(u32, u32)>,
    pub rectification: Option<Matrix3<f64>>,
    pub projection: Option<Matrix3x4<f64>>,
}

impl CameraParams {
    /// (fx, fy)
    pub fn focal_length(&self) -> (f64, f64) {
        (self.intrinsics[(0, 0)], self.intrinsics[(1, 1)])
    }

    /// (cx, cy)
    pub fn principal_point(&self) -> (f64, f64) {
        (self.intrinsics[(0, 2)], self.intrinsics[(1, 2)])
    }
}

/// Calibration of a left/right camera pair
#[derive(Debug, Clone, PartialEq)]
pub struct StereoCalibration {
    pub left: CameraParams,
    pub right: CameraParams,
    /// Pose of the right camera in the left camera frame
    pub left_pose_right: Isometry3<f64>,
}

impl StereoCalibration {
    pub fn new(left: CameraParams, right: CameraParams) -> Self {
        let left_pose_right = left.cam_pose_ref * right.cam_pose_ref.inverse();
        Self {
            left,
            right,
            left_pose_right,
        }
    }

    /// Distance between the two optical centres (m)
    pub fn baseline(&self) -> f64 {
        self.left_pose_right.translation.vector.norm()
    }
}

/// Parsed `calib_cam_to_cam.txt`
#[derive(Debug, Clone)]
pub struct CamToCamCalibration {
    path: PathBuf,
    /// Values with their 1-based line
    entries: HashMap<String, (usize, Vec<f64>)>,
}

impl CamToCamCalibration {
    #[instrument(name = "kitti_calibration_load", skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| IngestionError::io(path.display().to_string(), e))?;
        let calibration = Self::parse(path, &content)?;
        debug!(entries = calibration.entries.len(), "loaded camera calibration");
        Ok(calibration)
    }

    /// Look for the calibration file in the drive folder, then in its parent
    pub fn locate(drive_root: &Path) -> Option<PathBuf> {
        [Some(drive_root), drive_root.parent()]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(CAM_TO_CAM_FILE))
            .find(|candidate| candidate.is_file())
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let parse_error = |line: usize, message: String| {
            IngestionError::from(ContractError::dataset_parse(
                path.display().to_string(),
                line,
                message,
            ))
        };

        let mut entries = HashMap::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (key, values) = line.split_once(':').ok_or_else(|| {
                parse_error(index + 1, format!("expected 'KEY: values', got '{}'", line.trim()))
            })?;
            let key = key.trim();
            if TEXT_KEYS.contains(&key) {
                continue;
            }
            let values = values
                .split_whitespace()
                .map(|field| {
                    field.parse::<f64>().map_err(|_| {
                        parse_error(index + 1, format!("invalid number '{field}' in {key}"))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            entries.insert(key.to_string(), (index + 1, values));
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Values of `key`, which must hold exactly `N` numbers
    fn values<const N: usize>(&self, key: &str) -> Result<[f64; N]> {
        let (line, values) = self
            .entries
            .get(key)
            .ok_or_else(|| IngestionError::MissingCalibration {
                path: self.path.display().to_string(),
                key: key.to_string(),
            })?;
        <[f64; N]>::try_from(values.as_slice()).map_err(|_| {
            ContractError::dataset_parse(
                self.path.display().to_string(),
                *line,
                format!("{key} holds {} values, expected {N}", values.len()),
            )
            .into()
        })
    }

    fn optional<const N: usize>(&self, key: &str) -> Result<Option<[f64; N]>> {
        if self.entries.contains_key(key) {
            self.values(key).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Parameters of the camera stored in folder `camera` (`image_xx`)
    pub fn camera(&self, camera: &str) -> Result<CameraParams> {
        let id = camera_id(camera).ok_or_else(|| IngestionError::MissingCalibration {
            path: self.path.display().to_string(),
            key: format!("camera id for '{camera}'"),
        })?;

        let [width, height] = self.values::<2>(&format!("S_{id}"))?;
        let rotation = self.values::<9>(&format!("R_{id}"))?;
        let [tx, ty, tz] = self.values::<3>(&format!("T_{id}"))?;

        Ok(CameraParams {
            name: camera.to_string(),
            image_size: (width as u32, height as u32),
            intrinsics: Matrix3::from_row_slice(&self.values::<9>(&format!("K_{id}"))?),
            distortion: self.values::<5>(&format!("D_{id}"))?,
            cam_pose_ref: isometry(&rotation, Vector3::new(tx, ty, tz)),
            rectified_size: self
                .optional::<2>(&format!("S_rect_{id}"))?
                .map(|[w, h]| (w as u32, h as u32)),
            rectification: self
                .optional::<9>(&format!("R_rect_{id}"))?
                .map(|r| Matrix3::from_row_slice(&r)),
            projection: self
                .optional::<12>(&format!("P_rect_{id}"))?
                .map(|p| Matrix3x4::from_row_slice(&p)),
        })
    }

    pub fn stereo(&self, left: &str, right: &str) -> Result<StereoCalibration> {
        Ok(StereoCalibration::new(self.camera(left)?, self.camera(right)?))
    }
}

/// `image_02` -> `02`
fn camera_id(camera: &str) -> Option<&str> {
    camera
        .strip_prefix("image_")
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
}

/// Right partner of a KITTI camera folder: `image_00` -> `image_01`,
/// `image_02` -> `image_03`
pub fn stereo_partner(camera: &str) -> Option<String> {
    let id: u32 = camera_id(camera)?.parse().ok()?;
    (id % 2 == 0).then(|| format!("image_{:02}", id + 1))
}

/// Rigid transform from a row-major rotation that may be slightly off
/// orthonormal in the printed file
fn isometry(rotation: &[f64; 9], translation: Vector3<f64>) -> Isometry3<f64> {
    let rotation = Rotation3::from_matrix(&Matrix3::from_row_slice(rotation));
    Isometry3::from_parts(
        Translation3::from(translation),
        UnitQuaternion::from_rotation_matrix(&rotation),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALIB: &str = "\
calib_time: 09-Jan-2012 13:57:47
corner_dist: 9.950000e-02
S_00: 1.392000e+03 5.120000e+02
K_00: 9.842439e+02 0.000000e+00 6.900000e+02 0.000000e+00 9.808141e+02 2.331966e+02 0.000000e+00 0.000000e+00 1.000000e+00
D_00: -3.728755e-01 2.037299e-01 2.219027e-03 1.383707e-03 -7.233722e-02
R_00: 1.000000e+00 0.000000e+00 0.000000e+00 0.000000e+00 1.000000e+00 0.000000e+00 0.000000e+00 0.000000e+00 1.000000e+00
T_00: 2.573699e-16 -1.059758e-16 1.614870e-16
S_rect_00: 1.242000e+03 3.750000e+02
R_rect_00: 9.999239e-01 9.837760e-03 -7.445048e-03 -9.869795e-03 9.999421e-01 -4.278459e-03 7.402527e-03 4.351614e-03 9.999631e-01
P_rect_00: 7.215377e+02 0.000000e+00 6.095593e+02 0.000000e+00 0.000000e+00 7.215377e+02 1.728540e+02 0.000000e+00 0.000000e+00 0.000000e+00 1.000000e+00 0.000000e+00
S_01: 1.392000e+03 5.120000e+02
K_01: 9.895267e+02 0.000000e+00 7.020000e+02 0.000000e+00 9.878386e+02 2.455590e+02 0.000000e+00 0.000000e+00 1.000000e+00
D_01: -3.644661e-01 1.790019e-01 1.148107e-03 -6.298563e-04 -5.314062e-02
R_01: 9.993513e-01 1.860866e-02 -3.083487e-02 -1.887662e-02 9.997863e-01 -8.421873e-03 3.067156e-02 8.998467e-03 9.994890e-01
T_01: -5.370000e-01 4.822061e-03 -1.252488e-02
";

    fn calibration() -> CamToCamCalibration {
        CamToCamCalibration::parse(Path::new(CAM_TO_CAM_FILE), CALIB).unwrap()
    }

    #[test]
    fn test_camera_params() {
        let left = calibration().camera("image_00").unwrap();
        assert_eq!(left.image_size, (1392, 512));
        assert_eq!(left.rectified_size, Some((1242, 375)));
        assert_eq!(left.focal_length(), (9.842439e+02, 9.808141e+02));
        assert_eq!(left.principal_point(), (6.900000e+02, 2.331966e+02));
        assert_eq!(left.distortion[0], -3.728755e-01);
        assert!((left.projection.unwrap()[(0, 0)] - 7.215377e+02).abs() < 1e-9);
        assert!(left.cam_pose_ref.rotation.angle() < 1e-9);

        // no rectified entries for camera 01 in this file
        let right = calibration().camera("image_01").unwrap();
        assert!(right.projection.is_none());
        assert!(right.rectification.is_none());
    }

    #[test]
    fn test_stereo_extrinsic() {
        let stereo = calibration().stereo("image_00", "image_01").unwrap();
        let t = stereo.left_pose_right.translation.vector;

        // right camera sits about 0.54 m along +x of the left one
        assert!((stereo.baseline() - 0.537).abs() < 1e-3, "{}", stereo.baseline());
        assert!(t.x > 0.5);
        assert!((stereo.left_pose_right.rotation.angle() - 0.037).abs() < 1e-3);

        // a point at the right optical centre maps back to the origin
        let centre = stereo.left_pose_right.inverse_transform_point(&t.into());
        assert!(centre.coords.norm() < 1e-12);
    }

    #[test]
    fn test_missing_camera_entry() {
        let err = calibration().camera("image_02").unwrap_err();
        match err {
            IngestionError::MissingCalibration { key, .. } => assert_eq!(key, "S_02"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(calibration().camera("velodyne").is_err());
    }

    #[test]
    fn test_malformed_entry_reports_line() {
        let content = "calib_time: 09-Jan-2012 13:57:47\nK_00: 1.0 two 3.0\n";
        let err = CamToCamCalibration::parse(Path::new(CAM_TO_CAM_FILE), content).unwrap_err();
        assert!(matches!(
            err,
            IngestionError::Contract(ContractError::DatasetParse { line: 2, .. })
        ));

        let err =
            CamToCamCalibration::parse(Path::new(CAM_TO_CAM_FILE), "no separator").unwrap_err();
        assert!(matches!(
            err,
            IngestionError::Contract(ContractError::DatasetParse { line: 1, .. })
        ));
    }

    #[test]
    fn test_wrong_value_count() {
        let content = CALIB.replace(
            "T_01: -5.370000e-01 4.822061e-03 -1.252488e-02",
            "T_01: -5.37e-01",
        );
        let calibration =
            CamToCamCalibration::parse(Path::new(CAM_TO_CAM_FILE), &content).unwrap();
        assert!(matches!(
            calibration.camera("image_01"),
            Err(IngestionError::Contract(ContractError::DatasetParse { line: 15, .. }))
        ));
    }

    #[test]
    fn test_stereo_partner() {
        assert_eq!(stereo_partner("image_00").as_deref(), Some("image_01"));
        assert_eq!(stereo_partner("image_02").as_deref(), Some("image_03"));
        assert_eq!(stereo_partner("image_03"), None);
        assert_eq!(stereo_partner("oxts"), None);
    }

    #[test]
    fn test_locate_in_date_folder() {
        let dir = tempfile::tempdir().unwrap();
        let drive = dir.path().join("2011_09_26_drive_0001_sync");
        fs::create_dir_all(&drive).unwrap();
        assert!(CamToCamCalibration::locate(&drive).is_none());

        fs::write(dir.path().join(CAM_TO_CAM_FILE), CALIB).unwrap();
        let found = CamToCamCalibration::locate(&drive).unwrap();
        assert_eq!(found, dir.path().join(CAM_TO_CAM_FILE));
        assert_eq!(CamToCamCalibration::load(&found).unwrap().path(), found);
    }
}
