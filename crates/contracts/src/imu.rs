//! IMU measurement batch delivered between two consecutive frames.

use nalgebra::{Matrix6xX, RowDVector, Vector3};

use crate::{ContractError, Timestamp};

/// Row vector of IMU timestamps, one per column of [`ImuAccGyr`].
pub type ImuStamps = RowDVector<Timestamp>;

/// Stacked IMU samples: rows 0-2 accelerometer (m/s²), rows 3-5 gyroscope (rad/s).
pub type ImuAccGyr = Matrix6xX<f64>;

/// IMU samples bracketing one frame interval
///
/// The first column corresponds to the previous frame boundary, the last one
/// to the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ImuBatch {
    pub stamps: ImuStamps,
    pub acc_gyr: ImuAccGyr,
}

impl ImuBatch {
    pub fn new(stamps: ImuStamps, acc_gyr: ImuAccGyr) -> Self {
        Self { stamps, acc_gyr }
    }

    /// Batch without any sample
    pub fn empty() -> Self {
        Self {
            stamps: ImuStamps::from_row_slice(&[]),
            acc_gyr: ImuAccGyr::zeros(0),
        }
    }

    /// Build a batch from `(timestamp, accelerometer, gyroscope)` triples
    pub fn from_samples(samples: &[(Timestamp, Vector3<f64>, Vector3<f64>)]) -> Self {
        let stamps: Vec<Timestamp> = samples.iter().map(|(t, _, _)| *t).collect();
        let mut acc_gyr = ImuAccGyr::zeros(samples.len());
        for (col, (_, acc, gyro)) in samples.iter().enumerate() {
            for row in 0..3 {
                acc_gyr[(row, col)] = acc[row];
                acc_gyr[(row + 3, col)] = gyro[row];
            }
        }
        Self {
            stamps: ImuStamps::from_row_slice(&stamps),
            acc_gyr,
        }
    }

    /// Number of samples (columns)
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn validate(&self) -> Result<(), ContractError> {
        validate_imu_batch(&self.stamps, &self.acc_gyr)
    }
}

/// Angular rate of column `col`
#[inline]
pub fn gyro_column(acc_gyr: &ImuAccGyr, col: usize) -> Vector3<f64> {
    Vector3::new(acc_gyr[(3, col)], acc_gyr[(4, col)], acc_gyr[(5, col)])
}

/// Check that stamps and samples describe the same, strictly increasing,
/// finite sequence of measurements.
pub fn validate_imu_batch(stamps: &ImuStamps, acc_gyr: &ImuAccGyr) -> Result<(), ContractError> {
    if stamps.len() != acc_gyr.ncols() {
        return Err(ContractError::input_validation(
            "imu_acc_gyr",
            format!(
                "expected {} sample columns to match the stamps, got {}",
                stamps.len(),
                acc_gyr.ncols()
            ),
        ));
    }

    if let Some(idx) = (1..stamps.len()).find(|&i| stamps[i] <= stamps[i - 1]) {
        return Err(ContractError::input_validation(
            "imu_stamps",
            format!(
                "timestamps must be strictly increasing: stamps[{}]={} after stamps[{}]={}",
                idx,
                stamps[idx],
                idx - 1,
                stamps[idx - 1]
            ),
        ));
    }

    if let Some(pos) = acc_gyr.iter().position(|v| !v.is_finite()) {
        return Err(ContractError::input_validation(
            "imu_acc_gyr",
            format!("non-finite sample in column {}", pos / 6),
        ));
    }

    Ok(())
}
