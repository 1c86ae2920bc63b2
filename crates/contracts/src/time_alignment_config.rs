//! Time alignment configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// How a 3D rotation is reduced to the scalar signal that gets correlated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationSignal {
    /// Rotation angle (norm of the rotation vector); independent of the axis
    #[default]
    Magnitude,
    /// Signed rotation about the sensor x axis
    AxisX,
    /// Signed rotation about the sensor y axis
    AxisY,
    /// Signed rotation about the sensor z axis
    AxisZ,
}

impl RotationSignal {
    /// Component index for the signed single-axis variants
    pub fn axis_index(self) -> Option<usize> {
        match self {
            RotationSignal::Magnitude => None,
            RotationSignal::AxisX => Some(0),
            RotationSignal::AxisY => Some(1),
            RotationSignal::AxisZ => Some(2),
        }
    }
}

/// Cross-correlation time alignment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeAlignmentConfig {
    /// Gyroscope noise density (rad / s / sqrt(Hz))
    pub gyro_noise_density: f64,

    /// Correlate at IMU rate (one window slot per IMU sample) instead of
    /// frame rate (one slot per frame interval)
    pub do_imu_rate_time_alignment: bool,

    /// Number of window slots used for the correlation
    pub time_alignment_window_size: usize,

    /// Nominal IMU sampling period (seconds)
    pub nominal_sampling_time_s: f64,

    /// Multiplier applied to the squared noise density to obtain the minimum
    /// IMU signal variance
    pub variance_threshold_scaling: f64,

    /// Scalar reduction of rotations
    pub rotation_signal: RotationSignal,
}

impl Default for TimeAlignmentConfig {
    fn default() -> Self {
        Self {
            gyro_noise_density: 1.6968e-4,
            do_imu_rate_time_alignment: true,
            time_alignment_window_size: 100,
            nominal_sampling_time_s: 0.005,
            variance_threshold_scaling: 30.0,
            rotation_signal: RotationSignal::Magnitude,
        }
    }
}

impl TimeAlignmentConfig {
    /// Minimum variance the buffered IMU signal must reach
    pub fn variance_threshold(&self) -> f64 {
        self.variance_threshold_scaling * self.gyro_noise_density.powi(2)
    }

    /// Check value ranges, reporting the first offending field
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.time_alignment_window_size == 0 {
            return Err(ContractError::config_validation(
                "time_alignment_window_size",
                "window size must be > 0",
            ));
        }

        if !self.nominal_sampling_time_s.is_finite() || self.nominal_sampling_time_s <= 0.0 {
            return Err(ContractError::config_validation(
                "nominal_sampling_time_s",
                format!(
                    "sampling time must be a positive number of seconds, got {}",
                    self.nominal_sampling_time_s
                ),
            ));
        }

        if !self.gyro_noise_density.is_finite() || self.gyro_noise_density < 0.0 {
            return Err(ContractError::config_validation(
                "gyro_noise_density",
                format!(
                    "noise density must be finite and >= 0, got {}",
                    self.gyro_noise_density
                ),
            ));
        }

        if !self.variance_threshold_scaling.is_finite() || self.variance_threshold_scaling < 0.0 {
            return Err(ContractError::config_validation(
                "variance_threshold_scaling",
                format!(
                    "scaling must be finite and >= 0, got {}",
                    self.variance_threshold_scaling
                ),
            ));
        }

        Ok(())
    }
}
