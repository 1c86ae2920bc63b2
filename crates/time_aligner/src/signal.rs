//! Scalar signal extraction
//!
//! Both sensors are reduced to one angle per window slot so they can be
//! correlated. [`RotationSignal`] picks the reduction: rotation magnitude
//! (default) or the signed component about one body axis.

use contracts::{
    gyro_column, nsec_to_sec, ImuAccGyr, ImuStamps, RansacRotationResult, RotationSignal,
    Timestamp,
};
use nalgebra::{UnitQuaternion, Vector3};

use crate::buffer::CorrelationSample;

/// Reduce an angular rate (rad/s) to a scalar rate
#[inline]
pub fn reduce_rate(gyro: &Vector3<f64>, signal: RotationSignal) -> f64 {
    match signal.axis_index() {
        Some(axis) => gyro[axis],
        None => gyro.norm(),
    }
}

/// Reduce a rotation to a scalar angle (rad)
#[inline]
pub fn rotation_angle(rotation: &UnitQuaternion<f64>, signal: RotationSignal) -> f64 {
    match signal.axis_index() {
        Some(axis) => rotation.scaled_axis()[axis],
        None => rotation.angle(),
    }
}

/// One IMU sample turned into a per-period rotation angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuTick {
    pub timestamp: Timestamp,
    pub angle: f64,
}

/// Per-tick IMU angles for the columns newer than `after`.
///
/// Each tick integrates its rate over one nominal period. Columns at or before
/// `after` were already consumed with the previous batch.
pub fn imu_rate_ticks(
    stamps: &ImuStamps,
    acc_gyr: &ImuAccGyr,
    after: Option<Timestamp>,
    sampling_time_s: f64,
    signal: RotationSignal,
) -> Vec<ImuTick> {
    stamps
        .iter()
        .enumerate()
        .filter(|(_, stamp)| after.map_or(true, |last| **stamp > last))
        .map(|(col, &stamp)| ImuTick {
            timestamp: stamp,
            angle: reduce_rate(&gyro_column(acc_gyr, col), signal) * sampling_time_s,
        })
        .collect()
}

/// Pair IMU ticks with vision angles linearly interpolated from `previous`
/// to `current`; the last tick receives `current` exactly.
pub fn interpolate_vision(previous: f64, current: f64, ticks: &[ImuTick]) -> Vec<CorrelationSample> {
    let n = ticks.len() as f64;
    ticks
        .iter()
        .enumerate()
        .map(|(k, tick)| CorrelationSample {
            timestamp: tick.timestamp,
            vision_angle: previous + (current - previous) * (k + 1) as f64 / n,
            imu_angle: tick.angle,
            imu_ticks: 1,
        })
        .collect()
}

/// Compose the gyro increments of a batch into one rotation.
///
/// Column `i` is integrated over `[stamp[i-1], stamp[i]]`; the first column
/// only anchors the interval.
pub fn integrate_rotation(stamps: &ImuStamps, acc_gyr: &ImuAccGyr) -> UnitQuaternion<f64> {
    (1..stamps.len()).fold(UnitQuaternion::identity(), |rotation, col| {
        let dt = nsec_to_sec(stamps[col] - stamps[col - 1]);
        rotation * UnitQuaternion::from_scaled_axis(gyro_column(acc_gyr, col) * dt)
    })
}

/// One frame-rate window slot from a tracker result and its IMU batch
pub fn frame_rate_sample(
    frame_timestamp: Timestamp,
    ransac: &RansacRotationResult,
    stamps: &ImuStamps,
    acc_gyr: &ImuAccGyr,
    signal: RotationSignal,
) -> CorrelationSample {
    let imu_rotation = integrate_rotation(stamps, acc_gyr);
    CorrelationSample {
        timestamp: frame_timestamp,
        vision_angle: rotation_angle(&ransac.relative_rotation, signal),
        imu_angle: rotation_angle(&imu_rotation, signal),
        imu_ticks: stamps.len().saturating_sub(1),
    }
}
