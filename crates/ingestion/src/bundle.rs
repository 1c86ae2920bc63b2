//! Frame / IMU bundling
//!
//! Splits a continuous IMU stream into the per-frame batches the time aligner
//! consumes. Each batch starts with the boundary sample at or before the
//! previous frame and ends with the last sample at or before the current one.

use contracts::{FrameObservation, ImuBatch, Timestamp};
use nalgebra::Vector3;

/// One IMU measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    pub timestamp: Timestamp,
    /// Linear acceleration (m/s²)
    pub acc: Vector3<f64>,
    /// Angular rate (rad/s)
    pub gyro: Vector3<f64>,
}

/// A frame with the IMU samples covering the interval that ends at it
#[derive(Debug, Clone)]
pub struct FrameBundle {
    pub frame: FrameObservation,
    pub imu: ImuBatch,
}

/// Pair frames with IMU batches.
///
/// `imu` must be sorted by timestamp. The first bundle carries only the
/// sample at or before the first frame (possibly none); frames without new
/// IMU data get a batch holding just the boundary sample.
pub fn bundle_frames(frames: Vec<FrameObservation>, imu: &[ImuSample]) -> Vec<FrameBundle> {
    let upto = |t: Timestamp| imu.partition_point(|s| s.timestamp <= t);

    let mut previous: Option<Timestamp> = None;
    frames
        .into_iter()
        .map(|frame| {
            let end = upto(frame.timestamp);
            let start = match previous {
                Some(prev) => upto(prev).saturating_sub(1),
                None => end.saturating_sub(1),
            };
            previous = Some(frame.timestamp);

            let samples: Vec<_> = imu[start..end.max(start)]
                .iter()
                .map(|s| (s.timestamp, s.acc, s.gyro))
                .collect();

            FrameBundle {
                frame,
                imu: ImuBatch::from_samples(&samples),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imu_at(timestamps: &[Timestamp]) -> Vec<ImuSample> {
        timestamps
            .iter()
            .map(|&timestamp| ImuSample {
                timestamp,
                acc: Vector3::zeros(),
                gyro: Vector3::new(0.0, 0.0, timestamp as f64),
            })
            .collect()
    }

    fn frames_at(timestamps: &[Timestamp]) -> Vec<FrameObservation> {
        timestamps
            .iter()
            .enumerate()
            .map(|(id, &t)| FrameObservation::without_image(id as u64, t))
            .collect()
    }

    fn stamps(bundle: &FrameBundle) -> Vec<Timestamp> {
        bundle.imu.stamps.iter().copied().collect()
    }

    #[test]
    fn test_batches_share_boundary_sample() {
        let imu = imu_at(&[0, 10, 20, 30, 40, 50, 60]);
        let bundles = bundle_frames(frames_at(&[5, 30, 60]), &imu);

        assert_eq!(bundles.len(), 3);
        assert_eq!(stamps(&bundles[0]), vec![0]);
        assert_eq!(stamps(&bundles[1]), vec![0, 10, 20, 30]);
        assert_eq!(stamps(&bundles[2]), vec![30, 40, 50, 60]);
        assert!(bundles.iter().all(|b| b.imu.validate().is_ok()));
        assert_eq!(bundles[2].imu.acc_gyr[(5, 3)], 60.0);
    }

    #[test]
    fn test_frames_before_imu_start() {
        let imu = imu_at(&[100, 110]);
        let bundles = bundle_frames(frames_at(&[50, 105]), &imu);

        assert!(bundles[0].imu.is_empty());
        assert_eq!(stamps(&bundles[1]), vec![100]);
    }

    #[test]
    fn test_frame_without_new_imu() {
        let imu = imu_at(&[0, 10]);
        let bundles = bundle_frames(frames_at(&[10, 12, 14]), &imu);

        assert_eq!(stamps(&bundles[1]), vec![10]);
        assert_eq!(stamps(&bundles[2]), vec![10]);
    }

    #[test]
    fn test_no_imu_at_all() {
        let bundles = bundle_frames(frames_at(&[1, 2]), &[]);
        assert!(bundles.iter().all(|b| b.imu.is_empty()));
    }
}
