//! Synthetic rotation sequences with a known IMU delay
//!
//! The camera rotates with a triangular angle profile: the per-frame relative
//! rotation grows by `rotation_scale` for the first half of the frames and
//! shrinks back afterwards. The IMU reports the same profile, linearly
//! interpolated between frames, as a rate about its x axis. The stream opens
//! with one zero-rate boundary tick. A delay of `d` IMU ticks is injected with
//! further zero-rate ticks: `|d|` in front for a negative delay, `d` behind
//! (with the frame batches read `d` ticks later) for a positive one.

use contracts::{
    sec_to_nsec, FrameObservation, ImuBatch, RansacRotationResult, TimeAlignmentConfig,
    Timestamp,
};
use nalgebra::{UnitQuaternion, Vector3};

use crate::bundle::FrameBundle;
use crate::tracker::ScriptedTracker;

/// Parameters of a synthetic sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticSequence {
    pub num_frames: usize,
    pub imu_per_frame: usize,
    /// Injected IMU delay in IMU ticks
    pub delay_ticks: i64,
    /// Per-frame angle increment (rad)
    pub rotation_scale: f64,
    pub imu_period_s: f64,
    /// Correlate at IMU rate instead of frame rate
    pub imu_rate: bool,
}

impl Default for SyntheticSequence {
    fn default() -> Self {
        Self {
            num_frames: 10,
            imu_per_frame: 5,
            delay_ticks: 0,
            rotation_scale: 0.1,
            imu_period_s: 1.0e-9,
            imu_rate: true,
        }
    }
}

/// Raw signals in IMU tick units
#[derive(Debug, Clone, Default)]
pub struct SyntheticSignal {
    pub vision_ticks: Vec<i64>,
    pub vision_angles: Vec<f64>,
    pub imu_ticks: Vec<i64>,
    /// Angular rate about x (rad/s)
    pub imu_rates: Vec<f64>,
}

impl SyntheticSignal {
    fn push_imu(&mut self, tick: i64, rate: f64) {
        self.imu_ticks.push(tick);
        self.imu_rates.push(rate);
    }

    fn next_imu_tick(&self) -> i64 {
        self.imu_ticks.last().map_or(0, |t| t + 1)
    }
}

/// Everything needed to drive an aligner over a synthetic sequence
#[derive(Debug, Clone)]
pub struct SyntheticRun {
    pub config: TimeAlignmentConfig,
    /// Bootstrap frame followed by one bundle per tracker result
    pub bundles: Vec<FrameBundle>,
    pub tracker_results: Vec<RansacRotationResult>,
    /// Shift the aligner should report (seconds)
    pub expected_shift: f64,
}

impl SyntheticRun {
    pub fn tracker(&self) -> ScriptedTracker {
        ScriptedTracker::new(self.tracker_results.iter().copied())
    }
}

impl SyntheticSequence {
    /// Nanoseconds per IMU tick
    fn tick_ns(&self) -> Timestamp {
        sec_to_nsec(self.imu_period_s).max(1)
    }

    fn frame_angle(&self, frame: usize) -> f64 {
        if frame <= self.num_frames / 2 {
            self.rotation_scale * frame as f64
        } else {
            self.rotation_scale * (self.num_frames - frame) as f64
        }
    }

    pub fn signal(&self) -> SyntheticSignal {
        let mut signal = SyntheticSignal::default();
        let per = self.imu_per_frame.max(1);

        for tick in 0..=(-self.delay_ticks).max(0) {
            signal.push_imu(tick, 0.0);
        }

        let mut previous = 0.0;
        for frame in 1..=self.num_frames {
            let angle = self.frame_angle(frame);
            signal.vision_ticks.push((frame * per) as i64);
            signal.vision_angles.push(angle);

            let diff = angle - previous;
            for k in 1..=per {
                let ratio = k as f64 / per as f64;
                let rate = (ratio * diff + previous) / self.imu_period_s;
                let tick = signal.next_imu_tick();
                signal.push_imu(tick, rate);
            }
            previous = angle;
        }

        for _ in 0..self.delay_ticks.max(0) {
            let tick = signal.next_imu_tick();
            signal.push_imu(tick, 0.0);
        }

        signal
    }

    /// Aligner config with zero noise, so the gate never blocks, and a
    /// window that fills exactly on the last frame.
    ///
    /// At IMU rate the first batch contributes one extra boundary tick; with a
    /// single IMU sample per frame that tick alone would fill the window one
    /// frame early, so it gets one more slot.
    pub fn alignment_config(&self) -> TimeAlignmentConfig {
        let per = self.imu_per_frame.max(1);
        TimeAlignmentConfig {
            gyro_noise_density: 0.0,
            do_imu_rate_time_alignment: self.imu_rate,
            time_alignment_window_size: if self.imu_rate {
                self.num_frames * per + usize::from(per == 1)
            } else {
                self.num_frames
            },
            nominal_sampling_time_s: self.imu_period_s,
            ..Default::default()
        }
    }

    /// Shift the aligner reports for this sequence: `d - sign(d)` ticks at
    /// IMU rate, `d` rounded to whole frames at frame rate.
    ///
    /// Holds while the delay leaves at least half the window overlapping.
    pub fn expected_shift(&self) -> f64 {
        let d = self.delay_ticks;
        if self.imu_rate {
            (d - d.signum()) as f64 * self.imu_period_s
        } else {
            let per = self.imu_per_frame.max(1) as i64;
            let frames = (d as f64 / per as f64).round() as i64;
            (frames * per) as f64 * self.imu_period_s
        }
    }

    /// Angles the tracker reports, one per frame.
    ///
    /// At IMU rate these are the profile values. At frame rate each one is the
    /// mean of the interpolated IMU angles over its frame interval, which is
    /// what the integrated batch measures.
    pub fn tracked_angles(&self, signal: &SyntheticSignal) -> Vec<f64> {
        if self.imu_rate {
            return signal.vision_angles.clone();
        }
        let per = self.imu_per_frame.max(1);
        let mut previous = 0.0;
        signal
            .vision_angles
            .iter()
            .map(|&angle| {
                let mean = previous + (angle - previous) * (per + 1) as f64 / (2 * per) as f64;
                previous = angle;
                mean
            })
            .collect()
    }

    pub fn generate(&self) -> SyntheticRun {
        let signal = self.signal();
        let per = self.imu_per_frame.max(1);
        let tick_ns = self.tick_ns();
        let lead = self.delay_ticks.max(0) as usize;
        let first_tick = signal.imu_ticks[lead];

        let mut bundles = Vec::with_capacity(self.num_frames + 1);
        bundles.push(FrameBundle {
            frame: FrameObservation::without_image(0, 0),
            imu: ImuBatch::from_samples(&[(0, Vector3::zeros(), Vector3::zeros())]),
        });

        for (i, &vision_tick) in signal.vision_ticks.iter().enumerate() {
            let offset = per * i + lead;
            let samples: Vec<_> = (0..=per)
                .map(|k| {
                    let idx = offset + k;
                    (
                        (signal.imu_ticks[idx] - first_tick) * tick_ns,
                        Vector3::zeros(),
                        Vector3::new(signal.imu_rates[idx], 0.0, 0.0),
                    )
                })
                .collect();

            bundles.push(FrameBundle {
                frame: FrameObservation::without_image(i as u64 + 1, vision_tick * tick_ns),
                imu: ImuBatch::from_samples(&samples),
            });
        }

        let tracker_results = self
            .tracked_angles(&signal)
            .into_iter()
            .map(|angle| {
                RansacRotationResult::valid(UnitQuaternion::from_axis_angle(
                    &Vector3::z_axis(),
                    angle,
                ))
            })
            .collect();

        SyntheticRun {
            config: self.alignment_config(),
            bundles,
            tracker_results,
            expected_shift: self.expected_shift(),
        }
    }
}
