//! Cross-correlation time aligner
//!
//! Consumes one frame and the IMU batch ending at that frame per call, fills
//! the correlation window, and reports the IMU time shift once the window is
//! full and the IMU signal is informative enough.

use contracts::{
    validate_imu_batch, AlignmentOutcome, AlignmentResult, FrameObservation, ImuAccGyr,
    ImuStamps, TimeAlignmentConfig, Tracker, TrackingStatus,
};
use tracing::{debug, info, instrument, warn};

use crate::buffer::{CorrelationSample, CorrelationWindow};
use crate::correlation::{CorrelationEstimate, CrossCorrelationEstimator};
use crate::error::AlignmentError;
use crate::signal::{frame_rate_sample, imu_rate_ticks, interpolate_vision, rotation_angle};
use crate::variance::VarianceGate;

/// Aligner lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignerPhase {
    /// No reference frame yet
    AwaitingReference,
    /// Filling the window or waiting for enough IMU excitation
    Accumulating,
    /// Shift determined; further calls return it unchanged
    Converged,
}

/// Estimates the time offset between camera and IMU streams
#[derive(Debug)]
pub struct CrossCorrTimeAligner {
    config: TimeAlignmentConfig,
    window: CorrelationWindow,
    gate: VarianceGate,
    estimator: CrossCorrelationEstimator,
    /// Frame the next tracker call is measured against
    reference_frame: Option<FrameObservation>,
    /// Vision angle of the last valid tracker result, start of the next
    /// interpolation ramp
    last_vision_angle: f64,
    converged: Option<AlignmentResult>,
    last_outcome: Option<AlignmentOutcome>,
    last_estimate: Option<CorrelationEstimate>,
    last_imu_variance: Option<f64>,
}

impl CrossCorrTimeAligner {
    /// Create an aligner; the config is validated first.
    pub fn new(config: TimeAlignmentConfig) -> Result<Self, AlignmentError> {
        config.validate().map_err(AlignmentError::InvalidConfig)?;

        Ok(Self {
            window: CorrelationWindow::new(config.time_alignment_window_size),
            gate: VarianceGate::from_config(&config),
            estimator: CrossCorrelationEstimator::from_config(&config),
            config,
            reference_frame: None,
            last_vision_angle: 0.0,
            converged: None,
            last_outcome: None,
            last_estimate: None,
            last_imu_variance: None,
        })
    }

    /// Feed one frame with the IMU samples since the previous frame.
    ///
    /// Returns `valid = false` while the shift is still unknown. A degenerate
    /// tracker status or an empty IMU batch yields `valid = true` with a zero
    /// shift and leaves the window untouched. Malformed IMU data is rejected
    /// before any state changes.
    #[instrument(
        level = "debug",
        name = "time_aligner_estimate",
        skip(self, tracker, frame, imu_stamps, imu_acc_gyr),
        fields(frame_id = frame.id, timestamp = frame.timestamp, imu_samples = imu_stamps.len())
    )]
    pub fn estimate_time_alignment<T: Tracker + ?Sized>(
        &mut self,
        tracker: &mut T,
        frame: &FrameObservation,
        imu_stamps: &ImuStamps,
        imu_acc_gyr: &ImuAccGyr,
    ) -> Result<AlignmentResult, AlignmentError> {
        validate_imu_batch(imu_stamps, imu_acc_gyr).map_err(AlignmentError::MalformedInput)?;

        let Some(reference) = self.reference_frame.replace(frame.clone()) else {
            debug!("stored first reference frame");
            return Ok(self.finish(AlignmentOutcome::Bootstrap, AlignmentResult::pending()));
        };

        if let Some(result) = self.converged {
            return Ok(self.finish(AlignmentOutcome::Cached, result));
        }

        let ransac = tracker.geometric_outlier_rejection_mono(&reference, frame);
        match ransac.status {
            TrackingStatus::Valid => {}
            status @ (TrackingStatus::LowDisparity
            | TrackingStatus::FewMatches
            | TrackingStatus::Invalid
            | TrackingStatus::Disabled) => {
                warn!(
                    status = status.as_str(),
                    "tracker result unusable, skipping time alignment for this frame"
                );
                return Ok(self.finish(
                    AlignmentOutcome::DegenerateTracking,
                    AlignmentResult::aligned(0.0),
                ));
            }
        }

        if imu_stamps.is_empty() {
            warn!("no IMU samples between frames, skipping time alignment");
            return Ok(self.finish(AlignmentOutcome::EmptyImu, AlignmentResult::aligned(0.0)));
        }

        let signal = self.config.rotation_signal;
        if self.config.do_imu_rate_time_alignment {
            let vision_angle = rotation_angle(&ransac.relative_rotation, signal);
            let ticks = imu_rate_ticks(
                imu_stamps,
                imu_acc_gyr,
                self.window.last_timestamp(),
                self.config.nominal_sampling_time_s,
                signal,
            );
            for sample in interpolate_vision(self.last_vision_angle, vision_angle, &ticks) {
                self.window.push(sample);
            }
            // the next ramp starts from the last angle that reached the window
            if !ticks.is_empty() {
                self.last_vision_angle = vision_angle;
            }
        } else {
            let sample = frame_rate_sample(frame.timestamp, &ransac, imu_stamps, imu_acc_gyr, signal);
            self.last_vision_angle = sample.vision_angle;
            self.window.push(sample);
        }

        metrics::gauge!("time_alignment_window_fill").set(self.window.fill_ratio());

        if !self.window.is_full() {
            debug!(
                filled = self.window.len(),
                capacity = self.window.capacity(),
                "waiting for correlation window to fill"
            );
            return Ok(self.finish(AlignmentOutcome::InsufficientData, AlignmentResult::pending()));
        }

        let decision = self.gate.evaluate(&self.window.imu_angles());
        metrics::gauge!("time_alignment_imu_variance").set(decision.variance);
        self.last_imu_variance = Some(decision.variance);
        if !decision.admitted {
            debug!(
                variance = decision.variance,
                threshold = decision.threshold,
                "IMU signal variance below threshold"
            );
            return Ok(self.finish(AlignmentOutcome::LowVariance, AlignmentResult::pending()));
        }

        let Some(estimate) = self.estimator.estimate(&self.window) else {
            return Ok(self.finish(AlignmentOutcome::InsufficientData, AlignmentResult::pending()));
        };

        let result = AlignmentResult::aligned(estimate.imu_time_shift);
        info!(
            imu_time_shift = estimate.imu_time_shift,
            peak_shift = estimate.peak.shift,
            shift_slots = estimate.shift_slots,
            ticks_per_slot = estimate.ticks_per_slot,
            peak_quality = estimate.peak.normalized,
            "time alignment converged"
        );
        metrics::histogram!("time_alignment_shift_s").record(estimate.imu_time_shift);

        self.last_estimate = Some(estimate);
        self.converged = Some(result);
        Ok(self.finish(AlignmentOutcome::Aligned, result))
    }

    fn finish(&mut self, outcome: AlignmentOutcome, result: AlignmentResult) -> AlignmentResult {
        metrics::counter!("time_alignment_attempts_total", "outcome" => outcome.as_str())
            .increment(1);
        self.last_outcome = Some(outcome);
        result
    }

    /// Forget all samples and the converged shift, keeping the config.
    pub fn reset(&mut self) {
        self.window.clear();
        self.reference_frame = None;
        self.last_vision_angle = 0.0;
        self.converged = None;
        self.last_outcome = None;
        self.last_estimate = None;
        self.last_imu_variance = None;
    }

    pub fn phase(&self) -> AlignerPhase {
        if self.converged.is_some() {
            AlignerPhase::Converged
        } else if self.reference_frame.is_some() {
            AlignerPhase::Accumulating
        } else {
            AlignerPhase::AwaitingReference
        }
    }

    pub fn config(&self) -> &TimeAlignmentConfig {
        &self.config
    }

    pub fn window(&self) -> &CorrelationWindow {
        &self.window
    }

    /// Window contents from oldest to newest
    pub fn window_samples(&self) -> Vec<CorrelationSample> {
        self.window.samples()
    }

    pub fn converged_result(&self) -> Option<AlignmentResult> {
        self.converged
    }

    /// Outcome of the most recent successful call
    pub fn last_outcome(&self) -> Option<AlignmentOutcome> {
        self.last_outcome
    }

    /// IMU angle variance of the last full window
    pub fn last_imu_variance(&self) -> Option<f64> {
        self.last_imu_variance
    }

    /// Correlation details behind the converged shift
    pub fn last_estimate(&self) -> Option<CorrelationEstimate> {
        self.last_estimate
    }
}
