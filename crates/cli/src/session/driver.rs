//! Session driver - replays bundles through a `CrossCorrTimeAligner`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{AlignmentOutcome, AlignmentResult, TimeAlignmentConfig, Tracker};
use ingestion::FrameBundle;
use observability::{
    record_alignment_outcome, record_converged_shift, record_run_finished,
    AlignmentMetricsAggregator,
};
use time_aligner::CrossCorrTimeAligner;
use tracing::{debug, info};

use super::{PeakReport, SessionReport, StopReason};

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Aligner settings
    pub alignment: TimeAlignmentConfig,

    /// Maximum number of frames to feed (None = whole sequence)
    pub max_frames: Option<u64>,

    /// Ignore `valid` results that did not come from a correlation
    pub require_correlation: bool,
}

/// Runs one aligner over a bundle sequence until it yields a usable shift
pub struct AlignmentSession<T> {
    aligner: CrossCorrTimeAligner,
    tracker: T,
    max_frames: Option<u64>,
    require_correlation: bool,
    stop: Arc<AtomicBool>,
    metrics: AlignmentMetricsAggregator,
}

impl<T: Tracker> AlignmentSession<T> {
    pub fn new(config: SessionConfig, tracker: T) -> Result<Self> {
        let aligner = CrossCorrTimeAligner::new(config.alignment)
            .context("Invalid time alignment configuration")?;

        Ok(Self {
            aligner,
            tracker,
            max_frames: config.max_frames,
            require_correlation: config.require_correlation,
            stop: Arc::new(AtomicBool::new(false)),
            metrics: AlignmentMetricsAggregator::new(),
        })
    }

    /// Flag checked before every frame; setting it ends the run early
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Feed bundles in order until the shift is known or input runs out
    pub fn run(mut self, bundles: &[FrameBundle]) -> Result<SessionReport> {
        let start = Instant::now();
        let mut frames = 0u64;
        let mut result = AlignmentResult::pending();
        let mut stop_reason = StopReason::EndOfData;

        info!(
            bundles = bundles.len(),
            window = self.aligner.config().time_alignment_window_size,
            imu_rate = self.aligner.config().do_imu_rate_time_alignment,
            "Alignment session started"
        );

        for bundle in bundles {
            if self.stop.load(Ordering::Relaxed) {
                stop_reason = StopReason::Interrupted;
                break;
            }
            if self.max_frames.is_some_and(|max| frames >= max) {
                stop_reason = StopReason::MaxFrames;
                break;
            }

            let frame_result = self
                .aligner
                .estimate_time_alignment(
                    &mut self.tracker,
                    &bundle.frame,
                    &bundle.imu.stamps,
                    &bundle.imu.acc_gyr,
                )
                .with_context(|| format!("Time alignment failed at frame {}", bundle.frame.id))?;
            frames += 1;

            let Some(outcome) = self.aligner.last_outcome() else {
                continue;
            };
            self.record(outcome);

            if !frame_result.valid {
                continue;
            }
            match outcome {
                AlignmentOutcome::Aligned | AlignmentOutcome::Cached => {
                    result = frame_result;
                    stop_reason = StopReason::Converged;
                    break;
                }
                _ if !self.require_correlation => {
                    result = frame_result;
                    stop_reason = StopReason::AcceptedWithoutCorrelation;
                    break;
                }
                _ => debug!(
                    frame_id = bundle.frame.id,
                    outcome = %outcome,
                    "Skipping result without correlation"
                ),
            }
        }

        record_run_finished(stop_reason == StopReason::Converged, frames);

        let peak = match stop_reason {
            StopReason::Converged => self.aligner.last_estimate().map(PeakReport::from),
            _ => None,
        };

        Ok(SessionReport {
            result,
            stop_reason,
            frames_processed: frames,
            duration: start.elapsed(),
            final_outcome: self.aligner.last_outcome(),
            peak,
            metrics: self.metrics,
        })
    }

    fn record(&mut self, outcome: AlignmentOutcome) {
        record_alignment_outcome(outcome);
        self.metrics
            .update(outcome, self.aligner.window().fill_ratio());

        if matches!(
            outcome,
            AlignmentOutcome::LowVariance | AlignmentOutcome::Aligned
        ) {
            if let Some(variance) = self.aligner.last_imu_variance() {
                self.metrics.record_variance(variance);
            }
        }

        if outcome == AlignmentOutcome::Aligned {
            if let Some(estimate) = self.aligner.last_estimate() {
                self.metrics
                    .record_convergence(estimate.imu_time_shift, estimate.peak.normalized);
                record_converged_shift(estimate.imu_time_shift, estimate.peak.normalized);
            }
        }
    }
}
