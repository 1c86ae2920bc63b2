//! Session report and summary output.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use contracts::{AlignmentOutcome, AlignmentResult};
use observability::AlignmentMetricsAggregator;
use serde::Serialize;
use time_aligner::CorrelationEstimate;

/// Why a session stopped feeding frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Correlation produced a shift
    Converged,
    /// Aligner returned `valid` without a correlation (degenerate tracking, no IMU data)
    AcceptedWithoutCorrelation,
    /// All bundles consumed
    EndOfData,
    /// Frame limit reached
    MaxFrames,
    /// Stop flag raised (signal or timeout)
    Interrupted,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Converged => "converged",
            StopReason::AcceptedWithoutCorrelation => "accepted_without_correlation",
            StopReason::EndOfData => "end_of_data",
            StopReason::MaxFrames => "max_frames",
            StopReason::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlation peak behind a converged shift
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PeakReport {
    pub shift_slots: i64,
    pub ticks_per_slot: i64,
    pub score: f64,
    pub quality: f64,
}

impl From<CorrelationEstimate> for PeakReport {
    fn from(estimate: CorrelationEstimate) -> Self {
        Self {
            shift_slots: estimate.shift_slots,
            ticks_per_slot: estimate.ticks_per_slot,
            score: estimate.peak.score,
            quality: estimate.peak.normalized,
        }
    }
}

/// Result of one session
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Final aligner answer (pending unless the run stopped on a valid result)
    pub result: AlignmentResult,

    pub stop_reason: StopReason,

    /// Frames handed to the aligner, bootstrap frame included
    pub frames_processed: u64,

    /// Wall time spent in the aligner loop
    pub duration: Duration,

    /// Outcome of the last processed frame
    pub final_outcome: Option<AlignmentOutcome>,

    pub peak: Option<PeakReport>,

    /// Per-frame statistics
    pub metrics: AlignmentMetricsAggregator,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    valid: bool,
    imu_time_shift_s: f64,
    stop_reason: StopReason,
    frames_processed: u64,
    duration_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    final_outcome: Option<AlignmentOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    peak: Option<PeakReport>,
    outcome_counts: &'a BTreeMap<&'static str, u64>,
}

impl SessionReport {
    pub fn converged(&self) -> bool {
        self.stop_reason == StopReason::Converged
    }

    /// Frames per second through the aligner
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.frames_processed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&JsonReport {
            valid: self.result.valid,
            imu_time_shift_s: self.result.imu_time_shift,
            stop_reason: self.stop_reason,
            frames_processed: self.frames_processed,
            duration_s: self.duration.as_secs_f64(),
            final_outcome: self.final_outcome,
            peak: self.peak,
            outcome_counts: &self.metrics.outcome_counts,
        })
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  Time Alignment Session                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.3}s", self.duration.as_secs_f64());
        println!("   ├─ Frames processed: {}", self.frames_processed);
        println!("   ├─ FPS: {:.2}", self.fps());
        println!("   └─ Stopped: {}", self.stop_reason);

        println!("\n🎯 Result");
        if self.result.valid {
            println!(
                "   ├─ IMU time shift: {:.9} s ({:.3} ms)",
                self.result.imu_time_shift,
                self.result.imu_time_shift * 1e3
            );
        } else {
            println!("   ├─ IMU time shift: not determined");
        }
        match self.peak {
            Some(peak) => {
                println!(
                    "   ├─ Peak: {} slots x {} IMU ticks",
                    peak.shift_slots, peak.ticks_per_slot
                );
                println!("   └─ Peak quality: {:.3}", peak.quality);
            }
            None => println!("   └─ Peak: none"),
        }

        println!("\n{}", self.metrics.summary());
    }
}
