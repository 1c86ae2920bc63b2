//! `simulate` command implementation.

use anyhow::{Context, Result};
use ingestion::SyntheticSequence;
use serde::Serialize;
use tracing::info;

use crate::cli::SimulateArgs;
use crate::error::CliError;
use crate::session::{AlignmentSession, SessionConfig};

/// Injected vs. recovered delay, for JSON output
#[derive(Serialize)]
struct SimulationResult {
    delay_ticks: i64,
    imu_per_frame: usize,
    frames: usize,
    imu_rate: bool,
    expected_shift_s: f64,
    estimated_shift_s: Option<f64>,
    frames_processed: u64,
    matches: bool,
}

/// Execute the `simulate` command
pub fn run_simulate(args: &SimulateArgs) -> Result<()> {
    let sequence = SyntheticSequence {
        num_frames: args.frames,
        imu_per_frame: args.imu_per_frame,
        delay_ticks: args.delay,
        rotation_scale: args.scale,
        imu_period_s: args.period,
        imu_rate: !args.frame_rate,
    };

    if sequence.num_frames == 0 {
        anyhow::bail!("--frames must be at least 1");
    }

    info!(
        frames = sequence.num_frames,
        imu_per_frame = sequence.imu_per_frame,
        delay_ticks = sequence.delay_ticks,
        imu_rate = sequence.imu_rate,
        "Generating synthetic sequence"
    );

    let run = sequence.generate();
    let imu_samples: usize = run.bundles.iter().map(|b| b.imu.len()).sum();
    observability::record_dataset_loaded(run.bundles.len(), imu_samples);

    let session = AlignmentSession::new(
        SessionConfig {
            alignment: run.config.clone(),
            max_frames: None,
            require_correlation: true,
        },
        run.tracker(),
    )?;
    let report = session.run(&run.bundles)?;

    let estimated = report.converged().then_some(report.result.imu_time_shift);
    let tolerance = sequence.imu_period_s * 1e-6;
    let matches = estimated.is_some_and(|shift| (shift - run.expected_shift).abs() <= tolerance);

    if args.json {
        let result = SimulationResult {
            delay_ticks: sequence.delay_ticks,
            imu_per_frame: sequence.imu_per_frame,
            frames: sequence.num_frames,
            imu_rate: sequence.imu_rate,
            expected_shift_s: run.expected_shift,
            estimated_shift_s: estimated,
            frames_processed: report.frames_processed,
            matches,
        };
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize simulation result")?;
        println!("{}", json);
    } else {
        report.print_summary();
        println!("Injected delay: {} IMU ticks", sequence.delay_ticks);
        println!("Expected shift: {:.3e} s", run.expected_shift);
        match estimated {
            Some(shift) => println!(
                "{} Estimated shift: {:.3e} s",
                if matches { "✓" } else { "✗" },
                shift
            ),
            None => println!("✗ No shift estimated"),
        }
    }

    match estimated {
        None => Err(CliError::NotConverged {
            frames: report.frames_processed,
        }
        .into()),
        Some(estimated) if !matches => Err(CliError::ShiftMismatch {
            estimated,
            expected: run.expected_shift,
        }
        .into()),
        Some(_) => Ok(()),
    }
}
