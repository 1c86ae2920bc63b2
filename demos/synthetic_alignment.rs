//! Synthetic Alignment Example
//!
//! Generates triangular rotation sequences with a known IMU delay and shows
//! the shift recovered by the aligner at IMU rate and at frame rate.
//!
//! Run with: cargo run -p demos --bin synthetic_alignment

use ingestion::SyntheticSequence;
use time_aligner::CrossCorrTimeAligner;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("{:>6} {:>10} {:>14} {:>14}", "delay", "mode", "expected", "estimated");

    for imu_rate in [true, false] {
        for delay_ticks in [-8, -7, -3, 0, 1, 3, 7, 8] {
            let sequence = SyntheticSequence {
                delay_ticks,
                imu_rate,
                ..Default::default()
            };
            let run = sequence.generate();
            let mut tracker = run.tracker();
            let mut aligner = CrossCorrTimeAligner::new(run.config.clone())?;

            let mut estimated = None;
            for bundle in &run.bundles {
                let result = aligner.estimate_time_alignment(
                    &mut tracker,
                    &bundle.frame,
                    &bundle.imu.stamps,
                    &bundle.imu.acc_gyr,
                )?;
                if result.valid {
                    estimated = Some(result.imu_time_shift);
                    break;
                }
            }

            println!(
                "{:>6} {:>10} {:>14.3e} {:>14}",
                delay_ticks,
                if imu_rate { "imu" } else { "frame" },
                run.expected_shift,
                estimated.map_or_else(|| "-".to_string(), |s| format!("{s:.3e}"))
            );
        }
    }

    Ok(())
}
