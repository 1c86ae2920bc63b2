//! KITTI Alignment Example
//!
//! Replays a KITTI raw drive through the aligner, using the oxts orientation
//! as tracker output.
//!
//! Run with: cargo run -p demos --bin kitti_alignment -- demos/time_align.toml

use std::path::Path;

use config_loader::ConfigLoader;
use ingestion::{GroundTruthTracker, KittiRawSequence};
use time_aligner::CrossCorrTimeAligner;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/time_align.toml".to_string());
    tracing::info!(path = %path, "Loading blueprint config");
    let blueprint = ConfigLoader::load_from_path(Path::new(&path))?;

    let Some(dataset) = blueprint.dataset.as_ref() else {
        return Err("config has no [dataset] section".into());
    };

    let sequence = KittiRawSequence::load(&dataset.path, &dataset.camera)?;
    let bundles = sequence.bundles(blueprint.max_frames.map(|n| n as usize), false)?;
    let mut tracker = GroundTruthTracker::new(sequence.orientations());
    let mut aligner = CrossCorrTimeAligner::new(blueprint.alignment.clone())?;

    for bundle in &bundles {
        let result = aligner.estimate_time_alignment(
            &mut tracker,
            &bundle.frame,
            &bundle.imu.stamps,
            &bundle.imu.acc_gyr,
        )?;
        if result.valid {
            println!(
                "frame {}: imu_time_shift = {:.6} s ({:?})",
                bundle.frame.id,
                result.imu_time_shift,
                aligner.last_outcome()
            );
            return Ok(());
        }
    }

    println!(
        "no alignment after {} frames (window {}/{})",
        bundles.len(),
        aligner.window().len(),
        aligner.window().capacity()
    );
    Ok(())
}
