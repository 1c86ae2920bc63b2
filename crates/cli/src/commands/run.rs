//! `run` command implementation.

use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{CalibrationBlueprint, DatasetConfig, DatasetFormat};
use ingestion::{GroundTruthTracker, KittiRawSequence};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::session::{AlignmentSession, SessionConfig};

/// Execute the `run` command
pub async fn run_calibration(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Invalid configuration after CLI overrides")?;

    let dataset = blueprint
        .dataset
        .clone()
        .ok_or_else(|| CliError::dataset_missing(&args.config))?;

    info!(
        dataset = %dataset.path.display(),
        camera = %dataset.camera,
        right_camera = ?dataset.right_camera,
        window = blueprint.alignment.time_alignment_window_size,
        imu_rate = blueprint.alignment.do_imu_rate_time_alignment,
        max_frames = ?blueprint.max_frames,
        "Configuration loaded"
    );

    let max_frames = blueprint.max_frames;
    let load_images = args.load_images;
    let (sequence, bundles) = tokio::task::spawn_blocking(move || -> Result<_> {
        let sequence = match (dataset.format, &dataset.right_camera) {
            (DatasetFormat::KittiRaw, None) => {
                KittiRawSequence::load(&dataset.path, &dataset.camera)?
            }
            (DatasetFormat::KittiRaw, Some(right)) => {
                KittiRawSequence::load_stereo(&dataset.path, &dataset.camera, right)?
            }
        };
        let bundles = sequence.bundles(max_frames.map(|n| n as usize), load_images)?;
        Ok((sequence, bundles))
    })
    .await
    .context("Dataset loading task panicked")?
    .context("Failed to load dataset")?;

    observability::record_dataset_loaded(bundles.len(), sequence.oxts().len());

    let session = AlignmentSession::new(
        SessionConfig {
            alignment: blueprint.alignment.clone(),
            max_frames,
            require_correlation: args.require_correlation,
        },
        GroundTruthTracker::new(sequence.orientations()),
    )?;
    let stop = session.stop_handle();

    info!("Starting alignment session...");
    let mut handle = tokio::task::spawn_blocking(move || session.run(&bundles));

    let timeout = async {
        match args.timeout {
            0 => std::future::pending::<()>().await,
            secs => tokio::time::sleep(Duration::from_secs(secs)).await,
        }
    };

    let finished = tokio::select! {
        joined = &mut handle => Some(joined),
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping session...");
            None
        }
        _ = timeout => {
            warn!(timeout_secs = args.timeout, "Timeout reached, stopping session...");
            None
        }
    };

    let joined = match finished {
        Some(joined) => joined,
        None => {
            stop.store(true, Ordering::SeqCst);
            handle.await
        }
    };
    let report = joined
        .context("Alignment task panicked")?
        .context("Alignment session failed")?;

    info!(
        valid = report.result.valid,
        imu_time_shift = report.result.imu_time_shift,
        frames = report.frames_processed,
        stop_reason = %report.stop_reason,
        duration_secs = report.duration.as_secs_f64(),
        "Alignment session completed"
    );

    if args.json {
        println!("{}", report.to_json().context("Failed to serialize report")?);
    } else {
        report.print_summary();
    }

    info!("Time Align finished");
    Ok(())
}

/// Apply CLI overrides on top of the loaded blueprint
fn apply_overrides(blueprint: &mut CalibrationBlueprint, args: &RunArgs) {
    if args.max_frames > 0 {
        info!(max_frames = args.max_frames, "Overriding max_frames from CLI");
        blueprint.max_frames = Some(args.max_frames);
    }

    if let Some(ref path) = args.dataset {
        info!(dataset = %path.display(), "Overriding dataset path from CLI");
        match blueprint.dataset.as_mut() {
            Some(dataset) => dataset.path = path.clone(),
            None => {
                blueprint.dataset = Some(DatasetConfig {
                    format: DatasetFormat::KittiRaw,
                    path: path.clone(),
                    camera: "image_00".to_string(),
                    right_camera: None,
                })
            }
        }
    }

    if let Some(ref camera) = args.camera {
        if let Some(dataset) = blueprint.dataset.as_mut() {
            info!(camera = %camera, "Overriding camera from CLI");
            dataset.camera = camera.clone();
        }
    }

    if let Some(ref right) = args.right_camera {
        if let Some(dataset) = blueprint.dataset.as_mut() {
            info!(right_camera = %right, "Overriding right camera from CLI");
            dataset.right_camera = Some(right.clone());
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM. A handler that fails to install is logged
/// and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
