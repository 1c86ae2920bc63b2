//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 合成序列 e2e 测试（已知延迟）
//! - KITTI 目录结构 e2e 测试（配置 -> 数据集 -> 对齐器）

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{AlignmentOutcome, CalibrationBlueprint, TimeAlignmentConfig};

    #[test]
    fn test_default_blueprint_survives_toml() {
        let blueprint = ConfigLoader::load_from_str("", ConfigFormat::Toml).unwrap();
        let toml = ConfigLoader::to_toml(&blueprint).unwrap();
        let reparsed: CalibrationBlueprint =
            ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();

        assert_eq!(reparsed.alignment, TimeAlignmentConfig::default());
        assert_eq!(reparsed.max_frames, None);
    }

    #[test]
    fn test_outcome_labels_are_unique() {
        let mut labels: Vec<&str> = AlignmentOutcome::ALL.iter().map(|o| o.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), AlignmentOutcome::ALL.len());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::path::Path;

    use contracts::{AlignmentOutcome, AlignmentResult, TimeAlignmentConfig};
    use ingestion::{
        FrameBundle, GroundTruthTracker, KittiRawSequence, SyntheticRun, SyntheticSequence,
    };
    use observability::AlignmentMetricsAggregator;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use time_aligner::{AlignerPhase, CrossCorrTimeAligner, Tracker};

    /// Feed every bundle, collecting one result per frame
    fn drive<T: Tracker>(
        config: TimeAlignmentConfig,
        tracker: &mut T,
        bundles: &[FrameBundle],
    ) -> (CrossCorrTimeAligner, Vec<AlignmentResult>) {
        let mut aligner = CrossCorrTimeAligner::new(config).unwrap();
        let results = bundles
            .iter()
            .map(|b| {
                aligner
                    .estimate_time_alignment(tracker, &b.frame, &b.imu.stamps, &b.imu.acc_gyr)
                    .unwrap()
            })
            .collect();
        (aligner, results)
    }

    /// Every frame before the last is pending, the last one carries the
    /// expected shift.
    fn assert_converges_on_last_frame(sequence: SyntheticSequence) {
        let run: SyntheticRun = sequence.generate();
        let mut tracker = run.tracker();
        let (aligner, results) = drive(run.config.clone(), &mut tracker, &run.bundles);

        let (last, earlier) = results.split_last().unwrap();
        for (i, result) in earlier.iter().enumerate() {
            assert_eq!(*result, AlignmentResult::pending(), "{sequence:?} frame {i}");
        }
        assert!(last.valid, "{sequence:?} did not converge");
        assert_eq!(last.imu_time_shift, run.expected_shift, "{sequence:?}");
        assert_eq!(tracker.calls(), sequence.num_frames);
        assert_eq!(aligner.phase(), AlignerPhase::Converged);
        assert_eq!(aligner.last_outcome(), Some(AlignmentOutcome::Aligned));
    }

    #[test]
    fn test_synthetic_no_delay_single_imu_sample_per_frame() {
        assert_converges_on_last_frame(SyntheticSequence {
            imu_per_frame: 1,
            ..Default::default()
        });
    }

    #[test]
    fn test_synthetic_no_delay_imu_rate() {
        assert_converges_on_last_frame(SyntheticSequence::default());
    }

    #[test]
    fn test_synthetic_no_delay_frame_rate() {
        assert_converges_on_last_frame(SyntheticSequence {
            imu_rate: false,
            ..Default::default()
        });
    }

    #[test]
    fn test_synthetic_delay_imu_rate() {
        for (delay_ticks, shift) in [(-8, -7e-9), (7, 6e-9), (1, 0.0), (3, 2e-9), (5, 4e-9)] {
            let sequence = SyntheticSequence {
                delay_ticks,
                ..Default::default()
            };
            assert!((sequence.expected_shift() - shift).abs() < 1e-18);
            assert_converges_on_last_frame(sequence);
        }
    }

    #[test]
    fn test_synthetic_delay_frame_rate() {
        for (delay_ticks, shift) in [(-8, -10e-9), (7, 5e-9), (8, 10e-9), (-7, -5e-9), (3, 5e-9)] {
            let sequence = SyntheticSequence {
                delay_ticks,
                imu_rate: false,
                ..Default::default()
            };
            assert!((sequence.expected_shift() - shift).abs() < 1e-18);
            assert_converges_on_last_frame(sequence);
        }
    }

    #[test]
    fn test_synthetic_delay_sweep() {
        for imu_rate in [true, false] {
            for delay_ticks in -10..=10i64 {
                let ticks = if imu_rate {
                    delay_ticks - delay_ticks.signum()
                } else {
                    // half a frame rounds away from zero
                    delay_ticks.signum() * ((delay_ticks.abs() + 2) / 5) * 5
                };
                let sequence = SyntheticSequence {
                    delay_ticks,
                    imu_rate,
                    ..Default::default()
                };
                assert_eq!(sequence.expected_shift(), ticks as f64 * 1e-9);
                assert_converges_on_last_frame(sequence);
            }
        }
    }

    #[test]
    fn test_noisy_gyro_still_recovers_delay() {
        let mut rng = StdRng::seed_from_u64(42);
        let sequence = SyntheticSequence {
            delay_ticks: -8,
            ..Default::default()
        };
        let mut run = sequence.generate();
        for bundle in &mut run.bundles {
            for col in 0..bundle.imu.len() {
                bundle.imu.acc_gyr[(3, col)] += rng.random_range(-1e6..1e6);
            }
        }

        let mut tracker = run.tracker();
        let (_, results) = drive(run.config.clone(), &mut tracker, &run.bundles);
        let last = results.last().unwrap();

        assert!(last.valid);
        let ticks = last.imu_time_shift / sequence.imu_period_s;
        let expected_ticks = run.expected_shift / sequence.imu_period_s;
        assert!(
            (ticks - expected_ticks).abs() <= 1.0 + 1e-6,
            "shift {ticks} ticks, expected {expected_ticks}"
        );
    }

    #[test]
    fn test_converged_aligner_keeps_answer() {
        let run = SyntheticSequence {
            delay_ticks: 7,
            ..Default::default()
        }
        .generate();
        let mut tracker = run.tracker();
        let (mut aligner, results) = drive(run.config.clone(), &mut tracker, &run.bundles);
        let converged = *results.last().unwrap();
        let calls = tracker.calls();

        // frames after convergence get the cached answer without tracking
        for bundle in &run.bundles[1..4] {
            let result = aligner
                .estimate_time_alignment(
                    &mut tracker,
                    &bundle.frame,
                    &bundle.imu.stamps,
                    &bundle.imu.acc_gyr,
                )
                .unwrap();
            assert_eq!(result, converged);
            assert_eq!(aligner.last_outcome(), Some(AlignmentOutcome::Cached));
        }
        assert_eq!(tracker.calls(), calls);
    }

    // ===== KITTI raw fixture =====

    const PERIOD_S: f64 = 0.01;
    const TICKS_PER_FRAME: usize = 10;
    const FIRST_FRAME_TICK: usize = 5;

    fn yaw(t: f64) -> f64 {
        0.4 * (1.3 * t).sin() + 0.25 * (3.1 * t + 0.7).sin() + 0.1 * t
    }

    fn yaw_rate(t: f64) -> f64 {
        0.4 * 1.3 * (1.3 * t).cos() + 0.25 * 3.1 * (3.1 * t + 0.7).cos() + 0.1
    }

    fn kitti_time(tick: usize) -> String {
        let ns = tick as u64 * 10_000_000;
        format!(
            "2011-09-26 13:02:{:02}.{:09}",
            25 + ns / 1_000_000_000,
            ns % 1_000_000_000
        )
    }

    fn oxts_line(tick: usize) -> String {
        let t = tick as f64 * PERIOD_S;
        let mut fields = vec![0.0; 30];
        fields[5] = yaw(t);
        fields[13] = 9.81;
        fields[19] = yaw_rate(t);
        fields
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// 100 Hz oxts, 10 Hz camera sharing the oxts clock
    fn write_drive(root: &Path, camera: &str, frames: usize) {
        let camera_dir = root.join(camera);
        fs::create_dir_all(camera_dir.join("data")).unwrap();
        let camera_times: Vec<String> = (0..frames)
            .map(|f| kitti_time(FIRST_FRAME_TICK + f * TICKS_PER_FRAME))
            .collect();
        fs::write(camera_dir.join("timestamps.txt"), camera_times.join("\n")).unwrap();

        let ticks = frames * TICKS_PER_FRAME + FIRST_FRAME_TICK;
        let oxts_dir = root.join("oxts");
        fs::create_dir_all(oxts_dir.join("data")).unwrap();
        let oxts_times: Vec<String> = (0..ticks).map(kitti_time).collect();
        fs::write(oxts_dir.join("timestamps.txt"), oxts_times.join("\n")).unwrap();
        for tick in 0..ticks {
            fs::write(
                oxts_dir.join("data").join(format!("{tick:010}.txt")),
                oxts_line(tick),
            )
            .unwrap();
        }
    }

    fn kitti_config(imu_rate: bool) -> TimeAlignmentConfig {
        TimeAlignmentConfig {
            do_imu_rate_time_alignment: imu_rate,
            time_alignment_window_size: if imu_rate { 100 } else { 20 },
            nominal_sampling_time_s: PERIOD_S,
            ..Default::default()
        }
    }

    /// Index of the first valid result
    fn converged_at(results: &[AlignmentResult]) -> Option<usize> {
        results.iter().position(|r| r.valid)
    }

    #[test]
    fn test_kitti_ground_truth_imu_rate() {
        let dir = tempfile::tempdir().unwrap();
        write_drive(dir.path(), "image_00", 30);

        let sequence = KittiRawSequence::load(dir.path(), "image_00").unwrap();
        let bundles = sequence.bundles(None, false).unwrap();
        let mut tracker = GroundTruthTracker::new(sequence.orientations());

        let (aligner, results) = drive(kitti_config(true), &mut tracker, &bundles);

        // 11 ticks from the first interval, 10 from each one after
        assert_eq!(converged_at(&results), Some(10));
        let result = aligner.converged_result().unwrap();
        assert!(result.imu_time_shift.abs() <= 0.1, "{result:?}");
        assert!(aligner.last_imu_variance().unwrap() > kitti_config(true).variance_threshold());
    }

    #[test]
    fn test_kitti_ground_truth_frame_rate() {
        let dir = tempfile::tempdir().unwrap();
        write_drive(dir.path(), "image_00", 30);

        let sequence = KittiRawSequence::load(dir.path(), "image_00").unwrap();
        let bundles = sequence.bundles(None, false).unwrap();
        let mut tracker = GroundTruthTracker::new(sequence.orientations());

        let (aligner, results) = drive(kitti_config(false), &mut tracker, &bundles);

        assert_eq!(converged_at(&results), Some(20));
        let estimate = aligner.last_estimate().unwrap();
        assert_eq!(estimate.ticks_per_slot, TICKS_PER_FRAME as i64);
        assert!(estimate.imu_time_shift.abs() <= 0.1, "{estimate:?}");
    }

    #[test]
    fn test_config_file_to_alignment() {
        let dir = tempfile::tempdir().unwrap();
        write_drive(&dir.path().join("drive_0001"), "image_02", 25);

        let config_path = dir.path().join("time_align.toml");
        fs::write(
            &config_path,
            r#"
max_frames = 22

[alignment]
do_imu_rate_time_alignment = false
time_alignment_window_size = 20
nominal_sampling_time_s = 0.01

[dataset]
path = "drive_0001"
camera = "image_02"
"#,
        )
        .unwrap();

        let blueprint = config_loader::ConfigLoader::load_from_path(&config_path).unwrap();
        let dataset = blueprint.dataset.clone().unwrap();
        let sequence = KittiRawSequence::load(&dataset.path, &dataset.camera).unwrap();
        let max_frames = blueprint.max_frames.map(|n| n as usize);
        let bundles = sequence.bundles(max_frames, false).unwrap();
        assert_eq!(bundles.len(), 22);

        let mut tracker = GroundTruthTracker::new(sequence.orientations());
        let mut aligner = CrossCorrTimeAligner::new(blueprint.alignment.clone()).unwrap();
        let mut metrics = AlignmentMetricsAggregator::new();

        for bundle in &bundles {
            let result = aligner
                .estimate_time_alignment(
                    &mut tracker,
                    &bundle.frame,
                    &bundle.imu.stamps,
                    &bundle.imu.acc_gyr,
                )
                .unwrap();
            let outcome = aligner.last_outcome().unwrap();
            metrics.update(outcome, aligner.window().fill_ratio());
            if outcome == AlignmentOutcome::Aligned {
                let estimate = aligner.last_estimate().unwrap();
                metrics.record_convergence(estimate.imu_time_shift, estimate.peak.normalized);
            }
            if result.valid {
                break;
            }
        }

        assert_eq!(metrics.converged_at_frame, Some(21));
        assert_eq!(metrics.count(AlignmentOutcome::Bootstrap), 1);
        assert_eq!(metrics.count(AlignmentOutcome::InsufficientData), 19);
        assert!(metrics.summary().to_string().contains("Converged at frame 21"));
    }

    /// Color pair 02/03, 0.54 m apart, identity rotations
    fn write_cam_to_cam(date_dir: &Path) {
        let camera = |id: &str, tx: f64| {
            format!(
                "S_{id}: 1.392000e+03 5.120000e+02\n\
                 K_{id}: 9.6e+02 0 6.9e+02 0 9.6e+02 2.2e+02 0 0 1\n\
                 D_{id}: 0 0 0 0 0\n\
                 R_{id}: 1 0 0 0 1 0 0 0 1\n\
                 T_{id}: {tx} 0 0\n"
            )
        };
        let content = format!(
            "calib_time: 09-Jan-2012 13:57:47\n{}{}",
            camera("02", 0.06),
            camera("03", -0.48)
        );
        fs::write(date_dir.join(ingestion::CAM_TO_CAM_FILE), content).unwrap();
    }

    #[test]
    fn test_stereo_config_aligns_left_camera() {
        let dir = tempfile::tempdir().unwrap();
        let drive = dir.path().join("drive_0001");
        write_drive(&drive, "image_02", 25);
        fs::create_dir_all(drive.join("image_03")).unwrap();
        fs::copy(
            drive.join("image_02").join("timestamps.txt"),
            drive.join("image_03").join("timestamps.txt"),
        )
        .unwrap();
        write_cam_to_cam(dir.path());

        let config_path = dir.path().join("time_align.toml");
        fs::write(
            &config_path,
            r#"
[alignment]
do_imu_rate_time_alignment = false
time_alignment_window_size = 20
nominal_sampling_time_s = 0.01

[dataset]
path = "drive_0001"
camera = "image_02"
right_camera = "image_03"
"#,
        )
        .unwrap();

        let blueprint = config_loader::ConfigLoader::load_from_path(&config_path).unwrap();
        let dataset = blueprint.dataset.clone().unwrap();
        let right = dataset.right_camera.as_deref().unwrap();
        let sequence = KittiRawSequence::load_stereo(&dataset.path, &dataset.camera, right).unwrap();

        let stereo = sequence.stereo().unwrap();
        assert_eq!(stereo.images.len(), 25);
        assert!((stereo.calibration.baseline() - 0.54).abs() < 1e-12);
        assert!(stereo.calibration.left_pose_right.translation.vector.x > 0.0);
        assert_eq!(sequence.stereo_pairs().count(), 25);

        let bundles = sequence.bundles(None, false).unwrap();
        let mut tracker = GroundTruthTracker::new(sequence.orientations());
        let (aligner, results) = self::drive(blueprint.alignment.clone(), &mut tracker, &bundles);

        assert_eq!(converged_at(&results), Some(20));
        assert!(aligner.converged_result().unwrap().imu_time_shift.abs() <= 0.1);
    }
}
