//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::CalibrationBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Windows shorter than this rarely give a clear correlation peak
const MIN_RECOMMENDED_WINDOW: usize = 10;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    mode: &'static str,
    window_size: usize,
    sampling_time_s: f64,
    variance_threshold: f64,
    rotation_signal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dataset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_frames: Option<u64>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(summarize(&blueprint)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn summarize(blueprint: &CalibrationBlueprint) -> ConfigSummary {
    let alignment = &blueprint.alignment;
    ConfigSummary {
        version: format!("{:?}", blueprint.version),
        mode: if alignment.do_imu_rate_time_alignment {
            "imu_rate"
        } else {
            "frame_rate"
        },
        window_size: alignment.time_alignment_window_size,
        sampling_time_s: alignment.nominal_sampling_time_s,
        variance_threshold: alignment.variance_threshold(),
        rotation_signal: format!("{:?}", alignment.rotation_signal),
        dataset: blueprint
            .dataset
            .as_ref()
            .map(|d| format!("{} ({})", d.path.display(), d.camera)),
        max_frames: blueprint.max_frames,
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &CalibrationBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let alignment = &blueprint.alignment;

    match &blueprint.dataset {
        None => warnings.push("No dataset configured - `run` will need --dataset".to_string()),
        Some(dataset) if !dataset.path.exists() => warnings.push(format!(
            "Dataset path does not exist: {}",
            dataset.path.display()
        )),
        Some(_) => {}
    }

    if alignment.time_alignment_window_size < MIN_RECOMMENDED_WINDOW {
        warnings.push(format!(
            "time_alignment_window_size = {} is very short; the correlation peak may be ambiguous",
            alignment.time_alignment_window_size
        ));
    }

    if alignment.gyro_noise_density == 0.0 || alignment.variance_threshold_scaling == 0.0 {
        warnings.push("Variance threshold is zero - flat IMU windows will not be rejected".to_string());
    }

    if let (Some(max_frames), false) = (blueprint.max_frames, alignment.do_imu_rate_time_alignment) {
        if (max_frames as usize) <= alignment.time_alignment_window_size {
            warnings.push(format!(
                "max_frames = {} cannot fill a frame-rate window of {} slots",
                max_frames, alignment.time_alignment_window_size
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Mode: {}", summary.mode);
            println!("  Window: {} slots", summary.window_size);
            println!("  Sampling time: {} s", summary.sampling_time_s);
            println!("  Variance threshold: {:.3e}", summary.variance_threshold);
            println!("  Rotation signal: {}", summary.rotation_signal);
            if let Some(ref dataset) = summary.dataset {
                println!("  Dataset: {}", dataset);
            }
            if let Some(max_frames) = summary.max_frames {
                println!("  Max frames: {}", max_frames);
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let file = write_config(
            r#"
[alignment]
time_alignment_window_size = 5
do_imu_rate_time_alignment = false

[dataset]
path = "missing_drive"
"#,
        );
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });

        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.mode, "frame_rate");
        assert_eq!(summary.window_size, 5);

        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("does not exist")));
        assert!(warnings.iter().any(|w| w.contains("very short")));
    }

    #[test]
    fn test_invalid_config_reports_field() {
        let file = write_config("[alignment]\ntime_alignment_window_size = 0\n");
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });

        assert!(!result.valid);
        assert!(result
            .error
            .unwrap()
            .contains("alignment.time_alignment_window_size"));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: "/nonexistent/time_align.toml".into(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_no_dataset_warning() {
        let warnings = collect_warnings(&CalibrationBlueprint {
            version: Default::default(),
            max_frames: None,
            alignment: Default::default(),
            dataset: None,
        });
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("No dataset"));
    }
}
