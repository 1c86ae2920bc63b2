//! # Config Loader
//!
//! Loads the calibration session description.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Resolve relative dataset paths against the config file location
//! - Validate value ranges, reporting the first offending field
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("calibration.toml")).unwrap();
//! println!("Window: {}", blueprint.alignment.time_alignment_window_size);
//! ```

mod parser;
mod validator;

pub use contracts::CalibrationBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a blueprint from a `.toml` or `.json` file.
    ///
    /// A relative `dataset.path` is taken relative to the directory holding
    /// the config file.
    pub fn load_from_path(path: &Path) -> Result<CalibrationBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        let mut blueprint = Self::load_from_str(&content, format)?;

        if let (Some(dataset), Some(base)) = (blueprint.dataset.as_mut(), path.parent()) {
            if dataset.path.is_relative() {
                dataset.path = base.join(&dataset.path);
            }
        }
        Ok(blueprint)
    }

    /// Parse then validate configuration content
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<CalibrationBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Check an in-memory blueprint, e.g. after CLI overrides
    pub fn validate(blueprint: &CalibrationBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    pub fn to_toml(blueprint: &CalibrationBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(blueprint: &CalibrationBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
max_frames = 500

[alignment]
gyro_noise_density = 1.6968e-4
do_imu_rate_time_alignment = true
time_alignment_window_size = 100
nominal_sampling_time_s = 0.01

[dataset]
format = "kitti_raw"
path = "/data/kitti/2011_09_26/2011_09_26_drive_0001_sync"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.max_frames, Some(500));
        assert!((bp.alignment.nominal_sampling_time_s - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.alignment, bp2.alignment);
        assert_eq!(bp.max_frames, bp2.max_frames);
        assert_eq!(
            bp.dataset.map(|d| d.path),
            bp2.dataset.map(|d| d.path)
        );
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.alignment, bp2.alignment);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[alignment]
time_alignment_window_size = 0
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("alignment.time_alignment_window_size"));
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "max_frames": 10 }}"#).unwrap();

        let bp = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(bp.max_frames, Some(10));
    }

    #[test]
    fn test_relative_dataset_path_is_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("calibration.toml");
        std::fs::write(&config, "[dataset]\npath = \"drive_0001\"\n").unwrap();

        let bp = ConfigLoader::load_from_path(&config).unwrap();
        assert_eq!(bp.dataset.unwrap().path, dir.path().join("drive_0001"));
    }

    #[test]
    fn test_load_from_path_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }
}
