//! 配置文本解析
//!
//! TOML 为主，JSON 作为备选；文件格式由扩展名决定。

use contracts::{CalibrationBlueprint, ContractError};

/// 配置文本格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// 按扩展名识别 (大小写不敏感)
    pub fn from_extension(ext: &str) -> Option<Self> {
        [Self::Toml, Self::Json]
            .into_iter()
            .find(|format| ext.eq_ignore_ascii_case(format.extension()))
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }
}

pub fn parse_toml(content: &str) -> Result<CalibrationBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| syntax_error(ConfigFormat::Toml, e))
}

pub fn parse_json(content: &str) -> Result<CalibrationBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| syntax_error(ConfigFormat::Json, e))
}

/// 按指定格式解析，不做取值校验
pub fn parse(content: &str, format: ConfigFormat) -> Result<CalibrationBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

fn syntax_error<E>(format: ConfigFormat, err: E) -> ContractError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ContractError::ConfigParse {
        message: format!("malformed .{} calibration config: {err}", format.extension()),
        source: Some(Box::new(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::RotationSignal;

    #[test]
    fn test_toml_frame_rate_session() {
        let bp = parse_toml(
            r#"
max_frames = 200

[alignment]
gyro_noise_density = 0.0002
do_imu_rate_time_alignment = false
time_alignment_window_size = 30
nominal_sampling_time_s = 0.01
rotation_signal = "axis_z"

[dataset]
path = "/data/kitti/2011_09_26_drive_0005_sync"
camera = "image_02"
"#,
        )
        .unwrap();

        assert_eq!(bp.max_frames, Some(200));
        assert!(!bp.alignment.do_imu_rate_time_alignment);
        assert_eq!(bp.alignment.time_alignment_window_size, 30);
        assert_eq!(bp.alignment.rotation_signal, RotationSignal::AxisZ);
        // omitted keys fall back to defaults
        assert_eq!(bp.alignment.variance_threshold_scaling, 30.0);
        assert_eq!(bp.dataset.unwrap().camera, "image_02");
    }

    #[test]
    fn test_json_partial_alignment() {
        let bp = parse(
            r#"{
                "alignment": { "time_alignment_window_size": 50 },
                "dataset": { "format": "kitti_raw", "path": "drive" }
            }"#,
            ConfigFormat::Json,
        )
        .unwrap();
        assert_eq!(bp.alignment.time_alignment_window_size, 50);
        assert!(bp.alignment.do_imu_rate_time_alignment);
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let bp = parse("", ConfigFormat::Toml).unwrap();
        assert!(bp.dataset.is_none());
        assert_eq!(bp.alignment.time_alignment_window_size, 100);
    }

    #[test]
    fn test_syntax_errors_keep_source() {
        for (content, format) in [
            ("window = [[[", ConfigFormat::Toml),
            ("{ \"alignment\": ", ConfigFormat::Json),
        ] {
            match parse(content, format) {
                Err(ContractError::ConfigParse { message, source }) => {
                    assert!(message.contains(format.extension()), "{message}");
                    assert!(source.is_some());
                }
                other => panic!("expected parse error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_unknown_rotation_signal_rejected() {
        let content = "[alignment]\nrotation_signal = \"diagonal\"\n";
        assert!(matches!(
            parse_toml(content),
            Err(ContractError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_extension_lookup() {
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
