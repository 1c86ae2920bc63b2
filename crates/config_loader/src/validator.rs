//! 配置校验模块
//!
//! 校验规则：
//! - alignment 参数范围 (窗口 > 0, 采样周期 > 0, 噪声密度 >= 0)
//! - dataset.path 非空
//! - max_frames > 0

use contracts::{CalibrationBlueprint, ContractError};

/// 校验 CalibrationBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &CalibrationBlueprint) -> Result<(), ContractError> {
    validate_alignment(blueprint)?;
    validate_dataset(blueprint)?;
    validate_max_frames(blueprint)?;
    Ok(())
}

/// 校验时间对齐参数，字段名加上 `alignment.` 前缀
fn validate_alignment(blueprint: &CalibrationBlueprint) -> Result<(), ContractError> {
    blueprint.alignment.validate().map_err(|e| match e {
        ContractError::ConfigValidation { field, message } => {
            ContractError::config_validation(format!("alignment.{field}"), message)
        }
        other => other,
    })
}

/// 校验数据集路径
fn validate_dataset(blueprint: &CalibrationBlueprint) -> Result<(), ContractError> {
    if let Some(dataset) = &blueprint.dataset {
        if dataset.path.as_os_str().is_empty() {
            return Err(ContractError::config_validation(
                "dataset.path",
                "dataset path must not be empty",
            ));
        }
        if dataset.camera.trim().is_empty() {
            return Err(ContractError::config_validation(
                "dataset.camera",
                "camera folder must not be empty",
            ));
        }
        if let Some(right) = &dataset.right_camera {
            if right.trim().is_empty() || *right == dataset.camera {
                return Err(ContractError::config_validation(
                    "dataset.right_camera",
                    "right camera must name a folder other than dataset.camera",
                ));
            }
        }
    }
    Ok(())
}

fn validate_max_frames(blueprint: &CalibrationBlueprint) -> Result<(), ContractError> {
    if blueprint.max_frames == Some(0) {
        return Err(ContractError::config_validation(
            "max_frames",
            "max_frames must be > 0 when set",
        ));
    }
    Ok(())
}
