//! Ingestion 错误类型

use contracts::ContractError;
use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 数据集目录或文件不存在
    #[error("dataset file not found: {path}")]
    MissingFile {
        /// 文件路径
        path: String,
    },

    /// 数据集没有任何帧
    #[error("dataset {path} contains no frames")]
    EmptySequence {
        /// 数据集根目录
        path: String,
    },

    /// 标定文件缺少某个键
    #[error("calibration file {path} has no {key} entry")]
    MissingCalibration {
        /// 标定文件路径
        path: String,
        /// 缺失的键，例如 `K_02`
        key: String,
    },

    /// 读取文件失败
    #[error("failed to read {path}: {source}")]
    Io {
        /// 文件路径
        path: String,
        /// 底层 IO 错误
        #[source]
        source: std::io::Error,
    },

    /// 数据内容不符合契约（解析失败、IMU 批次非法等）
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl IngestionError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::MissingFile { path: path.into() }
        } else {
            Self::Io {
                path: path.into(),
                source,
            }
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
