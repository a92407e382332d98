// crates/tc_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `TcError` 枚举和 `TcResult` 类型别名。
//!
//! 错误分层约定：
//!
//! 1. **配置错误**（构造期致命）：`Config` / `InvalidConfig` / `MissingConfig` / `UnknownModel`
//! 2. **宿主误用**：`SizeMismatch` / `DimensionMismatch` / `AlreadyCorrected`
//! 3. **数值奇异**：不产生错误，由调用方按下限截断
//!
//! # 示例
//!
//! ```
//! use tc_foundation::error::{TcError, TcResult};
//!
//! fn read_coeffs() -> TcResult<()> {
//!     Err(TcError::config("系数字典格式错误"))
//! }
//! assert!(read_coeffs().is_err());
//! ```

use crate::dimension::UnitDim;
use thiserror::Error;

/// 统一结果类型
pub type TcResult<T> = Result<T, TcError>;

/// TurbClosure 错误类型
#[derive(Error, Debug)]
pub enum TcError {
    // ========================================================================
    // IO 相关错误
    // ========================================================================
    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 错误信息
        message: String,
    },

    // ========================================================================
    // 配置错误
    // ========================================================================
    /// 通用配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 错误信息
        message: String,
    },

    /// 缺少必需的配置项
    #[error("缺少必需的配置项: {key}")]
    MissingConfig {
        /// 配置键
        key: String,
    },

    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidConfig {
        /// 配置键
        key: String,
        /// 实际值
        value: String,
        /// 原因
        reason: String,
    },

    /// 未知的湍流模型名称
    #[error("未知的湍流模型: {name} (可用模型: {available:?})")]
    UnknownModel {
        /// 请求的模型名称
        name: String,
        /// 可用模型列表
        available: Vec<String>,
    },

    // ========================================================================
    // 数据一致性错误
    // ========================================================================
    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: String,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 量纲不一致
    #[error("量纲不一致: {context} 期望 {expected}, 实际 {actual}")]
    DimensionMismatch {
        /// 发生位置
        context: String,
        /// 期望量纲
        expected: UnitDim,
        /// 实际量纲
        actual: UnitDim,
    },

    /// 无效的网格拓扑
    #[error("无效的网格拓扑: {message}")]
    InvalidMesh {
        /// 错误信息
        message: String,
    },

    /// 同一时间步重复修正
    #[error("时间步 {time_index} 已经完成湍流修正")]
    AlreadyCorrected {
        /// 时间步编号
        time_index: u64,
    },

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 错误信息
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl TcError {
    /// 创建 IO 错误
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带底层错误的 IO 错误
    pub fn io_with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// 创建序列化错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 创建缺少配置项错误
    pub fn missing_config(key: impl Into<String>) -> Self {
        Self::MissingConfig { key: key.into() }
    }

    /// 创建配置值无效错误
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 创建未知模型错误
    pub fn unknown_model(name: impl Into<String>, available: &[&str]) -> Self {
        Self::UnknownModel {
            name: name.into(),
            available: available.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// 创建大小不匹配错误
    pub fn size_mismatch(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }

    /// 创建量纲不一致错误
    pub fn dimension_mismatch(context: impl Into<String>, expected: UnitDim, actual: UnitDim) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// 创建无效网格错误
    pub fn invalid_mesh(message: impl Into<String>) -> Self {
        Self::InvalidMesh {
            message: message.into(),
        }
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// 是否属于构造期致命的配置类错误
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::MissingConfig { .. }
                | Self::InvalidConfig { .. }
                | Self::UnknownModel { .. }
        )
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl TcError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &str, expected: usize, actual: usize) -> TcResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }
}

// ========================================================================
// 标准库错误转换
// ========================================================================

impl From<std::io::Error> for TcError {
    fn from(err: std::io::Error) -> Self {
        Self::io_with_source(err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TcError::config("测试配置错误");
        assert!(err.to_string().contains("配置错误"));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_unknown_model_lists_available() {
        let err = TcError::unknown_model("kEpsilonX", &["kkl", "SpalartAllmaras"]);
        let msg = err.to_string();
        assert!(msg.contains("kEpsilonX"));
        assert!(msg.contains("SpalartAllmaras"));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_check_size() {
        assert!(TcError::check_size("nut", 10, 10).is_ok());
        let err = TcError::check_size("nut", 10, 3).unwrap_err();
        assert!(err.to_string().contains("nut"));
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = TcError::dimension_mismatch("k", UnitDim::K, UnitDim::EPSILON);
        assert!(err.to_string().contains("m^2 s^-2"));
    }

    #[test]
    fn test_io_from_std() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: TcError = io.into();
        assert!(err.to_string().contains("IO错误"));
    }
}
