// crates/tc_config/src/error.rs

//! 配置层错误类型

use tc_foundation::TcError;

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },

    /// 缺失配置
    #[error("缺失配置: {0}")]
    Missing(String),
}

impl ConfigError {
    /// 创建无效值错误
    pub fn invalid(key: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for TcError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(e) => TcError::io_with_source("读取配置失败", e),
            ConfigError::Parse(msg) => TcError::config(msg),
            ConfigError::InvalidValue { key, value, reason } => {
                TcError::invalid_config(key, value, reason)
            }
            ConfigError::Missing(key) => TcError::missing_config(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("Cb1", "abc", "必须为数值");
        assert!(err.to_string().contains("Cb1"));
    }

    #[test]
    fn test_into_tc_error_is_config() {
        let err: TcError = ConfigError::Missing("model".into()).into();
        assert!(err.is_config_error());
        let err: TcError = ConfigError::invalid("sigmaNut", -1.0, "必须为正").into();
        assert!(err.is_config_error());
    }
}
