// crates/tc_config/src/solver_config.rs

//! 线性求解器配置
//!
//! 湍流输运方程的离散系统由宿主的 Krylov 求解器求解，
//! 本结构体给出收敛容差与迭代上限。

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// 线性求解器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSolverConfig {
    /// 相对收敛容差
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    /// 绝对收敛容差
    #[serde(default = "default_atol")]
    pub atol: f64,
    /// 最大迭代次数
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// 是否逐次输出迭代残差（trace 级日志）
    #[serde(default)]
    pub verbose: bool,
}

fn default_rtol() -> f64 {
    1e-8
}
fn default_atol() -> f64 {
    1e-14
}
fn default_max_iter() -> usize {
    1000
}

impl Default for LinearSolverConfig {
    fn default() -> Self {
        Self {
            rtol: default_rtol(),
            atol: default_atol(),
            max_iter: default_max_iter(),
            verbose: false,
        }
    }
}

impl LinearSolverConfig {
    /// 创建求解器配置
    pub fn new(rtol: f64, max_iter: usize) -> Self {
        Self {
            rtol,
            max_iter,
            ..Default::default()
        }
    }

    /// 设置绝对容差
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    /// 启用详细输出
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rtol > 0.0 && self.rtol < 1.0) {
            return Err(ConfigError::invalid("solver.rtol", self.rtol, "rtol 必须在 (0, 1) 范围内"));
        }
        if !(self.atol >= 0.0) {
            return Err(ConfigError::invalid("solver.atol", self.atol, "atol 不能为负"));
        }
        if self.max_iter == 0 {
            return Err(ConfigError::invalid("solver.max_iter", self.max_iter, "max_iter 必须大于 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_valid() {
        assert!(LinearSolverConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_rtol() {
        let cfg = LinearSolverConfig::new(0.0, 10);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: LinearSolverConfig = serde_json::from_str(r#"{"max_iter": 50}"#).unwrap();
        assert_eq!(cfg.max_iter, 50);
        assert!((cfg.rtol - 1e-8).abs() < 1e-20);
        assert!(!cfg.verbose);
    }
}
