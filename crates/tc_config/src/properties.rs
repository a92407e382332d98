// crates/tc_config/src/properties.rs

//! 湍流属性配置
//!
//! 对应算例中的湍流属性文件，JSON 格式：
//!
//! ```json
//! {
//!     "model": "WrayAgarwal2017",
//!     "turbulence": true,
//!     "print_coeffs": true,
//!     "coeffs": { "kappa": 0.41, "DDES": "off" },
//!     "relaxation": { "Rnu": 0.7 },
//!     "solver": { "rtol": 1e-6, "max_iter": 200 },
//!     "initial": { "Rnu": 3e-5 }
//! }
//! ```

use crate::dict::CoeffDict;
use crate::error::ConfigError;
use crate::solver_config::LinearSolverConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 湍流属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurbulenceProperties {
    /// 模型名称标签
    pub model: String,

    /// 是否求解湍流（关闭时 `correct` 为空操作）
    #[serde(default = "default_true")]
    pub turbulence: bool,

    /// 构造与重读时是否打印系数
    #[serde(default)]
    pub print_coeffs: bool,

    /// 模型系数
    #[serde(default)]
    pub coeffs: CoeffDict,

    /// 各输运变量的欠松弛因子
    #[serde(default)]
    pub relaxation: BTreeMap<String, f64>,

    /// 线性求解器参数
    #[serde(default)]
    pub solver: LinearSolverConfig,

    /// 无持久化数据时各输运变量的均匀初值
    #[serde(default)]
    pub initial: BTreeMap<String, f64>,
}

fn default_true() -> bool {
    true
}

impl TurbulenceProperties {
    /// 以默认设置创建指定模型的属性
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            turbulence: true,
            print_coeffs: false,
            coeffs: CoeffDict::new(),
            relaxation: BTreeMap::new(),
            solver: LinearSolverConfig::default(),
            initial: BTreeMap::new(),
        }
    }

    /// 从 JSON 文件加载并验证
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// 从 JSON 文本解析并验证
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let props: TurbulenceProperties =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        props.validate()?;
        Ok(props)
    }

    /// 保存到 JSON 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Missing("model".to_string()));
        }

        for (field, &alpha) in &self.relaxation {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(ConfigError::invalid(
                    format!("relaxation.{field}"),
                    alpha,
                    "欠松弛因子必须在 (0, 1] 范围内",
                ));
            }
        }

        for (field, &value) in &self.initial {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    format!("initial.{field}"),
                    value,
                    "初值必须为非负有限数",
                ));
            }
        }

        self.solver.validate()
    }

    /// 设置系数（构建器风格）
    pub fn with_coeff(mut self, name: &str, value: f64) -> Self {
        self.coeffs.insert(name, value);
        self
    }

    /// 设置开关（构建器风格）
    pub fn with_switch(mut self, name: &str, value: bool) -> Self {
        self.coeffs.insert_switch(name, value);
        self
    }

    /// 设置欠松弛因子（构建器风格）
    pub fn with_relaxation(mut self, field: &str, alpha: f64) -> Self {
        self.relaxation.insert(field.to_string(), alpha);
        self
    }

    /// 设置均匀初值（构建器风格）
    pub fn with_initial(mut self, field: &str, value: f64) -> Self {
        self.initial.insert(field.to_string(), value);
        self
    }

    /// 设置线性求解器参数（构建器风格）
    pub fn with_solver(mut self, solver: LinearSolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// 指定输运变量的欠松弛因子
    pub fn relaxation_for(&self, field: &str) -> Option<f64> {
        self.relaxation.get(field).copied()
    }

    /// 指定输运变量的初值，未配置时返回 `default`
    pub fn initial_value(&self, field: &str, default: f64) -> f64 {
        self.initial.get(field).copied().unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_json() {
        let props = TurbulenceProperties::from_json_str(r#"{"model": "kkl"}"#).unwrap();
        assert_eq!(props.model, "kkl");
        assert!(props.turbulence);
        assert!(!props.print_coeffs);
        assert!(props.coeffs.is_empty());
        assert_eq!(props.relaxation_for("k"), None);
    }

    #[test]
    fn test_invalid_relaxation() {
        let text = r#"{"model": "kkl", "relaxation": {"k": 1.5}}"#;
        assert!(TurbulenceProperties::from_json_str(text).is_err());
    }

    #[test]
    fn test_negative_initial_rejected() {
        let props = TurbulenceProperties::new("kkl").with_initial("k", -1.0);
        assert!(props.validate().is_err());
    }

    #[test]
    fn test_missing_model() {
        assert!(TurbulenceProperties::from_json_str(r#"{"model": " "}"#).is_err());
        assert!(TurbulenceProperties::from_json_str(r#"{}"#).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turbulenceProperties.json");
        let props = TurbulenceProperties::new("SpalartAllmaras")
            .with_coeff("Cb1", 0.14)
            .with_relaxation("nuTilda", 0.7)
            .with_initial("nuTilda", 3e-5);
        props.save_to_file(&path).unwrap();

        let loaded = TurbulenceProperties::from_file(&path).unwrap();
        assert_eq!(loaded, props);
        assert!((loaded.initial_value("nuTilda", 0.0) - 3e-5).abs() < 1e-20);
    }
}
