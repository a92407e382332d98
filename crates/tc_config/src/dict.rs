// crates/tc_config/src/dict.rs

//! 系数字典
//!
//! 每个湍流模型在构造时按名称查找系数，缺省时使用文献默认值。
//! `lookup_or_add` 会把默认值写回字典，使系数打印完整反映实际使用的值。
//!
//! 字典以 JSON 对象存储，数值项为浮点数，开关项为布尔值或
//! `"on"/"off"/"yes"/"no"/"true"/"false"` 字符串。

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 模型系数字典
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoeffDict(Map<String, Value>);

impl CoeffDict {
    /// 创建空字典
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// 从 JSON 文本解析
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 条目数
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 是否包含指定名称
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// 设置数值系数（覆盖）
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.0.insert(name.into(), Value::Number(n));
        }
        self
    }

    /// 设置开关（覆盖）
    pub fn insert_switch(&mut self, name: impl Into<String>, value: bool) -> &mut Self {
        self.0.insert(name.into(), Value::Bool(value));
        self
    }

    /// 查找数值系数
    ///
    /// 条目不存在返回 `Ok(None)`，存在但不是有限数值返回错误。
    pub fn lookup(&self, name: &str) -> Result<Option<f64>, ConfigError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v.is_finite() => Ok(Some(v)),
                _ => Err(ConfigError::invalid(name, n, "系数必须为有限数值")),
            },
            Some(other) => Err(ConfigError::invalid(name, other, "系数必须为数值")),
        }
    }

    /// 查找数值系数，不存在时返回默认值
    pub fn lookup_or_default(&self, name: &str, default: f64) -> Result<f64, ConfigError> {
        Ok(self.lookup(name)?.unwrap_or(default))
    }

    /// 查找数值系数，不存在时写入并返回默认值
    pub fn lookup_or_add(&mut self, name: &str, default: f64) -> Result<f64, ConfigError> {
        match self.lookup(name)? {
            Some(v) => Ok(v),
            None => {
                self.insert(name, default);
                Ok(default)
            }
        }
    }

    /// 查找开关
    pub fn lookup_switch(&self, name: &str) -> Result<Option<bool>, ConfigError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "on" | "yes" | "true" => Ok(Some(true)),
                "off" | "no" | "false" | "none" => Ok(Some(false)),
                _ => Err(ConfigError::invalid(name, s, "无法识别的开关值")),
            },
            Some(other) => Err(ConfigError::invalid(name, other, "开关必须为布尔值")),
        }
    }

    /// 查找开关，不存在时返回默认值
    pub fn lookup_switch_or_default(&self, name: &str, default: bool) -> Result<bool, ConfigError> {
        Ok(self.lookup_switch(name)?.unwrap_or(default))
    }

    /// 查找开关，不存在时写入并返回默认值
    pub fn lookup_switch_or_add(&mut self, name: &str, default: bool) -> Result<bool, ConfigError> {
        match self.lookup_switch(name)? {
            Some(v) => Ok(v),
            None => {
                self.insert_switch(name, default);
                Ok(default)
            }
        }
    }

    /// 按名称顺序遍历全部条目
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// 以 `name value` 形式逐行输出，用于日志
    pub fn to_pretty_lines(&self) -> Vec<String> {
        self.0.iter().map(|(k, v)| format!("{k:<12} {v}")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_or_default() {
        let dict = CoeffDict::from_json_str(r#"{"Cb1": 0.2}"#).unwrap();
        assert!((dict.lookup_or_default("Cb1", 0.1355).unwrap() - 0.2).abs() < 1e-15);
        assert!((dict.lookup_or_default("Cb2", 0.622).unwrap() - 0.622).abs() < 1e-15);
        assert!(!dict.contains("Cb2"));
    }

    #[test]
    fn test_lookup_or_add_records_default() {
        let mut dict = CoeffDict::new();
        let v = dict.lookup_or_add("kappa", 0.41).unwrap();
        assert!((v - 0.41).abs() < 1e-15);
        assert!(dict.contains("kappa"));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_non_numeric_coefficient_rejected() {
        let dict = CoeffDict::from_json_str(r#"{"Cw2": "abc"}"#).unwrap();
        assert!(dict.lookup_or_default("Cw2", 0.3).is_err());
    }

    #[test]
    fn test_switch_forms() {
        let dict =
            CoeffDict::from_json_str(r#"{"DDES": "on", "F3": false, "bad": 3}"#).unwrap();
        assert!(dict.lookup_switch_or_default("DDES", false).unwrap());
        assert!(!dict.lookup_switch_or_default("F3", true).unwrap());
        assert!(dict.lookup_switch_or_default("missing", true).unwrap());
        assert!(dict.lookup_switch("bad").is_err());
    }

    #[test]
    fn test_pretty_lines_sorted() {
        let mut dict = CoeffDict::new();
        dict.insert("b", 2.0).insert("a", 1.0);
        let lines = dict.to_pretty_lines();
        assert!(lines[0].starts_with('a'));
    }
}
