// crates/tc_config/src/lib.rs

//! TurbClosure Config Layer
//!
//! 配置层，提供湍流模型系数字典、湍流属性和线性求解器参数。
//! 本层所有数值使用 f64，通过 serde_json 读写。
//!
//! # 模块概览
//!
//! - [`dict`]: `CoeffDict` 系数字典（`lookup_or_default` / `lookup_or_add`）
//! - [`properties`]: `TurbulenceProperties` 湍流属性
//! - [`solver_config`]: `LinearSolverConfig` 线性求解器参数
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! tc_turbulence ─> 读取 TurbulenceProperties，构造模型
//! tc_fvm        ─> 使用 LinearSolverConfig 求解
//! tc_config     ─> 本层
//! tc_foundation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dict;
pub mod error;
pub mod properties;
pub mod solver_config;

pub use dict::CoeffDict;
pub use error::ConfigError;
pub use properties::TurbulenceProperties;
pub use solver_config::LinearSolverConfig;
