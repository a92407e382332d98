// crates/tc_foundation/src/lib.rs

//! TurbClosure Foundation Layer
//!
//! 基础层，为湍流闭合模型工作区提供公共抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `TcError` / `TcResult`
//! - [`dimension`]: 物理量纲 `UnitDim`，用于场与系数的量纲一致性检查
//! - [`float`]: 数值下限常量与安全运算
//!
//! # 示例
//!
//! ```
//! use tc_foundation::{dimension::UnitDim, error::TcResult};
//!
//! fn check() -> TcResult<()> {
//!     let nu = UnitDim::KINEMATIC_VISCOSITY;
//!     let s = UnitDim::FREQUENCY;
//!     (nu * s).expect_eq(UnitDim::K, "nu*S")
//! }
//! assert!(check().is_ok());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dimension;
pub mod error;
pub mod float;

pub use dimension::UnitDim;
pub use error::{TcError, TcResult};

/// 工作区统一使用的标量类型
pub type Scalar = f64;

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::dimension::UnitDim;
    pub use crate::error::{TcError, TcResult};
    pub use crate::float::{bound_below, safe_div, sqr, SMALL};
    pub use crate::Scalar;
}
