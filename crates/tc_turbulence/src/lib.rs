// crates/tc_turbulence/src/lib.rs

//! TurbClosure 湍流闭合模型
//!
//! 一族 RANS 与 RANS/LES 混合闭合模型，共享以下核心组件：
//!
//! - [`invariants`]: 由速度梯度计算 S、W、|∇U|、∇·U 与 G/ν
//! - [`blend`]: 有界混合函数 [`BlendFunction`]（WA f1、SST F1/F2/F3、DDES 屏蔽）
//! - [`coefficient`]: 按混合函数逐单元插值模型系数
//! - [`length_scale`]: DES/DDES 混合长度尺度选择
//! - [`transport`]: 标量输运方程组装与求解
//! - [`closure`]: [`ClosureModel`] trait 与模型公共状态
//! - [`models`]: 具体模型与工厂 [`new_model`]
//!
//! # 层级架构
//!
//! ```text
//! tc_turbulence ─> 本层
//! tc_fvm        ─> 网格、场、显式/隐式算子
//! tc_config     ─> 系数字典与湍流属性
//! tc_foundation ─> 错误、量纲、数值工具
//! ```
//!
//! # 示例
//!
//! ```no_run
//! use std::sync::Arc;
//! use tc_config::TurbulenceProperties;
//! use tc_foundation::UnitDim;
//! use tc_fvm::{FvMesh, PolyMesh, VectorField, WallDistance};
//! use tc_turbulence::{new_model, FlowState, ModelContext};
//!
//! # fn main() -> tc_foundation::TcResult<()> {
//! let mesh: Arc<dyn FvMesh> = Arc::new(PolyMesh::structured([4, 4, 1], [1.0, 1.0, 0.25])?);
//! let wall = Arc::new(WallDistance::uniform(mesh.as_ref(), 0.1)?);
//! let ctx = ModelContext::with_uniform_nu(mesh.clone(), wall, 1e-5)?;
//! let props = TurbulenceProperties::new("SpalartAllmaras");
//! let mut model = new_model(&props, ctx, None)?;
//!
//! let u = VectorField::uniform("U", UnitDim::VELOCITY, mesh.as_ref(), glam::DVec3::ZERO);
//! let phi = vec![0.0; mesh.n_faces()];
//! let report = model.correct(&FlowState::new(&u, &phi, 1))?;
//! assert!(report.all_converged());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod blend;
pub mod closure;
pub mod coefficient;
pub mod invariants;
pub mod length_scale;
pub mod models;
pub mod transport;

pub use blend::{BlendArgument, BlendField, BlendFunction};
pub use closure::{ClosureModel, CorrectionReport, FlowState, ModelContext, ModelState};
pub use coefficient::{blend, CoefficientBlender};
pub use invariants::FlowInvariants;
pub use length_scale::{LengthScaleMode, LengthScaleSelector, LengthScales};
pub use models::{new_model, ModelKind};
pub use transport::{EquationReport, TimeScheme, TransportEquationBuilder};

/// Prelude 模块
pub mod prelude {
    pub use crate::closure::{ClosureModel, FlowState, ModelContext};
    pub use crate::models::{new_model, ModelKind};
    pub use tc_config::TurbulenceProperties;
    pub use tc_foundation::{TcError, TcResult};
}
