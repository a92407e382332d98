// crates/tc_fvm/src/lib.rs

//! TurbClosure 有限体积层
//!
//! 湍流闭合模型依赖的离散基础设施：
//!
//! - [`mesh`]: 网格接口 [`FvMesh`] 与参考实现 [`PolyMesh`]
//! - [`field`]: 单元中心标量场、矢量场及其边界条件
//! - [`fvc`]: 显式算子（梯度、通量、散度、拉普拉斯）
//! - [`fvm`]: 隐式算子，组装 [`FvScalarMatrix`] 并求解
//! - [`linear_algebra`]: CSR 稀疏矩阵、预条件器、BiCGStab
//! - [`wall`]: 壁面距离
//! - [`io`]: 场的读写接口
//!
//! 网格生成、压力-速度耦合等属于宿主求解器，不在本 crate 范围内。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod field;
pub mod fvc;
pub mod fvm;
pub mod io;
pub mod linear_algebra;
pub mod mesh;
pub mod wall;

pub use field::{BoundaryCondition, ScalarField, VectorBoundaryCondition, VectorField};
pub use fvm::FvScalarMatrix;
pub use io::{FieldStore, JsonFieldStore, MemoryFieldStore, StoredField};
pub use mesh::{FvMesh, MeshParts, PolyMesh, StructuredMeshBuilder};
pub use wall::WallDistance;

/// 并行计算的单元数阈值，低于该值时串行执行
pub const PARALLEL_THRESHOLD: usize = 1000;

/// Prelude 模块
pub mod prelude {
    pub use crate::field::{BoundaryCondition, ScalarField, VectorBoundaryCondition, VectorField};
    pub use crate::fvm::FvScalarMatrix;
    pub use crate::io::FieldStore;
    pub use crate::mesh::FvMesh;
    pub use crate::wall::WallDistance;
    pub use glam::{DMat3, DVec3};
}
