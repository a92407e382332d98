// crates/tc_fvm/src/linear_algebra/mod.rs

//! 稀疏线性代数模块
//!
//! 提供输运方程隐式求解所需的 CSR 矩阵、预条件器和 BiCGStab 迭代求解器。
//! 对流项使离散矩阵非对称，因此只提供适用于非对称系统的 BiCGStab。

pub mod csr;
pub mod preconditioner;
pub mod solver;
pub mod vector_ops;

pub use csr::{CsrBuilder, CsrMatrix, CsrPattern};
pub use preconditioner::{IdentityPreconditioner, JacobiPreconditioner, Preconditioner};
pub use solver::{BiCgStabSolver, IterativeSolver, SolverResult, SolverStatus};
pub use vector_ops::{axpy, copy, dot, norm2, norm_inf};
