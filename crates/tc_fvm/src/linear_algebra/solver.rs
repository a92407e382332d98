// crates/tc_fvm/src/linear_algebra/solver.rs

//! 迭代线性求解器
//!
//! [`BiCgStabSolver`]: 右预条件双共轭梯度稳定法，适用于对流-扩散得到的非对称矩阵。
//!
//! 求解失败不返回错误，而是通过 [`SolverStatus`] 报告；
//! 调用方决定是否继续（湍流方程在不收敛时照常截断并进入下一步）。
//!
//! ```
//! use tc_config::LinearSolverConfig;
//! use tc_fvm::linear_algebra::{BiCgStabSolver, CsrBuilder, IterativeSolver, JacobiPreconditioner};
//!
//! let mut builder = CsrBuilder::new_square(2);
//! builder.set(0, 0, 2.0);
//! builder.set(1, 1, 4.0);
//! let matrix = builder.build();
//! let precond = JacobiPreconditioner::from_matrix(&matrix);
//!
//! let mut x = vec![0.0; 2];
//! let mut solver = BiCgStabSolver::new(LinearSolverConfig::default());
//! let result = solver.solve(&matrix, &[2.0, 4.0], &mut x, &precond);
//! assert!(result.is_converged());
//! assert!((x[0] - 1.0).abs() < 1e-10);
//! ```

use super::csr::CsrMatrix;
use super::preconditioner::Preconditioner;
use super::vector_ops::{axpy, copy, dot, norm2};
use tc_config::LinearSolverConfig;

/// 破缺判据
const BREAKDOWN_TOL: f64 = 1e-30;
/// 残差增长超过初始残差的倍数视为发散
const DIVERGENCE_FACTOR: f64 = 1e6;

/// 求解器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// 收敛
    Converged,
    /// 达到最大迭代次数
    MaxIterationsReached,
    /// 发散
    Diverged,
    /// 停滞
    Stagnated,
}

/// 求解器结果
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// 求解状态
    pub status: SolverStatus,
    /// 迭代次数
    pub iterations: usize,
    /// 最终残差范数
    pub residual_norm: f64,
    /// 初始残差范数
    pub initial_residual_norm: f64,
    /// 相对残差
    pub relative_residual: f64,
}

impl SolverResult {
    /// 是否成功收敛
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }

    fn new(status: SolverStatus, iterations: usize, residual: f64, initial: f64) -> Self {
        let relative_residual = if initial > 0.0 { residual / initial } else { 0.0 };
        Self {
            status,
            iterations,
            residual_norm: residual,
            initial_residual_norm: initial,
            relative_residual,
        }
    }
}

/// 迭代求解器 trait
pub trait IterativeSolver {
    /// 求解线性系统 Ax = b
    ///
    /// - `x`: 输入初始猜测，输出解
    fn solve<P: Preconditioner>(
        &mut self,
        matrix: &CsrMatrix,
        b: &[f64],
        x: &mut [f64],
        precond: &P,
    ) -> SolverResult;

    /// 求解器名称
    fn name(&self) -> &'static str;
}

/// 双共轭梯度稳定法求解器
pub struct BiCgStabSolver {
    config: LinearSolverConfig,
    r: Vec<f64>,
    r0: Vec<f64>,
    p: Vec<f64>,
    v: Vec<f64>,
    s: Vec<f64>,
    t: Vec<f64>,
    z: Vec<f64>,
}

impl BiCgStabSolver {
    /// 创建 BiCGStab 求解器
    pub fn new(config: LinearSolverConfig) -> Self {
        Self {
            config,
            r: Vec::new(),
            r0: Vec::new(),
            p: Vec::new(),
            v: Vec::new(),
            s: Vec::new(),
            t: Vec::new(),
            z: Vec::new(),
        }
    }

    /// 确保工作向量大小正确
    fn ensure_workspace(&mut self, n: usize) {
        if self.r.len() != n {
            self.r = vec![0.0; n];
            self.r0 = vec![0.0; n];
            self.p = vec![0.0; n];
            self.v = vec![0.0; n];
            self.s = vec![0.0; n];
            self.t = vec![0.0; n];
            self.z = vec![0.0; n];
        }
    }
}

impl IterativeSolver for BiCgStabSolver {
    fn solve<P: Preconditioner>(
        &mut self,
        matrix: &CsrMatrix,
        b: &[f64],
        x: &mut [f64],
        precond: &P,
    ) -> SolverResult {
        let n = b.len();
        self.ensure_workspace(n);
        let rtol = self.config.rtol;
        let atol = self.config.atol;

        // r = b - A*x
        matrix.mul_vec(x, &mut self.r);
        for i in 0..n {
            self.r[i] = b[i] - self.r[i];
        }

        let initial_norm = norm2(&self.r);
        if initial_norm <= atol {
            return SolverResult::new(SolverStatus::Converged, 0, initial_norm, initial_norm);
        }

        // 影子残差固定为初始残差
        copy(&self.r, &mut self.r0);

        let mut rho_old = 1.0;
        let mut alpha = 1.0;
        let mut omega = 1.0;

        self.v.fill(0.0);
        self.p.fill(0.0);

        for iter in 0..self.config.max_iter {
            let rho = dot(&self.r0, &self.r);
            if rho.abs() < BREAKDOWN_TOL {
                let res = norm2(&self.r);
                return SolverResult::new(SolverStatus::Stagnated, iter, res, initial_norm);
            }

            let beta = if iter == 0 {
                0.0
            } else {
                (rho / rho_old) * (alpha / omega)
            };
            rho_old = rho;

            // p = r + beta * (p - omega * v)
            for i in 0..n {
                self.p[i] = self.r[i] + beta * (self.p[i] - omega * self.v[i]);
            }

            // v = A * M⁻¹ p
            precond.apply(&self.p, &mut self.z);
            matrix.mul_vec(&self.z, &mut self.v);

            let r0v = dot(&self.r0, &self.v);
            if r0v.abs() < BREAKDOWN_TOL {
                let res = norm2(&self.r);
                return SolverResult::new(SolverStatus::Stagnated, iter, res, initial_norm);
            }
            alpha = rho / r0v;

            // s = r - alpha * v
            for i in 0..n {
                self.s[i] = self.r[i] - alpha * self.v[i];
            }

            let s_norm = norm2(&self.s);
            if s_norm <= atol || s_norm / initial_norm < rtol {
                axpy(alpha, &self.z, x);
                return SolverResult::new(SolverStatus::Converged, iter + 1, s_norm, initial_norm);
            }

            // t = A * M⁻¹ s
            precond.apply(&self.s, &mut self.z);
            matrix.mul_vec(&self.z, &mut self.t);

            let tt = dot(&self.t, &self.t);
            omega = if tt.abs() < BREAKDOWN_TOL {
                1.0
            } else {
                dot(&self.t, &self.s) / tt
            };

            if omega.abs() < BREAKDOWN_TOL {
                precond.apply(&self.p, &mut self.z);
                axpy(alpha, &self.z, x);
                return SolverResult::new(SolverStatus::Stagnated, iter + 1, s_norm, initial_norm);
            }

            // x = x + alpha * M⁻¹ p + omega * M⁻¹ s
            axpy(omega, &self.z, x);
            precond.apply(&self.p, &mut self.z);
            axpy(alpha, &self.z, x);

            // r = s - omega * t
            for i in 0..n {
                self.r[i] = self.s[i] - omega * self.t[i];
            }

            let res_norm = norm2(&self.r);
            let rel_res = res_norm / initial_norm;

            if self.config.verbose {
                log::trace!("BiCGStab iter {}: residual = {:.6e}", iter + 1, res_norm);
            }

            if res_norm <= atol || rel_res < rtol {
                return SolverResult::new(SolverStatus::Converged, iter + 1, res_norm, initial_norm);
            }

            if !res_norm.is_finite() || res_norm > initial_norm * DIVERGENCE_FACTOR {
                return SolverResult::new(SolverStatus::Diverged, iter + 1, res_norm, initial_norm);
            }
        }

        let res = norm2(&self.r);
        SolverResult::new(
            SolverStatus::MaxIterationsReached,
            self.config.max_iter,
            res,
            initial_norm,
        )
    }

    fn name(&self) -> &'static str {
        "BiCGStab"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear_algebra::csr::CsrBuilder;
    use crate::linear_algebra::preconditioner::{IdentityPreconditioner, JacobiPreconditioner};

    /// 对流-扩散型非对称三对角矩阵
    fn convection_diffusion(n: usize) -> CsrMatrix {
        let mut builder = CsrBuilder::new_square(n);
        for i in 0..n {
            builder.set(i, i, 3.0);
            if i > 0 {
                builder.set(i, i - 1, -1.5);
            }
            if i + 1 < n {
                builder.set(i, i + 1, -0.5);
            }
        }
        builder.build()
    }

    fn residual(matrix: &CsrMatrix, b: &[f64], x: &[f64]) -> f64 {
        let mut ax = vec![0.0; b.len()];
        matrix.mul_vec(x, &mut ax);
        ax.iter().zip(b).map(|(a, b)| (a - b).powi(2)).sum::<f64>().sqrt()
    }

    #[test]
    fn test_bicgstab_nonsymmetric() {
        let n = 50;
        let matrix = convection_diffusion(n);
        let b = vec![1.0; n];
        let mut x = vec![0.0; n];
        let precond = JacobiPreconditioner::from_matrix(&matrix);
        let mut solver = BiCgStabSolver::new(LinearSolverConfig::new(1e-10, 200));

        let result = solver.solve(&matrix, &b, &mut x, &precond);
        assert!(result.is_converged(), "status: {:?}", result.status);
        assert!(residual(&matrix, &b, &x) < 1e-8);
    }

    #[test]
    fn test_zero_rhs_returns_immediately() {
        let matrix = convection_diffusion(5);
        let mut x = vec![0.0; 5];
        let mut solver = BiCgStabSolver::new(LinearSolverConfig::default());
        let result = solver.solve(&matrix, &[0.0; 5], &mut x, &IdentityPreconditioner);
        assert!(result.is_converged());
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_max_iterations_reported() {
        let matrix = convection_diffusion(40);
        let b = vec![1.0; 40];
        let mut x = vec![0.0; 40];
        let mut solver = BiCgStabSolver::new(LinearSolverConfig::new(1e-14, 1).with_atol(0.0));
        let result = solver.solve(&matrix, &b, &mut x, &IdentityPreconditioner);
        assert!(!result.is_converged());
        assert!(x.iter().all(|v| v.is_finite()));
    }
}
