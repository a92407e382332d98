// crates/tc_fvm/src/linear_algebra/preconditioner.rs

//! 预条件器
//!
//! 核心操作是 `apply`: z = M⁻¹ * r。
//! 湍流输运方程经过隐式线性化后对角占优，Jacobi 预条件已足够。

use super::csr::CsrMatrix;

/// 对角元绝对值低于此阈值时按单位预条件处理
const ZERO_DIAGONAL: f64 = 1e-14;

/// 预条件器 trait
pub trait Preconditioner: Send + Sync {
    /// 应用预条件器: z = M⁻¹ * r
    fn apply(&self, r: &[f64], z: &mut [f64]);

    /// 预条件器名称
    fn name(&self) -> &'static str;
}

/// 恒等预条件器（无预条件）
#[derive(Debug, Clone, Default)]
pub struct IdentityPreconditioner;

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        z.copy_from_slice(r);
    }

    fn name(&self) -> &'static str {
        "Identity"
    }
}

/// Jacobi 预条件器（对角预条件）
///
/// M = diag(A)，即 z_i = r_i / A_ii
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner {
    inv_diag: Vec<f64>,
}

impl JacobiPreconditioner {
    /// 从 CSR 矩阵创建
    pub fn from_matrix(matrix: &CsrMatrix) -> Self {
        Self::from_diagonal(&matrix.extract_diagonal())
    }

    /// 从对角向量创建
    pub fn from_diagonal(diag: &[f64]) -> Self {
        let inv_diag = diag
            .iter()
            .map(|&d| if d.abs() > ZERO_DIAGONAL { 1.0 / d } else { 1.0 })
            .collect();
        Self { inv_diag }
    }

    /// 对角元倒数
    pub fn inv_diagonal(&self) -> &[f64] {
        &self.inv_diag
    }
}

impl Preconditioner for JacobiPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        debug_assert_eq!(r.len(), self.inv_diag.len());
        for ((zi, &ri), &inv_d) in z.iter_mut().zip(r.iter()).zip(self.inv_diag.iter()) {
            *zi = ri * inv_d;
        }
    }

    fn name(&self) -> &'static str {
        "Jacobi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jacobi_zero_diagonal_falls_back() {
        let p = JacobiPreconditioner::from_diagonal(&[2.0, 0.0, -4.0]);
        let mut z = vec![0.0; 3];
        p.apply(&[1.0, 1.0, 1.0], &mut z);
        assert_eq!(z, vec![0.5, 1.0, -0.25]);
        assert_eq!(p.name(), "Jacobi");
    }

    #[test]
    fn test_identity() {
        let mut z = vec![0.0; 2];
        IdentityPreconditioner.apply(&[3.0, 4.0], &mut z);
        assert_eq!(z, vec![3.0, 4.0]);
    }
}
