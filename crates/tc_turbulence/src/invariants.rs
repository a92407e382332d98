// crates/tc_turbulence/src/invariants.rs

//! 速度梯度不变量
//!
//! 所有模型共用的流场量，每次 `correct` 开始时从速度场计算一次。
//!
//! # 定义
//!
//! ```text
//! S     = √(2 symm(∇U) : symm(∇U))       应变率模
//! W     = √(2 skew(∇U) : skew(∇U))       涡量模
//! |∇U|  = √(∇U : ∇U)
//! G/ν   = dev(twoSymm(∇U)) : ∇U          单位涡粘的湍流产生
//! ```
//!
//! S、W 按 [`SMALL`] 截断，作为分母时无需再判断。

use glam::{DMat3, DVec3};
use tc_foundation::float::{bound_below, SMALL};
use tc_fvm::fvc;
use tc_fvm::{FvMesh, VectorField};

/// 张量双点积 A:B = Σ A_ij B_ij
#[inline]
pub fn double_dot(a: &DMat3, b: &DMat3) -> f64 {
    a.x_axis.dot(b.x_axis) + a.y_axis.dot(b.y_axis) + a.z_axis.dot(b.z_axis)
}

/// 单元速度梯度张量
///
/// 第 j 列第 i 行为 ∂U_j/∂x_i。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityGradient(pub DMat3);

impl VelocityGradient {
    /// 由分量构造：`rows[i][j]` = ∂U_j/∂x_i
    pub fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self(DMat3::from_cols(
            DVec3::new(rows[0][0], rows[1][0], rows[2][0]),
            DVec3::new(rows[0][1], rows[1][1], rows[2][1]),
            DVec3::new(rows[0][2], rows[1][2], rows[2][2]),
        ))
    }

    /// 对称部分 (∇U + ∇Uᵀ)/2
    #[inline]
    pub fn symm(&self) -> DMat3 {
        (self.0 + self.0.transpose()) * 0.5
    }

    /// 反对称部分 (∇U - ∇Uᵀ)/2
    #[inline]
    pub fn skew(&self) -> DMat3 {
        (self.0 - self.0.transpose()) * 0.5
    }

    /// 应变率模 S（未截断）
    #[inline]
    pub fn strain_rate_magnitude(&self) -> f64 {
        let s = self.symm();
        (2.0 * double_dot(&s, &s)).max(0.0).sqrt()
    }

    /// 涡量模 W（未截断）
    #[inline]
    pub fn vorticity_magnitude(&self) -> f64 {
        let w = self.skew();
        (2.0 * double_dot(&w, &w)).max(0.0).sqrt()
    }

    /// 梯度模 |∇U|
    #[inline]
    pub fn magnitude(&self) -> f64 {
        double_dot(&self.0, &self.0).sqrt()
    }

    /// 散度 ∇·U
    #[inline]
    pub fn divergence(&self) -> f64 {
        self.0.x_axis.x + self.0.y_axis.y + self.0.z_axis.z
    }

    /// G/ν = dev(twoSymm(∇U)) : ∇U
    #[inline]
    pub fn production_per_viscosity(&self) -> f64 {
        let two_symm = self.0 + self.0.transpose();
        let trace = two_symm.x_axis.x + two_symm.y_axis.y + two_symm.z_axis.z;
        let dev = two_symm - DMat3::from_diagonal(DVec3::splat(trace / 3.0));
        double_dot(&dev, &self.0)
    }

    /// 所有分量是否有限
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0.is_finite()
    }
}

/// 流场不变量（按单元）
#[derive(Debug, Clone)]
pub struct FlowInvariants {
    /// 速度梯度
    pub grad_u: Vec<DMat3>,
    /// 应变率模 S，已截断
    pub s: Vec<f64>,
    /// 涡量模 W，已截断
    pub w: Vec<f64>,
    /// |∇U|
    pub mag_grad_u: Vec<f64>,
    /// ∇·U
    pub div_u: Vec<f64>,
    /// G/ν
    pub g_by_nu: Vec<f64>,
}

impl FlowInvariants {
    /// 由速度场计算
    pub fn compute(mesh: &dyn FvMesh, velocity: &VectorField) -> Self {
        Self::from_gradients(fvc::grad_vector(mesh, velocity))
    }

    /// 由已有的速度梯度计算
    pub fn from_gradients(grad_u: Vec<DMat3>) -> Self {
        let n = grad_u.len();
        let mut s = Vec::with_capacity(n);
        let mut w = Vec::with_capacity(n);
        let mut mag_grad_u = Vec::with_capacity(n);
        let mut div_u = Vec::with_capacity(n);
        let mut g_by_nu = Vec::with_capacity(n);

        for g in &grad_u {
            let vg = VelocityGradient(*g);
            if !vg.is_valid() {
                s.push(SMALL);
                w.push(SMALL);
                mag_grad_u.push(0.0);
                div_u.push(0.0);
                g_by_nu.push(0.0);
                continue;
            }
            s.push(bound_below(vg.strain_rate_magnitude(), SMALL));
            w.push(bound_below(vg.vorticity_magnitude(), SMALL));
            mag_grad_u.push(vg.magnitude());
            div_u.push(vg.divergence());
            g_by_nu.push(vg.production_per_viscosity());
        }

        Self {
            grad_u,
            s,
            w,
            mag_grad_u,
            div_u,
            g_by_nu,
        }
    }

    /// 单元数
    #[inline]
    pub fn len(&self) -> usize {
        self.s.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }

    /// S²
    pub fn s2(&self) -> Vec<f64> {
        self.s.iter().map(|s| s * s).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_shear() {
        // u = y: ∂u/∂y = 1
        let g = VelocityGradient::from_rows([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 0.0]]);
        assert!((g.strain_rate_magnitude() - 1.0).abs() < 1e-12);
        assert!((g.vorticity_magnitude() - 1.0).abs() < 1e-12);
        assert!((g.production_per_viscosity() - 1.0).abs() < 1e-12);
        assert!(g.divergence().abs() < 1e-12);
    }

    #[test]
    fn test_pure_strain_has_no_vorticity() {
        // u = x, v = -y: S = 2, W = 0
        let g = VelocityGradient::from_rows([[1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, 0.0]]);
        assert!((g.strain_rate_magnitude() - 2.0).abs() < 1e-12);
        assert!(g.vorticity_magnitude().abs() < 1e-12);
        // G/ν = S² 对无散流
        assert!((g.production_per_viscosity() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_invariants_are_floored() {
        let inv = FlowInvariants::from_gradients(vec![DMat3::ZERO, DMat3::from_diagonal(DVec3::splat(f64::NAN))]);
        assert_eq!(inv.s, vec![SMALL, SMALL]);
        assert_eq!(inv.w, vec![SMALL, SMALL]);
        assert_eq!(inv.g_by_nu[1], 0.0);
    }
}
