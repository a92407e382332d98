// crates/tc_turbulence/src/blend.rs

//! 混合函数
//!
//! 混合函数分两步计算：
//!
//! 1. [`BlendArgument`] 由局部量计算无量纲参数 `arg`，分母按下限截断
//! 2. [`Saturation`] 把 `arg` 饱和到 [0, 1]，再按上限 `cap` 截断
//!
//! | 函数 | 参数 | 饱和 | 上限 |
//! |------|------|------|------|
//! | WA2017 f1 | [`WrayAgarwalArg`] | tanh(arg⁴) | 0.9 |
//! | WR2018 f1 | [`WallDistanceFreeArg`] | tanh(arg⁴) | 0.9 |
//! | SST F1 | [`SstF1Arg`] | tanh(arg⁴) | 1 |
//! | SST F2 | [`SstF2Arg`] | tanh(arg²) | 1 |
//! | SST F3 | [`SstF3Arg`] | 1 - tanh(arg⁴) | 1 |
//! | DDES 屏蔽 1 - f_d | [`DdesShieldingArg`] | tanh(arg^Cd2) | 1 |
//!
//! 非有限结果按 0 处理，结果恒在 [0, cap] 内。

use rayon::prelude::*;
use tc_foundation::float::{bound_below, sqr, ARG_FLOOR};
use tc_fvm::PARALLEL_THRESHOLD;

// ============================================================
// 参数 trait
// ============================================================

/// 混合函数参数
pub trait BlendArgument: Sync {
    /// 参数名称（日志用）
    fn name(&self) -> &'static str;

    /// 单元数
    fn len(&self) -> usize;

    /// 是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 单元上的参数值
    fn argument(&self, cell: usize) -> f64;
}

/// 饱和方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Saturation {
    /// tanh(arg^power)
    Tanh {
        /// 幂次
        power: f64,
    },
    /// 1 - tanh(arg^power)
    OneMinusTanh {
        /// 幂次
        power: f64,
    },
}

impl Saturation {
    /// 饱和，负参数按 0 处理
    #[inline]
    pub fn apply(&self, arg: f64) -> f64 {
        let arg = bound_below(arg, 0.0);
        match *self {
            Self::Tanh { power } => arg.powf(power).tanh(),
            Self::OneMinusTanh { power } => 1.0 - arg.powf(power).tanh(),
        }
    }
}

// ============================================================
// 混合函数
// ============================================================

/// 混合函数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendFunction {
    saturation: Saturation,
    cap: f64,
}

impl BlendFunction {
    /// tanh(arg^power)
    pub fn tanh(power: f64) -> Self {
        Self {
            saturation: Saturation::Tanh { power },
            cap: 1.0,
        }
    }

    /// 1 - tanh(arg^power)
    pub fn one_minus_tanh(power: f64) -> Self {
        Self {
            saturation: Saturation::OneMinusTanh { power },
            cap: 1.0,
        }
    }

    /// 设置上限（如 WA 开关的 0.9）
    pub fn with_cap(mut self, cap: f64) -> Self {
        self.cap = cap.clamp(0.0, 1.0);
        self
    }

    /// 上限
    pub fn cap(&self) -> f64 {
        self.cap
    }

    /// 单点取值
    #[inline]
    pub fn value(&self, arg: f64) -> f64 {
        let f = self.saturation.apply(arg);
        if f.is_finite() {
            f.clamp(0.0, self.cap)
        } else {
            0.0
        }
    }

    /// 在所有单元上求值
    pub fn evaluate(&self, arg: &dyn BlendArgument) -> BlendField {
        let n = arg.len();
        let values = if n >= PARALLEL_THRESHOLD {
            (0..n).into_par_iter().map(|c| self.value(arg.argument(c))).collect()
        } else {
            (0..n).map(|c| self.value(arg.argument(c))).collect()
        };
        log::trace!("混合函数 {} 已更新", arg.name());
        BlendField {
            values,
            cap: self.cap,
        }
    }
}

/// 混合函数场，每次修正时重新计算，不持久化
#[derive(Debug, Clone, PartialEq)]
pub struct BlendField {
    values: Vec<f64>,
    cap: f64,
}

impl BlendField {
    /// 常数场
    pub fn uniform(n_cells: usize, value: f64) -> Self {
        let value = value.clamp(0.0, 1.0);
        Self {
            values: vec![value; n_cells],
            cap: 1.0,
        }
    }

    /// 值
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 单元值
    #[inline]
    pub fn get(&self, cell: usize) -> f64 {
        self.values[cell]
    }

    /// 上限
    #[inline]
    pub fn cap(&self) -> f64 {
        self.cap
    }

    /// 逐单元相乘（F2·F3）
    pub fn product(&self, other: &BlendField) -> BlendField {
        BlendField {
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| a * b)
                .collect(),
            cap: self.cap.min(other.cap),
        }
    }
}

// ============================================================
// 各模型的参数
// ============================================================

/// WA2017 开关参数
///
/// ```text
/// arg1 = (1 + y√(R S)/ν) / (1 + (max(y√(R S), 1.5 R) / (20 ν))²)
/// ```
pub struct WrayAgarwalArg<'a> {
    /// 壁面距离
    pub y: &'a [f64],
    /// R_ν
    pub rnu: &'a [f64],
    /// 应变率模
    pub s: &'a [f64],
    /// 分子运动粘度
    pub nu: &'a [f64],
}

impl BlendArgument for WrayAgarwalArg<'_> {
    fn name(&self) -> &'static str {
        "f1 (WA)"
    }

    fn len(&self) -> usize {
        self.rnu.len()
    }

    fn argument(&self, cell: usize) -> f64 {
        let r = bound_below(self.rnu[cell], 0.0);
        let nu = bound_below(self.nu[cell], ARG_FLOOR);
        let y_sqrt_rs = self.y[cell] * (r * self.s[cell]).sqrt();
        (1.0 + y_sqrt_rs / nu) / (1.0 + sqr(y_sqrt_rs.max(1.5 * r) / (20.0 * nu)))
    }
}

/// WR2018 无壁面距离开关参数
///
/// ```text
/// ω = S/√Cμ,  k = R ω,  η = S max(1, W/S)
/// arg1 = (ν ω / (ν ω + k)) · η² / (Cμ ω²)
/// ```
pub struct WallDistanceFreeArg<'a> {
    /// R_ν
    pub rnu: &'a [f64],
    /// 应变率模
    pub s: &'a [f64],
    /// 涡量模
    pub w: &'a [f64],
    /// 分子运动粘度
    pub nu: &'a [f64],
    /// Cμ
    pub c_mu: f64,
}

impl BlendArgument for WallDistanceFreeArg<'_> {
    fn name(&self) -> &'static str {
        "f1 (WR2018)"
    }

    fn len(&self) -> usize {
        self.rnu.len()
    }

    fn argument(&self, cell: usize) -> f64 {
        let s = bound_below(self.s[cell], ARG_FLOOR);
        let r = bound_below(self.rnu[cell], 0.0);
        let omega = s / self.c_mu.sqrt();
        let k = r * omega;
        let eta = s * (self.w[cell] / s).max(1.0);
        let nu_omega = self.nu[cell] * omega;
        (nu_omega / bound_below(nu_omega + k, ARG_FLOOR)) * sqr(eta)
            / bound_below(self.c_mu * sqr(omega), ARG_FLOOR)
    }
}

/// SST 公共输入
#[derive(Clone, Copy)]
pub struct SstInputs<'a> {
    /// 湍动能
    pub k: &'a [f64],
    /// 比耗散率
    pub omega: &'a [f64],
    /// 壁面距离
    pub y: &'a [f64],
    /// 分子运动粘度
    pub nu: &'a [f64],
    /// β*
    pub beta_star: f64,
}

impl SstInputs<'_> {
    #[inline]
    fn omega(&self, cell: usize) -> f64 {
        bound_below(self.omega[cell], ARG_FLOOR)
    }

    #[inline]
    fn y(&self, cell: usize) -> f64 {
        bound_below(self.y[cell], ARG_FLOOR)
    }

    /// max(√k/(β* ω y) · scale, 500ν/(y² ω))
    #[inline]
    fn viscous_or_outer(&self, cell: usize, scale: f64) -> f64 {
        let omega = self.omega(cell);
        let y = self.y(cell);
        let k = bound_below(self.k[cell], 0.0);
        (scale * k.sqrt() / (self.beta_star * omega * y)).max(500.0 * self.nu[cell] / (sqr(y) * omega))
    }
}

/// SST F1 参数
///
/// ```text
/// arg1 = min(max(√k/(β* ω y), 500ν/(y² ω)), 4 α_ω2 k / (CD_kω y²))
/// ```
pub struct SstF1Arg<'a> {
    /// 公共输入
    pub inputs: SstInputs<'a>,
    /// 交叉扩散项 CD_kω，已按 1e-10 截断
    pub cd_k_omega: &'a [f64],
    /// α_ω2
    pub alpha_omega2: f64,
}

impl BlendArgument for SstF1Arg<'_> {
    fn name(&self) -> &'static str {
        "F1 (SST)"
    }

    fn len(&self) -> usize {
        self.inputs.k.len()
    }

    fn argument(&self, cell: usize) -> f64 {
        let y = self.inputs.y(cell);
        let k = bound_below(self.inputs.k[cell], 0.0);
        let first = self.inputs.viscous_or_outer(cell, 1.0);
        let second = 4.0 * self.alpha_omega2 * k / bound_below(self.cd_k_omega[cell] * sqr(y), ARG_FLOOR);
        first.min(second)
    }
}

/// SST F2 参数
///
/// ```text
/// arg2 = min(max(2√k/(β* ω y), 500ν/(y² ω)), 100)
/// ```
pub struct SstF2Arg<'a> {
    /// 公共输入
    pub inputs: SstInputs<'a>,
}

impl BlendArgument for SstF2Arg<'_> {
    fn name(&self) -> &'static str {
        "F2 (SST)"
    }

    fn len(&self) -> usize {
        self.inputs.k.len()
    }

    fn argument(&self, cell: usize) -> f64 {
        self.inputs.viscous_or_outer(cell, 2.0).min(100.0)
    }
}

/// SST F3 参数：150ν/(ω y²)
pub struct SstF3Arg<'a> {
    /// 公共输入
    pub inputs: SstInputs<'a>,
}

impl BlendArgument for SstF3Arg<'_> {
    fn name(&self) -> &'static str {
        "F3 (SST)"
    }

    fn len(&self) -> usize {
        self.inputs.k.len()
    }

    fn argument(&self, cell: usize) -> f64 {
        let y = self.inputs.y(cell);
        150.0 * self.inputs.nu[cell] / (self.inputs.omega(cell) * sqr(y))
    }
}

/// DDES 屏蔽函数参数
///
/// ```text
/// r_d  = (ν_t + ν) / (max(|∇U|, ε) κ² y²)
/// arg  = Cd1 r_d
/// f_d  = 1 - tanh(arg^Cd2)
/// ```
///
/// 配合 `tanh(arg^Cd2)` 得到屏蔽系数 1 - f_d，边界层内趋于 1。
pub struct DdesShieldingArg<'a> {
    /// 涡粘
    pub nut: &'a [f64],
    /// 分子运动粘度
    pub nu: &'a [f64],
    /// |∇U|
    pub mag_grad_u: &'a [f64],
    /// 壁面距离
    pub y: &'a [f64],
    /// κ
    pub kappa: f64,
    /// Cd1
    pub cd1: f64,
}

impl DdesShieldingArg<'_> {
    /// r_d
    #[inline]
    pub fn rd(&self, cell: usize) -> f64 {
        let denom = bound_below(self.mag_grad_u[cell], tc_foundation::float::SMALL)
            * sqr(self.kappa)
            * sqr(bound_below(self.y[cell], ARG_FLOOR));
        (bound_below(self.nut[cell], 0.0) + self.nu[cell]) / bound_below(denom, ARG_FLOOR)
    }
}

impl BlendArgument for DdesShieldingArg<'_> {
    fn name(&self) -> &'static str {
        "fd (DDES)"
    }

    fn len(&self) -> usize {
        self.nut.len()
    }

    fn argument(&self, cell: usize) -> f64 {
        self.cd1 * self.rd(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<f64>);

    impl BlendArgument for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn len(&self) -> usize {
            self.0.len()
        }
        fn argument(&self, cell: usize) -> f64 {
            self.0[cell]
        }
    }

    #[test]
    fn test_output_in_unit_interval() {
        let args = Fixed(vec![0.0, 1e-300, 0.5, 1.0, 10.0, 1e300, f64::INFINITY, f64::NAN, -3.0]);
        for f in [
            BlendFunction::tanh(4.0).with_cap(0.9),
            BlendFunction::tanh(2.0),
            BlendFunction::one_minus_tanh(3.0),
        ] {
            let field = f.evaluate(&args);
            for &v in field.values() {
                assert!((0.0..=f.cap()).contains(&v), "{v}");
            }
        }
    }

    #[test]
    fn test_cap_applies() {
        let f = BlendFunction::tanh(4.0).with_cap(0.9);
        assert_eq!(f.value(100.0), 0.9);
        assert_eq!(f.value(0.0), 0.0);
    }

    #[test]
    fn test_wa_switch_zero_strain() {
        // S = 0, W = 0 时参数有限，f1 ∈ [0, 0.9]
        let y = [0.01, 1.0];
        let rnu = [1e-5, 0.0];
        let s = [0.0, 0.0];
        let nu = [1e-5, 1e-5];
        let arg = WrayAgarwalArg { y: &y, rnu: &rnu, s: &s, nu: &nu };
        let f1 = BlendFunction::tanh(4.0).with_cap(0.9).evaluate(&arg);
        for &v in f1.values() {
            assert!((0.0..=0.9).contains(&v));
        }
        // R = 0 时 arg1 = 1
        assert!((arg.argument(1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_wall_distance_free_switch_finite() {
        let rnu = [0.0, 1e-3, 1e3];
        let s = [0.0, 1.0, 1e-20];
        let w = [0.0, 2.0, 0.0];
        let nu = [1e-5; 3];
        let arg = WallDistanceFreeArg { rnu: &rnu, s: &s, w: &w, nu: &nu, c_mu: 0.09 };
        let f1 = BlendFunction::tanh(4.0).with_cap(0.9).evaluate(&arg);
        for &v in f1.values() {
            assert!(v.is_finite() && (0.0..=0.9).contains(&v));
        }
    }

    #[test]
    fn test_ddes_shielding_limits() {
        // ν_t 大（边界层内）→ 屏蔽 → 1；ν_t 为 0 且梯度大 → 屏蔽 → 0
        let nut = [1.0, 0.0];
        let nu = [1e-5, 1e-5];
        let grad = [1.0, 1e3];
        let y = [0.01, 1.0];
        let arg = DdesShieldingArg {
            nut: &nut,
            nu: &nu,
            mag_grad_u: &grad,
            y: &y,
            kappa: 0.41,
            cd1: 8.0,
        };
        let shield = BlendFunction::tanh(3.0).evaluate(&arg);
        assert!(shield.get(0) > 0.999);
        assert!(shield.get(1) < 1e-6);
    }

    #[test]
    fn test_sst_f1_near_wall_is_one() {
        let k = [1e-3];
        let omega = [1e4];
        let y = [1e-5];
        let nu = [1.5e-5];
        let cd = [1e-10];
        let inputs = SstInputs { k: &k, omega: &omega, y: &y, nu: &nu, beta_star: 0.09 };
        let f1 = BlendFunction::tanh(4.0).evaluate(&SstF1Arg {
            inputs,
            cd_k_omega: &cd,
            alpha_omega2: 0.856,
        });
        assert!(f1.get(0) > 0.99);
    }

    #[test]
    fn test_product() {
        let a = BlendField::uniform(2, 0.5);
        let b = BlendField::uniform(2, 0.4);
        assert!((a.product(&b).get(1) - 0.2).abs() < 1e-15);
    }
}
