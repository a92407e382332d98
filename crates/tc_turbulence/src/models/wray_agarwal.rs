// crates/tc_turbulence/src/models/wray_agarwal.rs

//! Wray-Agarwal 一方程模型
//!
//! 由 k-ω 与 k-ε 导出的 R = k/ω 方程，通过开关函数 f1 在两套系数间混合：
//!
//! ```text
//! ∂R/∂t + ∇·(UR) - ∇·((σ_R R + ν)∇R) = C1 R S
//!     + f1 C2kω (∇R·∇S)/S · R
//!     - (1-f1) C2kε R² |∇S|²/S²
//!
//! C1  = f1 C1kω + (1-f1) C1kε
//! σ_R = f1 σkω + (1-f1) σkε
//! ν_t = fμ R,  fμ = χ³/(χ³ + Cw³),  χ = R/ν
//! ```
//!
//! | 标签 | 开关 | 耗散项 |
//! |------|------|--------|
//! | `WrayAgarwal2017` | 壁面距离 | 原式 |
//! | `WrayAgarwal2018` | 壁面距离 | min(·, Cm \|∇R\|²) |
//! | `WrayAgarwalWR2018` | 无壁面距离 | min(·, Cm \|∇R\|²) |
//!
//! # 参考文献
//!
//! - Wray, T.J., Agarwal, R.K. (2015). Low-Reynolds-number one-equation
//!   turbulence model based on k-ω closure. AIAA Journal, 53(8).
//! - Han, X., Rahman, M., Agarwal, R.K. (2018). Development and application
//!   of wall-distance-free Wray-Agarwal turbulence model (WA2018). AIAA 2018-0593.

use crate::blend::{BlendField, BlendFunction, WallDistanceFreeArg, WrayAgarwalArg};
use crate::closure::{coeff, ClosureBase, ClosureModel, CorrectionReport, FlowState, ModelContext, ModelState};
use crate::coefficient::CoefficientBlender;
use crate::invariants::FlowInvariants;
use crate::transport::{EquationReport, TransportEquationBuilder};
use serde::{Deserialize, Serialize};
use tc_config::{CoeffDict, TurbulenceProperties};
use tc_foundation::float::{bound_below, pow3, sqr, SMALL};
use tc_foundation::{TcResult, UnitDim};
use tc_fvm::{fvc, FieldStore, FvMesh, ScalarField};

/// f1 上限
pub const F1_CAP: f64 = 0.9;

/// k、ε 导出所用的 Cμ
const C_MU: f64 = 0.09;

/// WA 模型系数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaCoeffs {
    /// κ
    pub kappa: f64,
    /// Cw
    pub cw: f64,
    /// C1kε
    pub c1ke: f64,
    /// C1kω
    pub c1kw: f64,
    /// σkε
    pub sigmake: f64,
    /// σkω
    pub sigmakw: f64,
    /// C2kε = C1kε/κ² + σkε（导出量）
    pub c2ke: f64,
    /// C2kω = C1kω/κ² + σkω（导出量）
    pub c2kw: f64,
}

impl Default for WaCoeffs {
    fn default() -> Self {
        Self::derive(0.41, 8.54, 0.1127, 0.0829, 1.0, 0.72)
    }
}

impl WaCoeffs {
    fn derive(kappa: f64, cw: f64, c1ke: f64, c1kw: f64, sigmake: f64, sigmakw: f64) -> Self {
        Self {
            kappa,
            cw,
            c1ke,
            c1kw,
            sigmake,
            sigmakw,
            c2ke: c1ke / sqr(kappa) + sigmake,
            c2kw: c1kw / sqr(kappa) + sigmakw,
        }
    }

    /// 从字典读取，缺省项写回字典
    pub fn from_dict(dict: &mut CoeffDict) -> TcResult<Self> {
        let d = Self::default();
        Ok(Self::derive(
            coeff(dict, "kappa", d.kappa)?,
            coeff(dict, "Cw", d.cw)?,
            coeff(dict, "C1ke", d.c1ke)?,
            coeff(dict, "C1kw", d.c1kw)?,
            coeff(dict, "sigmake", d.sigmake)?,
            coeff(dict, "sigmakw", d.sigmakw)?,
        ))
    }

    /// C1 混合器
    pub fn c1_blender(&self) -> CoefficientBlender {
        CoefficientBlender::new("C1", self.c1kw, self.c1ke)
    }

    /// σ_R 混合器
    pub fn sigma_blender(&self) -> CoefficientBlender {
        CoefficientBlender::new("sigmaR", self.sigmakw, self.sigmake)
    }

    /// fμ = χ³/(χ³ + Cw³)
    #[inline]
    pub fn fmu(&self, rnu: f64, nu: f64) -> f64 {
        let chi3 = pow3(bound_below(rnu, 0.0) / bound_below(nu, SMALL));
        chi3 / (chi3 + pow3(self.cw))
    }

    /// ν_t = fμ R
    #[inline]
    pub fn nut(&self, rnu: f64, nu: f64) -> f64 {
        self.fmu(rnu, nu) * bound_below(rnu, 0.0)
    }
}

/// 组装并求解 R 方程
///
/// `cm` 为耗散项限制系数，`extra_destruction` 为 DES 附加的隐式耗散系数。
#[allow(clippy::too_many_arguments)]
pub(crate) fn solve_rnu(
    base: &ClosureBase,
    coeffs: &WaCoeffs,
    cm: Option<f64>,
    f1: &BlendField,
    flow: &FlowState<'_>,
    inv: &FlowInvariants,
    rnu: &ScalarField,
    extra_destruction: Option<Vec<f64>>,
) -> TcResult<(ScalarField, EquationReport)> {
    let mesh = base.mesh();
    let nu = base.nu();
    let r = rnu.values();
    let grad_r = fvc::grad(mesh, rnu);
    let grad_s = fvc::grad_values(mesh, &inv.s);
    let c1 = coeffs.c1_blender().blend_field(f1);
    let sigma_r = coeffs.sigma_blender().blend_field(f1);

    let terms: Vec<(f64, f64, f64)> = fvc::cell_map(mesh.n_cells(), |c| {
        let s = inv.s[c];
        let f = f1.get(c);
        let rc = bound_below(r[c], 0.0);
        let production = c1[c] * rc * s;
        let cross = f * coeffs.c2kw * grad_r[c].dot(grad_s[c]) / s;
        let ke = coeffs.c2ke * sqr(rc) * grad_s[c].length_squared() / sqr(s);
        let destruction = match cm {
            Some(cm) => (1.0 - f) * ke.min(cm * grad_r[c].length_squared()),
            None => (1.0 - f) * ke,
        };
        (production, cross, destruction)
    });

    let production = terms.iter().map(|t| t.0).collect();
    let cross = terms.iter().map(|t| t.1).collect();
    let destruction = terms.iter().map(|t| t.2).collect();
    let d_eff = (0..r.len())
        .map(|c| sigma_r[c] * bound_below(r[c], 0.0) + nu[c])
        .collect();

    let mut builder = TransportEquationBuilder::new(mesh, rnu.name())
        .time(flow.time_scheme())
        .density(flow.rho)
        .convection(flow.phi)
        .diffusion(d_eff)
        .production(production)
        .linear_source(cross)
        .sink(destruction)
        .relaxation(base.relaxation_for(rnu.name()))
        .floor(0.0);
    if let Some(extra) = extra_destruction {
        builder = builder.destruction(extra);
    }

    let mut solved = rnu.clone();
    let report = builder.solve(&mut solved, base.solver())?;
    Ok((solved, report))
}

/// 由 ν_t 与 S 计算 k = ν_t S/√Cμ、ε = ν_t S²
pub(crate) fn wa_k_epsilon(nut: &[f64], s: &[f64], k: &mut [f64], epsilon: &mut [f64]) {
    let sqrt_cmu = C_MU.sqrt();
    for c in 0..nut.len() {
        k[c] = nut[c] * s[c] / sqrt_cmu;
        epsilon[c] = nut[c] * sqr(s[c]);
    }
}

/// WA 变体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaVariant {
    /// 原始模型
    Wa2017,
    /// 带 Cm 限制的耗散项
    Wa2018,
    /// 无壁面距离开关
    Wr2018,
}

impl WaVariant {
    /// 工厂标签
    pub fn tag(self) -> &'static str {
        match self {
            Self::Wa2017 => "WrayAgarwal2017",
            Self::Wa2018 => "WrayAgarwal2018",
            Self::Wr2018 => "WrayAgarwalWR2018",
        }
    }

    /// 是否限制耗散项
    pub fn has_limiter(self) -> bool {
        !matches!(self, Self::Wa2017)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct VariantCoeffs {
    cm: Option<f64>,
    c_mu: f64,
}

impl VariantCoeffs {
    fn from_dict(variant: WaVariant, dict: &mut CoeffDict) -> TcResult<Self> {
        let cm = if variant.has_limiter() {
            Some(coeff(dict, "Cm", 8.0)?)
        } else {
            None
        };
        let c_mu = if variant == WaVariant::Wr2018 {
            coeff(dict, "Cmu", C_MU)?
        } else {
            C_MU
        };
        Ok(Self { cm, c_mu })
    }
}

/// Wray-Agarwal 模型（2017、2018、WR2018）
pub struct WrayAgarwal {
    base: ClosureBase,
    variant: WaVariant,
    coeffs: WaCoeffs,
    extra: VariantCoeffs,
    f1: BlendField,
    rnu: ScalarField,
    nut: ScalarField,
    k: ScalarField,
    epsilon: ScalarField,
}

impl WrayAgarwal {
    /// 创建指定变体
    pub fn new(
        variant: WaVariant,
        props: &TurbulenceProperties,
        ctx: ModelContext,
        store: Option<&dyn FieldStore>,
    ) -> TcResult<Self> {
        let mut base = ClosureBase::new(variant.tag(), ctx, props);
        let coeffs = WaCoeffs::from_dict(base.coeffs_mut())?;
        let extra = VariantCoeffs::from_dict(variant, base.coeffs_mut())?;
        let rnu = base.initial_field(
            store,
            "Rnu",
            UnitDim::KINEMATIC_VISCOSITY,
            3.0 * base.mean_nu(),
            Some(0.0),
        )?;
        let n_cells = base.mesh().n_cells();
        let nut = base.calculated_field("nut", UnitDim::KINEMATIC_VISCOSITY, 0.0, Some(0.0));
        let k = base.calculated_field("k", UnitDim::K, 0.0, None);
        let epsilon = base.calculated_field("epsilon", UnitDim::EPSILON, 0.0, None);

        let mut model = Self {
            base,
            variant,
            coeffs,
            extra,
            f1: BlendField::uniform(n_cells, 0.0),
            rnu,
            nut,
            k,
            epsilon,
        };
        model.correct_nut();
        model.base.mark_ready();
        Ok(model)
    }

    /// 变体
    pub fn variant(&self) -> WaVariant {
        self.variant
    }

    /// R_ν
    pub fn rnu(&self) -> &ScalarField {
        &self.rnu
    }

    /// 最近一次修正的开关函数
    pub fn f1(&self) -> &BlendField {
        &self.f1
    }

    fn switch_function(&self, inv: &FlowInvariants) -> BlendField {
        let blend = BlendFunction::tanh(4.0).with_cap(F1_CAP);
        match self.variant {
            WaVariant::Wr2018 => blend.evaluate(&WallDistanceFreeArg {
                rnu: self.rnu.values(),
                s: &inv.s,
                w: &inv.w,
                nu: self.base.nu(),
                c_mu: self.extra.c_mu,
            }),
            WaVariant::Wa2017 | WaVariant::Wa2018 => blend.evaluate(&WrayAgarwalArg {
                y: self.base.y(),
                rnu: self.rnu.values(),
                s: &inv.s,
                nu: self.base.nu(),
            }),
        }
    }

    fn correct_nut(&mut self) {
        let nu = self.base.nu();
        let coeffs = self.coeffs;
        for ((nut, &r), &v) in self.nut.values_mut().iter_mut().zip(self.rnu.values()).zip(nu) {
            *nut = coeffs.nut(r, v);
        }
    }
}

impl ClosureModel for WrayAgarwal {
    fn name(&self) -> &'static str {
        self.base.name()
    }

    fn state(&self) -> ModelState {
        self.base.state()
    }

    fn correct(&mut self, flow: &FlowState<'_>) -> TcResult<CorrectionReport> {
        if !self.base.begin_correct(flow)? {
            return Ok(CorrectionReport::skipped(flow.time_index));
        }
        let inv = FlowInvariants::compute(self.base.mesh(), flow.velocity);
        let f1 = self.switch_function(&inv);
        let result = solve_rnu(
            &self.base,
            &self.coeffs,
            self.extra.cm,
            &f1,
            flow,
            &inv,
            &self.rnu,
            None,
        );
        let result = result.map(|(solved, report)| {
            self.rnu = solved;
            self.f1 = f1;
            self.correct_nut();
            wa_k_epsilon(self.nut.values(), &inv.s, self.k.values_mut(), self.epsilon.values_mut());
            vec![report]
        });
        self.base.end_correct(flow.time_index, result)
    }

    fn read(&mut self, props: &TurbulenceProperties) -> TcResult<bool> {
        let mut dict = props.coeffs.clone();
        let coeffs = WaCoeffs::from_dict(&mut dict)?;
        let extra = VariantCoeffs::from_dict(self.variant, &mut dict)?;
        if !self.base.reread(props, dict)? {
            return Ok(false);
        }
        self.coeffs = coeffs;
        self.extra = extra;
        Ok(true)
    }

    fn nut(&self) -> &ScalarField {
        &self.nut
    }

    fn k(&self) -> &ScalarField {
        &self.k
    }

    fn epsilon(&self) -> &ScalarField {
        &self.epsilon
    }

    fn effective_diffusivities(&self) -> Vec<ScalarField> {
        let sigma_r = self.coeffs.sigma_blender().blend_field(&self.f1);
        let d: Vec<f64> = (0..self.rnu.len())
            .map(|c| sigma_r[c] * bound_below(self.rnu.value(c), 0.0) + self.base.nu()[c])
            .collect();
        vec![self.base.derived_field("DRnuEff", UnitDim::KINEMATIC_VISCOSITY, &d)]
    }

    fn transported_fields(&self) -> Vec<&ScalarField> {
        vec![&self.rnu]
    }

    fn mesh(&self) -> &dyn FvMesh {
        self.base.mesh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_coefficients() {
        let c = WaCoeffs::default();
        assert!((c.c2ke - (0.1127 / 0.1681 + 1.0)).abs() < 1e-12);
        assert!((c.c2kw - (0.0829 / 0.1681 + 0.72)).abs() < 1e-12);
    }

    #[test]
    fn test_blended_coefficients_follow_switch() {
        let c = WaCoeffs::default();
        assert_eq!(c.c1_blender().value(1.0), c.c1kw);
        assert_eq!(c.c1_blender().value(0.0), c.c1ke);
        let at_cap = c.sigma_blender().value(F1_CAP);
        assert!(at_cap > c.sigmakw && at_cap < c.sigmake);
    }

    #[test]
    fn test_fmu() {
        let c = WaCoeffs::default();
        assert_eq!(c.fmu(0.0, 1e-5), 0.0);
        assert_eq!(c.nut(-1.0, 1e-5), 0.0);
        // χ = Cw 时 fμ = 1/2
        assert!((c.fmu(8.54e-5, 1e-5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_variant_coefficients() {
        let mut dict = CoeffDict::new();
        let wa2017 = VariantCoeffs::from_dict(WaVariant::Wa2017, &mut dict).unwrap();
        assert_eq!(wa2017.cm, None);
        assert!(!dict.contains("Cm"));
        let wr = VariantCoeffs::from_dict(WaVariant::Wr2018, &mut dict).unwrap();
        assert_eq!(wr.cm, Some(8.0));
        assert_eq!(wr.c_mu, 0.09);
        assert!(dict.contains("Cmu"));
    }

    #[test]
    fn test_k_epsilon_from_nut() {
        let mut k = vec![0.0; 1];
        let mut eps = vec![0.0; 1];
        wa_k_epsilon(&[0.3], &[2.0], &mut k, &mut eps);
        assert!((k[0] - 0.3 * 2.0 / 0.3).abs() < 1e-12);
        assert!((eps[0] - 1.2).abs() < 1e-12);
    }
}
