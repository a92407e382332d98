// crates/tc_turbulence/src/models/sst_des.rs

//! k-ω SST DES / DDES
//!
//! Menter SST 两方程模型，k 方程耗散乘以 fdes = L_RANS/L：
//!
//! ```text
//! L_RANS = √k/(β* ω),  L_LES = C_DES Δ,  C_DES = F1 CkwDES + (1 - F1) CkeDES
//! ν_t    = a1 k / max(a1 ω, b1 F23 S)
//!
//! ω:  ... = γ min(G/ν, c1/a1 β* ω max(a1 ω, b1 F23 S))
//!           - ⅔ γ ∇·U ω - β ω² + (1 - F1) CD_kω
//! k:  ... = min(ν_t G/ν, c1 β* k ω) - ⅔ ∇·U k - β* ω fdes k
//! ```
//!
//! 先解 ω，k 方程使用新的 ω。
//!
//! # 参考文献
//!
//! - Menter, F.R., Kuntz, M., Langtry, R. (2003). Ten years of industrial
//!   experience with the SST turbulence model.
//! - Gritskevich, M.S. et al. (2012). Development of DDES and IDDES
//!   formulations for the k-ω shear stress transport model.

use crate::blend::{BlendField, BlendFunction, DdesShieldingArg, SstF1Arg, SstF2Arg, SstF3Arg, SstInputs};
use crate::closure::{
    coeff, switch, ClosureBase, ClosureModel, CorrectionReport, FlowState, ModelContext, ModelState,
};
use crate::coefficient::CoefficientBlender;
use crate::invariants::FlowInvariants;
use crate::length_scale::{cube_root_delta, LengthScaleMode, LengthScaleSelector, LengthScales};
use crate::transport::{EquationReport, TransportEquationBuilder};
use serde::{Deserialize, Serialize};
use tc_config::{CoeffDict, TurbulenceProperties};
use tc_foundation::float::{bound_below, safe_div, SMALL};
use tc_foundation::{TcResult, UnitDim};
use tc_fvm::{fvc, FieldStore, FvMesh, ScalarField};

/// F1 中 CD_kω 的下限
pub const CD_K_OMEGA_MIN: f64 = 1e-10;

/// SST-DES 系数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SstDesCoeffs {
    /// α_k1
    pub alpha_k1: f64,
    /// α_k2
    pub alpha_k2: f64,
    /// α_ω1
    pub alpha_omega1: f64,
    /// α_ω2
    pub alpha_omega2: f64,
    /// γ1
    pub gamma1: f64,
    /// γ2
    pub gamma2: f64,
    /// β1
    pub beta1: f64,
    /// β2
    pub beta2: f64,
    /// β*
    pub beta_star: f64,
    /// a1
    pub a1: f64,
    /// b1
    pub b1: f64,
    /// c1
    pub c1: f64,
    /// 是否启用 F3
    pub f3: bool,
    /// ω 下限
    pub omega_min: f64,
    /// k 下限
    pub k_min: f64,
    /// k-ε 区 C_DES
    pub cke_des: f64,
    /// k-ω 区 C_DES
    pub ckw_des: f64,
    /// κ
    pub kappa: f64,
    /// 是否启用 DDES
    pub ddes: bool,
    /// Cd1
    pub cd1: f64,
    /// Cd2
    pub cd2: f64,
}

impl Default for SstDesCoeffs {
    fn default() -> Self {
        Self {
            alpha_k1: 0.85,
            alpha_k2: 1.0,
            alpha_omega1: 0.5,
            alpha_omega2: 0.856,
            gamma1: 5.0 / 9.0,
            gamma2: 0.44,
            beta1: 0.075,
            beta2: 0.0828,
            beta_star: 0.09,
            a1: 0.31,
            b1: 1.0,
            c1: 10.0,
            f3: false,
            omega_min: 1e-15,
            k_min: 1e-15,
            cke_des: 0.61,
            ckw_des: 0.78,
            kappa: 0.41,
            ddes: false,
            cd1: 20.0,
            cd2: 3.0,
        }
    }
}

impl SstDesCoeffs {
    /// 从字典读取，缺省项写回字典
    pub fn from_dict(dict: &mut CoeffDict) -> TcResult<Self> {
        let d = Self::default();
        Ok(Self {
            alpha_k1: coeff(dict, "alphaK1", d.alpha_k1)?,
            alpha_k2: coeff(dict, "alphaK2", d.alpha_k2)?,
            alpha_omega1: coeff(dict, "alphaOmega1", d.alpha_omega1)?,
            alpha_omega2: coeff(dict, "alphaOmega2", d.alpha_omega2)?,
            gamma1: coeff(dict, "gamma1", d.gamma1)?,
            gamma2: coeff(dict, "gamma2", d.gamma2)?,
            beta1: coeff(dict, "beta1", d.beta1)?,
            beta2: coeff(dict, "beta2", d.beta2)?,
            beta_star: coeff(dict, "betaStar", d.beta_star)?,
            a1: coeff(dict, "a1", d.a1)?,
            b1: coeff(dict, "b1", d.b1)?,
            c1: coeff(dict, "c1", d.c1)?,
            f3: switch(dict, "F3", d.f3)?,
            omega_min: coeff(dict, "omegaMin", d.omega_min)?,
            k_min: coeff(dict, "kMin", d.k_min)?,
            cke_des: coeff(dict, "CkeDES", d.cke_des)?,
            ckw_des: coeff(dict, "CkwDES", d.ckw_des)?,
            kappa: coeff(dict, "kappa", d.kappa)?,
            ddes: switch(dict, "DDES", d.ddes)?,
            cd1: coeff(dict, "Cd1", d.cd1)?,
            cd2: coeff(dict, "Cd2", d.cd2)?,
        })
    }

    /// F1 混合的 α_k
    pub fn alpha_k(&self) -> CoefficientBlender {
        CoefficientBlender::new("alphaK", self.alpha_k1, self.alpha_k2)
    }

    /// F1 混合的 α_ω
    pub fn alpha_omega(&self) -> CoefficientBlender {
        CoefficientBlender::new("alphaOmega", self.alpha_omega1, self.alpha_omega2)
    }

    /// F1 混合的 γ
    pub fn gamma(&self) -> CoefficientBlender {
        CoefficientBlender::new("gamma", self.gamma1, self.gamma2)
    }

    /// F1 混合的 β
    pub fn beta(&self) -> CoefficientBlender {
        CoefficientBlender::new("beta", self.beta1, self.beta2)
    }

    /// F1 混合的 C_DES
    pub fn c_des(&self) -> CoefficientBlender {
        CoefficientBlender::new("CDES", self.ckw_des, self.cke_des)
    }

    /// ν_t = a1 k / max(a1 ω, b1 F23 S)
    #[inline]
    pub fn nut(&self, k: f64, omega: f64, f23: f64, s: f64) -> f64 {
        let denom = (self.a1 * omega).max(self.b1 * f23 * s);
        self.a1 * bound_below(k, 0.0) / bound_below(denom, SMALL)
    }

    /// L_RANS = √k/(β* ω)
    #[inline]
    pub fn l_rans(&self, k: f64, omega: f64) -> f64 {
        bound_below(k, 0.0).sqrt() / (self.beta_star * bound_below(omega, self.omega_min.max(SMALL)))
    }
}

/// 单次修正所用的混合场与长度尺度
struct SstBlending {
    f1: BlendField,
    f23: BlendField,
    cd_k_omega: Vec<f64>,
    scales: LengthScales,
}

/// SST-DES 模型
pub struct KOmegaSstDes {
    base: ClosureBase,
    coeffs: SstDesCoeffs,
    selector: LengthScaleSelector,
    delta: Vec<f64>,
    f1: BlendField,
    k: ScalarField,
    omega: ScalarField,
    nut: ScalarField,
    epsilon: ScalarField,
    les_region: ScalarField,
}

impl KOmegaSstDes {
    /// 创建模型
    pub fn new(
        props: &TurbulenceProperties,
        ctx: ModelContext,
        store: Option<&dyn FieldStore>,
    ) -> TcResult<Self> {
        let mut base = ClosureBase::new("kOmegaSSTDES", ctx, props);
        let coeffs = SstDesCoeffs::from_dict(base.coeffs_mut())?;
        let k = base.initial_field(store, "k", UnitDim::K, 1e-4, Some(0.0))?;
        let omega = base.initial_field(store, "omega", UnitDim::FREQUENCY, 1.0, None)?;
        let n_cells = base.mesh().n_cells();
        let delta = cube_root_delta(base.mesh());
        let nut = base.calculated_field("nut", UnitDim::KINEMATIC_VISCOSITY, 0.0, Some(0.0));
        let epsilon = base.calculated_field("epsilon", UnitDim::EPSILON, 0.0, None);
        let les_region = base.calculated_field("DESRegion", UnitDim::DIMENSIONLESS, 0.0, None);

        let mut model = Self {
            base,
            coeffs,
            selector: LengthScaleSelector::new(LengthScaleMode::from_ddes_switch(coeffs.ddes)),
            delta,
            f1: BlendField::uniform(n_cells, 1.0),
            k,
            omega,
            nut,
            epsilon,
            les_region,
        };
        model.correct_outputs(&BlendField::uniform(n_cells, 0.0), &vec![0.0; n_cells]);
        model.base.mark_ready();
        Ok(model)
    }

    /// ω
    pub fn omega(&self) -> &ScalarField {
        &self.omega
    }

    /// 最近一次修正的 F1
    pub fn f1(&self) -> &BlendField {
        &self.f1
    }

    /// 长度尺度模式
    pub fn mode(&self) -> LengthScaleMode {
        self.selector.mode()
    }

    fn inputs(&self) -> SstInputs<'_> {
        SstInputs {
            k: self.k.values(),
            omega: self.omega.values(),
            y: self.base.y(),
            nu: self.base.nu(),
            beta_star: self.coeffs.beta_star,
        }
    }

    fn blending(&self, inv: &FlowInvariants) -> SstBlending {
        let mesh = self.base.mesh();
        let c = self.coeffs;
        let grad_k = fvc::grad(mesh, &self.k);
        let grad_omega = fvc::grad(mesh, &self.omega);
        let omega = self.omega.values();
        let cd_k_omega: Vec<f64> = fvc::cell_map(mesh.n_cells(), |i| {
            2.0 * c.alpha_omega2 * grad_k[i].dot(grad_omega[i]) / bound_below(omega[i], c.omega_min.max(SMALL))
        });
        let cd_clamped: Vec<f64> = cd_k_omega.iter().map(|&cd| cd.max(CD_K_OMEGA_MIN)).collect();

        let inputs = self.inputs();
        let f1 = BlendFunction::tanh(4.0).evaluate(&SstF1Arg {
            inputs,
            cd_k_omega: &cd_clamped,
            alpha_omega2: c.alpha_omega2,
        });
        let f2 = BlendFunction::tanh(2.0).evaluate(&SstF2Arg { inputs });
        let f23 = if c.f3 {
            f2.product(&BlendFunction::one_minus_tanh(4.0).evaluate(&SstF3Arg { inputs }))
        } else {
            f2
        };

        let k = self.k.values();
        let l_rans: Vec<f64> = k.iter().zip(omega).map(|(&ki, &wi)| c.l_rans(ki, wi)).collect();
        let shield = c.ddes.then(|| {
            let arg = DdesShieldingArg {
                nut: self.nut.values(),
                nu: self.base.nu(),
                mag_grad_u: &inv.mag_grad_u,
                y: self.base.y(),
                kappa: c.kappa,
                cd1: c.cd1,
            };
            BlendFunction::tanh(c.cd2).evaluate(&arg).values().to_vec()
        });
        let c_des = c.c_des().blend_field(&f1);
        let scales = self.selector.compute(l_rans, &c_des, &self.delta, shield.as_deref());

        SstBlending {
            f1,
            f23,
            cd_k_omega,
            scales,
        }
    }

    fn diffusivities(&self, f1: &BlendField) -> (Vec<f64>, Vec<f64>) {
        let alpha_k = self.coeffs.alpha_k().blend_field(f1);
        let alpha_omega = self.coeffs.alpha_omega().blend_field(f1);
        let nut = self.nut.values();
        let nu = self.base.nu();
        let dk = (0..nut.len()).map(|c| alpha_k[c] * nut[c] + nu[c]).collect();
        let domega = (0..nut.len()).map(|c| alpha_omega[c] * nut[c] + nu[c]).collect();
        (dk, domega)
    }

    fn solve(
        &self,
        flow: &FlowState<'_>,
        inv: &FlowInvariants,
        blending: &SstBlending,
    ) -> TcResult<(ScalarField, ScalarField, Vec<EquationReport>)> {
        let mesh = self.base.mesh();
        let c = self.coeffs;
        let f1 = &blending.f1;
        let gamma = c.gamma().blend_field(f1);
        let beta = c.beta().blend_field(f1);
        let (dk, domega) = self.diffusivities(f1);
        let omega_old = self.omega.values();
        let omega_floor = c.omega_min.max(SMALL);

        // (产生项, -⅔ γ ∇·U, 交叉扩散)
        let omega_terms: Vec<(f64, f64, f64)> = fvc::cell_map(mesh.n_cells(), |i| {
            let w = bound_below(omega_old[i], omega_floor);
            let limiter = (c.a1 * w).max(c.b1 * blending.f23.get(i) * inv.s[i]);
            let production = gamma[i] * inv.g_by_nu[i].min(c.c1 / c.a1 * c.beta_star * w * limiter);
            let compressible = -2.0 / 3.0 * gamma[i] * inv.div_u[i];
            let cross = (1.0 - f1.get(i)) * blending.cd_k_omega[i] / w;
            (production, compressible, cross)
        });
        let omega_destruction: Vec<f64> = (0..omega_old.len())
            .map(|i| beta[i] * bound_below(omega_old[i], omega_floor))
            .collect();

        let mut omega_new = self.omega.clone();
        let omega_report = TransportEquationBuilder::new(mesh, "omega")
            .time(flow.time_scheme())
            .density(flow.rho)
            .convection(flow.phi)
            .diffusion(domega)
            .production(omega_terms.iter().map(|t| t.0).collect())
            .linear_source(omega_terms.iter().map(|t| t.1).collect())
            .destruction(omega_destruction)
            .linear_source(omega_terms.iter().map(|t| t.2).collect())
            .relaxation(self.base.relaxation_for("omega"))
            .floor(c.omega_min)
            .solve(&mut omega_new, self.base.solver())?;

        let k_old = self.k.values();
        let nut = self.nut.values();
        let omega = omega_new.values();
        let scales = &blending.scales;
        // (产生项, -⅔ ∇·U, 耗散系数)
        let k_terms: Vec<(f64, f64, f64)> = fvc::cell_map(mesh.n_cells(), |i| {
            let w = bound_below(omega[i], omega_floor);
            let ki = bound_below(k_old[i], c.k_min);
            let production = (nut[i] * inv.g_by_nu[i]).min(c.c1 * c.beta_star * ki * w);
            let fdes = safe_div(scales.l_rans[i], scales.l[i], 1.0);
            (production, -2.0 / 3.0 * inv.div_u[i], c.beta_star * w * fdes.max(1.0))
        });

        let mut k_new = self.k.clone();
        let k_report = TransportEquationBuilder::new(mesh, "k")
            .time(flow.time_scheme())
            .density(flow.rho)
            .convection(flow.phi)
            .diffusion(dk)
            .production(k_terms.iter().map(|t| t.0).collect())
            .linear_source(k_terms.iter().map(|t| t.1).collect())
            .destruction(k_terms.iter().map(|t| t.2).collect())
            .relaxation(self.base.relaxation_for("k"))
            .floor(c.k_min)
            .solve(&mut k_new, self.base.solver())?;

        Ok((k_new, omega_new, vec![omega_report, k_report]))
    }

    fn correct_outputs(&mut self, f23: &BlendField, s: &[f64]) {
        let c = self.coeffs;
        let k = self.k.values();
        let omega = self.omega.values();
        let nut = self.nut.values_mut();
        let epsilon = self.epsilon.values_mut();
        for i in 0..k.len() {
            nut[i] = c.nut(k[i], omega[i], f23.get(i), s[i]);
            epsilon[i] = c.beta_star * bound_below(k[i], 0.0) * bound_below(omega[i], 0.0);
        }
    }
}

impl ClosureModel for KOmegaSstDes {
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
        let blending = self.blending(&inv);
        let result = self.solve(flow, &inv, &blending).map(|(k, omega, reports)| {
            self.k = k;
            self.omega = omega;
            self.les_region
                .values_mut()
                .copy_from_slice(&blending.scales.les_region);
            self.correct_outputs(&blending.f23, &inv.s);
            self.f1 = blending.f1;
            reports
        });
        self.base.end_correct(flow.time_index, result)
    }

    fn read(&mut self, props: &TurbulenceProperties) -> TcResult<bool> {
        let mut dict = props.coeffs.clone();
        let coeffs = SstDesCoeffs::from_dict(&mut dict)?;
        if !self.base.reread(props, dict)? {
            return Ok(false);
        }
        self.coeffs = coeffs;
        self.selector = LengthScaleSelector::new(LengthScaleMode::from_ddes_switch(coeffs.ddes));
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
        let (dk, domega) = self.diffusivities(&self.f1);
        vec![
            self.base.derived_field("DkEff", UnitDim::KINEMATIC_VISCOSITY, &dk),
            self.base.derived_field("DomegaEff", UnitDim::KINEMATIC_VISCOSITY, &domega),
        ]
    }

    fn les_region(&self) -> Option<&ScalarField> {
        Some(&self.les_region)
    }

    fn transported_fields(&self) -> Vec<&ScalarField> {
        vec![&self.k, &self.omega]
    }

    fn mesh(&self) -> &dyn FvMesh {
        self.base.mesh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let mut dict = CoeffDict::new();
        let c = SstDesCoeffs::from_dict(&mut dict).unwrap();
        assert!((c.gamma1 - 5.0 / 9.0).abs() < 1e-15);
        assert_eq!(c.cd1, 20.0);
        assert!(!c.f3);
        assert!(dict.contains("CkwDES"));
    }

    #[test]
    fn test_blended_coefficients() {
        let c = SstDesCoeffs::default();
        // F1 = 1 取内层 (k-ω) 系数
        assert_eq!(c.beta().value(1.0), 0.075);
        assert_eq!(c.c_des().value(1.0), 0.78);
        assert_eq!(c.c_des().value(0.0), 0.61);
        assert!((c.alpha_k().value(0.5) - 0.925).abs() < 1e-12);
    }

    #[test]
    fn test_nut_limiter() {
        let c = SstDesCoeffs::default();
        // 低剪切：ν_t = k/ω
        assert!((c.nut(1.0, 2.0, 1.0, 0.1) - 0.5).abs() < 1e-12);
        // 高剪切：ν_t = a1 k/(b1 F23 S)
        assert!((c.nut(1.0, 2.0, 1.0, 10.0) - 0.031).abs() < 1e-12);
    }

    #[test]
    fn test_l_rans() {
        let c = SstDesCoeffs::default();
        assert!((c.l_rans(0.09, 1.0) - 0.3 / 0.09).abs() < 1e-12);
        assert!(c.l_rans(1.0, 0.0).is_finite());
    }
}
