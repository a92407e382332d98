// crates/tc_turbulence/src/models/spalart_allmaras.rs

//! Spalart-Allmaras 一方程模型
//!
//! # 控制方程
//!
//! ```text
//! ∂ν̃/∂t + ∇·(Uν̃) - ∇·(D ∇ν̃) = Cb1(1-ft2) S̃ ν̃ + Cb2/σ |∇ν̃|²
//!                                - (Cw1 fw - Cb1 ft2/κ²) ν̃²/y²
//! D = (ν̃ + ν)/σ
//! ν_t = fv1 ν̃
//! ```
//!
//! `SpalartAllmarasNoft2` 令 ft2 ≡ 0。
//!
//! # 参考文献
//!
//! - Spalart, P.R., Allmaras, S.R. (1994). A one-equation turbulence model
//!   for aerodynamic flows. La Recherche Aerospatiale, 1, 5-21.

use crate::closure::{coeff, ClosureBase, ClosureModel, CorrectionReport, FlowState, ModelContext, ModelState};
use crate::invariants::FlowInvariants;
use crate::transport::{EquationReport, TransportEquationBuilder};
use serde::{Deserialize, Serialize};
use tc_config::{CoeffDict, TurbulenceProperties};
use tc_foundation::float::{bound_below, pow3, pow6, sqr, SMALL};
use tc_foundation::{TcResult, UnitDim};
use tc_fvm::{fvc, FieldStore, FvMesh, ScalarField};

/// SA 模型系数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaCoeffs {
    /// σ_ν
    pub sigma_nut: f64,
    /// κ
    pub kappa: f64,
    /// Cb1
    pub cb1: f64,
    /// Cb2
    pub cb2: f64,
    /// Cw1（导出量）
    pub cw1: f64,
    /// Cw2
    pub cw2: f64,
    /// Cw3
    pub cw3: f64,
    /// Cv1
    pub cv1: f64,
    /// Cs
    pub cs: f64,
    /// Ct3
    pub ct3: f64,
    /// Ct4
    pub ct4: f64,
}

impl Default for SaCoeffs {
    fn default() -> Self {
        let sigma_nut = 0.66666;
        let kappa = 0.41;
        let cb1 = 0.1355;
        let cb2 = 0.622;
        Self {
            sigma_nut,
            kappa,
            cb1,
            cb2,
            cw1: cb1 / sqr(kappa) + (1.0 + cb2) / sigma_nut,
            cw2: 0.3,
            cw3: 2.0,
            cv1: 7.1,
            cs: 0.3,
            ct3: 1.2,
            ct4: 0.5,
        }
    }
}

impl SaCoeffs {
    /// 从字典读取，缺省项写回字典
    pub fn from_dict(dict: &mut CoeffDict) -> TcResult<Self> {
        let d = Self::default();
        let sigma_nut = coeff(dict, "sigmaNut", d.sigma_nut)?;
        let kappa = coeff(dict, "kappa", d.kappa)?;
        let cb1 = coeff(dict, "Cb1", d.cb1)?;
        let cb2 = coeff(dict, "Cb2", d.cb2)?;
        Ok(Self {
            sigma_nut,
            kappa,
            cb1,
            cb2,
            cw1: cb1 / sqr(kappa) + (1.0 + cb2) / sigma_nut,
            cw2: coeff(dict, "Cw2", d.cw2)?,
            cw3: coeff(dict, "Cw3", d.cw3)?,
            cv1: coeff(dict, "Cv1", d.cv1)?,
            cs: coeff(dict, "Cs", d.cs)?,
            ct3: coeff(dict, "Ct3", d.ct3)?,
            ct4: coeff(dict, "Ct4", d.ct4)?,
        })
    }

    /// χ = max(ν̃, 0)/ν
    #[inline]
    pub fn chi(&self, nu_tilda: f64, nu: f64) -> f64 {
        bound_below(nu_tilda, 0.0) / bound_below(nu, SMALL)
    }

    /// fv1 = χ³/(χ³ + Cv1³)
    #[inline]
    pub fn fv1(&self, chi: f64) -> f64 {
        let chi3 = pow3(chi);
        chi3 / (chi3 + pow3(self.cv1))
    }

    /// fv2 = 1 - χ/(1 + χ fv1)
    #[inline]
    pub fn fv2(&self, chi: f64, fv1: f64) -> f64 {
        1.0 - chi / (1.0 + chi * fv1)
    }

    /// ft2 = Ct3 exp(-Ct4 χ²)
    #[inline]
    pub fn ft2(&self, chi: f64) -> f64 {
        self.ct3 * (-self.ct4 * sqr(chi)).exp()
    }

    /// S̃ = max(Ω + fv2 ν̃/(κ² y²), Cs Ω)
    #[inline]
    pub fn stilda(&self, chi: f64, fv1: f64, nu_tilda: f64, omega: f64, y: f64) -> f64 {
        let nt = bound_below(nu_tilda, 0.0);
        let s = omega + self.fv2(chi, fv1) * nt / (sqr(self.kappa) * sqr(y));
        s.max(self.cs * omega)
    }

    /// fw(r)，r = min(ν̃/(S̃ κ² y²), 10)
    #[inline]
    pub fn fw(&self, stilda: f64, nu_tilda: f64, y: f64) -> f64 {
        let r = (nu_tilda / (bound_below(stilda, SMALL) * sqr(self.kappa) * sqr(y))).min(10.0);
        let g = r + self.cw2 * (pow6(r) - r);
        let cw3_6 = pow6(self.cw3);
        g * ((1.0 + cw3_6) / (pow6(g) + cw3_6)).powf(1.0 / 6.0)
    }

    /// 有效扩散系数 (max(ν̃,0) + ν)/σ
    #[inline]
    pub fn diffusivity(&self, nu_tilda: f64, nu: f64) -> f64 {
        (bound_below(nu_tilda, 0.0) + nu) / self.sigma_nut
    }

    /// ν_t = fv1 ν̃
    #[inline]
    pub fn nut(&self, nu_tilda: f64, nu: f64) -> f64 {
        let nt = bound_below(nu_tilda, 0.0);
        self.fv1(self.chi(nt, nu)) * nt
    }
}

/// 组装并求解 ν̃ 方程
///
/// `length` 为源项中的长度尺度：RANS 取壁面距离，DES 取混合长度 d̃。
pub(crate) fn solve_nu_tilda(
    base: &ClosureBase,
    coeffs: &SaCoeffs,
    noft2: bool,
    flow: &FlowState<'_>,
    inv: &FlowInvariants,
    length: &[f64],
    nu_tilda: &ScalarField,
) -> TcResult<(ScalarField, EquationReport)> {
    let mesh = base.mesh();
    let nu = base.nu();
    let nt = nu_tilda.values();
    let grad_nt = fvc::grad(mesh, nu_tilda);

    let terms: Vec<(f64, f64, f64)> = fvc::cell_map(mesh.n_cells(), |c| {
        let y = bound_below(length[c], SMALL);
        let chi = coeffs.chi(nt[c], nu[c]);
        let fv1 = coeffs.fv1(chi);
        let stilda = coeffs.stilda(chi, fv1, nt[c], inv.w[c], y);
        let ft2 = if noft2 { 0.0 } else { coeffs.ft2(chi) };

        let production = coeffs.cb1 * (1.0 - ft2) * stilda * nt[c];
        let cross = coeffs.cb2 / coeffs.sigma_nut * grad_nt[c].length_squared();
        let destruction = (coeffs.cw1 * coeffs.fw(stilda, nt[c], y) - coeffs.cb1 * ft2 / sqr(coeffs.kappa))
            * nt[c]
            / sqr(y);
        (production, cross, destruction)
    });

    let production = terms.iter().map(|t| t.0).collect();
    let cross = terms.iter().map(|t| t.1).collect();
    let destruction = terms.iter().map(|t| t.2).collect();
    let d_eff = nt.iter().zip(nu).map(|(&n, &v)| coeffs.diffusivity(n, v)).collect();

    let mut solved = nu_tilda.clone();
    let report = TransportEquationBuilder::new(mesh, nu_tilda.name())
        .time(flow.time_scheme())
        .density(flow.rho)
        .convection(flow.phi)
        .diffusion(d_eff)
        .production(production)
        .production(cross)
        .destruction(destruction)
        .relaxation(base.relaxation_for(nu_tilda.name()))
        .floor(0.0)
        .solve(&mut solved, base.solver())?;
    Ok((solved, report))
}

/// Spalart-Allmaras 模型
pub struct SpalartAllmaras {
    base: ClosureBase,
    coeffs: SaCoeffs,
    noft2: bool,
    nu_tilda: ScalarField,
    nut: ScalarField,
    k: ScalarField,
    epsilon: ScalarField,
}

impl SpalartAllmaras {
    /// 标准模型
    pub fn new(
        props: &TurbulenceProperties,
        ctx: ModelContext,
        store: Option<&dyn FieldStore>,
    ) -> TcResult<Self> {
        Self::build("SpalartAllmaras", false, props, ctx, store)
    }

    /// 不含 ft2 的变体
    pub fn noft2(
        props: &TurbulenceProperties,
        ctx: ModelContext,
        store: Option<&dyn FieldStore>,
    ) -> TcResult<Self> {
        Self::build("SpalartAllmarasNoft2", true, props, ctx, store)
    }

    fn build(
        name: &'static str,
        noft2: bool,
        props: &TurbulenceProperties,
        ctx: ModelContext,
        store: Option<&dyn FieldStore>,
    ) -> TcResult<Self> {
        let mut base = ClosureBase::new(name, ctx, props);
        let coeffs = SaCoeffs::from_dict(base.coeffs_mut())?;
        let nu_tilda = base.initial_field(
            store,
            "nuTilda",
            UnitDim::KINEMATIC_VISCOSITY,
            3.0 * base.mean_nu(),
            Some(0.0),
        )?;
        let nut = base.calculated_field("nut", UnitDim::KINEMATIC_VISCOSITY, 0.0, Some(0.0));
        let k = base.calculated_field("k", UnitDim::K, 0.0, None);
        let epsilon = base.calculated_field("epsilon", UnitDim::EPSILON, 0.0, None);

        let mut model = Self {
            base,
            coeffs,
            noft2,
            nu_tilda,
            nut,
            k,
            epsilon,
        };
        model.correct_nut();
        model.base.mark_ready();
        Ok(model)
    }

    /// ν̃
    pub fn nu_tilda(&self) -> &ScalarField {
        &self.nu_tilda
    }

    /// 当前系数
    pub fn coeffs(&self) -> &SaCoeffs {
        &self.coeffs
    }

    fn correct_nut(&mut self) {
        let nu = self.base.nu();
        let coeffs = self.coeffs;
        for ((nut, &nt), &v) in self.nut.values_mut().iter_mut().zip(self.nu_tilda.values()).zip(nu) {
            *nut = coeffs.nut(nt, v);
        }
    }
}

impl ClosureModel for SpalartAllmaras {
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
        let result = solve_nu_tilda(
            &self.base,
            &self.coeffs,
            self.noft2,
            flow,
            &inv,
            self.base.y(),
            &self.nu_tilda,
        );
        let result = result.map(|(solved, report)| {
            self.nu_tilda = solved;
            self.correct_nut();
            vec![report]
        });
        self.base.end_correct(flow.time_index, result)
    }

    fn read(&mut self, props: &TurbulenceProperties) -> TcResult<bool> {
        let mut dict = props.coeffs.clone();
        let coeffs = SaCoeffs::from_dict(&mut dict)?;
        if !self.base.reread(props, dict)? {
            return Ok(false);
        }
        self.coeffs = coeffs;
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
        let d: Vec<f64> = self
            .nu_tilda
            .values()
            .iter()
            .zip(self.base.nu())
            .map(|(&n, &v)| self.coeffs.diffusivity(n, v))
            .collect();
        vec![self
            .base
            .derived_field("DnuTildaEff", UnitDim::KINEMATIC_VISCOSITY, &d)]
    }

    fn transported_fields(&self) -> Vec<&ScalarField> {
        vec![&self.nu_tilda]
    }

    fn mesh(&self) -> &dyn FvMesh {
        self.base.mesh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cw1() {
        let c = SaCoeffs::default();
        let expected = 0.1355 / (0.41 * 0.41) + 1.622 / 0.66666;
        assert!((c.cw1 - expected).abs() < 1e-12);
    }

    #[test]
    fn test_from_dict_fills_defaults() {
        let mut dict = CoeffDict::new();
        dict.insert("Cb1", 0.2);
        let c = SaCoeffs::from_dict(&mut dict).unwrap();
        assert_eq!(c.cb1, 0.2);
        assert!(dict.contains("Cv1"));
        assert!((c.cw1 - (0.2 / (0.41 * 0.41) + 1.622 / 0.66666)).abs() < 1e-12);
    }

    #[test]
    fn test_damping_functions() {
        let c = SaCoeffs::default();
        assert_eq!(c.fv1(0.0), 0.0);
        assert!((c.fv1(1e3) - 1.0).abs() < 1e-3);
        // χ = 0 时 fv2 = 1
        assert_eq!(c.fv2(0.0, 0.0), 1.0);
        // 负 ν̃ 按 0 处理
        assert_eq!(c.chi(-1.0, 1e-5), 0.0);
        assert_eq!(c.nut(-1.0, 1e-5), 0.0);
    }

    #[test]
    fn test_fw_limits() {
        let c = SaCoeffs::default();
        // r = 1 时 g = 1，fw = 1
        let y = 1.0;
        let stilda = 1.0 / sqr(c.kappa);
        assert!((c.fw(stilda, 1.0, y) - 1.0).abs() < 1e-12);
        // r 被截断在 10，fw 有界
        let fw_max = c.fw(SMALL, 1.0, y);
        assert!(fw_max.is_finite());
        assert!(fw_max < (1.0 + pow6(c.cw3)).powf(1.0 / 6.0) + 1e-9);
    }

    #[test]
    fn test_stilda_lower_bound() {
        let c = SaCoeffs::default();
        let chi = 3.0;
        let fv1 = c.fv1(chi);
        // fv2 < 0 时 S̃ 不低于 Cs Ω
        let s = c.stilda(chi, fv1, 3e-5, 2.0, 1e-3);
        assert!(s >= c.cs * 2.0 - 1e-15);
    }
}
