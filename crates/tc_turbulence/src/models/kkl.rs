// crates/tc_turbulence/src/models/kkl.rs

//! k-kl 两方程模型
//!
//! 以湍动能 k 与积分长度尺度乘积 kl 为变量，von Kármán 长度尺度
//! 进入 kl 方程的产生项系数：
//!
//! ```text
//! ν_t  = Cμ^¼ kl/√k
//! Pk   = ν_t G/ν
//! L    = kl/k
//! L_vK = max(L/C11, min(C12 κ y fp, κ S/U''))
//! Cφ1  = η1 - η2 (L/L_vK)²
//!
//! k:  ... = Pk - [Cμ^¾ k^{3/2}/kl + 2ν/y²] k
//! kl: ... = Cφ1 Pk/k · kl - [Cφ2 k^{3/2}/kl + f1 ν fφ/y²] kl
//! ```
//!
//! 两个方程的源项都由修正开始时的旧值计算。
//!
//! # 参考文献
//!
//! - Abdol-Hamid, K.S. (2013). Assessments of k-kL turbulence model based on
//!   Menter's modification to Rotta's two-equation model. AIAA 2013-0632.

use crate::closure::{coeff, ClosureBase, ClosureModel, CorrectionReport, FlowState, ModelContext, ModelState};
use crate::invariants::FlowInvariants;
use crate::transport::{EquationReport, TransportEquationBuilder};
use serde::{Deserialize, Serialize};
use tc_config::{CoeffDict, TurbulenceProperties};
use tc_foundation::float::{bound_below, pow4, sqr, SMALL};
use tc_foundation::{TcResult, UnitDim};
use tc_fvm::{fvc, FieldStore, FvMesh, ScalarField, VectorField};

/// U'' = |∇²U|，按 [`SMALL`] 截断
pub(crate) fn velocity_second_derivative(mesh: &dyn FvMesh, velocity: &VectorField) -> Vec<f64> {
    fvc::laplacian_vector(mesh, velocity)
        .into_iter()
        .map(|l| bound_below(l.length(), SMALL))
        .collect()
}

/// 近壁阻尼 fφ = (1 + Cd1 ξ)/(1 + ξ⁴)
#[inline]
pub(crate) fn fphi(cd1: f64, xi: f64) -> f64 {
    (1.0 + cd1 * xi) / (1.0 + pow4(xi))
}

/// k-kl 模型系数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KklCoeffs {
    /// κ
    pub kappa: f64,
    /// η1
    pub eta1: f64,
    /// η2
    pub eta2: f64,
    /// η3
    pub eta3: f64,
    /// Cφ2，默认等于 η3
    pub cphi2: f64,
    /// f1
    pub f1: f64,
    /// C11
    pub c11: f64,
    /// C12
    pub c12: f64,
    /// Cd1
    pub cd1: f64,
    /// Cμ
    pub cmu: f64,
    /// σk
    pub sigmak: f64,
    /// σφ
    pub sigmaphi: f64,
    /// k 下限
    pub k_min: f64,
    /// kl 下限
    pub kl_min: f64,
}

impl Default for KklCoeffs {
    fn default() -> Self {
        Self {
            kappa: 0.41,
            eta1: 1.2,
            eta2: 0.97,
            eta3: 0.13,
            cphi2: 0.13,
            f1: 6.0,
            c11: 10.0,
            c12: 1.3,
            cd1: 4.7,
            cmu: 0.09,
            sigmak: 1.0,
            sigmaphi: 1.0,
            k_min: 1e-15,
            kl_min: 1e-15,
        }
    }
}

impl KklCoeffs {
    /// 从字典读取，缺省项写回字典
    pub fn from_dict(dict: &mut CoeffDict) -> TcResult<Self> {
        let d = Self::default();
        let eta3 = coeff(dict, "eta3", d.eta3)?;
        Ok(Self {
            kappa: coeff(dict, "kappa", d.kappa)?,
            eta1: coeff(dict, "eta1", d.eta1)?,
            eta2: coeff(dict, "eta2", d.eta2)?,
            eta3,
            cphi2: coeff(dict, "Cphi2", eta3)?,
            f1: coeff(dict, "f1", d.f1)?,
            c11: coeff(dict, "C11", d.c11)?,
            c12: coeff(dict, "C12", d.c12)?,
            cd1: coeff(dict, "Cd1", d.cd1)?,
            cmu: coeff(dict, "Cmu", d.cmu)?,
            sigmak: coeff(dict, "sigmak", d.sigmak)?,
            sigmaphi: coeff(dict, "sigmaphi", d.sigmaphi)?,
            k_min: coeff(dict, "kMin", d.k_min)?,
            kl_min: coeff(dict, "klMin", d.kl_min)?,
        })
    }

    /// ν_t = Cμ^¼ kl/√k
    #[inline]
    pub fn nut(&self, k: f64, kl: f64) -> f64 {
        self.cmu.powf(0.25) * bound_below(kl, 0.0) / bound_below(k, self.k_min).sqrt()
    }

    /// ε = Cμ^¾ k^{5/2}/kl
    #[inline]
    pub fn epsilon(&self, k: f64, kl: f64) -> f64 {
        self.cmu.powf(0.75) * bound_below(k, 0.0).powf(2.5) / bound_below(kl, self.kl_min)
    }

    /// Cφ1 = η1 - η2 (L/L_vK)²
    #[inline]
    pub fn cphi1(&self, l: f64, l_vk: f64) -> f64 {
        self.eta1 - self.eta2 * sqr(l / bound_below(l_vk, SMALL))
    }
}

/// k-kl 模型
pub struct Kkl {
    base: ClosureBase,
    coeffs: KklCoeffs,
    k: ScalarField,
    kl: ScalarField,
    nut: ScalarField,
    epsilon: ScalarField,
}

impl Kkl {
    /// 创建模型
    pub fn new(
        props: &TurbulenceProperties,
        ctx: ModelContext,
        store: Option<&dyn FieldStore>,
    ) -> TcResult<Self> {
        let mut base = ClosureBase::new("kkl", ctx, props);
        let coeffs = KklCoeffs::from_dict(base.coeffs_mut())?;
        let k = base.initial_field(store, "k", UnitDim::K, 1e-4, Some(0.0))?;
        let kl = base.initial_field(store, "kl", UnitDim::K_LENGTH, 1e-6, Some(0.0))?;
        let nut = base.calculated_field("nut", UnitDim::KINEMATIC_VISCOSITY, 0.0, Some(0.0));
        let epsilon = base.calculated_field("epsilon", UnitDim::EPSILON, 0.0, None);

        let mut model = Self {
            base,
            coeffs,
            k,
            kl,
            nut,
            epsilon,
        };
        model.correct_outputs();
        model.base.mark_ready();
        Ok(model)
    }

    /// kl
    pub fn kl(&self) -> &ScalarField {
        &self.kl
    }

    fn correct_outputs(&mut self) {
        let coeffs = self.coeffs;
        let k = self.k.values();
        let kl = self.kl.values();
        let nut = self.nut.values_mut();
        let epsilon = self.epsilon.values_mut();
        for c in 0..k.len() {
            nut[c] = coeffs.nut(k[c], kl[c]);
            epsilon[c] = coeffs.epsilon(k[c], kl[c]);
        }
    }

    fn diffusivities(&self) -> (Vec<f64>, Vec<f64>) {
        let nu = self.base.nu();
        let nut = self.nut.values();
        let dk = (0..nu.len()).map(|c| nu[c] + self.coeffs.sigmak * nut[c]).collect();
        let dkl = (0..nu.len()).map(|c| nu[c] + self.coeffs.sigmaphi * nut[c]).collect();
        (dk, dkl)
    }

    fn solve(&self, flow: &FlowState<'_>) -> TcResult<(ScalarField, ScalarField, Vec<EquationReport>)> {
        let mesh = self.base.mesh();
        let c = self.coeffs;
        let nu = self.base.nu();
        let y = self.base.y();
        let inv = FlowInvariants::compute(mesh, flow.velocity);
        let u2 = velocity_second_derivative(mesh, flow.velocity);
        let k = self.k.values();
        let kl = self.kl.values();
        let nut = self.nut.values();
        let cmu34 = c.cmu.powf(0.75);

        // (Pk, k 耗散系数, kl 线性源系数, kl 耗散系数)
        let terms: Vec<(f64, f64, f64, f64)> = fvc::cell_map(mesh.n_cells(), |i| {
            let ki = bound_below(k[i], c.k_min);
            let kli = bound_below(kl[i], c.kl_min);
            let yi = bound_below(y[i], SMALL);
            let pk = nut[i] * inv.g_by_nu[i];
            let eps = c.epsilon(ki, kli);
            let l = kli / ki;
            let fp = (pk / bound_below(eps, SMALL)).clamp(0.5, 1.0);
            let l_vk = (l / c.c11).max((c.c12 * c.kappa * yi * fp).min(c.kappa * inv.s[i] / u2[i]));
            let cphi1 = c.cphi1(l, l_vk);

            let k_dest = cmu34 * ki.powf(1.5) / kli + 2.0 * nu[i] / sqr(yi);
            let xi = (0.3 * ki).sqrt() * yi / (20.0 * nu[i]);
            let kl_linear = cphi1 * pk / ki;
            let kl_dest = c.cphi2 * ki.powf(1.5) / kli + c.f1 * nu[i] * fphi(c.cd1, xi) / sqr(yi);
            (pk, k_dest, kl_linear, kl_dest)
        });

        let (dk, dkl) = self.diffusivities();
        let relax_k = self.base.relaxation_for("k");
        let relax_kl = self.base.relaxation_for("kl");

        let mut k_new = self.k.clone();
        let k_report = TransportEquationBuilder::new(mesh, "k")
            .time(flow.time_scheme())
            .density(flow.rho)
            .convection(flow.phi)
            .diffusion(dk)
            .production(terms.iter().map(|t| t.0).collect())
            .destruction(terms.iter().map(|t| t.1).collect())
            .relaxation(relax_k)
            .floor(c.k_min)
            .solve(&mut k_new, self.base.solver())?;

        let mut kl_new = self.kl.clone();
        let kl_report = TransportEquationBuilder::new(mesh, "kl")
            .time(flow.time_scheme())
            .density(flow.rho)
            .convection(flow.phi)
            .diffusion(dkl)
            .linear_source(terms.iter().map(|t| t.2).collect())
            .destruction(terms.iter().map(|t| t.3).collect())
            .relaxation(relax_kl)
            .floor(c.kl_min)
            .solve(&mut kl_new, self.base.solver())?;

        Ok((k_new, kl_new, vec![k_report, kl_report]))
    }
}

impl ClosureModel for Kkl {
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
        let result = self.solve(flow).map(|(k, kl, reports)| {
            self.k = k;
            self.kl = kl;
            self.correct_outputs();
            reports
        });
        self.base.end_correct(flow.time_index, result)
    }

    fn read(&mut self, props: &TurbulenceProperties) -> TcResult<bool> {
        let mut dict = props.coeffs.clone();
        let coeffs = KklCoeffs::from_dict(&mut dict)?;
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
        let (dk, dkl) = self.diffusivities();
        vec![
            self.base.derived_field("DkEff", UnitDim::KINEMATIC_VISCOSITY, &dk),
            self.base.derived_field("DklEff", UnitDim::KINEMATIC_VISCOSITY, &dkl),
        ]
    }

    fn transported_fields(&self) -> Vec<&ScalarField> {
        vec![&self.k, &self.kl]
    }

    fn mesh(&self) -> &dyn FvMesh {
        self.base.mesh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cphi2_defaults_to_eta3() {
        let mut dict = CoeffDict::from_json_str(r#"{"eta3": 0.2}"#).unwrap();
        let c = KklCoeffs::from_dict(&mut dict).unwrap();
        assert_eq!(c.cphi2, 0.2);
        let mut dict = CoeffDict::from_json_str(r#"{"eta3": 0.2, "Cphi2": 0.3}"#).unwrap();
        assert_eq!(KklCoeffs::from_dict(&mut dict).unwrap().cphi2, 0.3);
    }

    #[test]
    fn test_nut_and_epsilon_consistency() {
        // ε = Cμ k²/ν_t
        let c = KklCoeffs::default();
        let (k, kl) = (0.5, 0.02);
        let nut = c.nut(k, kl);
        let eps = c.epsilon(k, kl);
        assert!((eps - c.cmu * k * k / nut).abs() < 1e-12);
    }

    #[test]
    fn test_fphi_limits() {
        assert_eq!(fphi(4.7, 0.0), 1.0);
        assert!(fphi(4.7, 100.0) < 1e-3);
    }

    #[test]
    fn test_cphi1_at_von_karman_scale() {
        let c = KklCoeffs::default();
        assert!((c.cphi1(1.0, 1.0) - (1.2 - 0.97)).abs() < 1e-12);
        assert!((c.cphi1(0.0, 1.0) - 1.2).abs() < 1e-12);
    }
}
