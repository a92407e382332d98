// crates/tc_turbulence/src/models/kkl_arsm.rs

//! k-kl-ARSM 一方程模型
//!
//! 由 k-kl 模型在代数应力假设下化简得到的 ν̃ 单方程，ν_t = ν̃。
//! 各向异性参数 al 取 1，其梯度与拉普拉斯项均为零。
//!
//! ```text
//! ka    = ν̃ S/a1
//! len   = √(ν̃/S)
//! G     = min(ν̃ G/ν - ⅔ ∇·U ka, 20 ν̃ S²)
//! lvk   = max(len/C11, min(C12 κ y fp, κ S/U''))
//! Cφ1   = η1 - η2 (len/lvk)²
//! E1e   = C3 Ebb tanh(Eke/(C3 Ebb))
//!
//! ∂ν̃/∂t + ∇·(Uν̃) - ∇·((pk ν̃ + ν)∇ν̃) =
//!       a1 (Cφ1 - 0.5) G/S
//!     + (0.5 a1 - a1^-2.5 Cφ2) S ν̃
//!     - f1 fφ ν/y² ν̃
//!     + pl 0.5 (∇ν̃·∇S)/S ν̃
//!     + ph 0.75 |∇ν̃|²
//!     - pf 0.25 E1e
//! ```

use super::kkl::{fphi, velocity_second_derivative};
use crate::closure::{coeff, ClosureBase, ClosureModel, CorrectionReport, FlowState, ModelContext, ModelState};
use crate::invariants::FlowInvariants;
use crate::transport::{EquationReport, TransportEquationBuilder};
use serde::{Deserialize, Serialize};
use tc_config::{CoeffDict, TurbulenceProperties};
use tc_foundation::float::{bound_below, sqr, ARG_FLOOR, SMALL};
use tc_foundation::{TcResult, UnitDim};
use tc_fvm::{fvc, FieldStore, FvMesh, ScalarField};

/// Ebb 下限
const EBB_MIN: f64 = 1e-15;

/// k-kl-ARSM 系数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KklArsmCoeffs {
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
    /// C3
    pub c3: f64,
    /// a1
    pub a1: f64,
    /// 梯度交叉项开关系数
    pub pl: f64,
    /// 扩散项系数
    pub pk: f64,
    /// |∇ν̃|² 项系数
    pub ph: f64,
    /// E1e 项系数
    pub pf: f64,
}

impl Default for KklArsmCoeffs {
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
            c3: 7.0,
            a1: 0.3,
            pl: 1.0,
            pk: 1.0,
            ph: 1.0,
            pf: 1.0,
        }
    }
}

impl KklArsmCoeffs {
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
            c3: coeff(dict, "C3", d.c3)?,
            a1: coeff(dict, "a1", d.a1)?,
            pl: coeff(dict, "pl", d.pl)?,
            pk: coeff(dict, "pk", d.pk)?,
            ph: coeff(dict, "ph", d.ph)?,
            pf: coeff(dict, "pf", d.pf)?,
        })
    }

    /// ka = ν̃ S/a1
    #[inline]
    pub fn ka(&self, nu_tilda: f64, s: f64) -> f64 {
        bound_below(nu_tilda, 0.0) * s / self.a1
    }

    /// E1e = C3 Ebb tanh(Eke/(C3 Ebb))
    #[inline]
    pub fn e1e(&self, eke: f64, ebb: f64) -> f64 {
        let scale = self.c3 * bound_below(ebb, EBB_MIN);
        scale * (eke / scale).tanh()
    }

    /// 近壁线性源项系数 -f1 fφ(ep) ν/y²
    ///
    /// 恒为汇项，远离壁面（ep → ∞）时趋于零。
    #[inline]
    pub fn wall_coefficient(&self, nu: f64, y: f64, ep: f64) -> f64 {
        -self.f1 * fphi(self.cd1, ep) * nu / sqr(bound_below(y, SMALL))
    }

    /// 有效扩散系数 pk ν̃ + ν
    #[inline]
    pub fn diffusivity(&self, nu_tilda: f64, nu: f64) -> f64 {
        self.pk * bound_below(nu_tilda, 0.0) + nu
    }
}

/// 单元源项
#[derive(Debug, Clone, Copy, Default)]
struct CellSources {
    g_term: f64,
    s_term: f64,
    wall_term: f64,
    cross: f64,
    production: f64,
    sink: f64,
}

/// k-kl-ARSM 模型
pub struct KklArsm {
    base: ClosureBase,
    coeffs: KklArsmCoeffs,
    nu_tilda: ScalarField,
    nut: ScalarField,
    k: ScalarField,
    epsilon: ScalarField,
}

impl KklArsm {
    /// 创建模型
    pub fn new(
        props: &TurbulenceProperties,
        ctx: ModelContext,
        store: Option<&dyn FieldStore>,
    ) -> TcResult<Self> {
        let mut base = ClosureBase::new("kklARSM", ctx, props);
        let coeffs = KklArsmCoeffs::from_dict(base.coeffs_mut())?;
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
            nu_tilda,
            nut,
            k,
            epsilon,
        };
        let n = model.nu_tilda.len();
        model.correct_outputs(&vec![SMALL; n]);
        model.base.mark_ready();
        Ok(model)
    }

    /// ν̃
    pub fn nu_tilda(&self) -> &ScalarField {
        &self.nu_tilda
    }

    fn correct_outputs(&mut self, s: &[f64]) {
        let coeffs = self.coeffs;
        let nt = self.nu_tilda.values();
        let nut = self.nut.values_mut();
        let k = self.k.values_mut();
        let epsilon = self.epsilon.values_mut();
        for c in 0..nt.len() {
            let v = bound_below(nt[c], 0.0);
            nut[c] = v;
            k[c] = coeffs.ka(v, s[c]);
            epsilon[c] = v * sqr(s[c]);
        }
    }

    fn solve(&self, flow: &FlowState<'_>, inv: &FlowInvariants) -> TcResult<(ScalarField, EquationReport)> {
        let mesh = self.base.mesh();
        let c = self.coeffs;
        let nu = self.base.nu();
        let y = self.base.y();
        let nt = self.nu_tilda.values();
        let u2 = velocity_second_derivative(mesh, flow.velocity);
        let grad_nt = fvc::grad(mesh, &self.nu_tilda);
        let grad_s = fvc::grad_values(mesh, &inv.s);

        let sources: Vec<CellSources> = fvc::cell_map(mesh.n_cells(), |i| {
            let s = inv.s[i];
            let s2 = sqr(s);
            let v = bound_below(nt[i], 0.0);
            let yi = bound_below(y[i], SMALL);

            let ka = c.ka(v, s);
            let len = (v / s).sqrt();
            let lvk_min = len / c.c11;
            let ep = yi * (0.3 * ka).sqrt() / (20.0 * nu[i]);

            let gp = v * inv.g_by_nu[i];
            let g = (gp - 2.0 / 3.0 * inv.div_u[i] * ka).min(20.0 * v * s2);
            let fp = (g / bound_below(v * s2, ARG_FLOOR)).clamp(0.5, 1.0);
            let lvk = lvk_min.max((c.c12 * c.kappa * yi * fp).min(c.kappa * s / u2[i]));
            let cphi1 = c.eta1 - c.eta2 * sqr(len / bound_below(lvk, SMALL));

            let eke = sqr(v) * grad_s[i].length_squared() / s2;
            let ebb = grad_nt[i].length_squared();

            CellSources {
                g_term: c.a1 * (cphi1 - 0.5) * g / (s * bound_below(v, SMALL)),
                s_term: (0.5 * c.a1 - c.a1.powf(-2.5) * c.cphi2) * s,
                wall_term: c.wall_coefficient(nu[i], yi, ep),
                cross: c.pl * 0.5 * grad_nt[i].dot(grad_s[i]) / s,
                production: c.ph * 0.75 * ebb,
                sink: c.pf * 0.25 * c.e1e(eke, ebb),
            }
        });

        let d_eff = nt.iter().zip(nu).map(|(&v, &n)| c.diffusivity(v, n)).collect();
        let mut solved = self.nu_tilda.clone();
        let report = TransportEquationBuilder::new(mesh, "nuTilda")
            .time(flow.time_scheme())
            .density(flow.rho)
            .convection(flow.phi)
            .diffusion(d_eff)
            .linear_source(sources.iter().map(|t| t.g_term).collect())
            .linear_source(sources.iter().map(|t| t.s_term).collect())
            .linear_source(sources.iter().map(|t| t.wall_term).collect())
            .linear_source(sources.iter().map(|t| t.cross).collect())
            .production(sources.iter().map(|t| t.production).collect())
            .sink(sources.iter().map(|t| t.sink).collect())
            .relaxation(self.base.relaxation_for("nuTilda"))
            .floor(0.0)
            .solve(&mut solved, self.base.solver())?;
        Ok((solved, report))
    }
}

impl ClosureModel for KklArsm {
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
        let result = self.solve(flow, &inv).map(|(solved, report)| {
            self.nu_tilda = solved;
            self.correct_outputs(&inv.s);
            vec![report]
        });
        self.base.end_correct(flow.time_index, result)
    }

    fn read(&mut self, props: &TurbulenceProperties) -> TcResult<bool> {
        let mut dict = props.coeffs.clone();
        let coeffs = KklArsmCoeffs::from_dict(&mut dict)?;
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
            .map(|(&v, &n)| self.coeffs.diffusivity(v, n))
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
    fn test_coefficients_skip_unused_entries() {
        let mut dict = CoeffDict::new();
        let c = KklArsmCoeffs::from_dict(&mut dict).unwrap();
        assert_eq!(c.a1, 0.3);
        assert_eq!(c.cphi2, c.eta3);
        assert!(!dict.contains("sigmak"));
        assert!(!dict.contains("sigmaphi"));
        assert!(dict.contains("C3"));
    }

    #[test]
    fn test_e1e_saturates() {
        let c = KklArsmCoeffs::default();
        // Eke ≪ C3 Ebb 时 E1e ≈ Eke
        assert!((c.e1e(1e-6, 1.0) - 1e-6).abs() < 1e-12);
        // Eke ≫ C3 Ebb 时 E1e → C3 Ebb
        assert!((c.e1e(1e6, 1.0) - 7.0).abs() < 1e-9);
        // Ebb 截断
        assert!(c.e1e(1.0, 0.0).is_finite());
    }

    #[test]
    fn test_ka() {
        let c = KklArsmCoeffs::default();
        assert!((c.ka(3e-4, 2.0) - 2e-3).abs() < 1e-15);
        assert_eq!(c.ka(-1.0, 2.0), 0.0);
    }

    #[test]
    fn test_wall_coefficient_is_sink() {
        let c = KklArsmCoeffs::default();
        let (nu, y) = (1e-5, 0.01);

        // 壁面处 fφ = 1
        let at_wall = c.wall_coefficient(nu, y, 0.0);
        assert!((at_wall + 6.0 * nu / (y * y)).abs() < 1e-12);

        // 远离壁面时趋于零，且不变号
        let far = c.wall_coefficient(nu, y, 1e6);
        assert!(far <= 0.0);
        assert!(far.abs() < 1e-12 * at_wall.abs());

        for ep in [1e-3, 0.1, 0.5, 1.0, 2.0, 10.0, 100.0] {
            assert!(c.wall_coefficient(nu, y, ep) <= 0.0, "ep = {ep}");
        }
    }
}
