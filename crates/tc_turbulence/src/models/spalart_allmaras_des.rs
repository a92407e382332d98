// crates/tc_turbulence/src/models/spalart_allmaras_des.rs

//! Spalart-Allmaras DES / DDES
//!
//! SA 方程中的壁面距离替换为混合长度 d̃：
//!
//! ```text
//! L_RANS = y,  L_LES = C_DES Δ
//! d̃ = LengthScaleSelector(L_RANS, L_LES, 1 - f_d)
//! k = (ν_t/(ck d̃))²,  ε = Cε k^{3/2}/d̃
//! ```
//!
//! DDES 屏蔽函数 `r_d = (ν_t + ν)/(max(|∇U|, ε) κ² y²)`，Cd1 = 8，Cd2 = 3。

use super::spalart_allmaras::{solve_nu_tilda, SaCoeffs};
use crate::blend::{BlendFunction, DdesShieldingArg};
use crate::closure::{
    coeff, switch, ClosureBase, ClosureModel, CorrectionReport, FlowState, ModelContext, ModelState,
};
use crate::invariants::FlowInvariants;
use crate::length_scale::{cube_root_delta, LengthScaleMode, LengthScaleSelector};
use tc_config::{CoeffDict, TurbulenceProperties};
use tc_foundation::float::{bound_below, sqr, SMALL};
use tc_foundation::{TcResult, UnitDim};
use tc_fvm::{FieldStore, FvMesh, ScalarField};

/// 耗散率系数 Cε
const C_EPSILON: f64 = 1.048;

/// DES 附加系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaDesCoeffs {
    /// C_DES
    pub c_des: f64,
    /// ck
    pub ck: f64,
    /// 是否启用 DDES
    pub ddes: bool,
    /// Cd1
    pub cd1: f64,
    /// Cd2
    pub cd2: f64,
}

impl SaDesCoeffs {
    /// 从字典读取
    pub fn from_dict(dict: &mut CoeffDict) -> TcResult<Self> {
        Ok(Self {
            c_des: coeff(dict, "CDES", 0.65)?,
            ck: coeff(dict, "ck", 0.07)?,
            ddes: switch(dict, "DDES", false)?,
            cd1: coeff(dict, "Cd1", 8.0)?,
            cd2: coeff(dict, "Cd2", 3.0)?,
        })
    }
}

/// SA-DES 模型
pub struct SpalartAllmarasDes {
    base: ClosureBase,
    coeffs: SaCoeffs,
    des: SaDesCoeffs,
    selector: LengthScaleSelector,
    delta: Vec<f64>,
    d_tilda: Vec<f64>,
    nu_tilda: ScalarField,
    nut: ScalarField,
    k: ScalarField,
    epsilon: ScalarField,
    les_region: ScalarField,
}

impl SpalartAllmarasDes {
    /// 创建模型
    pub fn new(
        props: &TurbulenceProperties,
        ctx: ModelContext,
        store: Option<&dyn FieldStore>,
    ) -> TcResult<Self> {
        let mut base = ClosureBase::new("SpalartAllmarasDES", ctx, props);
        let coeffs = SaCoeffs::from_dict(base.coeffs_mut())?;
        let des = SaDesCoeffs::from_dict(base.coeffs_mut())?;
        let nu_tilda = base.initial_field(
            store,
            "nuTilda",
            UnitDim::KINEMATIC_VISCOSITY,
            3.0 * base.mean_nu(),
            Some(0.0),
        )?;
        let delta = cube_root_delta(base.mesh());
        let d_tilda = base.y().to_vec();
        let nut = base.calculated_field("nut", UnitDim::KINEMATIC_VISCOSITY, 0.0, Some(0.0));
        let k = base.calculated_field("k", UnitDim::K, 0.0, None);
        let epsilon = base.calculated_field("epsilon", UnitDim::EPSILON, 0.0, None);
        let les_region = base.calculated_field("DESRegion", UnitDim::DIMENSIONLESS, 0.0, None);

        let mut model = Self {
            base,
            coeffs,
            selector: LengthScaleSelector::new(LengthScaleMode::from_ddes_switch(des.ddes)),
            des,
            delta,
            d_tilda,
            nu_tilda,
            nut,
            k,
            epsilon,
            les_region,
        };
        model.correct_outputs();
        model.base.mark_ready();
        Ok(model)
    }

    /// ν̃
    pub fn nu_tilda(&self) -> &ScalarField {
        &self.nu_tilda
    }

    /// 混合长度 d̃
    pub fn d_tilda(&self) -> &[f64] {
        &self.d_tilda
    }

    /// 长度尺度模式
    pub fn mode(&self) -> LengthScaleMode {
        self.selector.mode()
    }

    /// DDES 屏蔽系数 1 - f_d，DES 时为 None
    fn shielding(&self, inv: &FlowInvariants) -> Option<Vec<f64>> {
        if !self.des.ddes {
            return None;
        }
        let arg = DdesShieldingArg {
            nut: self.nut.values(),
            nu: self.base.nu(),
            mag_grad_u: &inv.mag_grad_u,
            y: self.base.y(),
            kappa: self.coeffs.kappa,
            cd1: self.des.cd1,
        };
        Some(BlendFunction::tanh(self.des.cd2).evaluate(&arg).values().to_vec())
    }

    fn correct_outputs(&mut self) {
        let nu = self.base.nu();
        let coeffs = self.coeffs;
        let ck = self.des.ck;
        let nt = self.nu_tilda.values();
        let nut = self.nut.values_mut();
        for c in 0..nt.len() {
            nut[c] = coeffs.nut(nt[c], nu[c]);
        }
        let k = self.k.values_mut();
        let epsilon = self.epsilon.values_mut();
        for c in 0..nt.len() {
            let d = bound_below(self.d_tilda[c], SMALL);
            k[c] = sqr(nut[c] / (ck * d));
            epsilon[c] = C_EPSILON * k[c].powf(1.5) / d;
        }
    }
}

impl ClosureModel for SpalartAllmarasDes {
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
        let shield = self.shielding(&inv);
        let c_des = vec![self.des.c_des; self.delta.len()];
        let scales = self
            .selector
            .compute(self.base.y().to_vec(), &c_des, &self.delta, shield.as_deref());

        let result = solve_nu_tilda(
            &self.base,
            &self.coeffs,
            false,
            flow,
            &inv,
            &scales.l,
            &self.nu_tilda,
        );
        let result = result.map(|(solved, report)| {
            self.nu_tilda = solved;
            self.d_tilda = scales.l;
            self.les_region.values_mut().copy_from_slice(&scales.les_region);
            self.correct_outputs();
            vec![report]
        });
        self.base.end_correct(flow.time_index, result)
    }

    fn read(&mut self, props: &TurbulenceProperties) -> TcResult<bool> {
        let mut dict = props.coeffs.clone();
        let coeffs = SaCoeffs::from_dict(&mut dict)?;
        let des = SaDesCoeffs::from_dict(&mut dict)?;
        if !self.base.reread(props, dict)? {
            return Ok(false);
        }
        self.coeffs = coeffs;
        self.des = des;
        self.selector = LengthScaleSelector::new(LengthScaleMode::from_ddes_switch(des.ddes));
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

    fn les_region(&self) -> Option<&ScalarField> {
        Some(&self.les_region)
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
    fn test_des_defaults() {
        let mut dict = CoeffDict::new();
        let des = SaDesCoeffs::from_dict(&mut dict).unwrap();
        assert_eq!(des.c_des, 0.65);
        assert_eq!(des.ck, 0.07);
        assert!(!des.ddes);
        assert_eq!(des.cd1, 8.0);
        assert_eq!(des.cd2, 3.0);
    }

    #[test]
    fn test_ddes_switch_from_string() {
        let mut dict = CoeffDict::from_json_str(r#"{"DDES": "on"}"#).unwrap();
        assert!(SaDesCoeffs::from_dict(&mut dict).unwrap().ddes);
    }
}
