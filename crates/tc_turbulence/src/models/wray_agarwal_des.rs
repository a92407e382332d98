// crates/tc_turbulence/src/models/wray_agarwal_des.rs

//! Wray-Agarwal DES / DDES
//!
//! 在 WA2017 的 R 方程上附加隐式耗散：
//!
//! ```text
//! L_RANS = √(R/S),  L_LES = C_DES Δ
//! L      = LengthScaleSelector(L_RANS, L_LES, 1 - f_d)
//! fdes2  = max((L_RANS/L)², 1)
//! 附加耗散系数 C1 S (fdes2 - 1)
//! ```

use super::wray_agarwal::{solve_rnu, wa_k_epsilon, WaCoeffs, F1_CAP};
use crate::blend::{BlendField, BlendFunction, DdesShieldingArg, WrayAgarwalArg};
use crate::closure::{
    coeff, switch, ClosureBase, ClosureModel, CorrectionReport, FlowState, ModelContext, ModelState,
};
use crate::invariants::FlowInvariants;
use crate::length_scale::{cube_root_delta, LengthScaleMode, LengthScaleSelector, LengthScales};
use tc_config::{CoeffDict, TurbulenceProperties};
use tc_foundation::float::{bound_below, sqr, SMALL};
use tc_foundation::{TcResult, UnitDim};
use tc_fvm::{FieldStore, FvMesh, ScalarField};

/// WA-DES 附加系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaDesCoeffs {
    /// C_DES
    pub c_des: f64,
    /// 是否启用 DDES
    pub ddes: bool,
    /// Cd1
    pub cd1: f64,
    /// Cd2
    pub cd2: f64,
}

impl WaDesCoeffs {
    /// 从字典读取
    pub fn from_dict(dict: &mut CoeffDict) -> TcResult<Self> {
        Ok(Self {
            c_des: coeff(dict, "CDES", 0.41)?,
            ddes: switch(dict, "DDES", false)?,
            cd1: coeff(dict, "Cd1", 8.0)?,
            cd2: coeff(dict, "Cd2", 3.0)?,
        })
    }
}

/// fdes2 = max((L_RANS/L)², 1)
#[inline]
pub fn fdes2(l_rans: f64, l: f64) -> f64 {
    sqr(l_rans / bound_below(l, SMALL)).max(1.0)
}

/// WA-DES 模型
pub struct WrayAgarwalDes {
    base: ClosureBase,
    coeffs: WaCoeffs,
    des: WaDesCoeffs,
    selector: LengthScaleSelector,
    delta: Vec<f64>,
    f1: BlendField,
    rnu: ScalarField,
    nut: ScalarField,
    k: ScalarField,
    epsilon: ScalarField,
    les_region: ScalarField,
}

impl WrayAgarwalDes {
    /// 创建模型
    pub fn new(
        props: &TurbulenceProperties,
        ctx: ModelContext,
        store: Option<&dyn FieldStore>,
    ) -> TcResult<Self> {
        let mut base = ClosureBase::new("WrayAgarwalDES", ctx, props);
        let coeffs = WaCoeffs::from_dict(base.coeffs_mut())?;
        let des = WaDesCoeffs::from_dict(base.coeffs_mut())?;
        let rnu = base.initial_field(
            store,
            "Rnu",
            UnitDim::KINEMATIC_VISCOSITY,
            3.0 * base.mean_nu(),
            Some(0.0),
        )?;
        let n_cells = base.mesh().n_cells();
        let delta = cube_root_delta(base.mesh());
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
            f1: BlendField::uniform(n_cells, 0.0),
            rnu,
            nut,
            k,
            epsilon,
            les_region,
        };
        model.correct_nut();
        model.base.mark_ready();
        Ok(model)
    }

    /// R_ν
    pub fn rnu(&self) -> &ScalarField {
        &self.rnu
    }

    /// 长度尺度模式
    pub fn mode(&self) -> LengthScaleMode {
        self.selector.mode()
    }

    fn length_scales(&self, inv: &FlowInvariants) -> LengthScales {
        let l_rans: Vec<f64> = self
            .rnu
            .values()
            .iter()
            .zip(&inv.s)
            .map(|(&r, &s)| (bound_below(r, 0.0) / s).sqrt())
            .collect();
        let shield = if self.des.ddes {
            let arg = DdesShieldingArg {
                nut: self.nut.values(),
                nu: self.base.nu(),
                mag_grad_u: &inv.mag_grad_u,
                y: self.base.y(),
                kappa: self.coeffs.kappa,
                cd1: self.des.cd1,
            };
            Some(BlendFunction::tanh(self.des.cd2).evaluate(&arg).values().to_vec())
        } else {
            None
        };
        let c_des = vec![self.des.c_des; self.delta.len()];
        self.selector.compute(l_rans, &c_des, &self.delta, shield.as_deref())
    }

    fn correct_nut(&mut self) {
        let nu = self.base.nu();
        let coeffs = self.coeffs;
        for ((nut, &r), &v) in self.nut.values_mut().iter_mut().zip(self.rnu.values()).zip(nu) {
            *nut = coeffs.nut(r, v);
        }
    }
}

impl ClosureModel for WrayAgarwalDes {
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
        let f1 = BlendFunction::tanh(4.0).with_cap(F1_CAP).evaluate(&WrayAgarwalArg {
            y: self.base.y(),
            rnu: self.rnu.values(),
            s: &inv.s,
            nu: self.base.nu(),
        });
        let scales = self.length_scales(&inv);
        let c1 = self.coeffs.c1_blender().blend_field(&f1);
        let extra: Vec<f64> = (0..c1.len())
            .map(|c| c1[c] * inv.s[c] * (fdes2(scales.l_rans[c], scales.l[c]) - 1.0))
            .collect();

        let result = solve_rnu(
            &self.base,
            &self.coeffs,
            None,
            &f1,
            flow,
            &inv,
            &self.rnu,
            Some(extra),
        );
        let result = result.map(|(solved, report)| {
            self.rnu = solved;
            self.f1 = f1;
            self.les_region.values_mut().copy_from_slice(&scales.les_region);
            self.correct_nut();
            wa_k_epsilon(self.nut.values(), &inv.s, self.k.values_mut(), self.epsilon.values_mut());
            vec![report]
        });
        self.base.end_correct(flow.time_index, result)
    }

    fn read(&mut self, props: &TurbulenceProperties) -> TcResult<bool> {
        let mut dict = props.coeffs.clone();
        let coeffs = WaCoeffs::from_dict(&mut dict)?;
        let des = WaDesCoeffs::from_dict(&mut dict)?;
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
        let sigma_r = self.coeffs.sigma_blender().blend_field(&self.f1);
        let d: Vec<f64> = (0..self.rnu.len())
            .map(|c| sigma_r[c] * bound_below(self.rnu.value(c), 0.0) + self.base.nu()[c])
            .collect();
        vec![self.base.derived_field("DRnuEff", UnitDim::KINEMATIC_VISCOSITY, &d)]
    }

    fn les_region(&self) -> Option<&ScalarField> {
        Some(&self.les_region)
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
    fn test_fdes2() {
        // RANS 区域 L = L_RANS
        assert_eq!(fdes2(1.0, 1.0), 1.0);
        // LES 区域放大耗散
        assert!((fdes2(1.0, 0.5) - 4.0).abs() < 1e-12);
        // 不小于 1
        assert_eq!(fdes2(0.1, 1.0), 1.0);
    }

    #[test]
    fn test_des_defaults() {
        let mut dict = CoeffDict::new();
        let des = WaDesCoeffs::from_dict(&mut dict).unwrap();
        assert_eq!(des.c_des, 0.41);
        assert!(!des.ddes);
        assert!(dict.contains("CDES"));
    }
}
