// crates/tc_turbulence/src/length_scale.rs

//! DES/DDES 混合长度尺度
//!
//! ```text
//! L_LES = C_DES · ∛max(V, V_min)
//! DES:  L = min(L_RANS, L_LES)
//! DDES: L = L_RANS - f_d · max(0, L_RANS - L_LES)
//! ```
//!
//! 选择器接收屏蔽系数 `shield = 1 - f_d`：边界层内 shield → 1，保持 RANS；
//! shield = 0 时退化为 DES 的 min 规则。
//!
//! LES 区域指示量 `(L_RANS - L)/(L_RANS - L_LES)` 在 `L_RANS > L_LES` 处取值，其余为 0。

use serde::{Deserialize, Serialize};
use tc_foundation::float::{bound_below, MIN_VOLUME};
use tc_fvm::FvMesh;

/// 长度尺度模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LengthScaleMode {
    /// 原始 DES
    #[default]
    Des,
    /// 延迟 DES
    Ddes,
}

impl LengthScaleMode {
    /// 由 DDES 开关得到模式
    pub fn from_ddes_switch(ddes: bool) -> Self {
        if ddes {
            Self::Ddes
        } else {
            Self::Des
        }
    }
}

/// 单元网格尺度 ∛max(V, V_min)
pub fn cube_root_delta(mesh: &dyn FvMesh) -> Vec<f64> {
    (0..mesh.n_cells())
        .map(|c| mesh.cell_volume(c).max(MIN_VOLUME).cbrt())
        .collect()
}

/// 一次修正得到的长度尺度
#[derive(Debug, Clone, PartialEq)]
pub struct LengthScales {
    /// RANS 长度尺度
    pub l_rans: Vec<f64>,
    /// LES 长度尺度
    pub l_les: Vec<f64>,
    /// 混合长度尺度
    pub l: Vec<f64>,
    /// LES 区域指示量
    pub les_region: Vec<f64>,
}

/// 长度尺度选择器
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthScaleSelector {
    mode: LengthScaleMode,
}

impl LengthScaleSelector {
    /// 创建选择器
    pub fn new(mode: LengthScaleMode) -> Self {
        Self { mode }
    }

    /// 模式
    pub fn mode(&self) -> LengthScaleMode {
        self.mode
    }

    /// 单点选择，`shield` 只在 DDES 下使用
    #[inline]
    pub fn select(&self, l_rans: f64, l_les: f64, shield: f64) -> f64 {
        match self.mode {
            LengthScaleMode::Des => l_rans.min(l_les),
            LengthScaleMode::Ddes => {
                let shield = if shield.is_finite() { shield.clamp(0.0, 1.0) } else { 0.0 };
                let fd = 1.0 - shield;
                l_rans - fd * bound_below(l_rans - l_les, 0.0)
            }
        }
    }

    /// LES 区域指示量
    #[inline]
    pub fn les_indicator(l_rans: f64, l_les: f64, l: f64) -> f64 {
        if l_rans > l_les {
            ((l_rans - l) / (l_rans - l_les)).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// 逐单元计算
    ///
    /// `c_des` 为每个单元的 C_DES（SST-DES 中随 F1 混合），
    /// `shield` 为 None 时不屏蔽。
    pub fn compute(
        &self,
        l_rans: Vec<f64>,
        c_des: &[f64],
        delta: &[f64],
        shield: Option<&[f64]>,
    ) -> LengthScales {
        let n = l_rans.len();
        let l_les: Vec<f64> = (0..n).map(|c| c_des[c] * delta[c]).collect();
        let l: Vec<f64> = (0..n)
            .map(|c| self.select(l_rans[c], l_les[c], shield.map_or(0.0, |s| s[c])))
            .collect();
        let les_region = (0..n)
            .map(|c| Self::les_indicator(l_rans[c], l_les[c], l[c]))
            .collect();
        LengthScales {
            l_rans,
            l_les,
            l,
            les_region,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_fvm::PolyMesh;

    #[test]
    fn test_ddes_limits() {
        let ddes = LengthScaleSelector::new(LengthScaleMode::Ddes);
        // 无屏蔽：min 规则
        assert!((ddes.select(1.0, 0.1, 0.0) - 0.1).abs() < 1e-15);
        // 完全屏蔽：恢复 RANS
        assert!((ddes.select(1.0, 0.1, 1.0) - 1.0).abs() < 1e-15);
        assert!((ddes.select(0.1, 1.0, 0.3) - 0.1).abs() < 1e-15);
        for i in 0..=10 {
            assert!(ddes.select(1.0, 0.1, i as f64 / 10.0) <= 1.0);
        }
    }

    #[test]
    fn test_des_is_min_and_bounded_by_rans() {
        let des = LengthScaleSelector::new(LengthScaleMode::Des);
        for (lr, ll) in [(1.0, 0.1), (0.1, 1.0), (0.5, 0.5)] {
            let l = des.select(lr, ll, 0.7);
            assert!(l <= lr);
            assert_eq!(l, f64::min(lr, ll));
        }
    }

    #[test]
    fn test_les_region() {
        assert_eq!(LengthScaleSelector::les_indicator(1.0, 0.1, 0.1), 1.0);
        assert_eq!(LengthScaleSelector::les_indicator(1.0, 0.1, 1.0), 0.0);
        assert_eq!(LengthScaleSelector::les_indicator(0.1, 1.0, 0.1), 0.0);
    }

    #[test]
    fn test_coarse_grid_recovers_rans() {
        let des = LengthScaleSelector::new(LengthScaleMode::Des);
        let scales = des.compute(vec![1e-3], &[0.65], &[1e-9], None);
        assert!(scales.l[0] <= 1e-3);
        assert_eq!(scales.les_region[0], 1.0);
        let coarse = des.compute(vec![1e-3], &[0.65], &[1.0], None);
        assert_eq!(coarse.l[0], 1e-3);
        assert_eq!(coarse.les_region[0], 0.0);
    }

    #[test]
    fn test_cube_root_delta() {
        let mesh = PolyMesh::structured([2, 2, 2], [2.0, 2.0, 2.0]).unwrap();
        for d in cube_root_delta(&mesh) {
            assert!((d - 1.0).abs() < 1e-12);
        }
    }
}
