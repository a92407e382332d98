// crates/tc_turbulence/src/models/mod.rs

//! 湍流闭合模型
//!
//! | 标签 | 类型 | 输运变量 |
//! |------|------|----------|
//! | `SpalartAllmaras` | [`SpalartAllmaras`] | ν̃ |
//! | `SpalartAllmarasNoft2` | [`SpalartAllmaras`] | ν̃ |
//! | `SpalartAllmarasDES` | [`SpalartAllmarasDes`] | ν̃ |
//! | `WrayAgarwal2017` | [`WrayAgarwal`] | R_ν |
//! | `WrayAgarwal2018` | [`WrayAgarwal`] | R_ν |
//! | `WrayAgarwalWR2018` | [`WrayAgarwal`] | R_ν |
//! | `WrayAgarwalDES` | [`WrayAgarwalDes`] | R_ν |
//! | `kkl` | [`Kkl`] | k, kl |
//! | `kklARSM` | [`KklArsm`] | ν̃ |
//! | `kOmegaSSTDES` | [`KOmegaSstDes`] | k, ω |
//!
//! 通过 [`new_model`] 按配置中的 `model` 标签创建。

pub mod kkl;
pub mod kkl_arsm;
pub mod spalart_allmaras;
pub mod spalart_allmaras_des;
pub mod sst_des;
pub mod wray_agarwal;
pub mod wray_agarwal_des;

pub use kkl::{Kkl, KklCoeffs};
pub use kkl_arsm::{KklArsm, KklArsmCoeffs};
pub use spalart_allmaras::{SaCoeffs, SpalartAllmaras};
pub use spalart_allmaras_des::{SaDesCoeffs, SpalartAllmarasDes};
pub use sst_des::{KOmegaSstDes, SstDesCoeffs};
pub use wray_agarwal::{WaCoeffs, WaVariant, WrayAgarwal};
pub use wray_agarwal_des::{WaDesCoeffs, WrayAgarwalDes};

use crate::closure::{ClosureModel, ModelContext};
use std::fmt;
use std::str::FromStr;
use tc_config::TurbulenceProperties;
use tc_foundation::{TcError, TcResult};
use tc_fvm::FieldStore;

/// 模型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Spalart-Allmaras
    SpalartAllmaras,
    /// 不含 ft2 的 Spalart-Allmaras
    SpalartAllmarasNoft2,
    /// SA-DES / DDES
    SpalartAllmarasDes,
    /// Wray-Agarwal 2017
    WrayAgarwal2017,
    /// Wray-Agarwal 2018
    WrayAgarwal2018,
    /// 无壁面距离的 Wray-Agarwal
    WrayAgarwalWr2018,
    /// WA-DES / DDES
    WrayAgarwalDes,
    /// k-kl
    Kkl,
    /// k-kl-ARSM
    KklArsm,
    /// k-ω SST DES / DDES
    KOmegaSstDes,
}

impl ModelKind {
    /// 全部模型
    pub const ALL: [ModelKind; 10] = [
        Self::SpalartAllmaras,
        Self::SpalartAllmarasNoft2,
        Self::SpalartAllmarasDes,
        Self::WrayAgarwal2017,
        Self::WrayAgarwal2018,
        Self::WrayAgarwalWr2018,
        Self::WrayAgarwalDes,
        Self::Kkl,
        Self::KklArsm,
        Self::KOmegaSstDes,
    ];

    /// 配置中的标签
    pub fn tag(self) -> &'static str {
        match self {
            Self::SpalartAllmaras => "SpalartAllmaras",
            Self::SpalartAllmarasNoft2 => "SpalartAllmarasNoft2",
            Self::SpalartAllmarasDes => "SpalartAllmarasDES",
            Self::WrayAgarwal2017 => WaVariant::Wa2017.tag(),
            Self::WrayAgarwal2018 => WaVariant::Wa2018.tag(),
            Self::WrayAgarwalWr2018 => WaVariant::Wr2018.tag(),
            Self::WrayAgarwalDes => "WrayAgarwalDES",
            Self::Kkl => "kkl",
            Self::KklArsm => "kklARSM",
            Self::KOmegaSstDes => "kOmegaSSTDES",
        }
    }

    /// 全部可用标签
    pub fn available() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.tag()).collect()
    }

    /// 是否为 RANS/LES 混合模型
    pub fn is_hybrid(self) -> bool {
        matches!(
            self,
            Self::SpalartAllmarasDes | Self::WrayAgarwalDes | Self::KOmegaSstDes
        )
    }

    /// 按种类创建模型
    pub fn create(
        self,
        props: &TurbulenceProperties,
        ctx: ModelContext,
        store: Option<&dyn FieldStore>,
    ) -> TcResult<Box<dyn ClosureModel>> {
        let model: Box<dyn ClosureModel> = match self {
            Self::SpalartAllmaras => Box::new(SpalartAllmaras::new(props, ctx, store)?),
            Self::SpalartAllmarasNoft2 => Box::new(SpalartAllmaras::noft2(props, ctx, store)?),
            Self::SpalartAllmarasDes => Box::new(SpalartAllmarasDes::new(props, ctx, store)?),
            Self::WrayAgarwal2017 => Box::new(WrayAgarwal::new(WaVariant::Wa2017, props, ctx, store)?),
            Self::WrayAgarwal2018 => Box::new(WrayAgarwal::new(WaVariant::Wa2018, props, ctx, store)?),
            Self::WrayAgarwalWr2018 => Box::new(WrayAgarwal::new(WaVariant::Wr2018, props, ctx, store)?),
            Self::WrayAgarwalDes => Box::new(WrayAgarwalDes::new(props, ctx, store)?),
            Self::Kkl => Box::new(Kkl::new(props, ctx, store)?),
            Self::KklArsm => Box::new(KklArsm::new(props, ctx, store)?),
            Self::KOmegaSstDes => Box::new(KOmegaSstDes::new(props, ctx, store)?),
        };
        Ok(model)
    }
}

impl FromStr for ModelKind {
    type Err = TcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.tag() == name)
            .ok_or_else(|| TcError::unknown_model(name, &Self::available()))
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// 按配置创建模型
///
/// 先校验配置，再按 `model` 标签分派；未知标签返回 [`TcError::UnknownModel`]。
pub fn new_model(
    props: &TurbulenceProperties,
    ctx: ModelContext,
    store: Option<&dyn FieldStore>,
) -> TcResult<Box<dyn ClosureModel>> {
    props.validate()?;
    let kind: ModelKind = props.model.parse()?;
    log::info!("选择湍流模型 {kind}");
    kind.create(props, ctx, store)
}
