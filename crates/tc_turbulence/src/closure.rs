// crates/tc_turbulence/src/closure.rs

//! 湍流闭合模型接口
//!
//! 宿主每个外迭代调用一次 [`ClosureModel::correct`]，之后通过
//! [`nut`](ClosureModel::nut)、[`k`](ClosureModel::k) 等读取结果。
//!
//! # 状态
//!
//! ```text
//! Uninitialized → Ready → Correcting → Ready → …
//! ```
//!
//! - 湍流关闭时 `correct` 直接返回，不触碰任何场
//! - 同一时间步索引重复调用返回 [`TcError::AlreadyCorrected`]，不修改任何场
//!
//! 网格、壁面距离与分子粘度通过 [`ModelContext`] 注入，速度、通量、
//! 密度在一次 `correct` 内以只读借用的形式由 [`FlowState`] 提供。

use crate::transport::{EquationReport, TimeScheme};
use std::sync::Arc;
use tc_config::{CoeffDict, LinearSolverConfig, TurbulenceProperties};
use tc_foundation::{TcError, TcResult, UnitDim};
use tc_fvm::io::read_if_present;
use tc_fvm::{BoundaryCondition, FieldStore, FvMesh, ScalarField, VectorField, WallDistance};

// ============================================================
// 外部输入
// ============================================================

/// 一次修正所需的流场
#[derive(Clone, Copy)]
pub struct FlowState<'a> {
    /// 速度场
    pub velocity: &'a VectorField,
    /// 面通量（可压时为质量通量）
    pub phi: &'a [f64],
    /// 密度，`None` 为不可压
    pub rho: Option<&'a [f64]>,
    /// 时间步索引
    pub time_index: u64,
    /// 时间步长，`None` 为稳态
    pub dt: Option<f64>,
    /// 宿主是否要求修正湍流
    pub correct_turbulence: bool,
}

impl<'a> FlowState<'a> {
    /// 不可压稳态流场
    pub fn new(velocity: &'a VectorField, phi: &'a [f64], time_index: u64) -> Self {
        Self {
            velocity,
            phi,
            rho: None,
            time_index,
            dt: None,
            correct_turbulence: true,
        }
    }

    /// 设置密度
    pub fn with_density(mut self, rho: &'a [f64]) -> Self {
        self.rho = Some(rho);
        self
    }

    /// 设置时间步长
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }

    /// 设置是否修正湍流
    pub fn with_correction(mut self, enabled: bool) -> Self {
        self.correct_turbulence = enabled;
        self
    }

    /// 时间格式
    pub fn time_scheme(&self) -> TimeScheme {
        TimeScheme::from_dt(self.dt)
    }
}

/// 注入的外部依赖
#[derive(Clone)]
pub struct ModelContext {
    mesh: Arc<dyn FvMesh>,
    wall: Arc<WallDistance>,
    nu: ScalarField,
}

impl ModelContext {
    /// 创建上下文，校验尺寸与 ν 的量纲
    pub fn new(mesh: Arc<dyn FvMesh>, wall: Arc<WallDistance>, nu: ScalarField) -> TcResult<Self> {
        let n_cells = mesh.n_cells();
        TcError::check_size("wallDistance", n_cells, wall.y().len())?;
        TcError::check_size(nu.name(), n_cells, nu.len())?;
        nu.check_dimensions(UnitDim::KINEMATIC_VISCOSITY)?;
        Ok(Self { mesh, wall, nu })
    }

    /// 以均匀分子粘度创建上下文
    pub fn with_uniform_nu(mesh: Arc<dyn FvMesh>, wall: Arc<WallDistance>, nu: f64) -> TcResult<Self> {
        if !(nu.is_finite() && nu > 0.0) {
            return Err(TcError::invalid_config("nu", nu.to_string(), "分子粘度必须为正"));
        }
        let field = ScalarField::uniform("nu", UnitDim::KINEMATIC_VISCOSITY, mesh.as_ref(), nu);
        Self::new(mesh, wall, field)
    }

    /// 网格
    pub fn mesh(&self) -> &dyn FvMesh {
        self.mesh.as_ref()
    }

    /// 壁面距离
    pub fn wall(&self) -> &WallDistance {
        &self.wall
    }

    /// 分子运动粘度
    pub fn nu(&self) -> &ScalarField {
        &self.nu
    }
}

// ============================================================
// 输出
// ============================================================

/// 模型状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// 构造中
    Uninitialized,
    /// 可修正
    Ready,
    /// 修正中
    Correcting,
}

/// 一次修正的报告
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionReport {
    /// 是否跳过
    pub skipped: bool,
    /// 时间步索引
    pub time_index: u64,
    /// 各输运方程的求解结果（按求解顺序）
    pub equations: Vec<EquationReport>,
}

impl CorrectionReport {
    /// 跳过的修正
    pub fn skipped(time_index: u64) -> Self {
        Self {
            skipped: true,
            time_index,
            equations: Vec::new(),
        }
    }

    /// 所有方程是否收敛
    pub fn all_converged(&self) -> bool {
        self.equations.iter().all(EquationReport::is_converged)
    }

    /// 截断单元总数
    pub fn total_clipped(&self) -> usize {
        self.equations.iter().map(|e| e.clipped).sum()
    }

    /// 按场名称查找
    pub fn equation(&self, field: &str) -> Option<&EquationReport> {
        self.equations.iter().find(|e| e.field == field)
    }
}

// ============================================================
// 模型 trait
// ============================================================

/// 湍流闭合模型
pub trait ClosureModel: Send {
    /// 模型标签
    fn name(&self) -> &'static str;

    /// 当前状态
    fn state(&self) -> ModelState;

    /// 求解输运方程并更新 ν_t
    fn correct(&mut self, flow: &FlowState<'_>) -> TcResult<CorrectionReport>;

    /// 重新读取系数，返回配置是否变化
    fn read(&mut self, props: &TurbulenceProperties) -> TcResult<bool>;

    /// 涡粘 ν_t
    fn nut(&self) -> &ScalarField;

    /// 湍动能
    fn k(&self) -> &ScalarField;

    /// 耗散率
    fn epsilon(&self) -> &ScalarField;

    /// 各输运方程的有效扩散系数
    fn effective_diffusivities(&self) -> Vec<ScalarField>;

    /// LES 区域指示量，仅混合 RANS/LES 模型提供
    fn les_region(&self) -> Option<&ScalarField> {
        None
    }

    /// 模型拥有的输运变量
    fn transported_fields(&self) -> Vec<&ScalarField>;

    /// 写出输运变量与 ν_t
    fn write(&self, store: &mut dyn FieldStore) -> TcResult<()> {
        let mesh = self.mesh();
        for field in self.transported_fields() {
            store.save(field.to_stored(mesh))?;
        }
        store.save(self.nut().to_stored(mesh))
    }

    /// 网格
    fn mesh(&self) -> &dyn FvMesh;
}

// ============================================================
// 公共实现
// ============================================================

/// 各模型共用的状态与配置
///
/// 负责跳过判断、时间步索引检查、状态切换、初值读取与系数打印。
pub struct ClosureBase {
    name: &'static str,
    ctx: ModelContext,
    input: TurbulenceProperties,
    coeffs: CoeffDict,
    state: ModelState,
    last_time_index: Option<u64>,
}

impl ClosureBase {
    /// 创建，状态为 `Uninitialized`
    pub fn new(name: &'static str, ctx: ModelContext, props: &TurbulenceProperties) -> Self {
        Self {
            name,
            ctx,
            input: props.clone(),
            coeffs: props.coeffs.clone(),
            state: ModelState::Uninitialized,
            last_time_index: None,
        }
    }

    /// 模型标签
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 状态
    pub fn state(&self) -> ModelState {
        self.state
    }

    /// 网格
    pub fn mesh(&self) -> &dyn FvMesh {
        self.ctx.mesh()
    }

    /// 上下文
    pub fn ctx(&self) -> &ModelContext {
        &self.ctx
    }

    /// 分子运动粘度
    pub fn nu(&self) -> &[f64] {
        self.ctx.nu().values()
    }

    /// 平均分子粘度，用于默认初值
    pub fn mean_nu(&self) -> f64 {
        let nu = self.nu();
        if nu.is_empty() {
            0.0
        } else {
            nu.iter().sum::<f64>() / nu.len() as f64
        }
    }

    /// 壁面距离
    pub fn y(&self) -> &[f64] {
        self.ctx.wall().y()
    }

    /// 系数字典（读取时补齐默认值）
    pub fn coeffs_mut(&mut self) -> &mut CoeffDict {
        &mut self.coeffs
    }

    /// 线性求解器参数
    pub fn solver(&self) -> &LinearSolverConfig {
        &self.input.solver
    }

    /// 欠松弛因子
    pub fn relaxation_for(&self, field: &str) -> Option<f64> {
        self.input.relaxation_for(field)
    }

    /// 构造完成
    pub fn mark_ready(&mut self) {
        self.print_coeffs();
        self.state = ModelState::Ready;
    }

    /// 开始修正
    ///
    /// 需要跳过时返回 `Ok(false)`；同一时间步重复调用返回错误。
    pub fn begin_correct(&mut self, flow: &FlowState<'_>) -> TcResult<bool> {
        if !self.input.turbulence || !flow.correct_turbulence {
            log::trace!("{}: 湍流修正已关闭，跳过", self.name);
            return Ok(false);
        }
        if self.last_time_index == Some(flow.time_index) {
            return Err(TcError::AlreadyCorrected {
                time_index: flow.time_index,
            });
        }

        let mesh = self.ctx.mesh();
        TcError::check_size(flow.velocity.name(), mesh.n_cells(), flow.velocity.len())?;
        TcError::check_size("phi", mesh.n_faces(), flow.phi.len())?;
        if let Some(rho) = flow.rho {
            TcError::check_size("rho", mesh.n_cells(), rho.len())?;
        }
        if let Some(dt) = flow.dt {
            if !(dt.is_finite() && dt > 0.0) {
                return Err(TcError::invalid_config("dt", dt.to_string(), "时间步长必须为正"));
            }
        }

        self.state = ModelState::Correcting;
        Ok(true)
    }

    /// 结束修正，成功时记录时间步索引
    pub fn end_correct(
        &mut self,
        time_index: u64,
        result: TcResult<Vec<EquationReport>>,
    ) -> TcResult<CorrectionReport> {
        self.state = ModelState::Ready;
        let equations = result?;
        self.last_time_index = Some(time_index);
        Ok(CorrectionReport {
            skipped: false,
            time_index,
            equations,
        })
    }

    /// 重读配置，返回是否变化
    ///
    /// `filled` 为模型解析 `props.coeffs` 后补齐默认值的字典，
    /// 解析失败时模型不应调用本方法，已有配置保持不变。
    pub fn reread(&mut self, props: &TurbulenceProperties, filled: CoeffDict) -> TcResult<bool> {
        props.validate()?;
        if props == &self.input {
            return Ok(false);
        }
        self.input = props.clone();
        self.coeffs = filled;
        self.print_coeffs();
        Ok(true)
    }

    /// 打印系数（`print_coeffs` 开启时）
    pub fn print_coeffs(&self) {
        if !self.input.print_coeffs {
            return;
        }
        log::info!("{} 系数:", self.name);
        for line in self.coeffs.to_pretty_lines() {
            log::info!("    {line}");
        }
    }

    /// 构造输运变量或输出场
    ///
    /// 依次尝试存储中的同名场、配置中的均匀初值、`default`。
    /// 新建的场在壁面 patch 上取 `wall_value`，其余边界为零梯度。
    pub fn initial_field(
        &self,
        store: Option<&dyn FieldStore>,
        name: &str,
        dimensions: UnitDim,
        default: f64,
        wall_value: Option<f64>,
    ) -> TcResult<ScalarField> {
        let mesh = self.ctx.mesh();
        if let Some(store) = store {
            if let Some(field) = read_if_present(store, mesh, name, dimensions)? {
                return Ok(field);
            }
        }
        let value = self.input.initial_value(name, default);
        Ok(self.calculated_field(name, dimensions, value, wall_value))
    }

    /// 由单元值构造派生场，边界为零梯度
    pub fn derived_field(&self, name: &str, dimensions: UnitDim, values: &[f64]) -> ScalarField {
        let mut field = ScalarField::uniform(name, dimensions, self.ctx.mesh(), 0.0);
        for (dst, src) in field.values_mut().iter_mut().zip(values) {
            *dst = *src;
        }
        field
    }

    /// 均匀场，壁面取 `wall_value`
    pub fn calculated_field(
        &self,
        name: &str,
        dimensions: UnitDim,
        value: f64,
        wall_value: Option<f64>,
    ) -> ScalarField {
        let mesh = self.ctx.mesh();
        let mut field = ScalarField::uniform(name, dimensions, mesh, value);
        if let Some(w) = wall_value {
            for &patch in self.ctx.wall().wall_patches() {
                field = field.with_boundary(patch, BoundaryCondition::FixedValue(w));
            }
        }
        field
    }
}

/// 读取系数的简写
pub(crate) fn coeff(dict: &mut CoeffDict, name: &str, default: f64) -> TcResult<f64> {
    Ok(dict.lookup_or_add(name, default)?)
}

/// 读取开关的简写
pub(crate) fn switch(dict: &mut CoeffDict, name: &str, default: bool) -> TcResult<bool> {
    Ok(dict.lookup_switch_or_add(name, default)?)
}
