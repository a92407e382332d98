// crates/tc_turbulence/src/transport.rs

//! 湍流输运方程的组装与求解
//!
//! ```text
//! ∂(ρφ)/∂t + ∇·(ρUφ) - ∇·(ρ D_eff ∇φ) = ρ (P - D·φ ± X)
//! ```
//!
//! 源项按性质分类加入：
//!
//! | 方法 | 处理 |
//! |------|------|
//! | [`production`](TransportEquationBuilder::production) | 显式，负值截断为 0 |
//! | [`explicit_source`](TransportEquationBuilder::explicit_source) | 显式，保留符号 |
//! | [`destruction`](TransportEquationBuilder::destruction) | 隐式对角，负系数截断为 0 |
//! | [`linear_source`](TransportEquationBuilder::linear_source) | SuSp：正系数显式，负系数隐式 |
//! | [`sink`](TransportEquationBuilder::sink) | 汇项量值 s 转为隐式系数 s/max(φ, floor) |
//!
//! 求解后变量截断到下限，NaN 同样替换为下限。

use tc_config::LinearSolverConfig;
use tc_foundation::float::{bound_below, SMALL};
use tc_foundation::{TcError, TcResult};
use tc_fvm::linear_algebra::SolverStatus;
use tc_fvm::{FvMesh, FvScalarMatrix, ScalarField};

/// 时间离散格式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeScheme {
    /// 一阶隐式 Euler
    Euler {
        /// 时间步长
        dt: f64,
    },
    /// 稳态，不含时间项
    Steady,
}

impl TimeScheme {
    /// 由可选时间步长构造
    pub fn from_dt(dt: Option<f64>) -> Self {
        match dt {
            Some(dt) => Self::Euler { dt },
            None => Self::Steady,
        }
    }
}

#[derive(Debug, Clone)]
enum SourceTerm {
    Production(Vec<f64>),
    Explicit(Vec<f64>),
    Destruction(Vec<f64>),
    Linear(Vec<f64>),
    Sink(Vec<f64>),
}

impl SourceTerm {
    fn label(&self) -> &'static str {
        match self {
            Self::Production(_) => "production",
            Self::Explicit(_) => "su",
            Self::Destruction(_) => "destruction",
            Self::Linear(_) => "susp",
            Self::Sink(_) => "sink",
        }
    }

    fn values(&self) -> &[f64] {
        match self {
            Self::Production(v)
            | Self::Explicit(v)
            | Self::Destruction(v)
            | Self::Linear(v)
            | Self::Sink(v) => v,
        }
    }
}

/// 单个方程的求解报告
#[derive(Debug, Clone, PartialEq)]
pub struct EquationReport {
    /// 场名称
    pub field: String,
    /// 线性求解状态
    pub status: SolverStatus,
    /// 迭代次数
    pub iterations: usize,
    /// 初始残差范数
    pub initial_residual: f64,
    /// 最终残差范数
    pub final_residual: f64,
    /// 被截断到下限的单元数
    pub clipped: usize,
}

impl EquationReport {
    /// 是否收敛
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}

/// 输运方程构建器
///
/// # 示例
///
/// ```ignore
/// let report = TransportEquationBuilder::new(mesh, "nuTilda")
///     .time(TimeScheme::Euler { dt })
///     .convection(phi)
///     .diffusion(d_eff)
///     .production(prod)
///     .destruction(dest)
///     .relaxation(Some(0.7))
///     .solve(&mut nu_tilda, &solver)?;
/// ```
pub struct TransportEquationBuilder<'a> {
    mesh: &'a dyn FvMesh,
    name: String,
    time: TimeScheme,
    rho: Option<&'a [f64]>,
    phi: Option<&'a [f64]>,
    diffusivity: Option<Vec<f64>>,
    terms: Vec<SourceTerm>,
    relaxation: Option<f64>,
    floor: f64,
}

impl<'a> TransportEquationBuilder<'a> {
    /// 为场 `name` 创建构建器，默认稳态、下限 0
    pub fn new(mesh: &'a dyn FvMesh, name: impl Into<String>) -> Self {
        Self {
            mesh,
            name: name.into(),
            time: TimeScheme::Steady,
            rho: None,
            phi: None,
            diffusivity: None,
            terms: Vec::new(),
            relaxation: None,
            floor: 0.0,
        }
    }

    /// 时间格式
    pub fn time(mut self, scheme: TimeScheme) -> Self {
        self.time = scheme;
        self
    }

    /// 密度，`None` 为不可压
    ///
    /// 可压时源项与扩散系数乘以 ρ，`phi` 应为质量通量。
    pub fn density(mut self, rho: Option<&'a [f64]>) -> Self {
        self.rho = rho;
        self
    }

    /// 对流项，`phi` 为面通量
    pub fn convection(mut self, phi: &'a [f64]) -> Self {
        self.phi = Some(phi);
        self
    }

    /// 扩散项，有效扩散系数按单元给出
    pub fn diffusion(mut self, d_eff: Vec<f64>) -> Self {
        self.diffusivity = Some(d_eff);
        self
    }

    /// 产生项（显式，负值截断为 0）
    pub fn production(mut self, p: Vec<f64>) -> Self {
        self.terms.push(SourceTerm::Production(p));
        self
    }

    /// 显式源项
    pub fn explicit_source(mut self, su: Vec<f64>) -> Self {
        self.terms.push(SourceTerm::Explicit(su));
        self
    }

    /// 耗散系数 d，右端 `-d·φ`
    pub fn destruction(mut self, d: Vec<f64>) -> Self {
        self.terms.push(SourceTerm::Destruction(d));
        self
    }

    /// 线性源项系数 c，右端 `c·φ`，按符号线性化
    pub fn linear_source(mut self, c: Vec<f64>) -> Self {
        self.terms.push(SourceTerm::Linear(c));
        self
    }

    /// 汇项量值 s，右端 `-s`
    pub fn sink(mut self, s: Vec<f64>) -> Self {
        self.terms.push(SourceTerm::Sink(s));
        self
    }

    /// 欠松弛因子
    pub fn relaxation(mut self, alpha: Option<f64>) -> Self {
        self.relaxation = alpha;
        self
    }

    /// 求解后的下限
    pub fn floor(mut self, floor: f64) -> Self {
        self.floor = floor;
        self
    }

    fn density_scaled(&self, values: &[f64]) -> Vec<f64> {
        match self.rho {
            Some(rho) => values.iter().zip(rho).map(|(v, r)| v * r).collect(),
            None => values.to_vec(),
        }
    }

    /// 组装并求解，结果写回 `field`
    ///
    /// 不收敛只记录警告，之后照常截断。
    pub fn solve(self, field: &mut ScalarField, config: &LinearSolverConfig) -> TcResult<EquationReport> {
        let mesh = self.mesh;
        let n_cells = mesh.n_cells();
        TcError::check_size(&self.name, n_cells, field.len())?;
        if let Some(rho) = self.rho {
            TcError::check_size(&format!("{}:rho", self.name), n_cells, rho.len())?;
        }
        for term in &self.terms {
            TcError::check_size(
                &format!("{}:{}", self.name, term.label()),
                n_cells,
                term.values().len(),
            )?;
        }

        let old = field.values().to_vec();
        let mut eqn = FvScalarMatrix::new(mesh, self.name.as_str());

        if let TimeScheme::Euler { dt } = self.time {
            eqn.add_ddt(mesh, self.rho, dt, &old)?;
        }
        if let Some(phi) = self.phi {
            eqn.add_convection(mesh, phi, field)?;
        }
        if let Some(d_eff) = &self.diffusivity {
            TcError::check_size(&format!("{}:diffusivity", self.name), n_cells, d_eff.len())?;
            let gamma = self.density_scaled(d_eff);
            eqn.add_laplacian(mesh, &gamma, field)?;
        }

        let sink_floor = self.floor.max(SMALL);
        for term in &self.terms {
            let values = self.density_scaled(term.values());
            match term {
                SourceTerm::Production(_) => {
                    let p: Vec<f64> = values.iter().map(|&p| bound_below(p, 0.0)).collect();
                    eqn.add_explicit_source(mesh, &p)?;
                }
                SourceTerm::Explicit(_) => eqn.add_explicit_source(mesh, &values)?,
                SourceTerm::Destruction(_) => eqn.add_destruction(mesh, &values)?,
                SourceTerm::Linear(_) => eqn.add_susp(mesh, &values, &old)?,
                SourceTerm::Sink(_) => {
                    let d: Vec<f64> = values
                        .iter()
                        .zip(&old)
                        .map(|(s, psi)| s / bound_below(*psi, sink_floor))
                        .collect();
                    eqn.add_destruction(mesh, &d)?;
                }
            }
        }

        if let Some(alpha) = self.relaxation {
            eqn.relax(mesh, alpha, &old)?;
        }

        let result = eqn.solve(mesh, field, config)?;
        if !result.is_converged() {
            log::warn!(
                "{} 未收敛: {:?}, 迭代 {}, 残差 {:.3e}",
                self.name,
                result.status,
                result.iterations,
                result.residual_norm
            );
        } else {
            log::debug!(
                "{}: 初始残差 {:.3e}, 最终残差 {:.3e}, 迭代 {}",
                self.name,
                result.initial_residual_norm,
                result.residual_norm,
                result.iterations
            );
        }

        let clipped = field.bound_below(self.floor);
        if clipped > 0 {
            log::debug!("{}: {} 个单元截断到下限 {:e}", self.name, clipped, self.floor);
        }

        Ok(EquationReport {
            field: self.name,
            status: result.status,
            iterations: result.iterations,
            initial_residual: result.initial_residual_norm,
            final_residual: result.residual_norm,
            clipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_foundation::UnitDim;
    use tc_fvm::PolyMesh;

    fn cell() -> PolyMesh {
        PolyMesh::structured([1, 1, 1], [1.0, 1.0, 1.0]).unwrap()
    }

    fn solve_one<'m>(
        mesh: &'m PolyMesh,
        init: f64,
        build: impl FnOnce(TransportEquationBuilder<'m>) -> TransportEquationBuilder<'m>,
    ) -> (f64, EquationReport) {
        let mut field = ScalarField::uniform("psi", UnitDim::KINEMATIC_VISCOSITY, mesh, init);
        let builder = TransportEquationBuilder::new(mesh, "psi").time(TimeScheme::Euler { dt: 1.0 });
        let report = build(builder)
            .solve(&mut field, &LinearSolverConfig::default())
            .unwrap();
        (field.value(0), report)
    }

    #[test]
    fn test_implicit_destruction() {
        let mesh = cell();
        let (v, report) = solve_one(&mesh, 1.0, |b| b.destruction(vec![1.0]));
        assert!((v - 0.5).abs() < 1e-10);
        assert!(report.is_converged());
        assert_eq!(report.clipped, 0);
        assert_eq!(report.field, "psi");
    }

    #[test]
    fn test_negative_production_is_clamped() {
        let mesh = cell();
        let (v, _) = solve_one(&mesh, 1.0, |b| b.production(vec![-5.0]));
        assert!((v - 1.0).abs() < 1e-10);
        let (v, _) = solve_one(&mesh, 1.0, |b| b.production(vec![2.0]));
        assert!((v - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_susp_split() {
        let mesh = cell();
        let (v, _) = solve_one(&mesh, 1.0, |b| b.linear_source(vec![-1.0]));
        assert!((v - 0.5).abs() < 1e-10);
        let (v, _) = solve_one(&mesh, 1.0, |b| b.linear_source(vec![0.5]));
        assert!((v - 1.5).abs() < 1e-10);
    }

    #[test]
    fn test_sink_becomes_implicit() {
        // s/φ_old = 2  =>  φ = 1/(1 + 2)
        let mesh = cell();
        let (v, _) = solve_one(&mesh, 1.0, |b| b.sink(vec![2.0]));
        assert!((v - 1.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_negative_start_is_clipped() {
        let mesh = cell();
        let (v, report) = solve_one(&mesh, -1.0, |b| b.explicit_source(vec![-0.5]).floor(1e-10));
        assert_eq!(v, 1e-10);
        assert_eq!(report.clipped, 1);
    }

    #[test]
    fn test_density_scales_time_and_sources_alike() {
        let mesh = cell();
        let rho = vec![2.0];
        let (v, _) = solve_one(&mesh, 1.0, |b| b.density(Some(&rho[..])).destruction(vec![1.0]));
        assert!((v - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_relaxation_keeps_previous_value_at_fixed_point() {
        let mesh = cell();
        let (v, _) = solve_one(&mesh, 1.0, |b| b.relaxation(Some(0.5)));
        assert!((v - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_size_mismatch() {
        let mesh = cell();
        let mut field = ScalarField::uniform("psi", UnitDim::KINEMATIC_VISCOSITY, &mesh, 1.0);
        let err = TransportEquationBuilder::new(&mesh, "psi")
            .production(vec![1.0, 2.0])
            .solve(&mut field, &LinearSolverConfig::default())
            .unwrap_err();
        assert!(matches!(err, TcError::SizeMismatch { .. }));
    }
}
