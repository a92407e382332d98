// crates/tc_fvm/src/fvm.rs

//! 隐式有限体积算子与标量方程矩阵
//!
//! [`FvScalarMatrix`] 以 LDU 形式存储 `A φ = b`：
//!
//! - `diag[c]`: 单元 c 的对角元
//! - `upper[f]`: 内部面 f 上 owner 行、neighbour 列的系数
//! - `lower[f]`: 内部面 f 上 neighbour 行、owner 列的系数
//! - `source[c]`: 右端项
//!
//! 源项按体积积分形式加入，单位体积源项由调用方给出。
//! 符号约定以方程右端为准：
//!
//! | 方法 | 右端项 | 矩阵贡献 |
//! |------|--------|----------|
//! | [`add_explicit_source`](FvScalarMatrix::add_explicit_source) | `su` | `b += su·V` |
//! | [`add_destruction`](FvScalarMatrix::add_destruction) | `-d·φ` | `diag += d·V` |
//! | [`add_susp`](FvScalarMatrix::add_susp) | `c·φ` | `c≥0` 显式，`c<0` 隐式 |

use crate::field::{BoundaryCondition, ScalarField};
use crate::linear_algebra::{
    BiCgStabSolver, CsrBuilder, CsrMatrix, IterativeSolver, JacobiPreconditioner, SolverResult,
};
use crate::mesh::FvMesh;
use tc_config::LinearSolverConfig;
use tc_foundation::{TcError, TcResult};

/// 有限体积标量方程矩阵
#[derive(Debug, Clone)]
pub struct FvScalarMatrix {
    name: String,
    diag: Vec<f64>,
    upper: Vec<f64>,
    lower: Vec<f64>,
    source: Vec<f64>,
}

impl FvScalarMatrix {
    /// 为场 `name` 创建空矩阵
    pub fn new(mesh: &dyn FvMesh, name: impl Into<String>) -> Self {
        let n_cells = mesh.n_cells();
        let n_internal = mesh.n_internal_faces();
        Self {
            name: name.into(),
            diag: vec![0.0; n_cells],
            upper: vec![0.0; n_internal],
            lower: vec![0.0; n_internal],
            source: vec![0.0; n_cells],
        }
    }

    /// 场名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 对角元
    pub fn diag(&self) -> &[f64] {
        &self.diag
    }

    /// 上三角系数（按内部面）
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// 下三角系数（按内部面）
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// 右端项
    pub fn source(&self) -> &[f64] {
        &self.source
    }

    fn check_cells(&self, what: &str, len: usize) -> TcResult<()> {
        TcError::check_size(&format!("{}:{}", self.name, what), self.diag.len(), len)
    }

    // ========================================================================
    // 算子
    // ========================================================================

    /// 一阶隐式 Euler 时间项 ∂(ρφ)/∂t
    pub fn add_ddt(
        &mut self,
        mesh: &dyn FvMesh,
        rho: Option<&[f64]>,
        dt: f64,
        old: &[f64],
    ) -> TcResult<()> {
        self.check_cells("old", old.len())?;
        if let Some(rho) = rho {
            self.check_cells("rho", rho.len())?;
        }
        if !(dt.is_finite() && dt > 0.0) {
            return Err(TcError::invalid_config("dt", dt.to_string(), "时间步长必须为正"));
        }
        for cell in 0..self.diag.len() {
            let r = rho.map_or(1.0, |r| r[cell]);
            let coeff = r * mesh.cell_volume(cell) / dt;
            self.diag[cell] += coeff;
            self.source[cell] += coeff * old[cell];
        }
        Ok(())
    }

    /// 迎风对流项 ∇·(Fφ)，`phi` 为面通量（可含密度）
    pub fn add_convection(&mut self, mesh: &dyn FvMesh, phi: &[f64], field: &ScalarField) -> TcResult<()> {
        TcError::check_size(&format!("{}:phi", self.name), mesh.n_faces(), phi.len())?;

        for face in mesh.internal_faces() {
            let f = phi[face];
            let owner = mesh.face_owner(face);
            let Some(nb) = mesh.face_neighbor(face) else {
                continue;
            };
            self.diag[owner] += f.max(0.0);
            self.upper[face] += f.min(0.0);
            self.diag[nb] += (-f).max(0.0);
            self.lower[face] += (-f).min(0.0);
        }

        for face in mesh.boundary_faces() {
            let f = phi[face];
            let owner = mesh.face_owner(face);
            match field.boundary(mesh.face_patch(face).unwrap_or(0)) {
                BoundaryCondition::ZeroGradient => self.diag[owner] += f,
                BoundaryCondition::FixedValue(v) => {
                    if f >= 0.0 {
                        self.diag[owner] += f;
                    } else {
                        self.source[owner] -= f * v;
                    }
                }
            }
        }
        Ok(())
    }

    /// 扩散项 -∇·(γ∇φ)，`gamma` 为单元值，内部面线性插值
    pub fn add_laplacian(&mut self, mesh: &dyn FvMesh, gamma: &[f64], field: &ScalarField) -> TcResult<()> {
        self.check_cells("gamma", gamma.len())?;

        for face in mesh.internal_faces() {
            let owner = mesh.face_owner(face);
            let Some(nb) = mesh.face_neighbor(face) else {
                continue;
            };
            let w = mesh.face_weight(face);
            let gamma_f = w * gamma[owner] + (1.0 - w) * gamma[nb];
            let a = gamma_f * mesh.face_area(face) * mesh.delta_coeff(face);
            self.diag[owner] += a;
            self.diag[nb] += a;
            self.upper[face] -= a;
            self.lower[face] -= a;
        }

        for face in mesh.boundary_faces() {
            let owner = mesh.face_owner(face);
            if let BoundaryCondition::FixedValue(v) = field.boundary(mesh.face_patch(face).unwrap_or(0)) {
                let a = gamma[owner] * mesh.face_area(face) * mesh.delta_coeff(face);
                self.diag[owner] += a;
                self.source[owner] += a * v;
            }
        }
        Ok(())
    }

    // ========================================================================
    // 源项
    // ========================================================================

    /// 显式源项：右端 `su`
    pub fn add_explicit_source(&mut self, mesh: &dyn FvMesh, su: &[f64]) -> TcResult<()> {
        self.check_cells("su", su.len())?;
        for (cell, s) in su.iter().enumerate() {
            self.source[cell] += s * mesh.cell_volume(cell);
        }
        Ok(())
    }

    /// 耗散项：右端 `-d·φ`，负系数按 0 处理
    pub fn add_destruction(&mut self, mesh: &dyn FvMesh, d: &[f64]) -> TcResult<()> {
        self.check_cells("destruction", d.len())?;
        for (cell, c) in d.iter().enumerate() {
            self.diag[cell] += c.max(0.0) * mesh.cell_volume(cell);
        }
        Ok(())
    }

    /// 按符号线性化的源项：右端 `c·φ`
    ///
    /// `c ≥ 0` 时以旧值显式加入，`c < 0` 时隐式加入对角元。
    pub fn add_susp(&mut self, mesh: &dyn FvMesh, c: &[f64], psi: &[f64]) -> TcResult<()> {
        self.check_cells("susp", c.len())?;
        self.check_cells("psi", psi.len())?;
        for cell in 0..self.diag.len() {
            let v = mesh.cell_volume(cell);
            if c[cell] >= 0.0 {
                self.source[cell] += c[cell] * psi[cell] * v;
            } else {
                self.diag[cell] -= c[cell] * v;
            }
        }
        Ok(())
    }

    // ========================================================================
    // 松弛与求解
    // ========================================================================

    /// 隐式欠松弛
    ///
    /// 对角元先提升到不小于非对角元绝对值之和，再除以 α，
    /// 差值乘以前一迭代值补入右端。α ≥ 1 时不做处理。
    pub fn relax(&mut self, mesh: &dyn FvMesh, alpha: f64, psi_prev: &[f64]) -> TcResult<()> {
        self.check_cells("psi", psi_prev.len())?;
        if !(alpha > 0.0) || alpha >= 1.0 {
            return Ok(());
        }

        let mut sum_off = vec![0.0; self.diag.len()];
        for face in mesh.internal_faces() {
            if let Some(nb) = mesh.face_neighbor(face) {
                sum_off[mesh.face_owner(face)] += self.upper[face].abs();
                sum_off[nb] += self.lower[face].abs();
            }
        }

        for cell in 0..self.diag.len() {
            let d = self.diag[cell];
            let dominant = d.abs().max(sum_off[cell]);
            let relaxed = dominant / alpha;
            self.source[cell] += (relaxed - d) * psi_prev[cell];
            self.diag[cell] = relaxed;
        }
        Ok(())
    }

    /// 转换为 CSR 矩阵
    pub fn to_csr(&self, mesh: &dyn FvMesh) -> CsrMatrix {
        let mut builder = CsrBuilder::new_square(self.diag.len());
        for (cell, &d) in self.diag.iter().enumerate() {
            builder.add(cell, cell, d);
        }
        for face in mesh.internal_faces() {
            if let Some(nb) = mesh.face_neighbor(face) {
                let owner = mesh.face_owner(face);
                builder.add(owner, nb, self.upper[face]);
                builder.add(nb, owner, self.lower[face]);
            }
        }
        builder.build()
    }

    /// 残差 b - Aφ
    pub fn residual(&self, mesh: &dyn FvMesh, psi: &[f64]) -> Vec<f64> {
        let mut r: Vec<f64> = self
            .source
            .iter()
            .zip(self.diag.iter().zip(psi))
            .map(|(b, (d, p))| b - d * p)
            .collect();
        for face in mesh.internal_faces() {
            if let Some(nb) = mesh.face_neighbor(face) {
                let owner = mesh.face_owner(face);
                r[owner] -= self.upper[face] * psi[nb];
                r[nb] -= self.lower[face] * psi[owner];
            }
        }
        r
    }

    /// 以当前场值为初值求解，结果写回 `psi`
    ///
    /// 不收敛不视为错误，由返回的 [`SolverResult`] 报告。
    pub fn solve(
        &self,
        mesh: &dyn FvMesh,
        psi: &mut ScalarField,
        config: &LinearSolverConfig,
    ) -> TcResult<SolverResult> {
        self.check_cells("psi", psi.len())?;
        let matrix = self.to_csr(mesh);
        let precond = JacobiPreconditioner::from_matrix(&matrix);
        let mut solver = BiCgStabSolver::new(config.clone());
        let result = solver.solve(&matrix, &self.source, psi.values_mut(), &precond);
        log::debug!(
            "{}: {} 初始残差 = {:.3e}, 最终残差 = {:.3e}, 迭代 {}",
            self.name,
            solver.name(),
            result.initial_residual_norm,
            result.residual_norm,
            result.iterations
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::PolyMesh;
    use tc_foundation::UnitDim;

    fn line_mesh(n: usize) -> PolyMesh {
        PolyMesh::structured([n, 1, 1], [n as f64, 1.0, 1.0]).unwrap()
    }

    #[test]
    fn test_pure_decay() {
        // (φ - φ0)/dt = -d φ  =>  φ = φ0 / (1 + d dt)
        let mesh = line_mesh(3);
        let mut psi = ScalarField::uniform("k", UnitDim::K, &mesh, 1.0);
        let mut eqn = FvScalarMatrix::new(&mesh, "k");
        eqn.add_ddt(&mesh, None, 0.5, psi.values()).unwrap();
        eqn.add_destruction(&mesh, &[2.0; 3]).unwrap();
        let result = eqn.solve(&mesh, &mut psi, &LinearSolverConfig::default()).unwrap();
        assert!(result.is_converged());
        for &v in psi.values() {
            assert!((v - 0.5).abs() < 1e-10);
        }
    }

    #[test]
    fn test_negative_destruction_is_ignored() {
        let mesh = line_mesh(1);
        let mut eqn = FvScalarMatrix::new(&mesh, "k");
        eqn.add_destruction(&mesh, &[-5.0]).unwrap();
        assert_eq!(eqn.diag()[0], 0.0);
    }

    #[test]
    fn test_susp_split_by_sign() {
        let mesh = line_mesh(2);
        let mut eqn = FvScalarMatrix::new(&mesh, "k");
        eqn.add_susp(&mesh, &[2.0, -3.0], &[0.5, 0.5]).unwrap();
        assert_eq!(eqn.source(), &[1.0, 0.0]);
        assert_eq!(eqn.diag(), &[0.0, 3.0]);
    }

    #[test]
    fn test_upwind_convection_rows_sum() {
        // 均匀正向通量：内部行系数之和为零
        let mesh = line_mesh(4);
        let field = ScalarField::uniform("k", UnitDim::K, &mesh, 0.0);
        let mut phi = vec![0.0; mesh.n_faces()];
        for face in 0..mesh.n_faces() {
            phi[face] = mesh.face_area_vector(face).x;
        }
        let mut eqn = FvScalarMatrix::new(&mesh, "k");
        eqn.add_convection(&mesh, &phi, &field).unwrap();
        let csr = eqn.to_csr(&mesh);
        // 单元 1: 对角 1（流出），左邻 -1（流入）
        assert!((csr.get(1, 1) - 1.0).abs() < 1e-12);
        assert!((csr.get(1, 0) + 1.0).abs() < 1e-12);
        assert_eq!(csr.get(1, 2), 0.0);
    }

    #[test]
    fn test_steady_diffusion_with_fixed_ends() {
        // -d²φ/dx² = 0, φ(0)=0, φ(L)=1 的线性解
        let n = 5;
        let mesh = line_mesh(n);
        let mut psi = ScalarField::uniform("T", UnitDim::DIMENSIONLESS, &mesh, 0.0);
        psi.set_patch_by_name(&mesh, "xmin", BoundaryCondition::FixedValue(0.0))
            .unwrap();
        psi.set_patch_by_name(&mesh, "xmax", BoundaryCondition::FixedValue(1.0))
            .unwrap();
        let mut eqn = FvScalarMatrix::new(&mesh, "T");
        eqn.add_laplacian(&mesh, &vec![1.0; n], &psi).unwrap();
        let result = eqn
            .solve(&mesh, &mut psi, &LinearSolverConfig::new(1e-12, 100))
            .unwrap();
        assert!(result.is_converged());
        for c in 0..n {
            let x = mesh.cell_center(c).x / n as f64;
            assert!((psi.value(c) - x).abs() < 1e-8, "cell {c}");
        }
    }

    #[test]
    fn test_relax_keeps_solution_fixed_point() {
        // 已收敛解在松弛后仍满足方程
        let mesh = line_mesh(3);
        let mut eqn = FvScalarMatrix::new(&mesh, "k");
        eqn.add_destruction(&mesh, &[1.0; 3]).unwrap();
        eqn.add_explicit_source(&mesh, &[2.0; 3]).unwrap();
        let psi = vec![2.0; 3];
        eqn.relax(&mesh, 0.5, &psi).unwrap();
        assert!((eqn.diag()[0] - 2.0).abs() < 1e-12);
        for r in eqn.residual(&mesh, &psi) {
            assert!(r.abs() < 1e-12);
        }
    }

    #[test]
    fn test_size_mismatch_is_reported() {
        let mesh = line_mesh(2);
        let mut eqn = FvScalarMatrix::new(&mesh, "k");
        assert!(eqn.add_explicit_source(&mesh, &[1.0]).is_err());
        assert!(eqn.add_ddt(&mesh, None, 0.0, &[1.0, 1.0]).is_err());
    }
}
