// crates/tc_fvm/src/field.rs

//! 单元中心场与边界条件
//!
//! 场由内部值（每个单元一个）和每个 patch 一个边界条件组成。
//! 湍流输运量只需要两类边界条件：
//!
//! - [`BoundaryCondition::ZeroGradient`]: 边界面取 owner 单元值
//! - [`BoundaryCondition::FixedValue`]: 边界面取给定值（如壁面 ν̃ = 0）

use crate::io::StoredField;
use crate::mesh::FvMesh;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use tc_foundation::float::bound_slice_below;
use tc_foundation::{TcError, TcResult, UnitDim};

// ============================================================
// 边界条件
// ============================================================

/// 标量边界条件
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum BoundaryCondition {
    /// 零梯度
    #[default]
    ZeroGradient,
    /// 固定值
    FixedValue(f64),
}

impl BoundaryCondition {
    /// 是否为固定值边界
    #[inline]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::FixedValue(_))
    }
}

/// 矢量边界条件
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum VectorBoundaryCondition {
    /// 零梯度
    #[default]
    ZeroGradient,
    /// 固定值
    FixedValue(DVec3),
}

// ============================================================
// 标量场
// ============================================================

/// 单元中心标量场
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    name: String,
    dimensions: UnitDim,
    internal: Vec<f64>,
    boundary: Vec<BoundaryCondition>,
}

impl ScalarField {
    /// 创建均匀场，所有 patch 为零梯度
    pub fn uniform(name: impl Into<String>, dimensions: UnitDim, mesh: &dyn FvMesh, value: f64) -> Self {
        Self {
            name: name.into(),
            dimensions,
            internal: vec![value; mesh.n_cells()],
            boundary: vec![BoundaryCondition::ZeroGradient; mesh.n_patches()],
        }
    }

    /// 由内部值创建，所有 patch 为零梯度
    pub fn from_values(
        name: impl Into<String>,
        dimensions: UnitDim,
        mesh: &dyn FvMesh,
        values: Vec<f64>,
    ) -> TcResult<Self> {
        let name = name.into();
        TcError::check_size(&name, mesh.n_cells(), values.len())?;
        Ok(Self {
            name,
            dimensions,
            internal: values,
            boundary: vec![BoundaryCondition::ZeroGradient; mesh.n_patches()],
        })
    }

    /// 从存储记录恢复，并检查尺寸与量纲
    pub fn from_stored(stored: StoredField, mesh: &dyn FvMesh, expected: UnitDim) -> TcResult<Self> {
        stored
            .dimensions
            .expect_eq(expected, &format!("字段 {}", stored.name))?;
        TcError::check_size(&stored.name, mesh.n_cells(), stored.internal.len())?;

        let mut boundary = vec![BoundaryCondition::ZeroGradient; mesh.n_patches()];
        for (patch_name, bc) in stored.boundary {
            match mesh.find_patch(&patch_name) {
                Some(p) => boundary[p] = bc,
                None => log::warn!("字段 {} 引用了不存在的 patch {}，已忽略", stored.name, patch_name),
            }
        }

        Ok(Self {
            name: stored.name,
            dimensions: stored.dimensions,
            internal: stored.internal,
            boundary,
        })
    }

    /// 转换为存储记录
    pub fn to_stored(&self, mesh: &dyn FvMesh) -> StoredField {
        StoredField {
            name: self.name.clone(),
            dimensions: self.dimensions,
            internal: self.internal.clone(),
            boundary: self
                .boundary
                .iter()
                .enumerate()
                .map(|(p, bc)| (mesh.patch_name(p).to_string(), *bc))
                .collect(),
        }
    }

    /// 场名称
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 量纲
    #[inline]
    pub fn dimensions(&self) -> UnitDim {
        self.dimensions
    }

    /// 单元数
    #[inline]
    pub fn len(&self) -> usize {
        self.internal.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.internal.is_empty()
    }

    /// 内部值
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.internal
    }

    /// 可变内部值
    #[inline]
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.internal
    }

    /// 单元值
    #[inline]
    pub fn value(&self, cell: usize) -> f64 {
        self.internal[cell]
    }

    /// 所有 patch 的边界条件
    #[inline]
    pub fn boundary_conditions(&self) -> &[BoundaryCondition] {
        &self.boundary
    }

    /// 指定 patch 的边界条件
    #[inline]
    pub fn boundary(&self, patch: usize) -> BoundaryCondition {
        self.boundary[patch]
    }

    /// 设置边界条件
    pub fn set_boundary(&mut self, patch: usize, bc: BoundaryCondition) -> TcResult<()> {
        match self.boundary.get_mut(patch) {
            Some(slot) => {
                *slot = bc;
                Ok(())
            }
            None => Err(TcError::invalid_mesh(format!(
                "字段 {} 没有 patch {}",
                self.name, patch
            ))),
        }
    }

    /// 按 patch 名称设置边界条件
    pub fn set_patch_by_name(
        &mut self,
        mesh: &dyn FvMesh,
        patch_name: &str,
        bc: BoundaryCondition,
    ) -> TcResult<()> {
        let patch = mesh
            .find_patch(patch_name)
            .ok_or_else(|| TcError::invalid_mesh(format!("不存在的 patch: {patch_name}")))?;
        self.set_boundary(patch, bc)
    }

    /// 链式设置边界条件
    pub fn with_boundary(mut self, patch: usize, bc: BoundaryCondition) -> Self {
        if let Some(slot) = self.boundary.get_mut(patch) {
            *slot = bc;
        }
        self
    }

    /// 边界面上的值
    pub fn boundary_value(&self, mesh: &dyn FvMesh, face: usize) -> f64 {
        let owner_value = self.internal[mesh.face_owner(face)];
        match mesh.face_patch(face).map(|p| self.boundary[p]) {
            Some(BoundaryCondition::FixedValue(v)) => v,
            _ => owner_value,
        }
    }

    /// 面值：内部面线性插值，边界面取边界值
    pub fn face_value(&self, mesh: &dyn FvMesh, face: usize) -> f64 {
        match mesh.face_neighbor(face) {
            Some(nb) => {
                let w = mesh.face_weight(face);
                w * self.internal[mesh.face_owner(face)] + (1.0 - w) * self.internal[nb]
            }
            None => self.boundary_value(mesh, face),
        }
    }

    /// 内部值下限截断（NaN 一并截断），返回截断的单元数
    pub fn bound_below(&mut self, floor: f64) -> usize {
        bound_slice_below(&mut self.internal, floor)
    }

    /// 检查量纲
    pub fn check_dimensions(&self, expected: UnitDim) -> TcResult<()> {
        self.dimensions
            .expect_eq(expected, &format!("字段 {}", self.name))
    }
}

// ============================================================
// 矢量场
// ============================================================

/// 单元中心矢量场（速度）
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    name: String,
    dimensions: UnitDim,
    internal: Vec<DVec3>,
    boundary: Vec<VectorBoundaryCondition>,
}

impl VectorField {
    /// 创建均匀场，所有 patch 为零梯度
    pub fn uniform(name: impl Into<String>, dimensions: UnitDim, mesh: &dyn FvMesh, value: DVec3) -> Self {
        Self {
            name: name.into(),
            dimensions,
            internal: vec![value; mesh.n_cells()],
            boundary: vec![VectorBoundaryCondition::ZeroGradient; mesh.n_patches()],
        }
    }

    /// 由内部值创建
    pub fn from_values(
        name: impl Into<String>,
        dimensions: UnitDim,
        mesh: &dyn FvMesh,
        values: Vec<DVec3>,
    ) -> TcResult<Self> {
        let name = name.into();
        TcError::check_size(&name, mesh.n_cells(), values.len())?;
        Ok(Self {
            name,
            dimensions,
            internal: values,
            boundary: vec![VectorBoundaryCondition::ZeroGradient; mesh.n_patches()],
        })
    }

    /// 场名称
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 量纲
    #[inline]
    pub fn dimensions(&self) -> UnitDim {
        self.dimensions
    }

    /// 单元数
    #[inline]
    pub fn len(&self) -> usize {
        self.internal.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.internal.is_empty()
    }

    /// 内部值
    #[inline]
    pub fn values(&self) -> &[DVec3] {
        &self.internal
    }

    /// 可变内部值
    #[inline]
    pub fn values_mut(&mut self) -> &mut [DVec3] {
        &mut self.internal
    }

    /// 指定 patch 的边界条件
    #[inline]
    pub fn boundary(&self, patch: usize) -> VectorBoundaryCondition {
        self.boundary[patch]
    }

    /// 设置边界条件
    pub fn set_boundary(&mut self, patch: usize, bc: VectorBoundaryCondition) -> TcResult<()> {
        match self.boundary.get_mut(patch) {
            Some(slot) => {
                *slot = bc;
                Ok(())
            }
            None => Err(TcError::invalid_mesh(format!(
                "字段 {} 没有 patch {}",
                self.name, patch
            ))),
        }
    }

    /// 按 patch 名称设置边界条件
    pub fn set_patch_by_name(
        &mut self,
        mesh: &dyn FvMesh,
        patch_name: &str,
        bc: VectorBoundaryCondition,
    ) -> TcResult<()> {
        let patch = mesh
            .find_patch(patch_name)
            .ok_or_else(|| TcError::invalid_mesh(format!("不存在的 patch: {patch_name}")))?;
        self.set_boundary(patch, bc)
    }

    /// 边界面上的值
    pub fn boundary_value(&self, mesh: &dyn FvMesh, face: usize) -> DVec3 {
        let owner_value = self.internal[mesh.face_owner(face)];
        match mesh.face_patch(face).map(|p| self.boundary[p]) {
            Some(VectorBoundaryCondition::FixedValue(v)) => v,
            _ => owner_value,
        }
    }

    /// 面值：内部面线性插值，边界面取边界值
    pub fn face_value(&self, mesh: &dyn FvMesh, face: usize) -> DVec3 {
        match mesh.face_neighbor(face) {
            Some(nb) => {
                let w = mesh.face_weight(face);
                self.internal[mesh.face_owner(face)] * w + self.internal[nb] * (1.0 - w)
            }
            None => self.boundary_value(mesh, face),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::PolyMesh;

    fn mesh() -> PolyMesh {
        PolyMesh::structured([2, 1, 1], [2.0, 1.0, 1.0]).unwrap()
    }

    #[test]
    fn test_face_values() {
        let mesh = mesh();
        let mut f = ScalarField::from_values("k", UnitDim::K, &mesh, vec![1.0, 3.0]).unwrap();
        f.set_patch_by_name(&mesh, "xmin", BoundaryCondition::FixedValue(0.0))
            .unwrap();

        // 内部面中点插值
        assert!((f.face_value(&mesh, 0) - 2.0).abs() < 1e-12);

        for face in mesh.boundary_faces() {
            let expected = match mesh.patch_name(mesh.face_patch(face).unwrap()) {
                "xmin" => 0.0,
                _ => f.value(mesh.face_owner(face)),
            };
            assert_eq!(f.boundary_value(&mesh, face), expected);
        }
    }

    #[test]
    fn test_size_mismatch() {
        let mesh = mesh();
        let err = ScalarField::from_values("k", UnitDim::K, &mesh, vec![1.0]).unwrap_err();
        assert!(matches!(err, TcError::SizeMismatch { .. }));
    }

    #[test]
    fn test_bound_below() {
        let mesh = mesh();
        let mut f = ScalarField::from_values("nut", UnitDim::KINEMATIC_VISCOSITY, &mesh, vec![-1.0, 2.0])
            .unwrap();
        assert_eq!(f.bound_below(0.0), 1);
        assert_eq!(f.values(), &[0.0, 2.0]);
    }

    #[test]
    fn test_unknown_patch() {
        let mesh = mesh();
        let mut f = ScalarField::uniform("k", UnitDim::K, &mesh, 1.0);
        assert!(f
            .set_patch_by_name(&mesh, "inlet", BoundaryCondition::FixedValue(1.0))
            .is_err());
        assert!(f.set_boundary(99, BoundaryCondition::ZeroGradient).is_err());
    }

    #[test]
    fn test_stored_round_trip_checks_dimensions() {
        let mesh = mesh();
        let f = ScalarField::uniform("k", UnitDim::K, &mesh, 0.5)
            .with_boundary(0, BoundaryCondition::FixedValue(0.0));
        let stored = f.to_stored(&mesh);
        assert!(ScalarField::from_stored(stored.clone(), &mesh, UnitDim::EPSILON).is_err());
        let back = ScalarField::from_stored(stored, &mesh, UnitDim::K).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn test_vector_boundary_value() {
        let mesh = mesh();
        let mut u = VectorField::uniform("U", UnitDim::VELOCITY, &mesh, DVec3::X);
        u.set_patch_by_name(&mesh, "xmax", VectorBoundaryCondition::FixedValue(DVec3::ZERO))
            .unwrap();
        let xmax = mesh.find_patch("xmax").unwrap();
        let face = mesh
            .boundary_faces()
            .find(|&f| mesh.face_patch(f) == Some(xmax))
            .unwrap();
        assert_eq!(u.boundary_value(&mesh, face), DVec3::ZERO);
        assert_eq!(u.face_value(&mesh, 0), DVec3::X);
    }
}
