// crates/tc_fvm/src/wall.rs

//! 壁面距离
//!
//! 每个单元到最近壁面的距离 y 及该壁面的单位法向（指向流体内部）。
//! 宿主可直接给出 y，也可以由指定的壁面 patch 计算。

use crate::fvc::cell_map;
use crate::mesh::FvMesh;
use glam::DVec3;
use tc_foundation::{TcError, TcResult};

/// 单元到最近壁面的距离
#[derive(Debug, Clone)]
pub struct WallDistance {
    y: Vec<f64>,
    n: Vec<DVec3>,
    wall_patches: Vec<usize>,
}

impl WallDistance {
    /// 由宿主给定的距离构造，法向未知时置零
    pub fn from_values(mesh: &dyn FvMesh, y: Vec<f64>) -> TcResult<Self> {
        TcError::check_size("y", mesh.n_cells(), y.len())?;
        if let Some(c) = y.iter().position(|v| !(v.is_finite() && *v >= 0.0)) {
            return Err(TcError::invalid_mesh(format!("单元 {c} 的壁面距离无效: {}", y[c])));
        }
        Ok(Self {
            n: vec![DVec3::ZERO; y.len()],
            y,
            wall_patches: Vec::new(),
        })
    }

    /// 所有单元取同一距离
    pub fn uniform(mesh: &dyn FvMesh, y: f64) -> TcResult<Self> {
        Self::from_values(mesh, vec![y; mesh.n_cells()])
    }

    /// 由壁面 patch 计算
    ///
    /// 对每个单元寻找中心距离最近的壁面，取到该面所在平面的法向距离。
    /// 计算量为 O(单元数 × 壁面数)。
    pub fn from_patches(mesh: &dyn FvMesh, patch_names: &[&str]) -> TcResult<Self> {
        let mut wall_patches = Vec::with_capacity(patch_names.len());
        for name in patch_names {
            let patch = mesh
                .find_patch(name)
                .ok_or_else(|| TcError::invalid_mesh(format!("不存在的壁面 patch: {name}")))?;
            wall_patches.push(patch);
        }

        let wall_faces: Vec<(DVec3, DVec3)> = mesh
            .boundary_faces()
            .filter(|&f| mesh.face_patch(f).is_some_and(|p| wall_patches.contains(&p)))
            .filter_map(|f| {
                let normal = -mesh.face_area_vector(f).try_normalize()?;
                Some((mesh.face_center(f), normal))
            })
            .collect();

        if wall_faces.is_empty() {
            return Err(TcError::invalid_mesh("壁面 patch 不含任何面"));
        }

        let nearest: Vec<(f64, DVec3)> = cell_map(mesh.n_cells(), |cell| {
            let c = mesh.cell_center(cell);
            let mut best = (f64::INFINITY, DVec3::ZERO, DVec3::ZERO);
            for &(fc, normal) in &wall_faces {
                let d2 = (c - fc).length_squared();
                if d2 < best.0 {
                    best = (d2, fc, normal);
                }
            }
            let (_, fc, normal) = best;
            ((c - fc).dot(normal).abs(), normal)
        });

        let (y, n) = nearest.into_iter().unzip();
        log::debug!("壁面距离: {} 个壁面, patch {:?}", wall_faces.len(), patch_names);
        Ok(Self { y, n, wall_patches })
    }

    /// 距离
    #[inline]
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// 壁面单位法向
    #[inline]
    pub fn n(&self) -> &[DVec3] {
        &self.n
    }

    /// 壁面 patch 编号
    #[inline]
    pub fn wall_patches(&self) -> &[usize] {
        &self.wall_patches
    }

    /// patch 是否为壁面
    #[inline]
    pub fn is_wall_patch(&self, patch: usize) -> bool {
        self.wall_patches.contains(&patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::PolyMesh;

    #[test]
    fn test_channel_wall_distance() {
        let mesh = PolyMesh::structured([2, 4, 1], [1.0, 2.0, 1.0]).unwrap();
        let wall = WallDistance::from_patches(&mesh, &["ymin", "ymax"]).unwrap();
        for cell in 0..mesh.n_cells() {
            let y = mesh.cell_center(cell).y;
            let expected = y.min(2.0 - y);
            assert!((wall.y()[cell] - expected).abs() < 1e-12);
        }
        // 下半部分法向朝 +y
        assert!((wall.n()[0] - DVec3::Y).length() < 1e-12);
        assert!(wall.is_wall_patch(mesh.find_patch("ymax").unwrap()));
        assert!(!wall.is_wall_patch(mesh.find_patch("xmin").unwrap()));
    }

    #[test]
    fn test_invalid_inputs() {
        let mesh = PolyMesh::structured([2, 1, 1], [1.0; 3]).unwrap();
        assert!(WallDistance::from_patches(&mesh, &["wall"]).is_err());
        assert!(WallDistance::from_values(&mesh, vec![1.0]).is_err());
        assert!(WallDistance::from_values(&mesh, vec![1.0, -1.0]).is_err());
        assert!(WallDistance::uniform(&mesh, 0.1).is_ok());
    }
}
