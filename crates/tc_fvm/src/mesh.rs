// crates/tc_fvm/src/mesh.rs

//! 有限体积网格接口
//!
//! 湍流模型只通过 [`FvMesh`] 访问网格几何与拓扑。
//! 约定：
//!
//! 1. 内部面编号在前（`0..n_internal_faces`），边界面在后
//! 2. 面积矢量 `Sf` 指向 owner 单元外侧
//! 3. 每个边界面属于且仅属于一个 patch
//!
//! [`PolyMesh`] 是接口的参考实现，[`StructuredMeshBuilder`] 生成 1D/2D/3D 均匀矩形网格，
//! 供测试与独立运行使用。

use glam::DVec3;
use std::ops::Range;
use tc_foundation::{TcError, TcResult};

/// 面距离下限，避免退化面导致扩散系数无穷大
const MIN_FACE_DISTANCE: f64 = 1e-30;

// ============================================================================
// 网格 trait
// ============================================================================

/// 有限体积网格接口
pub trait FvMesh: Send + Sync {
    /// 单元数量
    fn n_cells(&self) -> usize;

    /// 面数量（内部面 + 边界面）
    fn n_faces(&self) -> usize;

    /// 内部面数量
    fn n_internal_faces(&self) -> usize;

    /// 单元体积
    fn cell_volume(&self, cell: usize) -> f64;

    /// 单元中心
    fn cell_center(&self, cell: usize) -> DVec3;

    /// 单元关联的面
    fn cell_faces(&self, cell: usize) -> &[usize];

    /// 面的 owner 单元
    fn face_owner(&self, face: usize) -> usize;

    /// 面的 neighbour 单元（边界面为 None）
    fn face_neighbor(&self, face: usize) -> Option<usize>;

    /// 面积矢量（指向 owner 外侧，模长为面积）
    fn face_area_vector(&self, face: usize) -> DVec3;

    /// 面中心
    fn face_center(&self, face: usize) -> DVec3;

    /// 边界面所属 patch（内部面为 None）
    fn face_patch(&self, face: usize) -> Option<usize>;

    /// patch 数量
    fn n_patches(&self) -> usize;

    /// patch 名称
    fn patch_name(&self, patch: usize) -> &str;

    // ------------------------------------------------------------------------
    // 派生量
    // ------------------------------------------------------------------------

    /// 是否边界面
    #[inline]
    fn is_boundary_face(&self, face: usize) -> bool {
        face >= self.n_internal_faces()
    }

    /// 内部面范围
    #[inline]
    fn internal_faces(&self) -> Range<usize> {
        0..self.n_internal_faces()
    }

    /// 边界面范围
    #[inline]
    fn boundary_faces(&self) -> Range<usize> {
        self.n_internal_faces()..self.n_faces()
    }

    /// 面积
    #[inline]
    fn face_area(&self, face: usize) -> f64 {
        self.face_area_vector(face).length()
    }

    /// 按名称查找 patch
    fn find_patch(&self, name: &str) -> Option<usize> {
        (0..self.n_patches()).find(|&p| self.patch_name(p) == name)
    }

    /// 面的法向距离倒数 1/(n̂·d)
    ///
    /// 内部面 d 为两单元中心连线，边界面 d 为 owner 中心到面中心。
    fn delta_coeff(&self, face: usize) -> f64 {
        let sf = self.face_area_vector(face);
        let area = sf.length();
        if area <= 0.0 {
            return 0.0;
        }
        let n = sf / area;
        let owner_center = self.cell_center(self.face_owner(face));
        let d = match self.face_neighbor(face) {
            Some(nb) => self.cell_center(nb) - owner_center,
            None => self.face_center(face) - owner_center,
        };
        1.0 / n.dot(d).abs().max(MIN_FACE_DISTANCE)
    }

    /// 内部面 owner 侧线性插值权重
    ///
    /// φ_f = w φ_P + (1 - w) φ_N，边界面返回 1。
    fn face_weight(&self, face: usize) -> f64 {
        match self.face_neighbor(face) {
            Some(nb) => {
                let fc = self.face_center(face);
                let d_o = (fc - self.cell_center(self.face_owner(face))).length();
                let d_n = (fc - self.cell_center(nb)).length();
                let total = d_o + d_n;
                if total > MIN_FACE_DISTANCE {
                    d_n / total
                } else {
                    0.5
                }
            }
            None => 1.0,
        }
    }

    /// 计算域总体积
    fn total_volume(&self) -> f64 {
        (0..self.n_cells()).map(|c| self.cell_volume(c)).sum()
    }
}

// ============================================================================
// 参考实现
// ============================================================================

/// 多面体网格（参考实现）
#[derive(Debug, Clone)]
pub struct PolyMesh {
    cell_volumes: Vec<f64>,
    cell_centers: Vec<DVec3>,
    cell_faces: Vec<Vec<usize>>,
    face_owner: Vec<usize>,
    face_neighbor: Vec<Option<usize>>,
    face_area_vectors: Vec<DVec3>,
    face_centers: Vec<DVec3>,
    face_patch: Vec<Option<usize>>,
    n_internal_faces: usize,
    patch_names: Vec<String>,
}

/// 构造 [`PolyMesh`] 的原始数据
#[derive(Debug, Clone, Default)]
pub struct MeshParts {
    /// 单元体积
    pub cell_volumes: Vec<f64>,
    /// 单元中心
    pub cell_centers: Vec<DVec3>,
    /// 面 owner
    pub face_owner: Vec<usize>,
    /// 面 neighbour（内部面必须为 Some）
    pub face_neighbor: Vec<Option<usize>>,
    /// 面积矢量
    pub face_area_vectors: Vec<DVec3>,
    /// 面中心
    pub face_centers: Vec<DVec3>,
    /// 边界面所属 patch
    pub face_patch: Vec<Option<usize>>,
    /// patch 名称
    pub patch_names: Vec<String>,
}

impl PolyMesh {
    /// 从原始数据构造并校验拓扑
    pub fn from_parts(parts: MeshParts) -> TcResult<Self> {
        let n_cells = parts.cell_volumes.len();
        let n_faces = parts.face_owner.len();

        if n_cells == 0 {
            return Err(TcError::invalid_mesh("网格没有单元"));
        }
        TcError::check_size("cell_centers", n_cells, parts.cell_centers.len())?;
        TcError::check_size("face_neighbor", n_faces, parts.face_neighbor.len())?;
        TcError::check_size("face_area_vectors", n_faces, parts.face_area_vectors.len())?;
        TcError::check_size("face_centers", n_faces, parts.face_centers.len())?;
        TcError::check_size("face_patch", n_faces, parts.face_patch.len())?;

        if let Some(c) = parts
            .cell_volumes
            .iter()
            .position(|v| !(v.is_finite() && *v > 0.0))
        {
            return Err(TcError::invalid_mesh(format!("单元 {c} 体积非正")));
        }

        let n_internal_faces = parts
            .face_neighbor
            .iter()
            .position(|n| n.is_none())
            .unwrap_or(n_faces);

        let mut cell_faces = vec![Vec::new(); n_cells];
        for face in 0..n_faces {
            let owner = parts.face_owner[face];
            if owner >= n_cells {
                return Err(TcError::invalid_mesh(format!("面 {face} 的 owner 越界")));
            }
            cell_faces[owner].push(face);

            match (parts.face_neighbor[face], parts.face_patch[face]) {
                (Some(nb), None) if face < n_internal_faces => {
                    if nb >= n_cells || nb == owner {
                        return Err(TcError::invalid_mesh(format!(
                            "面 {face} 的 neighbour 无效"
                        )));
                    }
                    cell_faces[nb].push(face);
                }
                (None, Some(patch)) if face >= n_internal_faces => {
                    if patch >= parts.patch_names.len() {
                        return Err(TcError::invalid_mesh(format!(
                            "面 {face} 的 patch 越界"
                        )));
                    }
                }
                _ => {
                    return Err(TcError::invalid_mesh(format!(
                        "面 {face} 违反内部面在前、边界面带 patch 的约定"
                    )));
                }
            }
        }

        Ok(Self {
            cell_volumes: parts.cell_volumes,
            cell_centers: parts.cell_centers,
            cell_faces,
            face_owner: parts.face_owner,
            face_neighbor: parts.face_neighbor,
            face_area_vectors: parts.face_area_vectors,
            face_centers: parts.face_centers,
            face_patch: parts.face_patch,
            n_internal_faces,
            patch_names: parts.patch_names,
        })
    }

    /// 均匀矩形网格
    pub fn structured(cells: [usize; 3], lengths: [f64; 3]) -> TcResult<Self> {
        StructuredMeshBuilder::new(cells).lengths(lengths).build()
    }
}

impl FvMesh for PolyMesh {
    #[inline]
    fn n_cells(&self) -> usize {
        self.cell_volumes.len()
    }

    #[inline]
    fn n_faces(&self) -> usize {
        self.face_owner.len()
    }

    #[inline]
    fn n_internal_faces(&self) -> usize {
        self.n_internal_faces
    }

    #[inline]
    fn cell_volume(&self, cell: usize) -> f64 {
        self.cell_volumes[cell]
    }

    #[inline]
    fn cell_center(&self, cell: usize) -> DVec3 {
        self.cell_centers[cell]
    }

    #[inline]
    fn cell_faces(&self, cell: usize) -> &[usize] {
        &self.cell_faces[cell]
    }

    #[inline]
    fn face_owner(&self, face: usize) -> usize {
        self.face_owner[face]
    }

    #[inline]
    fn face_neighbor(&self, face: usize) -> Option<usize> {
        self.face_neighbor[face]
    }

    #[inline]
    fn face_area_vector(&self, face: usize) -> DVec3 {
        self.face_area_vectors[face]
    }

    #[inline]
    fn face_center(&self, face: usize) -> DVec3 {
        self.face_centers[face]
    }

    #[inline]
    fn face_patch(&self, face: usize) -> Option<usize> {
        self.face_patch[face]
    }

    #[inline]
    fn n_patches(&self) -> usize {
        self.patch_names.len()
    }

    #[inline]
    fn patch_name(&self, patch: usize) -> &str {
        &self.patch_names[patch]
    }
}

// ============================================================================
// 结构化网格构建器
// ============================================================================

/// 矩形盒网格 patch 名称，按 x-/x+/y-/y+/z-/z+ 顺序
pub const BOX_PATCHES: [&str; 6] = ["xmin", "xmax", "ymin", "ymax", "zmin", "zmax"];

/// 均匀矩形网格构建器
///
/// 单元编号 `i + nx*(j + ny*k)`，始终生成六个 patch（见 [`BOX_PATCHES`]）。
/// 某方向只有一层单元时即退化为 2D/1D 网格，该方向两侧 patch 取零梯度即可。
#[derive(Debug, Clone)]
pub struct StructuredMeshBuilder {
    cells: [usize; 3],
    lengths: [f64; 3],
    origin: DVec3,
}

impl StructuredMeshBuilder {
    /// 指定各方向单元数，默认单位立方体
    pub fn new(cells: [usize; 3]) -> Self {
        Self {
            cells,
            lengths: [1.0; 3],
            origin: DVec3::ZERO,
        }
    }

    /// 设置各方向长度
    pub fn lengths(mut self, lengths: [f64; 3]) -> Self {
        self.lengths = lengths;
        self
    }

    /// 设置原点
    pub fn origin(mut self, origin: DVec3) -> Self {
        self.origin = origin;
        self
    }

    /// 生成网格
    pub fn build(&self) -> TcResult<PolyMesh> {
        let [nx, ny, nz] = self.cells;
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(TcError::invalid_mesh("各方向单元数必须大于 0"));
        }
        if self.lengths.iter().any(|l| !(l.is_finite() && *l > 0.0)) {
            return Err(TcError::invalid_mesh("各方向长度必须为正"));
        }

        let h = DVec3::new(
            self.lengths[0] / nx as f64,
            self.lengths[1] / ny as f64,
            self.lengths[2] / nz as f64,
        );
        let idx = |i: usize, j: usize, k: usize| i + nx * (j + ny * k);
        let center = |i: usize, j: usize, k: usize| {
            self.origin + DVec3::new(i as f64 + 0.5, j as f64 + 0.5, k as f64 + 0.5) * h
        };
        let areas = DVec3::new(h.y * h.z, h.x * h.z, h.x * h.y);
        let n_cells = nx * ny * nz;

        let mut parts = MeshParts {
            cell_volumes: vec![h.x * h.y * h.z; n_cells],
            cell_centers: vec![DVec3::ZERO; n_cells],
            patch_names: BOX_PATCHES.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    parts.cell_centers[idx(i, j, k)] = center(i, j, k);
                }
            }
        }

        let mut push_face =
            |owner: usize, neighbor: Option<usize>, sf: DVec3, fc: DVec3, patch: Option<usize>| {
                parts.face_owner.push(owner);
                parts.face_neighbor.push(neighbor);
                parts.face_area_vectors.push(sf);
                parts.face_centers.push(fc);
                parts.face_patch.push(patch);
            };

        // 内部面
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let c = idx(i, j, k);
                    let cc = center(i, j, k);
                    if i + 1 < nx {
                        let fc = cc + DVec3::new(0.5 * h.x, 0.0, 0.0);
                        push_face(c, Some(idx(i + 1, j, k)), DVec3::X * areas.x, fc, None);
                    }
                    if j + 1 < ny {
                        let fc = cc + DVec3::new(0.0, 0.5 * h.y, 0.0);
                        push_face(c, Some(idx(i, j + 1, k)), DVec3::Y * areas.y, fc, None);
                    }
                    if k + 1 < nz {
                        let fc = cc + DVec3::new(0.0, 0.0, 0.5 * h.z);
                        push_face(c, Some(idx(i, j, k + 1)), DVec3::Z * areas.z, fc, None);
                    }
                }
            }
        }

        // 边界面，按 patch 顺序
        for k in 0..nz {
            for j in 0..ny {
                let c = idx(0, j, k);
                push_face(c, None, -DVec3::X * areas.x, center(0, j, k) - DVec3::X * 0.5 * h.x, Some(0));
            }
        }
        for k in 0..nz {
            for j in 0..ny {
                let c = idx(nx - 1, j, k);
                push_face(c, None, DVec3::X * areas.x, center(nx - 1, j, k) + DVec3::X * 0.5 * h.x, Some(1));
            }
        }
        for k in 0..nz {
            for i in 0..nx {
                let c = idx(i, 0, k);
                push_face(c, None, -DVec3::Y * areas.y, center(i, 0, k) - DVec3::Y * 0.5 * h.y, Some(2));
            }
        }
        for k in 0..nz {
            for i in 0..nx {
                let c = idx(i, ny - 1, k);
                push_face(c, None, DVec3::Y * areas.y, center(i, ny - 1, k) + DVec3::Y * 0.5 * h.y, Some(3));
            }
        }
        for j in 0..ny {
            for i in 0..nx {
                let c = idx(i, j, 0);
                push_face(c, None, -DVec3::Z * areas.z, center(i, j, 0) - DVec3::Z * 0.5 * h.z, Some(4));
            }
        }
        for j in 0..ny {
            for i in 0..nx {
                let c = idx(i, j, nz - 1);
                push_face(c, None, DVec3::Z * areas.z, center(i, j, nz - 1) + DVec3::Z * 0.5 * h.z, Some(5));
            }
        }

        PolyMesh::from_parts(parts)
    }
}
