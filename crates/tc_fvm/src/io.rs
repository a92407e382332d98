// crates/tc_fvm/src/io.rs

//! 场的持久化接口
//!
//! 湍流模型构造时尝试从 [`FieldStore`] 读取已有场（重启），
//! 找不到时使用默认初值；`write` 时把输运量和 ν_t 写回存储。

use crate::field::{BoundaryCondition, ScalarField};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tc_foundation::{TcError, TcResult, UnitDim};

/// 场的存储记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredField {
    /// 场名称
    pub name: String,
    /// 量纲
    pub dimensions: UnitDim,
    /// 单元值
    pub internal: Vec<f64>,
    /// 按 patch 名称记录的边界条件
    #[serde(default)]
    pub boundary: BTreeMap<String, BoundaryCondition>,
}

/// 场存储后端
pub trait FieldStore {
    /// 读取场，不存在时返回 `Ok(None)`
    fn load(&self, name: &str) -> TcResult<Option<StoredField>>;

    /// 保存场（覆盖同名记录）
    fn save(&mut self, field: StoredField) -> TcResult<()>;

    /// 是否存在
    fn contains(&self, name: &str) -> TcResult<bool> {
        Ok(self.load(name)?.is_some())
    }
}

/// 内存存储
#[derive(Debug, Default, Clone)]
pub struct MemoryFieldStore {
    fields: HashMap<String, StoredField>,
}

impl MemoryFieldStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入场（测试与宿主预置初值用）
    pub fn with_field(mut self, field: StoredField) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// 记录数量
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 已存储的场名称
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FieldStore for MemoryFieldStore {
    fn load(&self, name: &str) -> TcResult<Option<StoredField>> {
        Ok(self.fields.get(name).cloned())
    }

    fn save(&mut self, field: StoredField) -> TcResult<()> {
        self.fields.insert(field.name.clone(), field);
        Ok(())
    }
}

/// JSON 文件存储，每个场一个 `<name>.json`
#[derive(Debug, Clone)]
pub struct JsonFieldStore {
    dir: PathBuf,
}

impl JsonFieldStore {
    /// 创建存储，目录不存在时自动创建
    pub fn new(dir: impl Into<PathBuf>) -> TcResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| TcError::io_with_source(format!("无法创建目录 {}", dir.display()), e))?;
        Ok(Self { dir })
    }

    /// 存储目录
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn field_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl FieldStore for JsonFieldStore {
    fn load(&self, name: &str) -> TcResult<Option<StoredField>> {
        let path = self.field_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| TcError::io_with_source(format!("读取 {} 失败", path.display()), e))?;
        let field: StoredField = serde_json::from_str(&content)
            .map_err(|e| TcError::serialization(format!("{}: {e}", path.display())))?;
        if field.name != name {
            return Err(TcError::serialization(format!(
                "{} 中的场名称为 {}，期望 {name}",
                path.display(),
                field.name
            )));
        }
        Ok(Some(field))
    }

    fn save(&mut self, field: StoredField) -> TcResult<()> {
        let path = self.field_path(&field.name);
        let content = serde_json::to_string_pretty(&field)
            .map_err(|e| TcError::serialization(e.to_string()))?;
        std::fs::write(&path, content)
            .map_err(|e| TcError::io_with_source(format!("写入 {} 失败", path.display()), e))
    }
}

/// 读取场并按网格与量纲校验，不存在时返回 `Ok(None)`
pub fn read_if_present(
    store: &dyn FieldStore,
    mesh: &dyn crate::mesh::FvMesh,
    name: &str,
    dimensions: UnitDim,
) -> TcResult<Option<ScalarField>> {
    match store.load(name)? {
        Some(stored) => {
            log::info!("从存储读取场 {name}");
            ScalarField::from_stored(stored, mesh, dimensions).map(Some)
        }
        None => Ok(None),
    }
}
