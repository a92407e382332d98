// crates/tc_fvm/tests/field_store.rs

//! 场存储集成测试

use tc_foundation::{TcError, UnitDim};
use tc_fvm::io::read_if_present;
use tc_fvm::prelude::*;
use tc_fvm::{JsonFieldStore, MemoryFieldStore, PolyMesh};

fn mesh() -> PolyMesh {
    PolyMesh::structured([3, 2, 1], [3.0, 2.0, 1.0]).unwrap()
}

#[test]
fn test_json_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = mesh();
    let mut store = JsonFieldStore::new(dir.path().join("fields")).unwrap();

    let values: Vec<f64> = (0..mesh.n_cells()).map(|c| c as f64 * 0.1).collect();
    let mut nut = ScalarField::from_values("nut", UnitDim::KINEMATIC_VISCOSITY, &mesh, values).unwrap();
    nut.set_patch_by_name(&mesh, "ymin", BoundaryCondition::FixedValue(0.0))
        .unwrap();

    store.save(nut.to_stored(&mesh)).unwrap();
    assert!(dir.path().join("fields").join("nut.json").exists());
    assert!(store.contains("nut").unwrap());
    assert!(!store.contains("k").unwrap());

    let back = read_if_present(&store, &mesh, "nut", UnitDim::KINEMATIC_VISCOSITY)
        .unwrap()
        .unwrap();
    assert_eq!(back, nut);
}

#[test]
fn test_missing_field_is_none() {
    let mesh = mesh();
    let store = MemoryFieldStore::new();
    assert!(read_if_present(&store, &mesh, "k", UnitDim::K).unwrap().is_none());
}

#[test]
fn test_wrong_dimensions_rejected() {
    let mesh = mesh();
    let k = ScalarField::uniform("k", UnitDim::K, &mesh, 1.0);
    let store = MemoryFieldStore::new().with_field(k.to_stored(&mesh));
    let err = read_if_present(&store, &mesh, "k", UnitDim::EPSILON).unwrap_err();
    assert!(matches!(err, TcError::DimensionMismatch { .. }));
}

#[test]
fn test_wrong_size_rejected() {
    let mesh = mesh();
    let small = PolyMesh::structured([1, 1, 1], [1.0; 3]).unwrap();
    let k = ScalarField::uniform("k", UnitDim::K, &small, 1.0);
    let store = MemoryFieldStore::new().with_field(k.to_stored(&small));
    let err = read_if_present(&store, &mesh, "k", UnitDim::K).unwrap_err();
    assert!(matches!(err, TcError::SizeMismatch { .. }));
}

#[test]
fn test_corrupt_file_is_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("k.json"), "{ not json").unwrap();
    let store = JsonFieldStore::new(dir.path()).unwrap();
    let err = store.load("k").unwrap_err();
    assert!(matches!(err, TcError::Serialization { .. }));
}
