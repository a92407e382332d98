// crates/tc_turbulence/tests/lifecycle.rs

//! 模型生命周期测试：工厂、跳过、重复修正、重读系数、写出

use glam::DVec3;
use std::sync::Arc;
use tc_config::{CoeffDict, TurbulenceProperties};
use tc_foundation::{TcError, UnitDim};
use tc_fvm::prelude::*;
use tc_fvm::{fvc, JsonFieldStore, MemoryFieldStore, PolyMesh};
use tc_turbulence::prelude::*;
use tc_turbulence::models::KOmegaSstDes;
use tc_turbulence::ModelState;

struct Case {
    mesh: Arc<dyn FvMesh>,
    ctx: ModelContext,
    u: VectorField,
    phi: Vec<f64>,
}

/// 底面为壁面的剪切流 U = (y, 0, 0)
fn channel() -> Case {
    let mesh: Arc<dyn FvMesh> = Arc::new(PolyMesh::structured([4, 4, 1], [1.0, 1.0, 0.25]).unwrap());
    let wall = Arc::new(WallDistance::from_patches(mesh.as_ref(), &["ymin"]).unwrap());
    let ctx = ModelContext::with_uniform_nu(mesh.clone(), wall, 1e-3).unwrap();

    let values = (0..mesh.n_cells())
        .map(|c| DVec3::new(mesh.cell_center(c).y, 0.0, 0.0))
        .collect();
    let mut u = VectorField::from_values("U", UnitDim::VELOCITY, mesh.as_ref(), values).unwrap();
    u.set_patch_by_name(mesh.as_ref(), "ymin", VectorBoundaryCondition::FixedValue(DVec3::ZERO))
        .unwrap();
    let phi = fvc::flux(mesh.as_ref(), &u);
    Case { mesh, ctx, u, phi }
}

fn snapshot(model: &dyn ClosureModel) -> Vec<Vec<u64>> {
    let mut fields: Vec<&ScalarField> = model.transported_fields();
    fields.push(model.nut());
    fields.push(model.k());
    fields.push(model.epsilon());
    if let Some(region) = model.les_region() {
        fields.push(region);
    }
    fields
        .into_iter()
        .map(|f| bits(f.values()))
        .collect()
}

fn bits(values: &[f64]) -> Vec<u64> {
    values.iter().map(|v| v.to_bits()).collect()
}

#[test]
fn test_every_model_constructs_and_corrects() {
    for kind in ModelKind::ALL {
        let case = channel();
        let props = TurbulenceProperties::new(kind.tag());
        let mut model = new_model(&props, case.ctx.clone(), None).unwrap();
        assert_eq!(model.name(), kind.tag());
        assert_eq!(model.state(), ModelState::Ready);
        assert_eq!(model.les_region().is_some(), kind.is_hybrid(), "{kind}");

        let flow = FlowState::new(&case.u, &case.phi, 1).with_dt(0.01);
        let report = model.correct(&flow).unwrap();
        assert!(!report.skipped);
        assert_eq!(report.equations.len(), model.transported_fields().len(), "{kind}");
        assert_eq!(model.state(), ModelState::Ready);

        for field in model.transported_fields() {
            assert!(field.values().iter().all(|v| v.is_finite() && *v >= 0.0), "{kind}: {}", field.name());
        }
        for field in [model.nut(), model.k(), model.epsilon()] {
            assert!(field.values().iter().all(|v| v.is_finite() && *v >= 0.0), "{kind}: {}", field.name());
        }
        if let Some(region) = model.les_region() {
            assert!(region.values().iter().all(|r| (0.0..=1.0).contains(r)));
        }
        assert_eq!(model.effective_diffusivities().len(), model.transported_fields().len());
        assert_eq!(model.mesh().n_cells(), case.mesh.n_cells());
    }
}

#[test]
fn test_unknown_tag_lists_available_models() {
    let case = channel();
    let props = TurbulenceProperties::new("kEpsilonLaunder");
    let err = new_model(&props, case.ctx, None).err().unwrap();
    match err {
        TcError::UnknownModel { name, available } => {
            assert_eq!(name, "kEpsilonLaunder");
            assert!(available.iter().any(|t| t == "kOmegaSSTDES"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_invalid_configuration_is_fatal() {
    let case = channel();
    let props = TurbulenceProperties::new("SpalartAllmaras").with_relaxation("nuTilda", 1.5);
    assert!(new_model(&props, case.ctx.clone(), None).is_err());

    let mut props = TurbulenceProperties::new("SpalartAllmaras");
    props.coeffs = CoeffDict::from_json_str(r#"{"Cb1": "large"}"#).unwrap();
    assert!(new_model(&props, case.ctx, None).is_err());
}

#[test]
fn test_disabled_correction_leaves_fields_untouched() {
    for tag in ["SpalartAllmarasDES", "kkl", "kOmegaSSTDES"] {
        let case = channel();
        let mut model = new_model(&TurbulenceProperties::new(tag), case.ctx.clone(), None).unwrap();
        let before = snapshot(model.as_ref());

        let flow = FlowState::new(&case.u, &case.phi, 1).with_correction(false);
        let report = model.correct(&flow).unwrap();
        assert!(report.skipped);
        assert!(report.equations.is_empty());
        assert_eq!(snapshot(model.as_ref()), before, "{tag}");

        // 属性中关闭湍流同样跳过
        let mut props = TurbulenceProperties::new(tag);
        props.turbulence = false;
        let mut model = new_model(&props, case.ctx, None).unwrap();
        let before = snapshot(model.as_ref());
        let report = model.correct(&FlowState::new(&case.u, &case.phi, 1)).unwrap();
        assert!(report.skipped);
        assert_eq!(snapshot(model.as_ref()), before, "{tag}");
    }
}

#[test]
fn test_skipped_correction_keeps_hybrid_and_blend_fields() {
    for tag in ["SpalartAllmarasDES", "WrayAgarwalDES", "kOmegaSSTDES"] {
        let case = channel();
        let mut model = new_model(&TurbulenceProperties::new(tag), case.ctx.clone(), None).unwrap();
        model
            .correct(&FlowState::new(&case.u, &case.phi, 1).with_dt(0.01))
            .unwrap();
        let region = bits(model.les_region().unwrap().values());

        let flow = FlowState::new(&case.u, &case.phi, 2).with_correction(false);
        assert!(model.correct(&flow).unwrap().skipped);
        assert_eq!(bits(model.les_region().unwrap().values()), region, "{tag}");
    }

    // SST 的 F1 混合场
    let case = channel();
    let props = TurbulenceProperties::new("kOmegaSSTDES");
    let mut model = KOmegaSstDes::new(&props, case.ctx, None).unwrap();
    model
        .correct(&FlowState::new(&case.u, &case.phi, 1).with_dt(0.01))
        .unwrap();
    let f1 = bits(model.f1().values());
    let before = snapshot(&model);

    let flow = FlowState::new(&case.u, &case.phi, 2).with_correction(false);
    assert!(model.correct(&flow).unwrap().skipped);
    assert_eq!(bits(model.f1().values()), f1);
    assert_eq!(snapshot(&model), before);
}

#[test]
fn test_repeated_time_index_is_rejected() {
    let case = channel();
    let mut model = new_model(&TurbulenceProperties::new("WrayAgarwal2018"), case.ctx, None).unwrap();
    model
        .correct(&FlowState::new(&case.u, &case.phi, 7).with_dt(0.01))
        .unwrap();
    let after_first = snapshot(model.as_ref());

    let err = model
        .correct(&FlowState::new(&case.u, &case.phi, 7).with_dt(0.01))
        .unwrap_err();
    assert!(matches!(err, TcError::AlreadyCorrected { time_index: 7 }));
    assert_eq!(snapshot(model.as_ref()), after_first);
    assert_eq!(model.state(), ModelState::Ready);

    // 下一时间步正常
    assert!(model
        .correct(&FlowState::new(&case.u, &case.phi, 8).with_dt(0.01))
        .is_ok());
}

#[test]
fn test_flux_size_mismatch_is_rejected() {
    let case = channel();
    let mut model = new_model(&TurbulenceProperties::new("kklARSM"), case.ctx, None).unwrap();
    let short_phi = vec![0.0; 3];
    let err = model.correct(&FlowState::new(&case.u, &short_phi, 1)).unwrap_err();
    assert!(matches!(err, TcError::SizeMismatch { .. }));
}

#[test]
fn test_read_detects_coefficient_changes() {
    let case = channel();
    let props = TurbulenceProperties::new("SpalartAllmaras");
    let mut model = new_model(&props, case.ctx, None).unwrap();

    assert!(!model.read(&props).unwrap());
    let changed = props.clone().with_coeff("Cb1", 0.2);
    assert!(model.read(&changed).unwrap());
    assert!(!model.read(&changed).unwrap());

    let mut broken = changed.clone();
    broken.coeffs = CoeffDict::from_json_str(r#"{"Cb1": "x"}"#).unwrap();
    assert!(model.read(&broken).is_err());
    // 失败的重读不改变已记录的配置
    assert!(!model.read(&changed).unwrap());
}

#[test]
fn test_restart_from_written_fields() {
    let case = channel();
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonFieldStore::new(dir.path()).unwrap();

    let props = TurbulenceProperties::new("kOmegaSSTDES");
    let mut model = new_model(&props, case.ctx.clone(), None).unwrap();
    model
        .correct(&FlowState::new(&case.u, &case.phi, 1).with_dt(0.01))
        .unwrap();
    model.write(&mut store).unwrap();
    for name in ["k", "omega", "nut"] {
        assert!(dir.path().join(format!("{name}.json")).exists(), "{name}");
    }

    let restarted = new_model(&props, case.ctx, Some(&store)).unwrap();
    assert_eq!(restarted.k().values(), model.k().values());
    assert_eq!(
        restarted.transported_fields()[1].values(),
        model.transported_fields()[1].values()
    );
}

#[test]
fn test_loaded_field_with_wrong_dimensions_is_rejected() {
    let case = channel();
    let wrong = ScalarField::uniform("nuTilda", UnitDim::K, case.mesh.as_ref(), 1e-4);
    let store = MemoryFieldStore::new().with_field(wrong.to_stored(case.mesh.as_ref()));
    let props = TurbulenceProperties::new("SpalartAllmaras");
    let err = new_model(&props, case.ctx, Some(&store)).err().unwrap();
    assert!(matches!(err, TcError::DimensionMismatch { .. }));
}
