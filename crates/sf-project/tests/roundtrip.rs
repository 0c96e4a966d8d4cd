use sf_project::schema::*;
use sf_project::{
    ProjectError, ValidationError, load_case, load_json, load_yaml, save_json, save_yaml,
    validate_case,
};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("sf_project_{}_{name}", std::process::id()))
}

#[test]
fn roundtrip_yaml_reference_case() {
    let case = CaseDef::reference("Reference");
    validate_case(&case).unwrap();

    let path = temp_path("reference.yaml");
    save_yaml(&path, &case).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(case, loaded);
}

#[test]
fn roundtrip_json_with_gas_turbine() {
    let mut case = CaseDef::reference("With turbine");
    case.gas_turbine = Some(GasTurbineDef::FixedTemperatures {
        pressure_ratio: 3.5,
        compressor_outlet_temperature_k: 1173.15,
        turbine_inlet_temperature_k: 1473.15,
        turbine_outlet_temperature_k: 873.15,
    });
    case.reformer.model = ReformerModelDef::GibbsEquilibrium;
    case.stack.temperature_k = Some(1073.15);

    let path = temp_path("turbine.json");
    save_json(&path, &case).unwrap();
    let loaded = load_json(&path).unwrap();
    assert_eq!(case, loaded);

    // dispatch by extension
    assert_eq!(load_case(&path).unwrap(), case);
}

#[test]
fn save_refuses_invalid_case() {
    let mut case = CaseDef::reference("Invalid");
    case.recuperator.effectiveness = 1.5;
    let path = temp_path("invalid.yaml");
    let err = save_yaml(&path, &case).unwrap_err();
    assert!(matches!(err, ProjectError::Validation(_)));
}

#[test]
fn load_reports_unknown_species() {
    let text = r#"
version: 1
name: Bad air
stack:
  cells: 10
  cell_area_m2: 0.1
  asr_ohm_m2: 1.0e-5
  dg_a_j_per_mol: 242000.0
  dg_b_j_per_mol_k: 45.8
  v_floor: 0.3
  target_utilization: 0.75
  utilization_tol: 0.01
  max_iterations: 100
  lhv_method: stoichiometric
  cathode_air:
    temperature_k: 1073.15
    pressure_pa: 101325.0
    mass_flow_kg_s: 0.5
    composition:
      fractions:
        O2: 0.21
        NE: 0.79
"#;
    let path = temp_path("bad_air.yaml");
    std::fs::write(&path, text).unwrap();
    let err = load_yaml(&path).unwrap_err();
    match err {
        ProjectError::Validation(ValidationError::UnknownSpecies { name, context }) => {
            assert_eq!(name, "NE");
            assert_eq!(context, "stack.cathode_air.composition");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_yaml_is_a_yaml_error() {
    let path = temp_path("malformed.yaml");
    std::fs::write(&path, "version: [1\nname: x\n").unwrap();
    assert!(matches!(load_yaml(&path), Err(ProjectError::Yaml(_))));
    assert!(matches!(
        load_yaml(&temp_path("missing.yaml")),
        Err(ProjectError::Io(_))
    ));
}
