use std::path::Path;

#[test]
fn bundled_cases_load_and_validate() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../cases");
    let cases = ["reference_plant.yaml", "gibbs_reformer.yaml"];

    for name in cases {
        let path = root.join(name);
        let case = sf_project::load_yaml(&path)
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        sf_project::validate_case(&case)
            .unwrap_or_else(|e| panic!("Failed to validate {}: {}", name, e));
    }
}
