//! Test: Round Trip - repeated runs of one document agree

use crate::helpers::*;
use localci::core::{UnitResult, Vendor};

/// Result shape without timings or ids
fn shape(units: &[UnitResult]) -> Vec<String> {
    let mut out = Vec::new();
    for unit in units {
        out.push(format!("unit {} {:?}", unit.name, unit.status));
        for step in &unit.steps {
            out.push(format!(
                "  step {} {:?} {:?} {}",
                step.display_name, step.status, step.exit_code, step.stdout
            ));
        }
        out.extend(shape(&unit.children).into_iter().map(|line| format!("  {}", line)));
    }
    out
}

#[tokio::test]
async fn test_two_runs_have_identical_structure() {
    let yaml = r#"
variables:
  Name: world
stages:
  - stage: One
    jobs:
      - job: A
        steps:
          - script: echo hello $(Name)
          - script: fail now
          - script: echo never
  - stage: Two
    jobs:
      - job: B
        steps:
          - script: echo two
"#;
    let workflow = workflow(Vendor::Azure, yaml);

    let first = run_workflow(&workflow).await;
    let second = run_workflow(&workflow).await;

    assert_eq!(shape(&first.result.units), shape(&second.result.units));
    assert_eq!(first.result.succeeded, second.result.succeeded);
    assert_eq!(first.executed(), second.executed());
    assert_ne!(first.result.run_id, second.result.run_id);
}

#[tokio::test]
async fn test_document_normalizes_identically_twice() {
    let yaml = r#"
on: push
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - run: make
"#;
    assert_eq!(normalize(Vendor::GitHub, yaml), normalize(Vendor::GitHub, yaml));
}
