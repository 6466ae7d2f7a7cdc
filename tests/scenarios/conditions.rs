//! Test: Conditions - guards on steps and units

use crate::helpers::*;
use localci::core::{StepStatus, UnitStatus, Vendor};

#[tokio::test]
async fn test_false_step_condition_skips_but_succeeds() {
    let yaml = r#"
on: push
env:
  DEPLOY: "false"
jobs:
  release:
    steps:
      - name: Build
        run: echo build
      - name: Deploy
        if: ${{ env.DEPLOY == 'true' }}
        run: echo deploy
      - name: Notify
        run: echo notify
"#;

    let outcome = run_yaml(Vendor::GitHub, yaml).await;

    assert!(outcome.result.succeeded);
    assert_eq!(outcome.executed(), vec!["echo build", "echo notify"]);
    assert_eq!(
        outcome.step("Deploy").status,
        StepStatus::Skipped {
            reason: "condition `${{ env.DEPLOY == 'true' }}` is false".to_string()
        }
    );
}

#[tokio::test]
async fn test_false_job_condition_skips_the_job_only() {
    let yaml = r#"
on: push
jobs:
  docs:
    if: github.ref == 'refs/heads/gh-pages'
    steps:
      - run: echo docs
  test:
    steps:
      - run: echo test
"#;

    let outcome = run_yaml(Vendor::GitHub, yaml).await;

    assert!(outcome.result.succeeded);
    assert_eq!(outcome.executed(), vec!["echo test"]);
    assert!(matches!(outcome.unit("docs").status, UnitStatus::Skipped { .. }));
}

#[tokio::test]
async fn test_stage_condition_uses_stage_parent_scope() {
    let yaml = r#"
variables:
  RunDeploy: "no"
stages:
  - stage: Build
    jobs:
      - job: A
        steps:
          - script: echo build
  - stage: Deploy
    condition: eq(variables.RunDeploy, 'yes')
    jobs:
      - job: B
        steps:
          - script: echo deploy
"#;

    let outcome = run_yaml(Vendor::Azure, yaml).await;

    assert_eq!(outcome.executed(), vec!["echo build"]);
    assert!(matches!(outcome.unit("Deploy").status, UnitStatus::Skipped { .. }));
    assert!(outcome.result.succeeded);
}

#[tokio::test]
async fn test_unparseable_condition_falls_back_to_literal_text() {
    let yaml = r#"
variables:
  Enabled: "false"
  Other: "1"
steps:
  - script: echo first
    displayName: First
    condition: $(Enabled)
  - script: echo second
    displayName: Second
    condition: $(Other)
"#;

    let outcome = run_yaml(Vendor::Azure, yaml).await;

    assert_eq!(outcome.executed(), vec!["echo second"]);
    assert_skipped(outcome.step("First"));
}
