//! Test: Failure Handling - halting, continue-on-error and aborts

use crate::helpers::*;
use localci::core::{RunnerConfig, RunnerError, StepStatus, UnitStatus, Vendor};

#[tokio::test]
async fn test_failing_step_halts_its_job() {
    let yaml = r#"
on: push
jobs:
  build:
    steps:
      - name: A
        run: echo a
      - name: B
        run: fail here
      - name: C
        run: echo c
"#;

    let outcome = run_yaml(Vendor::GitHub, yaml).await;

    assert!(!outcome.result.succeeded);
    assert_eq!(outcome.executed(), vec!["echo a", "fail here"]);
    assert_eq!(outcome.step("B").status, StepStatus::Failed);
    assert_eq!(outcome.step("B").exit_code, Some(1));
    assert_eq!(
        outcome.step("C").status,
        StepStatus::Skipped {
            reason: "previous step failed".to_string()
        }
    );
    assert_unit_failed(outcome.unit("build"));
}

#[tokio::test]
async fn test_continue_on_error_keeps_going_but_fails_the_job() {
    let yaml = r#"
on: push
jobs:
  build:
    steps:
      - name: A
        run: echo a
      - name: B
        run: fail softly
        continue-on-error: true
      - name: C
        run: echo c
"#;

    let outcome = run_yaml(Vendor::GitHub, yaml).await;

    assert_eq!(outcome.executed(), vec!["echo a", "fail softly", "echo c"]);
    assert_eq!(outcome.step("B").status, StepStatus::Failed);
    assert_eq!(outcome.step("C").status, StepStatus::Succeeded);
    assert_unit_failed(outcome.unit("build"));
    assert!(!outcome.result.succeeded);
}

#[tokio::test]
async fn test_failed_job_skips_later_jobs() {
    let yaml = r#"
on: push
jobs:
  first:
    steps:
      - run: fail
  second:
    steps:
      - run: echo second
  cleanup:
    if: always()
    steps:
      - run: echo cleanup
"#;

    let outcome = run_yaml(Vendor::GitHub, yaml).await;

    assert_eq!(outcome.executed(), vec!["fail", "echo cleanup"]);
    assert_eq!(
        outcome.unit("second").status,
        UnitStatus::Skipped {
            reason: "previous unit failed".to_string()
        }
    );
    assert_eq!(outcome.unit("cleanup").status, UnitStatus::Succeeded);
    assert!(!outcome.result.succeeded);
}

#[tokio::test]
async fn test_status_functions_run_after_a_halt() {
    let yaml = r#"
steps:
  - script: fail build
    displayName: Build
  - script: echo report
    displayName: Report
    condition: failed()
  - script: echo publish
    displayName: Publish
    condition: succeeded()
  - script: echo always
    displayName: Always
    condition: always()
"#;

    let outcome = run_yaml(Vendor::Azure, yaml).await;

    assert_eq!(outcome.executed(), vec!["fail build", "echo report", "echo always"]);
    assert_skipped(outcome.step("Publish"));
    assert_eq!(outcome.step("Always").status, StepStatus::Succeeded);
}

#[tokio::test]
async fn test_codemagic_ignore_failure() {
    let yaml = r#"
workflows:
  app:
    scripts:
      - name: flaky
        script: fail sometimes
        ignore_failure: true
      - name: build
        script: echo build
"#;

    let outcome = run_yaml(Vendor::CodeMagic, yaml).await;

    assert_eq!(outcome.executed(), vec!["fail sometimes", "echo build"]);
    assert_eq!(outcome.step("build").status, StepStatus::Succeeded);
    assert!(!outcome.result.succeeded);
}

#[tokio::test]
async fn test_launch_failure_aborts_the_run() {
    let yaml = r#"
on: push
jobs:
  build:
    steps:
      - run: echo before
      - run: launch me
      - run: echo after
"#;
    let workflow = workflow(Vendor::GitHub, yaml);
    let scripts = MockScripts::failing_launch("launch");

    let err = run_workflow_with(&workflow, scripts.clone(), RunnerConfig::new())
        .await
        .err()
        .expect("launch failure should abort");

    assert!(matches!(err, RunnerError::ProcessLaunch { .. }));
    assert!(err.is_fatal());
    assert_eq!(scripts.scripts(), vec!["echo before"]);
}
