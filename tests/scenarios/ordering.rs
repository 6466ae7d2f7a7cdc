//! Test: Ordering - steps and units run in declaration order

use crate::helpers::*;
use localci::core::Vendor;

#[tokio::test]
async fn test_github_jobs_and_steps_run_in_declaration_order() {
    let yaml = r#"
on: push
jobs:
  lint:
    steps:
      - run: echo lint-1
      - run: echo lint-2
  test:
    needs: lint
    steps:
      - run: echo test-1
  build:
    steps:
      - run: echo build-1
"#;

    let outcome = run_yaml(Vendor::GitHub, yaml).await;

    assert!(outcome.result.succeeded);
    assert_eq!(
        outcome.executed(),
        vec!["echo lint-1", "echo lint-2", "echo test-1", "echo build-1"]
    );
    let recorded: Vec<_> = outcome.steps().iter().map(|s| s.display_name.clone()).collect();
    assert_eq!(recorded, vec!["echo lint-1", "echo lint-2", "echo test-1", "echo build-1"]);
}

#[tokio::test]
async fn test_azure_stages_recurse_before_the_next_stage() {
    let yaml = r#"
stages:
  - stage: Build
    jobs:
      - job: Linux
        steps:
          - script: echo linux
      - job: Mac
        steps:
          - script: echo mac
  - stage: Deploy
    dependsOn: Build
    jobs:
      - job: Ship
        steps:
          - script: echo ship
"#;

    let outcome = run_yaml(Vendor::Azure, yaml).await;

    assert!(outcome.result.succeeded);
    assert_eq!(outcome.executed(), vec!["echo linux", "echo mac", "echo ship"]);
    let stages: Vec<_> = outcome.result.units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(stages, vec!["Build", "Deploy"]);
    assert_eq!(outcome.unit("Build").children.len(), 2);
}

#[tokio::test]
async fn test_unit_events_bracket_their_steps() {
    use localci::execution::ExecutionEvent;

    let yaml = "steps:\n  - script: echo one\n  - script: echo two\n";
    let outcome = run_yaml(Vendor::Azure, yaml).await;

    let labels: Vec<String> = outcome
        .events
        .iter()
        .map(|event| match event {
            ExecutionEvent::WorkflowStarted { .. } => "workflow:start".to_string(),
            ExecutionEvent::UnitStarted { depth, .. } => format!("unit:start:{}", depth),
            ExecutionEvent::UnitFinished { depth, .. } => format!("unit:end:{}", depth),
            ExecutionEvent::StepStarted { display_name, .. } => format!("step:{}", display_name),
            ExecutionEvent::StepFinished { .. } => "step:done".to_string(),
            ExecutionEvent::WorkflowFinished { .. } => "workflow:end".to_string(),
            other => format!("{:?}", other),
        })
        .collect();

    assert_eq!(
        labels,
        vec![
            "workflow:start",
            "unit:start:0",
            "unit:start:1",
            "step:echo one",
            "step:done",
            "step:echo two",
            "step:done",
            "unit:end:1",
            "unit:end:0",
            "workflow:end",
        ]
    );
}
