//! Test: Azure Substitution - `$(Name)` macros

use crate::helpers::*;
use localci::core::{StepStatus, Vendor};

#[tokio::test]
async fn test_macros_expand_and_unknown_names_stay() {
    let yaml = r#"
variables:
  Foo: bar
steps:
  - script: echo $(Foo)
  - script: echo $(Missing)
"#;

    let outcome = run_yaml(Vendor::Azure, yaml).await;

    assert!(outcome.result.succeeded);
    assert_eq!(outcome.executed(), vec!["echo bar", "echo $(Missing)"]);
}

#[tokio::test]
async fn test_predefined_variables_point_at_workspace() {
    let yaml = r#"
steps:
  - script: cd $(Build.SourcesDirectory) && ls $(System.DefaultWorkingDirectory)
"#;

    let outcome = run_yaml(Vendor::Azure, yaml).await;

    assert_eq!(outcome.executed(), vec!["cd /ws && ls /ws"]);
    assert_eq!(outcome.env_of(0, "TF_BUILD").as_deref(), Some("True"));
    assert_eq!(outcome.env_of(0, "BUILD_SOURCESDIRECTORY").as_deref(), Some("/ws"));
}

#[tokio::test]
async fn test_variables_referencing_agent_variables_are_expanded() {
    let yaml = r#"
variables:
  outDir: $(Build.ArtifactStagingDirectory)/out
stages:
  - stage: Build
    variables:
      logDir: $(outDir)/logs
    jobs:
      - job: Compile
        variables:
          report: $(logDir)/report.txt
        steps:
          - script: echo $(outDir) $(report)
"#;

    let outcome = run_yaml(Vendor::Azure, yaml).await;
    let out_dir = format!(
        "{}/out",
        std::path::Path::new("/ws").join(".localci").join("artifacts").display()
    );
    let report = format!("{}/logs/report.txt", out_dir);

    assert_eq!(outcome.executed(), vec![format!("echo {} {}", out_dir, report)]);
    assert_eq!(outcome.env_of(0, "OUTDIR").as_deref(), Some(out_dir.as_str()));
    assert_eq!(outcome.env_of(0, "REPORT").as_deref(), Some(report.as_str()));
}

#[tokio::test]
async fn test_macros_fall_back_to_host_environment() {
    std::env::set_var("LOCALCI_SCENARIO_HOST_VALUE", "fromhost");
    let yaml = r#"
variables:
  Foo: bar
steps:
  - script: echo $(LOCALCI_SCENARIO_HOST_VALUE) $(Foo)
"#;

    let outcome = run_yaml(Vendor::Azure, yaml).await;

    assert_eq!(outcome.executed(), vec!["echo fromhost bar"]);
}

#[tokio::test]
async fn test_step_env_values_are_expanded() {
    let yaml = r#"
variables:
  Foo: bar
steps:
  - bash: echo "$OUT"
    env:
      OUT: $(Foo)-suffix
"#;

    let outcome = run_yaml(Vendor::Azure, yaml).await;

    assert_eq!(outcome.env_of(0, "OUT").as_deref(), Some("bar-suffix"));
    assert_eq!(outcome.executed(), vec![r#"echo "$OUT""#]);
}

#[tokio::test]
async fn test_conditions_read_variables() {
    let yaml = r#"
variables:
  Foo: bar
steps:
  - script: echo matched
    displayName: Matched
    condition: eq(variables['Foo'], 'bar')
  - script: echo other
    displayName: Other
    condition: and(succeeded(), eq(variables.Foo, 'baz'))
"#;

    let outcome = run_yaml(Vendor::Azure, yaml).await;

    assert_eq!(outcome.executed(), vec!["echo matched"]);
    assert_eq!(outcome.step("Matched").status, StepStatus::Succeeded);
    assert_skipped(outcome.step("Other"));
    assert!(outcome.result.succeeded);
}

#[tokio::test]
async fn test_tasks_and_templates_are_not_executed() {
    let yaml = r#"
steps:
  - checkout: self
  - task: NodeTool@0
    inputs:
      versionSpec: 20.x
  - template: steps/common.yml
  - script: echo done
"#;

    let outcome = run_yaml(Vendor::Azure, yaml).await;

    assert_eq!(outcome.executed(), vec!["echo done"]);
    let statuses: Vec<_> = outcome.steps().iter().map(|s| s.status.clone()).collect();
    assert_eq!(
        statuses,
        vec![
            StepStatus::Simulated,
            StepStatus::Simulated,
            StepStatus::Simulated,
            StepStatus::Succeeded
        ]
    );
}
