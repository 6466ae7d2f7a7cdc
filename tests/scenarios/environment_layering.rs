//! Test: Environment Layering - inner scopes override outer ones

use crate::helpers::*;
use localci::core::{EnvMap, RunnerConfig, Vendor};

#[tokio::test]
async fn test_step_override_reverts_for_siblings() {
    let yaml = r#"
on: push
env:
  LEVEL: workflow
  ONLY_GLOBAL: yes
jobs:
  build:
    env:
      LEVEL: job
    steps:
      - run: echo ${{ env.LEVEL }}
        env:
          LEVEL: step
      - run: echo ${{ env.LEVEL }} ${{ env.ONLY_GLOBAL }}
"#;

    let outcome = run_yaml(Vendor::GitHub, yaml).await;

    assert_eq!(outcome.executed(), vec!["echo step", "echo job yes"]);
    assert_eq!(outcome.env_of(0, "LEVEL").as_deref(), Some("step"));
    assert_eq!(outcome.env_of(1, "LEVEL").as_deref(), Some("job"));
    assert_eq!(outcome.env_of(1, "ONLY_GLOBAL").as_deref(), Some("yes"));
}

#[tokio::test]
async fn test_synthesized_github_variables() {
    let yaml = "on: push\njobs:\n  build:\n    steps:\n      - run: echo hi\n";
    let outcome = run_yaml(Vendor::GitHub, yaml).await;

    assert_eq!(outcome.env_of(0, "CI").as_deref(), Some("true"));
    assert_eq!(outcome.env_of(0, "GITHUB_ACTIONS").as_deref(), Some("true"));
    assert_eq!(outcome.env_of(0, "GITHUB_WORKSPACE").as_deref(), Some("/ws"));
}

#[tokio::test]
async fn test_cli_env_overrides_workflow_globals() {
    let yaml = r#"
on: push
env:
  TARGET: debug
jobs:
  build:
    steps:
      - run: echo ${{ env.TARGET }}
"#;
    let workflow = workflow(Vendor::GitHub, yaml);
    let extra: EnvMap = [("TARGET", "release")].into_iter().collect();
    let config = RunnerConfig::new().with_workspace("/ws").with_extra_env(extra);

    let outcome = run_workflow_with(&workflow, MockScripts::new(), config)
        .await
        .unwrap();

    assert_eq!(outcome.executed(), vec!["echo release"]);
}

#[tokio::test]
async fn test_github_workflow_and_job_env_expressions_are_expanded() {
    let yaml = r#"
on: push
env:
  TARGET: linux
  ARTIFACT: app-${{ env.TARGET }}
jobs:
  build:
    env:
      BUNDLE: ${{ env.ARTIFACT }}.tar.gz
    steps:
      - run: echo "$BUNDLE"
"#;

    let outcome = run_yaml(Vendor::GitHub, yaml).await;

    assert_eq!(outcome.env_of(0, "ARTIFACT").as_deref(), Some("app-linux"));
    assert_eq!(outcome.env_of(0, "BUNDLE").as_deref(), Some("app-linux.tar.gz"));
}

#[tokio::test]
async fn test_azure_variable_scopes_and_env_names() {
    let yaml = r#"
variables:
  build.config: Debug
  Scope: pipeline
stages:
  - stage: Build
    variables:
      Scope: stage
    jobs:
      - job: Compile
        variables:
          - name: Scope
            value: job
        steps:
          - script: echo $(Scope) $(build.config)
      - job: Package
        steps:
          - script: echo $(Scope)
"#;

    let outcome = run_yaml(Vendor::Azure, yaml).await;

    assert_eq!(outcome.executed(), vec!["echo job Debug", "echo stage"]);
    assert_eq!(outcome.env_of(0, "BUILD_CONFIG").as_deref(), Some("Debug"));
    assert_eq!(outcome.env_of(1, "SCOPE").as_deref(), Some("stage"));
}

#[tokio::test]
async fn test_working_directory_resolves_against_workspace() {
    let yaml = r#"
on: push
defaults:
  run:
    working-directory: app
jobs:
  build:
    steps:
      - run: echo default
      - run: echo absolute
        working-directory: /tmp
"#;

    let outcome = run_yaml(Vendor::GitHub, yaml).await;
    let requests = outcome.scripts.requests();

    assert_eq!(requests[0].cwd, std::path::PathBuf::from("/ws/app"));
    assert_eq!(requests[1].cwd, std::path::PathBuf::from("/tmp"));
}
