//! Test: CodeMagic References - shared script definitions

use crate::helpers::*;
use localci::core::{StepStatus, Vendor};

const DOCUMENT: &str = r#"
definitions:
  scripts:
    - &install
      name: Install deps
      script: flutter pub get
    - name: Analyze
      script: flutter analyze
workflows:
  android:
    name: Android
    environment:
      vars:
        FLAVOR: prod
    scripts:
      - *install
      - "*Analyze"
      - "*Missing script"
      - flutter build apk --flavor $FLAVOR
  ios:
    scripts:
      - echo ios
"#;

#[tokio::test]
async fn test_references_resolve_and_missing_ones_are_skipped() {
    let outcome = run_yaml(Vendor::CodeMagic, DOCUMENT).await;

    assert!(outcome.result.succeeded);
    assert_eq!(
        outcome.executed(),
        vec![
            "flutter pub get",
            "flutter analyze",
            "flutter build apk --flavor $FLAVOR"
        ]
    );
    assert_eq!(outcome.step("Install deps").status, StepStatus::Succeeded);
    assert_eq!(outcome.step("Analyze").status, StepStatus::Succeeded);
    assert_skipped(outcome.step("*Missing script"));
}

#[tokio::test]
async fn test_each_workflow_is_separate() {
    let workflows = normalize(Vendor::CodeMagic, DOCUMENT);
    let ids: Vec<_> = workflows.iter().map(|w| w.id.as_str()).collect();
    assert_eq!(ids, vec!["android", "ios"]);

    let outcome = run_workflow(&workflows[1]).await;
    assert_eq!(outcome.executed(), vec!["echo ios"]);
    assert_eq!(outcome.env_of(0, "CM_WORKFLOW_NAME").as_deref(), Some("ios"));
    assert_eq!(outcome.env_of(0, "FLAVOR"), None);
}

#[tokio::test]
async fn test_build_variables_and_vars_reach_scripts() {
    let outcome = run_yaml(Vendor::CodeMagic, DOCUMENT).await;

    assert_eq!(outcome.env_of(0, "FLAVOR").as_deref(), Some("prod"));
    assert_eq!(outcome.env_of(0, "CM_BUILD_DIR").as_deref(), Some("/ws"));
    assert_eq!(outcome.env_of(0, "CI").as_deref(), Some("true"));
}
