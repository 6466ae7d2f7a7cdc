//! Test: Empty Workflows - nothing to run is a success

use crate::helpers::*;
use localci::core::Vendor;

#[tokio::test]
async fn test_empty_workflows_succeed_for_every_vendor() {
    let documents = [
        (Vendor::GitHub, "on: push\njobs: {}\n"),
        (Vendor::GitHub, "on: push\njobs:\n  build:\n    steps: []\n"),
        (Vendor::Azure, "steps: []\n"),
        (Vendor::Azure, "stages:\n  - stage: Empty\n    jobs: []\n"),
        (Vendor::CodeMagic, "workflows:\n  app:\n    scripts: []\n"),
        (Vendor::CodeMagic, "workflows:\n  app:\n    name: App\n"),
    ];

    for (vendor, yaml) in documents {
        let outcome = run_yaml(vendor, yaml).await;
        assert!(outcome.result.succeeded, "{} document should succeed: {}", vendor, yaml);
        assert!(outcome.executed().is_empty());
        assert_eq!(outcome.result.tally().failed, 0);
    }
}

#[tokio::test]
async fn test_codemagic_without_workflows_yields_nothing() {
    let workflows = normalize(Vendor::CodeMagic, "workflows: {}\n");
    assert!(workflows.is_empty());
}
