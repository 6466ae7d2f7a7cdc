//! Test utility functions for localci scenarios

use async_trait::async_trait;
use localci::adapters::{adapter_for, AdapterContext};
use localci::core::{
    RunnerConfig, RunnerError, StepResult, StepStatus, UnitResult, UnitStatus, Vendor, Workflow,
    WorkflowResult,
};
use localci::execution::{ExecutionEngine, ExecutionEvent, ScriptExecutor, ScriptOutput, ScriptRequest};
use std::sync::{Arc, Mutex};

/// Script executor that records every request instead of spawning a shell.
///
/// Scripts starting with `fail` exit 1; everything else exits 0 and echoes
/// the script back as stdout.
#[derive(Clone, Default)]
pub struct MockScripts {
    requests: Arc<Mutex<Vec<ScriptRequest>>>,
    launch_failure: Option<String>,
}

impl MockScripts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts starting with `prefix` fail to launch
    pub fn failing_launch(prefix: &str) -> Self {
        Self {
            launch_failure: Some(prefix.to_string()),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<ScriptRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.script).collect()
    }
}

#[async_trait]
impl ScriptExecutor for MockScripts {
    async fn run(&self, request: &ScriptRequest) -> Result<ScriptOutput, RunnerError> {
        if let Some(prefix) = &self.launch_failure {
            if request.script.trim_start().starts_with(prefix.as_str()) {
                return Err(RunnerError::ProcessLaunch {
                    program: "missing-shell".to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                });
            }
        }
        self.requests.lock().unwrap().push(request.clone());
        let exit_code = if request.script.trim_start().starts_with("fail") { 1 } else { 0 };
        Ok(ScriptOutput {
            exit_code: Some(exit_code),
            stdout: request.script.clone(),
            ..Default::default()
        })
    }
}

/// Normalize a document the way the loader would for `ci.yml` in `/ws`
pub fn normalize(vendor: Vendor, yaml: &str) -> Vec<Workflow> {
    let ctx = AdapterContext::new("/ws").with_document_name("ci");
    adapter_for(vendor)
        .normalize(yaml, &ctx)
        .expect("document should normalize")
}

/// The only (or first) workflow of a document
pub fn workflow(vendor: Vendor, yaml: &str) -> Workflow {
    normalize(vendor, yaml).remove(0)
}

/// Everything observed while running one workflow
pub struct RunOutcome {
    pub result: WorkflowResult,
    pub scripts: MockScripts,
    pub events: Vec<ExecutionEvent>,
}

impl RunOutcome {
    /// Scripts that were handed to the executor, in order
    pub fn executed(&self) -> Vec<String> {
        self.scripts.scripts()
    }

    pub fn steps(&self) -> Vec<&StepResult> {
        self.result.step_results()
    }

    pub fn step(&self, display_name: &str) -> &StepResult {
        self.steps()
            .into_iter()
            .find(|s| s.display_name == display_name)
            .unwrap_or_else(|| panic!("no step named '{}'", display_name))
    }

    pub fn unit(&self, name: &str) -> &UnitResult {
        fn find<'a>(units: &'a [UnitResult], name: &str) -> Option<&'a UnitResult> {
            units
                .iter()
                .find_map(|u| if u.name == name { Some(u) } else { find(&u.children, name) })
        }
        find(&self.result.units, name).unwrap_or_else(|| panic!("no unit named '{}'", name))
    }

    /// Value of `key` in the environment of the n-th executed script
    pub fn env_of(&self, n: usize, key: &str) -> Option<String> {
        self.scripts.requests()[n].env.get(key).map(str::to_string)
    }
}

pub async fn run_workflow_with(
    workflow: &Workflow,
    scripts: MockScripts,
    config: RunnerConfig,
) -> Result<RunOutcome, RunnerError> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut engine = ExecutionEngine::new(scripts.clone(), config);
    let sink = events.clone();
    engine.add_event_handler(move |event| sink.lock().unwrap().push(event));

    let result = engine.run(workflow).await?;
    let events = events.lock().unwrap().clone();
    Ok(RunOutcome {
        result,
        scripts,
        events,
    })
}

pub async fn run_workflow(workflow: &Workflow) -> RunOutcome {
    run_workflow_with(workflow, MockScripts::new(), RunnerConfig::new().with_workspace("/ws"))
        .await
        .expect("run should not abort")
}

pub async fn run_yaml(vendor: Vendor, yaml: &str) -> RunOutcome {
    run_workflow(&workflow(vendor, yaml)).await
}

pub fn assert_skipped(result: &StepResult) {
    assert!(
        matches!(result.status, StepStatus::Skipped { .. }),
        "expected '{}' to be skipped, got {:?}",
        result.display_name,
        result.status
    );
}

pub fn assert_unit_failed(unit: &UnitResult) {
    assert_eq!(unit.status, UnitStatus::Failed, "unit '{}'", unit.name);
}
