//! Step executor - runs individual steps through the script executor

use crate::core::expression::EvalContext;
use crate::core::substitution::{expand, expand_layer};
use crate::core::{
    EnvScope, MacroSyntax, RunnerConfig, RunnerError, Step, StepAction, StepResult,
    StepStatus,
};
use crate::execution::process::{ScriptExecutor, ScriptRequest};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Executes a single step whose condition has already passed
pub struct StepExecutor<E> {
    scripts: E,
    config: RunnerConfig,
}

impl<E: ScriptExecutor> StepExecutor<E> {
    pub fn new(scripts: E, config: RunnerConfig) -> Self {
        Self { scripts, config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Execute a step in `scope`.
    ///
    /// Platform actions are only logged and empty steps are skipped. Script
    /// failures come back as a `Failed` result; an `Err` means the process
    /// could not be started.
    pub async fn execute(
        &self,
        step: &Step,
        scope: &EnvScope,
        syntax: MacroSyntax,
        job_failed: bool,
    ) -> Result<StepResult, RunnerError> {
        let scope = scope.push(&expand_layer(&step.env, syntax, scope, job_failed));
        let ctx = EvalContext::new(&scope, job_failed);

        match &step.action {
            StepAction::Empty { reason } => {
                debug!("Step '{}' has nothing to run: {}", step.display_name, reason);
                Ok(StepResult::skipped(&step.display_name, reason.clone()))
            }
            StepAction::PlatformAction { action, inputs } => {
                info!(
                    "Simulating platform action '{}' for step '{}'",
                    action, step.display_name
                );
                for (key, value) in inputs.iter() {
                    debug!("  input {} = {}", key, expand(value, syntax, &ctx));
                }
                Ok(StepResult::simulated(&step.display_name))
            }
            StepAction::Script { shell, script } => {
                let request = ScriptRequest {
                    shell: self.config.effective_shell(shell),
                    script: expand(script, syntax, &ctx),
                    cwd: self.working_directory(step, syntax, &ctx),
                    env: scope.overlay(),
                    stream_output: self.config.stream_output,
                    timeout: step.timeout.filter(|_| self.config.enforce_timeouts),
                };
                debug!("Running step '{}' with {}", step.display_name, request.shell);

                let started = Instant::now();
                let output = self.scripts.run(&request).await?;
                let duration_ms = started.elapsed().as_millis() as u64;

                let status = if output.success() {
                    StepStatus::Succeeded
                } else {
                    if output.timed_out {
                        warn!("Step '{}' exceeded its timeout", step.display_name);
                    }
                    StepStatus::Failed
                };

                Ok(StepResult {
                    display_name: step.display_name.clone(),
                    status,
                    exit_code: output.exit_code,
                    stdout: output.stdout,
                    stderr: output.stderr,
                    duration_ms,
                })
            }
        }
    }

    /// Step directory, relative paths resolved against the workspace
    fn working_directory(&self, step: &Step, syntax: MacroSyntax, ctx: &EvalContext<'_>) -> PathBuf {
        match &step.working_directory {
            Some(dir) => {
                let expanded = PathBuf::from(expand(&dir.to_string_lossy(), syntax, ctx));
                if expanded.is_absolute() {
                    expanded
                } else {
                    self.config.workspace.join(expanded)
                }
            }
            None => self.config.workspace.clone(),
        }
    }
}
