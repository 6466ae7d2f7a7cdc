//! Main execution engine - walks a workflow's units and steps in order

use crate::core::expression::EvalContext;
use crate::core::substitution::expand_layer;
use crate::core::{
    Condition, EnvScope, ExecutionUnit, MacroSyntax, RunnerConfig, RunnerError, RunnerResult,
    StepResult, StepStatus, UnitBody, UnitResult, UnitStatus, Workflow, WorkflowResult,
};
use crate::execution::executor::StepExecutor;
use crate::execution::process::ScriptExecutor;
use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events that can occur during a run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    WorkflowStarted {
        run_id: Uuid,
        name: String,
        unit_count: usize,
    },
    UnitStarted {
        name: String,
        display_name: String,
        depth: usize,
    },
    UnitSkipped {
        name: String,
        display_name: String,
        reason: String,
        depth: usize,
    },
    UnitFinished {
        name: String,
        display_name: String,
        status: UnitStatus,
        depth: usize,
    },
    StepStarted {
        unit: String,
        display_name: String,
        index: usize,
        /// Whether the step spawns a process
        runs_script: bool,
    },
    StepSkipped {
        unit: String,
        display_name: String,
        reason: String,
    },
    StepFinished {
        unit: String,
        result: StepResult,
    },
    WorkflowFinished {
        run_id: Uuid,
        succeeded: bool,
        duration_ms: i64,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

type UnitFuture<'a> = Pin<Box<dyn Future<Output = RunnerResult<UnitResult>> + Send + 'a>>;

/// Whether a guarded item runs
enum Gate {
    Run,
    Skip(String),
}

/// Sequential workflow runner
pub struct ExecutionEngine<E> {
    executor: StepExecutor<E>,
    event_handlers: Vec<EventHandler>,
}

impl<E: ScriptExecutor> ExecutionEngine<E> {
    pub fn new(scripts: E, config: RunnerConfig) -> Self {
        Self {
            executor: StepExecutor::new(scripts, config),
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    fn emit(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Run every unit of `workflow` in declaration order.
    ///
    /// Step failures are reported in the result; only a process that cannot
    /// be started aborts the run with an error.
    pub async fn run(&self, workflow: &Workflow) -> RunnerResult<WorkflowResult> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let name = workflow.display_name().to_string();

        info!(
            "Starting {} workflow '{}' ({})",
            workflow.vendor, name, run_id
        );
        for (key, value) in workflow.metadata.iter() {
            info!("  {} = {}", key, value);
        }
        self.emit(ExecutionEvent::WorkflowStarted {
            run_id,
            name: name.clone(),
            unit_count: workflow.units.len(),
        });

        let config = self.executor.config();
        let ambient = EnvScope::from_process();
        let globals = expand_layer(&workflow.global_env, workflow.substitution, &ambient, false);
        let scope = ambient.push(&globals).push(&config.extra_env);

        let (units, failed) = self
            .run_units(&workflow.units, &scope, workflow.substitution, 0)
            .await?;

        let finished_at = Utc::now();
        let succeeded = !failed;
        let duration_ms = (finished_at - started_at).num_milliseconds();
        if succeeded {
            info!("Workflow '{}' succeeded in {}ms", name, duration_ms);
        } else {
            warn!("Workflow '{}' failed after {}ms", name, duration_ms);
        }
        self.emit(ExecutionEvent::WorkflowFinished {
            run_id,
            succeeded,
            duration_ms,
        });

        Ok(WorkflowResult {
            run_id,
            name,
            succeeded,
            units,
            started_at,
            finished_at,
        })
    }

    /// Run sibling units; a failed unit halts the rest
    async fn run_units(
        &self,
        units: &[ExecutionUnit],
        scope: &EnvScope,
        syntax: MacroSyntax,
        depth: usize,
    ) -> RunnerResult<(Vec<UnitResult>, bool)> {
        let mut results = Vec::with_capacity(units.len());
        let mut halted = false;
        for unit in units {
            let result = self.run_unit(unit, scope, syntax, halted, depth).await?;
            if !result.is_success() {
                halted = true;
            }
            results.push(result);
        }
        Ok((results, halted))
    }

    fn run_unit<'a>(
        &'a self,
        unit: &'a ExecutionUnit,
        parent: &'a EnvScope,
        syntax: MacroSyntax,
        halted: bool,
        depth: usize,
    ) -> UnitFuture<'a> {
        Box::pin(async move {
            if let Gate::Skip(reason) =
                self.gate(unit.condition.as_ref(), parent, halted, "previous unit failed")
            {
                debug!("Skipping unit '{}': {}", unit.name, reason);
                self.emit(ExecutionEvent::UnitSkipped {
                    name: unit.name.clone(),
                    display_name: unit.display_name.clone(),
                    reason: reason.clone(),
                    depth,
                });
                return Ok(UnitResult::skipped(&unit.name, reason));
            }

            self.emit(ExecutionEvent::UnitStarted {
                name: unit.name.clone(),
                display_name: unit.display_name.clone(),
                depth,
            });
            let scope = parent.push(&expand_layer(&unit.env, syntax, parent, false));

            let (children, steps, failed) = match &unit.body {
                UnitBody::Composite(units) => {
                    let (children, failed) =
                        self.run_units(units, &scope, syntax, depth + 1).await?;
                    (children, Vec::new(), failed)
                }
                UnitBody::Leaf(steps) => {
                    let (steps, failed) = self.run_steps(unit, steps, &scope, syntax).await?;
                    (Vec::new(), steps, failed)
                }
            };

            let status = if failed {
                UnitStatus::Failed
            } else {
                UnitStatus::Succeeded
            };
            self.emit(ExecutionEvent::UnitFinished {
                name: unit.name.clone(),
                display_name: unit.display_name.clone(),
                status: status.clone(),
                depth,
            });

            Ok(UnitResult {
                name: unit.name.clone(),
                status,
                children,
                steps,
            })
        })
    }

    /// Run a job's steps; returns the results and whether any step failed
    async fn run_steps(
        &self,
        unit: &ExecutionUnit,
        steps: &[crate::core::Step],
        scope: &EnvScope,
        syntax: MacroSyntax,
    ) -> RunnerResult<(Vec<StepResult>, bool)> {
        let mut results = Vec::with_capacity(steps.len());
        let mut failed = false;
        let mut halted = false;

        for (index, step) in steps.iter().enumerate() {
            if let Gate::Skip(reason) =
                self.gate(step.condition.as_ref(), scope, halted, "previous step failed")
            {
                debug!("Skipping step '{}': {}", step.display_name, reason);
                self.emit(ExecutionEvent::StepSkipped {
                    unit: unit.name.clone(),
                    display_name: step.display_name.clone(),
                    reason: reason.clone(),
                });
                results.push(StepResult::skipped(&step.display_name, reason));
                continue;
            }

            self.emit(ExecutionEvent::StepStarted {
                unit: unit.name.clone(),
                display_name: step.display_name.clone(),
                index,
                runs_script: step.is_script(),
            });

            let result = self
                .executor
                .execute(step, scope, syntax, halted)
                .await
                .inspect_err(|e| warn!("Aborting run at step '{}': {}", step.display_name, e))?;

            if result.status == StepStatus::Failed {
                failed = true;
                if step.continue_on_error {
                    info!(
                        "Step '{}' failed but continues on error",
                        step.display_name
                    );
                } else {
                    halted = true;
                }
            }

            self.emit(ExecutionEvent::StepFinished {
                unit: unit.name.clone(),
                result: result.clone(),
            });
            results.push(result);
        }

        Ok((results, failed))
    }

    /// Decide whether an item with `condition` runs.
    ///
    /// After a halt only conditions that ask about job status are evaluated,
    /// and they see the failed status.
    fn gate(
        &self,
        condition: Option<&Condition>,
        scope: &EnvScope,
        halted: bool,
        halt_reason: &str,
    ) -> Gate {
        match condition {
            Some(condition) if halted && !condition.uses_status_function() => {
                Gate::Skip(halt_reason.to_string())
            }
            None if halted => Gate::Skip(halt_reason.to_string()),
            None => Gate::Run,
            Some(condition) => {
                if condition.evaluate(&EvalContext::new(scope, halted)) {
                    Gate::Run
                } else {
                    Gate::Skip(format!("condition `{}` is false", condition.source()))
                }
            }
        }
    }
}

/// Convert a launch error into the message shown to the user
pub fn describe_abort(error: &RunnerError) -> String {
    match error {
        RunnerError::ProcessLaunch { program, .. } => {
            format!("could not start '{}'; is it installed and on PATH?", program)
        }
        other => other.to_string(),
    }
}
