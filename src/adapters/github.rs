//! GitHub Actions adapter

use crate::adapters::{
    first_line, parse_document, parse_flag, parse_minutes, runner_os, AdapterContext,
    FormatAdapter,
};
use crate::core::{
    Condition, EnvMap, ExecutionUnit, MacroSyntax, RunnerResult, Shell, Step, StepAction, Vendor,
    Workflow,
};
use crate::schema::github::{Defaults, GitHubWorkflow, Job, Step as StepDef};
use crate::schema::scalar_to_string;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct GitHubAdapter;

impl FormatAdapter for GitHubAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::GitHub
    }

    fn normalize(&self, document: &str, ctx: &AdapterContext) -> RunnerResult<Vec<Workflow>> {
        let doc: GitHubWorkflow = parse_document(Vendor::GitHub, document, &["jobs"])?;

        let id = ctx
            .document_name
            .clone()
            .unwrap_or_else(|| "workflow".to_string());
        let workflow_name = doc.name.clone().unwrap_or_else(|| id.clone());

        let mut global_env = EnvMap::new();
        global_env.insert("CI", "true");
        global_env.insert("GITHUB_ACTIONS", "true");
        global_env.insert("GITHUB_WORKSPACE", ctx.workspace_str());
        global_env.insert("GITHUB_WORKFLOW", workflow_name);
        global_env.insert("RUNNER_OS", runner_os());
        global_env.extend_from(&doc.env.to_env());

        let defaults = doc.defaults.clone().unwrap_or_default();
        let mut metadata = EnvMap::new();
        let mut units = Vec::with_capacity(doc.jobs.len());

        for (job_id, job) in doc.jobs.iter() {
            if let Some(runs_on) = &job.runs_on {
                metadata.insert(format!("jobs.{}.runs-on", job_id), scalar_to_string(runs_on));
            }
            if let Some(timeout) = &job.timeout_minutes {
                metadata.insert(format!("jobs.{}.timeout-minutes", job_id), timeout.as_str());
            }
            units.push(job_unit(job_id, job, &defaults));
        }

        debug!("Normalized GitHub workflow '{}' with {} job(s)", id, units.len());

        Ok(vec![Workflow::new(id, Vendor::GitHub)
            .with_name(doc.name)
            .with_global_env(global_env)
            .with_units(units)
            .with_substitution(MacroSyntax::Expression)
            .with_metadata(metadata)])
    }
}

fn job_unit(job_id: &str, job: &Job, workflow_defaults: &Defaults) -> ExecutionUnit {
    if let Some(needs) = &job.needs {
        debug!(
            "Job '{}' needs [{}]; jobs run in declaration order",
            job_id,
            scalar_to_string(needs).replace('\n', " ")
        );
    }
    if job.strategy.is_some() {
        warn!("Job '{}' declares a strategy; the matrix is not expanded locally", job_id);
    }

    let steps = match &job.uses {
        Some(workflow_ref) => vec![Step::new(
            format!("Call {}", workflow_ref),
            StepAction::PlatformAction {
                action: workflow_ref.clone(),
                inputs: job.with.to_env(),
            },
        )],
        None => {
            let job_defaults = job.defaults.clone().unwrap_or_default();
            job.steps
                .iter()
                .enumerate()
                .map(|(i, step)| convert_step(i, step, &job_defaults, workflow_defaults))
                .collect()
        }
    };

    ExecutionUnit::leaf(job_id, steps)
        .with_display_name(job.name.clone())
        .with_condition(Condition::parse_optional(
            job.condition.as_ref().map(|c| c.as_str()),
        ))
        .with_env(job.env.to_env())
}

fn convert_step(
    index: usize,
    step: &StepDef,
    job_defaults: &Defaults,
    workflow_defaults: &Defaults,
) -> Step {
    let display_name = step
        .name
        .clone()
        .or_else(|| step.uses.clone())
        .or_else(|| step.run.as_deref().map(first_line))
        .unwrap_or_else(|| format!("step {}", index + 1));

    let action = if let Some(uses) = &step.uses {
        StepAction::PlatformAction {
            action: uses.clone(),
            inputs: step.with.to_env(),
        }
    } else if let Some(run) = &step.run {
        let shell = step
            .shell
            .as_deref()
            .or_else(|| job_defaults.shell())
            .or_else(|| workflow_defaults.shell())
            .map(Shell::parse)
            .unwrap_or_default();
        StepAction::Script {
            shell,
            script: run.clone(),
        }
    } else {
        StepAction::Empty {
            reason: "step has neither `uses` nor `run`".to_string(),
        }
    };

    let working_directory = step
        .working_directory
        .as_deref()
        .or_else(|| job_defaults.working_directory())
        .or_else(|| workflow_defaults.working_directory())
        .map(PathBuf::from);

    Step::new(display_name, action)
        .with_env(step.env.to_env())
        .with_condition(Condition::parse_optional(
            step.condition.as_ref().map(|c| c.as_str()),
        ))
        .with_continue_on_error(parse_flag(step.continue_on_error.as_ref(), "continue-on-error"))
        .with_working_directory(working_directory)
        .with_timeout(parse_minutes(step.timeout_minutes.as_ref()))
}
