//! Azure DevOps adapter

use crate::adapters::{
    first_line, parse_document, parse_flag, parse_minutes, runner_os, AdapterContext,
    FormatAdapter,
};
use crate::core::scope::env_var_name;
use crate::core::{
    Condition, EnvMap, ExecutionUnit, MacroSyntax, RunnerError, RunnerResult, Shell, Step,
    StepAction, Vendor, Workflow,
};
use crate::schema::azure::{AzurePipeline, Job, Stage, Step as StepDef, VariableEntry, Variables};
use crate::schema::scalar_to_string;
use serde_yaml::Value;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Name given to the stage or job Azure creates when the document omits it
pub const IMPLICIT_UNIT: &str = "__default";

pub struct AzureAdapter;

impl FormatAdapter for AzureAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Azure
    }

    fn normalize(&self, document: &str, ctx: &AdapterContext) -> RunnerResult<Vec<Workflow>> {
        let doc: AzurePipeline = parse_document(Vendor::Azure, document, &[])?;

        let shapes = [doc.stages.is_some(), doc.jobs.is_some(), doc.steps.is_some()]
            .iter()
            .filter(|present| **present)
            .count();
        if shapes == 0 {
            return Err(RunnerError::schema(
                Vendor::Azure,
                "expected one of `stages`, `jobs` or `steps` at the root",
            ));
        }
        if shapes > 1 {
            return Err(RunnerError::schema(
                Vendor::Azure,
                "`stages`, `jobs` and `steps` are mutually exclusive at the root",
            ));
        }

        let mut global_env = agent_variables(ctx);
        global_env.extend_from(&variables_layer(doc.variables.as_ref(), "pipeline"));

        let mut metadata = EnvMap::new();
        if let Some(pool) = doc.pool.as_ref().and_then(pool_label) {
            metadata.insert("pool", pool);
        }

        let units = if let Some(stages) = &doc.stages {
            stages
                .iter()
                .enumerate()
                .map(|(i, stage)| stage_unit(i, stage, &mut metadata))
                .collect()
        } else if let Some(jobs) = &doc.jobs {
            vec![ExecutionUnit::composite(IMPLICIT_UNIT, jobs_units(jobs, &mut metadata))]
        } else {
            let steps = doc.steps.as_deref().unwrap_or_default();
            vec![ExecutionUnit::composite(
                IMPLICIT_UNIT,
                vec![ExecutionUnit::leaf(IMPLICIT_UNIT, convert_steps(steps))],
            )]
        };

        let id = ctx
            .document_name
            .clone()
            .unwrap_or_else(|| "azure-pipelines".to_string());
        debug!("Normalized Azure pipeline '{}' with {} stage(s)", id, units.len());

        Ok(vec![Workflow::new(id, Vendor::Azure)
            .with_name(doc.name)
            .with_global_env(global_env)
            .with_units(units)
            .with_substitution(MacroSyntax::DollarParen)
            .with_metadata(metadata)])
    }
}

/// Predefined agent variables, in dotted and environment form
fn agent_variables(ctx: &AdapterContext) -> EnvMap {
    let workspace = ctx.workspace_str();
    let staging = ctx.workspace.join(".localci").join("artifacts");
    let binaries = ctx.workspace.join(".localci").join("binaries");
    let agent_os = match runner_os() {
        "macOS" => "Darwin",
        "Windows" => "Windows_NT",
        other => other,
    };

    let variables = [
        ("Agent.BuildDirectory", workspace.clone()),
        ("Agent.TempDirectory", std::env::temp_dir().display().to_string()),
        ("Agent.OS", agent_os.to_string()),
        ("Build.SourcesDirectory", workspace.clone()),
        ("Build.ArtifactStagingDirectory", staging.display().to_string()),
        ("Build.BinariesDirectory", binaries.display().to_string()),
        ("Build.Repository.LocalPath", workspace.clone()),
        ("System.DefaultWorkingDirectory", workspace.clone()),
        ("Pipeline.Workspace", workspace),
        ("TF_BUILD", "True".to_string()),
    ];

    let mut env = EnvMap::new();
    for (name, value) in variables {
        insert_variable(&mut env, name, &value);
    }
    env
}

/// Set a variable under its own name and its environment form
fn insert_variable(env: &mut EnvMap, name: &str, value: &str) {
    env.insert(name, value);
    let env_name = env_var_name(name);
    if env_name != name {
        env.insert(env_name, value);
    }
}

fn variables_layer(variables: Option<&Variables>, scope: &str) -> EnvMap {
    let mut env = EnvMap::new();
    match variables {
        None => {}
        Some(Variables::Map(map)) => {
            for (name, value) in map.iter() {
                insert_variable(&mut env, name, value.as_str());
            }
        }
        Some(Variables::List(entries)) => {
            for entry in entries {
                match entry {
                    VariableEntry::Named { name, value, .. } => {
                        insert_variable(&mut env, name, value.as_str())
                    }
                    VariableEntry::Group { group } => warn!(
                        "Variable group '{}' in {} is not available locally; skipping",
                        group, scope
                    ),
                    VariableEntry::Template { template } => warn!(
                        "Variable template '{}' in {} is not expanded locally; skipping",
                        template, scope
                    ),
                }
            }
        }
    }
    env
}

fn pool_label(pool: &Value) -> Option<String> {
    match pool {
        Value::Mapping(map) => map
            .get("vmImage")
            .or_else(|| map.get("name"))
            .map(scalar_to_string),
        Value::Null => None,
        other => Some(scalar_to_string(other)),
    }
}

fn template_step(template: &str, context: &str) -> Step {
    warn!("{}; templates are not expanded locally", RunnerError::reference(template, context));
    Step::empty(
        format!("template {}", template),
        "templates are not expanded locally",
    )
}

fn stage_unit(index: usize, stage: &Stage, metadata: &mut EnvMap) -> ExecutionUnit {
    let name = stage
        .stage
        .clone()
        .unwrap_or_else(|| format!("Stage{}", index + 1));

    if let Some(template) = &stage.template {
        return ExecutionUnit::composite(
            name.clone(),
            vec![ExecutionUnit::leaf(
                name.clone(),
                vec![template_step(template, &format!("stage '{}'", name))],
            )],
        );
    }
    if stage.depends_on.is_some() {
        debug!("Stage '{}' dependsOn is ignored; stages run in declaration order", name);
    }

    let context = format!("stage '{}'", name);
    ExecutionUnit::composite(name, jobs_units(&stage.jobs, metadata))
        .with_display_name(stage.display_name.clone())
        .with_condition(Condition::parse_optional(
            stage.condition.as_ref().map(|c| c.as_str()),
        ))
        .with_env(variables_layer(stage.variables.as_ref(), &context))
}

fn jobs_units(jobs: &[Job], metadata: &mut EnvMap) -> Vec<ExecutionUnit> {
    jobs.iter()
        .enumerate()
        .map(|(i, job)| job_unit(i, job, metadata))
        .collect()
}

fn job_unit(index: usize, job: &Job, metadata: &mut EnvMap) -> ExecutionUnit {
    let name = job
        .id()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Job{}", index + 1));
    let context = format!("job '{}'", name);

    if let Some(template) = &job.template {
        return ExecutionUnit::leaf(name, vec![template_step(template, &context)]);
    }
    if job.depends_on.is_some() {
        debug!("Job '{}' dependsOn is ignored; jobs run in declaration order", name);
    }
    if job.strategy.is_some() {
        warn!("Job '{}' declares a strategy; the matrix is not expanded locally", name);
    }
    if parse_flag(job.continue_on_error.as_ref(), "continueOnError") {
        debug!("Job '{}' continueOnError has no local effect", name);
    }
    if let Some(pool) = job.pool.as_ref().and_then(pool_label) {
        metadata.insert(format!("jobs.{}.pool", name), pool);
    }
    if let Some(timeout) = &job.timeout_in_minutes {
        metadata.insert(format!("jobs.{}.timeoutInMinutes", name), timeout.as_str());
    }

    ExecutionUnit::leaf(name, convert_steps(&job.steps))
        .with_display_name(job.display_name.clone())
        .with_condition(Condition::parse_optional(
            job.condition.as_ref().map(|c| c.as_str()),
        ))
        .with_env(variables_layer(job.variables.as_ref(), &context))
}

fn convert_steps(steps: &[StepDef]) -> Vec<Step> {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| convert_step(i, step))
        .collect()
}

fn convert_step(index: usize, step: &StepDef) -> Step {
    let scripts: Vec<(Shell, &String)> = [
        (Shell::Default, &step.script),
        (Shell::Bash, &step.bash),
        (Shell::Pwsh, &step.pwsh),
        (Shell::PowerShell, &step.powershell),
    ]
    .into_iter()
    .filter_map(|(shell, body)| body.as_ref().map(|b| (shell, b)))
    .collect();

    if scripts.len() > 1 {
        warn!(
            "Step {} declares {} script keys; using the first",
            index + 1,
            scripts.len()
        );
    }

    let shortcut = |kind: &str, target: &Option<String>| {
        target.as_ref().map(|t| StepAction::PlatformAction {
            action: format!("{}: {}", kind, t),
            inputs: step.inputs.to_env(),
        })
    };

    let action = if let Some((shell, body)) = scripts.first() {
        StepAction::Script {
            shell: shell.clone(),
            script: (*body).clone(),
        }
    } else if let Some(task) = &step.task {
        StepAction::PlatformAction {
            action: task.clone(),
            inputs: step.inputs.to_env(),
        }
    } else if let Some(action) = shortcut("checkout", &step.checkout)
        .or_else(|| shortcut("download", &step.download))
        .or_else(|| shortcut("publish", &step.publish))
    {
        action
    } else if let Some(template) = &step.template {
        warn!("Step template '{}' is not expanded locally", template);
        StepAction::PlatformAction {
            action: format!("template: {}", template),
            inputs: EnvMap::new(),
        }
    } else {
        StepAction::Empty {
            reason: "step has no script, task or known shortcut".to_string(),
        }
    };

    let display_name = step
        .display_name
        .clone()
        .or_else(|| step.name.clone())
        .or_else(|| match &action {
            StepAction::Script { script, .. } => Some(first_line(script)),
            StepAction::PlatformAction { action, .. } => Some(action.clone()),
            StepAction::Empty { .. } => None,
        })
        .unwrap_or_else(|| format!("Step {}", index + 1));

    let enabled = step
        .enabled
        .as_ref()
        .map(|e| !e.as_str().trim().eq_ignore_ascii_case("false"))
        .unwrap_or(true);
    let action = if enabled {
        action
    } else {
        StepAction::Empty {
            reason: "disabled (enabled: false)".to_string(),
        }
    };

    Step::new(display_name, action)
        .with_env(step.env.to_env())
        .with_condition(Condition::parse_optional(
            step.condition.as_ref().map(|c| c.as_str()),
        ))
        .with_continue_on_error(parse_flag(step.continue_on_error.as_ref(), "continueOnError"))
        .with_working_directory(step.working_directory.as_deref().map(PathBuf::from))
        .with_timeout(parse_minutes(step.timeout_in_minutes.as_ref()))
}
