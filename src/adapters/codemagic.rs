//! CodeMagic adapter

use crate::adapters::{first_line, parse_document, AdapterContext, FormatAdapter};
use crate::core::{
    EnvMap, ExecutionUnit, MacroSyntax, RunnerError, RunnerResult, Shell, Step, StepAction,
    Vendor, Workflow,
};
use crate::schema::codemagic::{CodeMagicConfig, InlineScript, ScriptEntry, Workflow as WorkflowDef};
use serde_yaml::Value;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Prefix marking a script entry as a reference into `definitions.scripts`
pub const REFERENCE_SIGIL: char = '*';

pub struct CodeMagicAdapter;

impl FormatAdapter for CodeMagicAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::CodeMagic
    }

    fn normalize(&self, document: &str, ctx: &AdapterContext) -> RunnerResult<Vec<Workflow>> {
        let doc: CodeMagicConfig = parse_document(Vendor::CodeMagic, document, &["workflows"])?;

        let library = ScriptLibrary::from_definitions(
            doc.definitions.as_ref().and_then(|d| d.scripts.as_ref()),
        );
        debug!("Loaded {} shared script definition(s)", library.len());

        Ok(doc
            .workflows
            .iter()
            .map(|(id, def)| convert_workflow(id, def, &library, ctx))
            .collect())
    }
}

/// Named scripts from `definitions.scripts`
#[derive(Debug, Default)]
struct ScriptLibrary {
    scripts: Vec<(String, InlineScript)>,
}

impl ScriptLibrary {
    fn from_definitions(definitions: Option<&Value>) -> Self {
        let mut scripts = Vec::new();
        match definitions {
            Some(Value::Sequence(items)) => {
                for item in items {
                    match serde_yaml::from_value::<InlineScript>(item.clone()) {
                        Ok(script) => match script.name.clone() {
                            Some(name) => scripts.push((name, script)),
                            None => debug!("Skipping unnamed script definition"),
                        },
                        Err(e) => warn!("Ignoring malformed script definition: {}", e),
                    }
                }
            }
            Some(Value::Mapping(map)) => {
                for (key, value) in map {
                    let Some(key) = key.as_str() else { continue };
                    let script = match value {
                        Value::String(body) => Some(InlineScript {
                            name: Some(key.to_string()),
                            script: Some(body.clone()),
                            ..Default::default()
                        }),
                        other => serde_yaml::from_value::<InlineScript>(other.clone())
                            .map_err(|e| warn!("Ignoring malformed script definition '{}': {}", key, e))
                            .ok(),
                    };
                    if let Some(script) = script {
                        scripts.push((key.to_string(), script));
                    }
                }
            }
            Some(Value::Null) | None => {}
            Some(_) => warn!("`definitions.scripts` must be a list or a mapping; ignoring it"),
        }
        Self { scripts }
    }

    fn get(&self, name: &str) -> Option<&InlineScript> {
        self.scripts
            .iter()
            .find(|(key, _)| key == name)
            .or_else(|| self.scripts.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)))
            .map(|(_, script)| script)
    }

    fn len(&self) -> usize {
        self.scripts.len()
    }
}

fn convert_workflow(
    id: &str,
    def: &WorkflowDef,
    library: &ScriptLibrary,
    ctx: &AdapterContext,
) -> Workflow {
    let workspace = ctx.workspace_str();
    let environment = def.environment.clone().unwrap_or_default();

    let mut global_env = environment.vars.to_env();
    global_env.insert("CI", "true");
    global_env.insert("CONTINUOUS_INTEGRATION", "true");
    global_env.insert("CM_BUILD_DIR", workspace.clone());
    global_env.insert("FCI_BUILD_DIR", workspace);
    global_env.insert(
        "CM_BUILD_OUTPUT_DIR",
        ctx.workspace.join(".localci").join("output").display().to_string(),
    );
    global_env.insert("CM_WORKFLOW_NAME", def.name.clone().unwrap_or_else(|| id.to_string()));

    for group in &environment.groups {
        warn!(
            "Environment group '{}' in workflow '{}' is not available locally; skipping",
            group, id
        );
    }

    let mut metadata = EnvMap::new();
    if let Some(duration) = &def.max_build_duration {
        metadata.insert("max_build_duration", duration.as_str());
    }
    if let Some(instance) = &def.instance_type {
        metadata.insert("instance_type", instance.as_str());
    }
    for (key, value) in environment.toolchain() {
        metadata.insert(key, value);
    }

    let context = format!("workflow '{}'", id);
    let steps = def
        .scripts
        .iter()
        .enumerate()
        .map(|(i, entry)| convert_entry(i, entry, library, &context))
        .collect();

    Workflow::new(id, Vendor::CodeMagic)
        .with_name(def.name.clone())
        .with_global_env(global_env)
        .with_units(vec![
            ExecutionUnit::leaf(id, steps).with_display_name(def.name.clone())
        ])
        .with_substitution(MacroSyntax::None)
        .with_metadata(metadata)
}

fn convert_entry(index: usize, entry: &ScriptEntry, library: &ScriptLibrary, context: &str) -> Step {
    match entry {
        ScriptEntry::Command(command) => match command.trim().strip_prefix(REFERENCE_SIGIL) {
            Some(reference) => {
                let reference = reference.trim();
                match library.get(reference) {
                    Some(script) => inline_step(index, script),
                    None => {
                        warn!("{}; skipping step", RunnerError::reference(reference, context));
                        Step::empty(
                            command.trim(),
                            format!("unresolved script reference '{}'", reference),
                        )
                    }
                }
            }
            None => script_step(first_line(command), command, None),
        },
        ScriptEntry::Inline(script) => inline_step(index, script),
    }
}

fn inline_step(index: usize, script: &InlineScript) -> Step {
    let display_name = script
        .name
        .clone()
        .or_else(|| script.script.as_deref().map(first_line))
        .unwrap_or_else(|| format!("script {}", index + 1));

    let step = match &script.script {
        Some(body) => script_step(display_name, body, script.working_directory.as_deref()),
        None => Step::empty(display_name, "script entry has no `script`"),
    };
    step.with_continue_on_error(script.ignore_failure.unwrap_or(false))
}

fn script_step(display_name: String, body: &str, working_directory: Option<&str>) -> Step {
    let shell = Shell::from_shebang(body).unwrap_or_default();
    Step::new(
        display_name,
        StepAction::Script {
            shell,
            script: body.to_string(),
        },
    )
    .with_working_directory(working_directory.map(PathBuf::from))
}
