use anyhow::{Context, Result};
use localci::cli::commands::{DetectCommand, ListCommand, RunCommand, ValidateCommand};
use localci::cli::output::*;
use localci::cli::terminal_output::TerminalReporter;
use localci::cli::{Cli, Command};
use localci::discovery::{self, FirstCandidate, PipelineLoader, TerminalSelector};
use localci::execution::{describe_abort, ExecutionEngine, ShellExecutor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let succeeded = match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd, &cli).await?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::Detect(cmd) => detect_pipelines(cmd),
        Command::List(cmd) => list_pipelines(cmd)?,
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

fn pipeline_loader(yes: bool) -> PipelineLoader {
    if yes {
        PipelineLoader::new(FirstCandidate)
    } else {
        PipelineLoader::new(TerminalSelector::new())
    }
}

async fn run_pipeline(cmd: &RunCommand, cli: &Cli) -> Result<bool> {
    let loaded = pipeline_loader(cmd.yes)
        .load(&cmd.load_request())
        .context("Failed to load pipeline")?;
    let Some(loaded) = loaded else {
        println!("{} Nothing selected; no workflow was run", INFO);
        return Ok(true);
    };

    println!(
        "{} Loaded {} workflow {} from {}",
        INFO,
        loaded.workflow.vendor,
        style(loaded.workflow.display_name()).bold(),
        style(loaded.path.display()).dim()
    );
    for (key, value) in &cmd.env {
        println!(
            "{} Variable override: {} = {}",
            INFO,
            style(key).cyan(),
            style(value).dim()
        );
    }

    let config = cmd.runner_config(loaded.workspace.clone(), cli.stream);
    debug!("Workspace: {}", config.workspace.display());
    let mut engine = ExecutionEngine::new(ShellExecutor::new(), config);

    if !cmd.json {
        let reporter = Arc::new(TerminalReporter::new(
            cli.verbose,
            cli.stream,
            loaded.workflow.step_count(),
        ));
        engine.add_event_handler(move |event| reporter.on_event(&event));
    }

    println!();
    let result = match engine.run(&loaded.workflow).await {
        Ok(result) => result,
        Err(e) => {
            println!("\n{} {}", CROSS, style(describe_abort(&e)).red());
            error!("{}", e);
            return Ok(false);
        }
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("\n{}", format_summary(&result));
    }
    Ok(result.succeeded)
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<bool> {
    println!("{} Validating pipeline...", INFO);

    match pipeline_loader(cmd.yes).load(&cmd.load_request()) {
        Ok(Some(loaded)) => {
            println!(
                "{} {} is a valid {} pipeline",
                CHECK,
                style(loaded.path.display()).bold(),
                loaded.workflow.vendor
            );
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&loaded.workflow)?);
            } else {
                println!("{}", format_plan(&loaded.workflow));
            }
            Ok(true)
        }
        Ok(None) => {
            println!("{} Nothing selected", INFO);
            Ok(true)
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            Ok(false)
        }
    }
}

/// Files to inspect for `detect` and `list`
fn candidate_files(path: &Path) -> Vec<PathBuf> {
    if path.is_dir() {
        discovery::find_candidates(path)
    } else {
        vec![path.to_path_buf()]
    }
}

fn detect_pipelines(cmd: &DetectCommand) -> bool {
    let files = candidate_files(&cmd.path);
    if files.is_empty() {
        println!("{} No pipeline files found in {}", WARN, cmd.path.display());
        return false;
    }

    let mut detected = false;
    for file in &files {
        match discovery::detect(file) {
            Some(vendor) => {
                detected = true;
                println!("{}{} {}", CHECK, style(vendor).cyan(), file.display());
            }
            None => println!("{}{} {}", WARN, style("unknown").yellow(), file.display()),
        }
    }
    detected
}

fn list_pipelines(cmd: &ListCommand) -> Result<bool> {
    let files = candidate_files(&cmd.path);
    if files.is_empty() {
        println!("{} No pipeline files found in {}", INFO, cmd.path.display());
        return Ok(true);
    }

    let loader = PipelineLoader::new(FirstCandidate);
    let mut all_valid = true;
    let mut json_data = Vec::new();

    for file in &files {
        let document = match loader.load_document(file, None) {
            Ok(document) => document,
            Err(e) => {
                all_valid = false;
                if cmd.json {
                    json_data.push(serde_json::json!({
                        "path": file,
                        "error": e.to_string(),
                    }));
                } else {
                    println!("{} {}: {}", CROSS, style(file.display()).bold(), style(e).red());
                }
                continue;
            }
        };

        if cmd.json {
            let workflows: Vec<_> = document
                .workflows
                .iter()
                .map(|w| {
                    serde_json::json!({
                        "id": w.id,
                        "name": w.name,
                        "units": w.units.len(),
                        "steps": w.step_count(),
                    })
                })
                .collect();
            json_data.push(serde_json::json!({
                "path": document.path,
                "vendor": document.vendor,
                "workflows": workflows,
            }));
            continue;
        }

        println!(
            "{} {} ({})",
            INFO,
            style(document.path.display()).bold(),
            style(document.vendor).cyan()
        );
        for workflow in &document.workflows {
            println!(
                "  {} {} unit(s), {} step(s)",
                style(workflow.display_name()).bold(),
                style(workflow.units.len()).cyan(),
                style(workflow.step_count()).cyan()
            );
        }
    }

    if cmd.json {
        let data = serde_json::json!({ "pipelines": json_data });
        println!("{}", serde_json::to_string_pretty(&data)?);
    }
    Ok(all_valid)
}
