//! CLI command definitions

use crate::core::{EnvMap, RunnerConfig, Shell, Vendor};
use crate::discovery::LoadRequest;
use clap::Args;
use std::path::PathBuf;

/// Run a pipeline locally
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Pipeline file, or a directory to search for one
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Skip detection and treat the file as this vendor's format
    #[arg(long, value_enum)]
    pub vendor: Option<VendorArg>,

    /// Workflow to run when the document or directory holds several
    #[arg(short, long)]
    pub workflow: Option<String>,

    /// Extra environment variables (KEY=VALUE), applied over the pipeline's own
    #[arg(short, long = "env", value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,

    /// Shell used for steps that don't name one
    #[arg(long)]
    pub shell: Option<String>,

    /// Directory scripts run in (defaults to the repository root)
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Kill steps that exceed their declared timeout
    #[arg(long)]
    pub enforce_timeouts: bool,

    /// Pick the first candidate instead of prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Print the run result as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunCommand {
    pub fn load_request(&self) -> LoadRequest {
        LoadRequest::new(&self.path)
            .with_vendor(self.vendor.map(Vendor::from))
            .with_workflow(self.workflow.clone())
    }

    /// Runner settings for a pipeline whose repository root is `workspace`
    pub fn runner_config(&self, workspace: PathBuf, stream: bool) -> RunnerConfig {
        let extra_env: EnvMap = self.env.iter().cloned().collect();
        RunnerConfig::new()
            .with_workspace(self.workspace.clone().unwrap_or(workspace))
            .with_shell_override(self.shell.as_deref().map(Shell::parse))
            .with_stream_output(stream)
            .with_enforce_timeouts(self.enforce_timeouts)
            .with_extra_env(extra_env)
    }
}

/// Parse a pipeline and print its execution plan without running it
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Pipeline file, or a directory to search for one
    #[arg(default_value = ".")]
    pub path: PathBuf,

    #[arg(long, value_enum)]
    pub vendor: Option<VendorArg>,

    #[arg(short, long)]
    pub workflow: Option<String>,

    /// Pick the first candidate instead of prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Output the normalized workflow as JSON
    #[arg(long)]
    pub json: bool,
}

impl ValidateCommand {
    pub fn load_request(&self) -> LoadRequest {
        LoadRequest::new(&self.path)
            .with_vendor(self.vendor.map(Vendor::from))
            .with_workflow(self.workflow.clone())
    }
}

/// Report which CI system each pipeline file belongs to
#[derive(Debug, Args, Clone)]
pub struct DetectCommand {
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

/// List the workflows found in a directory
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Vendor argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum VendorArg {
    #[clap(alias = "gh")]
    Github,
    #[clap(alias = "ado")]
    Azure,
    #[clap(alias = "cm")]
    Codemagic,
}

impl From<VendorArg> for Vendor {
    fn from(arg: VendorArg) -> Self {
        match arg {
            VendorArg::Github => Vendor::GitHub,
            VendorArg::Azure => Vendor::Azure,
            VendorArg::Codemagic => Vendor::CodeMagic,
        }
    }
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Invalid key=value pair: {}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("A=b=c"),
            Ok(("A".to_string(), "b=c".to_string()))
        );
        assert_eq!(parse_key_value("EMPTY="), Ok(("EMPTY".to_string(), String::new())));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_vendor_arg_conversion() {
        assert_eq!(Vendor::from(VendorArg::Github), Vendor::GitHub);
        assert_eq!(Vendor::from(VendorArg::Codemagic), Vendor::CodeMagic);
    }
}
