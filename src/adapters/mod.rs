//! Format adapters
//!
//! Each adapter turns one vendor's YAML document into normalized
//! [`Workflow`]s. Documents are first decoded into a generic YAML value so
//! that a missing top-level section is reported as a schema error naming the
//! section, rather than as a raw deserializer message.

pub mod azure;
pub mod codemagic;
pub mod github;

use crate::core::{RunnerError, RunnerResult, Vendor, Workflow};
use crate::schema::EnvValue;
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

pub use azure::AzureAdapter;
pub use codemagic::CodeMagicAdapter;
pub use github::GitHubAdapter;

/// Information about where a document came from
#[derive(Debug, Clone)]
pub struct AdapterContext {
    /// Workspace root used for synthesized path variables
    pub workspace: PathBuf,
    /// File stem of the document, used when it declares no name
    pub document_name: Option<String>,
}

impl AdapterContext {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            document_name: None,
        }
    }

    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = Some(name.into());
        self
    }

    fn workspace_str(&self) -> String {
        self.workspace.display().to_string()
    }
}

/// Translates one vendor's document into the shared execution model
pub trait FormatAdapter: Send + Sync {
    fn vendor(&self) -> Vendor;

    /// Every workflow declared in `document`, in declaration order
    fn normalize(&self, document: &str, ctx: &AdapterContext) -> RunnerResult<Vec<Workflow>>;
}

/// Adapter for a vendor
pub fn adapter_for(vendor: Vendor) -> Box<dyn FormatAdapter> {
    match vendor {
        Vendor::GitHub => Box::new(GitHubAdapter),
        Vendor::Azure => Box::new(AzureAdapter),
        Vendor::CodeMagic => Box::new(CodeMagicAdapter),
    }
}

/// Decode a document, requiring `required` top-level keys to hold mappings
pub(crate) fn parse_document<T: DeserializeOwned>(
    vendor: Vendor,
    document: &str,
    required: &[&str],
) -> RunnerResult<T> {
    let root: Value = serde_yaml::from_str(document)?;
    let Value::Mapping(map) = &root else {
        return Err(RunnerError::schema(vendor, "document root is not a mapping"));
    };

    for key in required {
        match map.get(*key) {
            None => {
                return Err(RunnerError::schema(
                    vendor,
                    format!("missing required top-level `{}`", key),
                ))
            }
            Some(Value::Mapping(_)) => {}
            Some(_) => {
                return Err(RunnerError::schema(
                    vendor,
                    format!("`{}` must be a mapping", key),
                ))
            }
        }
    }

    serde_yaml::from_value(root).map_err(|e| RunnerError::schema(vendor, e.to_string()))
}

/// First non-blank line of a script, for display
pub(crate) fn first_line(script: &str) -> String {
    script
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Interpret a boolean-ish field such as `continue-on-error`
pub(crate) fn parse_flag(value: Option<&EnvValue>, field: &str) -> bool {
    let Some(value) = value else {
        return false;
    };
    match value.as_str().trim().to_ascii_lowercase().as_str() {
        "true" | "yes" => true,
        "false" | "no" | "" => false,
        other => {
            debug!("Treating non-literal `{}: {}` as false", field, other);
            false
        }
    }
}

/// Parse a timeout given in minutes
pub(crate) fn parse_minutes(value: Option<&EnvValue>) -> Option<Duration> {
    let minutes: f64 = value?.as_str().trim().parse().ok()?;
    (minutes > 0.0).then(|| Duration::from_secs_f64(minutes * 60.0))
}

/// Operating system name as CI runners report it
pub(crate) fn runner_os() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        other => other,
    }
}
