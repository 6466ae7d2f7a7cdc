//! Runner configuration

use crate::core::scope::EnvMap;
use crate::core::step::Shell;
use std::path::PathBuf;

/// Settings for one local run, assembled by the CLI
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Directory scripts run in unless a step sets its own
    pub workspace: PathBuf,

    /// Replaces the platform default shell; explicit step shells are kept
    pub shell_override: Option<Shell>,

    /// Let scripts write straight to the terminal instead of capturing
    pub stream_output: bool,

    /// Turn declared step timeouts into kill deadlines
    pub enforce_timeouts: bool,

    /// Variables layered on top of the workflow globals (`--env KEY=VALUE`)
    pub extra_env: EnvMap,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("."),
            shell_override: None,
            stream_output: false,
            enforce_timeouts: false,
            extra_env: EnvMap::new(),
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.workspace = workspace.into();
        self
    }

    pub fn with_shell_override(mut self, shell: Option<Shell>) -> Self {
        self.shell_override = shell;
        self
    }

    pub fn with_stream_output(mut self, stream: bool) -> Self {
        self.stream_output = stream;
        self
    }

    pub fn with_enforce_timeouts(mut self, enforce: bool) -> Self {
        self.enforce_timeouts = enforce;
        self
    }

    pub fn with_extra_env(mut self, env: EnvMap) -> Self {
        self.extra_env = env;
        self
    }

    /// Shell actually used for a step that asked for `shell`
    pub fn effective_shell(&self, shell: &Shell) -> Shell {
        match (shell, &self.shell_override) {
            (Shell::Default, Some(over)) => over.clone(),
            _ => shell.clone(),
        }
    }
}
