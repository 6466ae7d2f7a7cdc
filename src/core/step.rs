//! Step domain model

use crate::core::condition::Condition;
use crate::core::scope::EnvMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// A single step inside a job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    /// Human-readable name shown in the trace
    pub display_name: String,

    /// What the step does
    pub action: StepAction,

    /// Step-level environment, the innermost scope layer
    pub env: EnvMap,

    /// Optional `if:` / `condition:` guard
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,

    /// A failure is recorded but does not halt the job
    pub continue_on_error: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,

    /// Declared timeout, only enforced when the runner is told to
    #[serde(skip_serializing_if = "Option::is_none", with = "duration_secs")]
    pub timeout: Option<Duration>,
}

/// The work a step performs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepAction {
    /// A script executed through a local shell
    Script { shell: Shell, script: String },
    /// A hosted action or task with no local equivalent; logged, never run
    PlatformAction { action: String, inputs: EnvMap },
    /// Nothing to run
    Empty { reason: String },
}

impl Step {
    pub fn new(display_name: impl Into<String>, action: StepAction) -> Self {
        Self {
            display_name: display_name.into(),
            action,
            env: EnvMap::new(),
            condition: None,
            continue_on_error: false,
            working_directory: None,
            timeout: None,
        }
    }

    /// Shorthand for a script step using the default shell
    pub fn script(display_name: impl Into<String>, script: impl Into<String>) -> Self {
        Self::new(
            display_name,
            StepAction::Script {
                shell: Shell::Default,
                script: script.into(),
            },
        )
    }

    pub fn empty(display_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            display_name,
            StepAction::Empty {
                reason: reason.into(),
            },
        )
    }

    pub fn with_env(mut self, env: EnvMap) -> Self {
        self.env = env;
        self
    }

    pub fn with_condition(mut self, condition: Option<Condition>) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn with_working_directory(mut self, dir: Option<PathBuf>) -> Self {
        self.working_directory = dir;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the step would spawn a process
    pub fn is_script(&self) -> bool {
        matches!(self.action, StepAction::Script { .. })
    }
}

/// Shell used to run a script step
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Shell {
    /// Platform default: `sh` on unix, `cmd` on windows
    #[default]
    Default,
    Bash,
    Sh,
    Pwsh,
    PowerShell,
    Python,
    Cmd,
    /// A custom command line such as `bash -x {0}`
    Custom(String),
}

impl Shell {
    /// Parse a shell name as written in a pipeline document
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Shell::Default,
            "bash" => Shell::Bash,
            "sh" => Shell::Sh,
            "pwsh" => Shell::Pwsh,
            "powershell" => Shell::PowerShell,
            "python" | "python3" => Shell::Python,
            "cmd" => Shell::Cmd,
            _ => Shell::Custom(name.trim().to_string()),
        }
    }

    /// Pick a shell from a `#!` line, if the script has one
    pub fn from_shebang(script: &str) -> Option<Self> {
        let line = script.trim_start().lines().next()?.strip_prefix("#!")?;
        let mut parts = line.split_whitespace();
        let mut program = parts.next()?;
        if program.ends_with("/env") {
            program = parts.next()?;
        }
        let name = program.rsplit('/').next().unwrap_or(program);
        match Shell::parse(name) {
            Shell::Custom(_) if name.starts_with("python") => Some(Shell::Python),
            Shell::Custom(_) => None,
            shell => Some(shell),
        }
    }

    /// Program and arguments that run `script` with this shell
    pub fn command_line(&self, script: &str) -> (String, Vec<String>) {
        let with = |program: &str, flags: &[&str]| {
            let mut args: Vec<String> = flags.iter().map(|f| f.to_string()).collect();
            args.push(script.to_string());
            (program.to_string(), args)
        };

        match self {
            Shell::Default if cfg!(windows) => with("cmd", &["/C"]),
            Shell::Default => with("sh", &["-c"]),
            Shell::Bash => with("bash", &["--noprofile", "--norc", "-eo", "pipefail", "-c"]),
            Shell::Sh => with("sh", &["-e", "-c"]),
            Shell::Pwsh => with("pwsh", &["-NoLogo", "-NoProfile", "-NonInteractive", "-Command"]),
            Shell::PowerShell => with(
                "powershell",
                &["-NoLogo", "-NoProfile", "-NonInteractive", "-Command"],
            ),
            Shell::Python => with("python3", &["-c"]),
            Shell::Cmd => with("cmd", &["/D", "/E:ON", "/V:OFF", "/S", "/C"]),
            Shell::Custom(line) => {
                let mut tokens = line.split_whitespace().filter(|t| *t != "{0}");
                let program = tokens.next().unwrap_or("sh").to_string();
                let mut args: Vec<String> = tokens.map(str::to_string).collect();
                args.push("-c".to_string());
                args.push(script.to_string());
                (program, args)
            }
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shell::Default => f.write_str("default"),
            Shell::Bash => f.write_str("bash"),
            Shell::Sh => f.write_str("sh"),
            Shell::Pwsh => f.write_str("pwsh"),
            Shell::PowerShell => f.write_str("powershell"),
            Shell::Python => f.write_str("python"),
            Shell::Cmd => f.write_str("cmd"),
            Shell::Custom(line) => f.write_str(line),
        }
    }
}

impl Serialize for Shell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_u64(duration.as_secs()),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shell_names() {
        assert_eq!(Shell::parse("bash"), Shell::Bash);
        assert_eq!(Shell::parse("PowerShell"), Shell::PowerShell);
        assert_eq!(Shell::parse("python3"), Shell::Python);
        assert_eq!(Shell::parse(""), Shell::Default);
        assert_eq!(Shell::parse("bash -x {0}"), Shell::Custom("bash -x {0}".to_string()));
    }

    #[test]
    fn test_default_shell_command_line() {
        let (program, args) = Shell::Default.command_line("echo hi");
        if cfg!(windows) {
            assert_eq!(program, "cmd");
        } else {
            assert_eq!(program, "sh");
            assert_eq!(args, vec!["-c", "echo hi"]);
        }
    }

    #[test]
    fn test_bash_runs_with_pipefail() {
        let (program, args) = Shell::Bash.command_line("make");
        assert_eq!(program, "bash");
        assert!(args.contains(&"pipefail".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("make"));
    }

    #[test]
    fn test_custom_shell_drops_placeholder() {
        let (program, args) = Shell::Custom("bash -x {0}".to_string()).command_line("ls");
        assert_eq!(program, "bash");
        assert_eq!(args, vec!["-x", "-c", "ls"]);
    }

    #[test]
    fn test_shebang_detection() {
        assert_eq!(Shell::from_shebang("#!/bin/bash\necho hi"), Some(Shell::Bash));
        assert_eq!(Shell::from_shebang("#!/usr/bin/env python3\nprint(1)"), Some(Shell::Python));
        assert_eq!(Shell::from_shebang("#!/usr/bin/env ruby\nputs 1"), None);
        assert_eq!(Shell::from_shebang("echo no shebang"), None);
    }

    #[test]
    fn test_step_builder() {
        let step = Step::script("Build", "make")
            .with_continue_on_error(true)
            .with_timeout(Some(Duration::from_secs(60)));

        assert!(step.is_script());
        assert!(step.continue_on_error);
        assert_eq!(step.timeout, Some(Duration::from_secs(60)));
        assert!(!Step::empty("noop", "nothing to run").is_script());
    }
}
