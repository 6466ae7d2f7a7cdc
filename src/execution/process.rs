//! Script executor - runs one script through a local shell

use crate::core::{EnvMap, RunnerError, Shell};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Everything needed to run one script
#[derive(Debug, Clone)]
pub struct ScriptRequest {
    pub shell: Shell,
    /// Script text with macros already expanded
    pub script: String,
    pub cwd: PathBuf,
    /// Variables layered on top of the host environment
    pub env: EnvMap,
    /// Inherit the terminal instead of capturing output
    pub stream_output: bool,
    pub timeout: Option<Duration>,
}

/// What a finished script produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOutput {
    /// `None` when the process was killed by a signal or timed out
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl ScriptOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Runs scripts on behalf of the engine
///
/// A non-zero exit is a normal result; only a failure to start the process
/// is an error.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    async fn run(&self, request: &ScriptRequest) -> Result<ScriptOutput, RunnerError>;
}

/// Executor backed by `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScriptExecutor for ShellExecutor {
    async fn run(&self, request: &ScriptRequest) -> Result<ScriptOutput, RunnerError> {
        let (program, args) = request.shell.command_line(&request.script);
        debug!(
            "Spawning {} {} in {}",
            program,
            args.iter()
                .take(args.len().saturating_sub(1))
                .cloned()
                .collect::<Vec<_>>()
                .join(" "),
            request.cwd.display()
        );

        let mut command = Command::new(&program);
        command
            .args(&args)
            .current_dir(&request.cwd)
            .envs(request.env.iter())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if request.stream_output {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let child = command.spawn().map_err(|source| RunnerError::ProcessLaunch {
            program: program.clone(),
            source,
        })?;

        let waited = match request.timeout {
            Some(limit) => match timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    // Dropping the future kills the child
                    warn!("Script timed out after {}s and was killed", limit.as_secs());
                    return Ok(ScriptOutput {
                        timed_out: true,
                        ..Default::default()
                    });
                }
            },
            None => child.wait_with_output().await,
        };

        let output = waited.map_err(|source| RunnerError::ProcessLaunch { program, source })?;

        Ok(ScriptOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            timed_out: false,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn request(script: &str) -> ScriptRequest {
        ScriptRequest {
            shell: Shell::Default,
            script: script.to_string(),
            cwd: std::env::temp_dir(),
            env: EnvMap::new(),
            stream_output: false,
            timeout: None,
        }
    }

    #[tokio::test]
    async fn test_captures_output() {
        let output = ShellExecutor.run(&request("echo out; echo err >&2")).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_not_an_error() {
        let output = ShellExecutor.run(&request("exit 3")).await.unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_env_is_layered_over_host() {
        let mut req = request("echo \"$LOCALCI_TEST_VAR:${PATH:+has-path}\"");
        req.env.insert("LOCALCI_TEST_VAR", "layered");
        let output = ShellExecutor.run(&req).await.unwrap();
        assert_eq!(output.stdout.trim(), "layered:has-path");
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let mut req = request("true");
        req.shell = Shell::Custom("localci-no-such-shell".to_string());
        let err = ShellExecutor.run(&req).await.unwrap_err();
        assert!(matches!(err, RunnerError::ProcessLaunch { .. }));
    }

    #[tokio::test]
    async fn test_bad_working_directory_is_launch_error() {
        let mut req = request("true");
        req.cwd = PathBuf::from("/definitely/not/a/real/dir");
        let err = ShellExecutor.run(&req).await.unwrap_err();
        assert!(matches!(err, RunnerError::ProcessLaunch { .. }));
    }

    #[tokio::test]
    async fn test_timeout_kills_script() {
        let mut req = request("sleep 5");
        req.timeout = Some(Duration::from_millis(100));
        let output = ShellExecutor.run(&req).await.unwrap();
        assert!(output.timed_out);
        assert!(!output.success());
    }
}
