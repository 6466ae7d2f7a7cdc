//! Execution result models

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Outcome of a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    /// Script exited with code zero
    Succeeded,
    /// Script exited non-zero, timed out or was killed
    Failed,
    /// Platform action logged instead of performed
    Simulated,
    /// Not executed (false condition, empty step, or halted job)
    Skipped { reason: String },
}

impl StepStatus {
    /// Skipped and simulated steps count as success
    pub fn is_success(&self) -> bool {
        !matches!(self, StepStatus::Failed)
    }
}

/// Outcome of a stage or job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitStatus {
    Succeeded,
    Failed,
    Skipped { reason: String },
}

impl UnitStatus {
    pub fn is_success(&self) -> bool {
        !matches!(self, UnitStatus::Failed)
    }
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub display_name: String,
    #[serde(flatten)]
    pub status: StepStatus,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl StepResult {
    /// A step that never ran
    pub fn skipped(display_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::without_output(
            display_name,
            StepStatus::Skipped {
                reason: reason.into(),
            },
        )
    }

    /// A platform action that was only logged
    pub fn simulated(display_name: impl Into<String>) -> Self {
        Self::without_output(display_name, StepStatus::Simulated)
    }

    fn without_output(display_name: impl Into<String>, status: StepStatus) -> Self {
        Self {
            display_name: display_name.into(),
            status,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of one unit; holds either child results or step results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitResult {
    pub name: String,
    #[serde(flatten)]
    pub status: UnitStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<UnitResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepResult>,
}

impl UnitResult {
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: UnitStatus::Skipped {
                reason: reason.into(),
            },
            children: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    fn collect_steps<'a>(&'a self, out: &mut Vec<&'a StepResult>) {
        for child in &self.children {
            child.collect_steps(out);
        }
        out.extend(self.steps.iter());
    }
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub run_id: Uuid,
    pub name: String,
    pub succeeded: bool,
    pub units: Vec<UnitResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl WorkflowResult {
    /// Every step result, depth-first in declaration order
    pub fn step_results(&self) -> Vec<&StepResult> {
        let mut out = Vec::new();
        for unit in &self.units {
            unit.collect_steps(&mut out);
        }
        out
    }

    /// Count of steps per outcome
    pub fn tally(&self) -> StepTally {
        let mut tally = StepTally::default();
        for step in self.step_results() {
            match step.status {
                StepStatus::Succeeded => tally.succeeded += 1,
                StepStatus::Failed => tally.failed += 1,
                StepStatus::Simulated => tally.simulated += 1,
                StepStatus::Skipped { .. } => tally.skipped += 1,
            }
        }
        tally
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Step counts by outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepTally {
    pub succeeded: usize,
    pub failed: usize,
    pub simulated: usize,
    pub skipped: usize,
}
