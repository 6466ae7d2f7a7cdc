//! CLI output formatting

use crate::core::{
    ExecutionUnit, Step, StepAction, StepResult, StepStatus, UnitBody, UnitStatus, Workflow,
    WorkflowResult,
};
use crate::execution::ExecutionEvent;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write as _;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static SIMULATED: Emoji<'_, '_> = Emoji("🎭 ", "* ");

/// Spinner shown while a captured step runs
pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a step status for display
pub fn format_step_status(status: &StepStatus) -> String {
    match status {
        StepStatus::Succeeded => style("SUCCEEDED").green().to_string(),
        StepStatus::Failed => style("FAILED").red().to_string(),
        StepStatus::Simulated => style("SIMULATED").blue().to_string(),
        StepStatus::Skipped { .. } => style("SKIPPED").dim().to_string(),
    }
}

/// Format a unit status for display
pub fn format_unit_status(status: &UnitStatus) -> String {
    match status {
        UnitStatus::Succeeded => style("SUCCEEDED").green().to_string(),
        UnitStatus::Failed => style("FAILED").red().to_string(),
        UnitStatus::Skipped { .. } => style("SKIPPED").dim().to_string(),
    }
}

fn step_icon(status: &StepStatus) -> Emoji<'static, 'static> {
    match status {
        StepStatus::Succeeded => CHECK,
        StepStatus::Failed => CROSS,
        StepStatus::Simulated => SIMULATED,
        StepStatus::Skipped { .. } => SKIP,
    }
}

pub fn format_duration(duration_ms: u64) -> String {
    let secs = duration_ms / 1000;
    if duration_ms < 1000 {
        format!("{}ms", duration_ms)
    } else if secs < 60 {
        format!("{:.1}s", duration_ms as f64 / 1000.0)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// One-line description of a finished step
pub fn format_step_result(result: &StepResult) -> String {
    let detail = match &result.status {
        StepStatus::Succeeded => style(format_duration(result.duration_ms)).dim().to_string(),
        StepStatus::Failed => match result.exit_code {
            Some(code) => format!(
                "{} {}",
                style(format!("exit code {}", code)).red(),
                style(format_duration(result.duration_ms)).dim()
            ),
            None => style("terminated").red().to_string(),
        },
        StepStatus::Simulated => style("platform action, not executed").dim().to_string(),
        StepStatus::Skipped { reason } => style(reason).dim().to_string(),
    };
    format!(
        "{}{} {}",
        step_icon(&result.status),
        style(&result.display_name).bold(),
        detail
    )
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::WorkflowStarted {
            run_id,
            name,
            unit_count,
        } => format!(
            "{} Running {} ({}, {} unit(s))",
            ROCKET,
            style(name).bold(),
            style(&run_id.to_string()[..8]).dim(),
            unit_count
        ),
        ExecutionEvent::UnitStarted {
            display_name,
            depth,
            ..
        } => format!("{}{} {}", indent(*depth), style("▶").cyan(), style(display_name).bold()),
        ExecutionEvent::UnitSkipped {
            display_name,
            reason,
            depth,
            ..
        } => format!(
            "{}{}{} {}",
            indent(*depth),
            SKIP,
            style(display_name).dim(),
            style(format!("({})", reason)).dim()
        ),
        ExecutionEvent::UnitFinished {
            display_name,
            status,
            depth,
            ..
        } => format!(
            "{}{} {}",
            indent(*depth),
            style(display_name).dim(),
            format_unit_status(status)
        ),
        ExecutionEvent::StepStarted { display_name, .. } => {
            format!("{}{}", SPINNER, style(display_name).cyan())
        }
        ExecutionEvent::StepSkipped {
            display_name,
            reason,
            ..
        } => format!(
            "{}{} {}",
            SKIP,
            style(display_name).dim(),
            style(format!("({})", reason)).dim()
        ),
        ExecutionEvent::StepFinished { result, .. } => format_step_result(result),
        ExecutionEvent::WorkflowFinished {
            run_id,
            succeeded,
            duration_ms,
        } => {
            let status_str = if *succeeded {
                style("succeeded").green().to_string()
            } else {
                style("failed").red().to_string()
            };
            format!(
                "{} Run ({}) {} in {}",
                INFO,
                style(&run_id.to_string()[..8]).dim(),
                status_str,
                format_duration((*duration_ms).max(0) as u64)
            )
        }
    }
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}

/// Final tally of a run, plus the failed steps
pub fn format_summary(result: &WorkflowResult) -> String {
    let tally = result.tally();
    let mut out = String::new();
    let (icon, verdict) = if result.succeeded {
        (CHECK, style("succeeded").green())
    } else {
        (CROSS, style("failed").red())
    };
    let _ = writeln!(
        out,
        "{}{} {} in {}",
        icon,
        style(&result.name).bold(),
        verdict,
        format_duration(result.duration().num_milliseconds().max(0) as u64)
    );
    let _ = write!(
        out,
        "  {} succeeded, {} failed, {} simulated, {} skipped",
        style(tally.succeeded).green(),
        style(tally.failed).red(),
        style(tally.simulated).blue(),
        style(tally.skipped).dim()
    );
    for step in result.step_results().into_iter().filter(|s| !s.is_success()) {
        let _ = write!(out, "\n  {} {}", CROSS, style(&step.display_name).red());
    }
    out
}

fn describe_step(step: &Step) -> String {
    let kind = match &step.action {
        StepAction::Script { shell, script } => {
            let first = script.lines().next().unwrap_or_default();
            let more = if script.lines().count() > 1 { " ..." } else { "" };
            format!("{} {}{}", style(format!("[{}]", shell)).cyan(), style(first).dim(), more)
        }
        StepAction::PlatformAction { action, .. } => {
            format!("{} {}", style("[action]").blue(), style(action).dim())
        }
        StepAction::Empty { reason } => format!("{} {}", style("[empty]").yellow(), style(reason).dim()),
    };
    let mut line = format!("{} {}", style(&step.display_name).bold(), kind);
    if let Some(condition) = &step.condition {
        let _ = write!(line, " {}", style(format!("if: {}", condition.source())).magenta());
    }
    if step.continue_on_error {
        let _ = write!(line, " {}", style("(continue on error)").dim());
    }
    line
}

fn write_unit(out: &mut String, unit: &ExecutionUnit, depth: usize) {
    let mut header = format!("{}{}", indent(depth), style(&unit.display_name).bold().underlined());
    if unit.display_name != unit.name {
        let _ = write!(header, " {}", style(format!("({})", unit.name)).dim());
    }
    if let Some(condition) = &unit.condition {
        let _ = write!(header, " {}", style(format!("if: {}", condition.source())).magenta());
    }
    let _ = writeln!(out, "{}", header);
    match &unit.body {
        UnitBody::Composite(children) => {
            for child in children {
                write_unit(out, child, depth + 1);
            }
        }
        UnitBody::Leaf(steps) => {
            for (i, step) in steps.iter().enumerate() {
                let _ = writeln!(out, "{}{}. {}", indent(depth + 1), i + 1, describe_step(step));
            }
        }
    }
}

/// Execution plan of a normalized workflow
pub fn format_plan(workflow: &Workflow) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  Name: {}\n  Vendor: {}\n  Units: {}\n  Steps: {}",
        style(workflow.display_name()).bold(),
        style(workflow.vendor).cyan(),
        style(workflow.units.len()).cyan(),
        style(workflow.step_count()).cyan()
    );
    if !workflow.global_env.is_empty() {
        let _ = writeln!(out, "  Variables: {}", style(workflow.global_env.len()).cyan());
    }
    let _ = writeln!(out);
    for unit in &workflow.units {
        write_unit(&mut out, unit, 1);
    }
    out.trim_end().to_string()
}
