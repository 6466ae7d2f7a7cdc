//! Live terminal reporting of a run
//!
//! `TerminalReporter` consumes engine events and renders them as they
//! arrive:
//!
//! - Step headers with progress indicators: `[1/3] Build`
//! - A spinner while a captured step runs
//! - Horizontal separators around the run
//! - Captured output of failed steps in verbose mode

use crate::cli::output::{create_spinner, format_execution_event, format_output, style, INFO};
use crate::core::{StepResult, StepStatus};
use crate::execution::ExecutionEvent;
use indicatif::ProgressBar;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Lines of failed-step output shown per stream
const FAILURE_TAIL_LINES: usize = 40;

/// Event handler that prints a run to the terminal
pub struct TerminalReporter {
    verbose: bool,
    stream: bool,
    step_number: AtomicUsize,
    total_steps: AtomicUsize,
    spinner: Mutex<Option<ProgressBar>>,
}

impl TerminalReporter {
    /// `total_steps` feeds the `[N/M]` header; `stream` means scripts write
    /// to the terminal themselves, so no spinner is drawn.
    pub fn new(verbose: bool, stream: bool, total_steps: usize) -> Self {
        Self {
            verbose,
            stream,
            step_number: AtomicUsize::new(0),
            total_steps: AtomicUsize::new(total_steps),
            spinner: Mutex::new(None),
        }
    }

    pub fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::WorkflowStarted { .. } => {
                println!("{}", format_execution_event(event));
                self.print_separator();
            }
            ExecutionEvent::StepStarted {
                display_name,
                runs_script,
                ..
            } => {
                let step = self.increment_step();
                let header = self.step_header(step, display_name);
                if *runs_script && !self.stream {
                    self.start_spinner(header);
                } else {
                    println!("{}", header);
                }
            }
            ExecutionEvent::StepSkipped { .. } => {
                self.increment_step();
                println!("    {}", format_execution_event(event));
            }
            ExecutionEvent::StepFinished { result, .. } => {
                self.stop_spinner();
                println!("    {}", format_execution_event(event));
                if result.status == StepStatus::Failed {
                    self.print_failure_output(result);
                }
            }
            ExecutionEvent::WorkflowFinished { .. } => {
                self.stop_spinner();
                self.print_separator();
            }
            _ => println!("{}", format_execution_event(event)),
        }
        self.flush_stdout();
    }

    /// Format: `[N/M] Step Name`
    fn step_header(&self, step_num: usize, step_name: &str) -> String {
        let total = self.total_steps.load(Ordering::SeqCst);
        format!(
            "  [{}/{}] {}",
            style(step_num).cyan(),
            style(total).dim(),
            style(step_name).bold()
        )
    }

    fn increment_step(&self) -> usize {
        self.step_number.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn start_spinner(&self, message: String) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(previous) = slot.take() {
                previous.finish_and_clear();
            }
            *slot = Some(create_spinner(message.clone()));
        }
        if !console::Term::stderr().is_term() {
            println!("{}", message);
        }
    }

    fn stop_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(spinner) = slot.take() {
                let message = spinner.message();
                spinner.finish_and_clear();
                if console::Term::stderr().is_term() {
                    println!("{}", message);
                }
            }
        }
    }

    fn print_failure_output(&self, result: &StepResult) {
        if self.stream {
            return;
        }
        if !self.verbose {
            println!(
                "      {} rerun with {} to see the step's output",
                INFO,
                style("--verbose").cyan()
            );
            return;
        }
        for (label, output) in [("stdout", &result.stdout), ("stderr", &result.stderr)] {
            if output.trim().is_empty() {
                continue;
            }
            println!("      {}", style(label).dim().underlined());
            for line in format_output(output.trim_end(), FAILURE_TAIL_LINES).lines() {
                println!("      {}", line);
            }
        }
    }

    /// A horizontal rule spanning the terminal width
    fn print_separator(&self) {
        let width = term_size::dimensions_stdout().map(|(w, _)| w).unwrap_or(80);
        println!("{}", style("─".repeat(width)).dim());
    }

    fn flush_stdout(&self) {
        let _ = io::stdout().flush();
    }
}
