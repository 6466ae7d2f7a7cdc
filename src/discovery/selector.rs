//! Choosing one entry among several candidates

use console::{style, Term};
use std::io::IsTerminal;
use tracing::warn;

/// Picks one of `candidates`; `None` means nothing was chosen
pub trait Selector {
    fn select(&self, prompt: &str, candidates: &[String]) -> Option<usize>;
}

/// Numbered prompt on the terminal
pub struct TerminalSelector {
    term: Term,
    attempts: usize,
}

impl Default for TerminalSelector {
    fn default() -> Self {
        Self {
            term: Term::stderr(),
            attempts: 3,
        }
    }
}

impl TerminalSelector {
    pub fn new() -> Self {
        Self::default()
    }

    fn prompt(&self, prompt: &str, candidates: &[String]) -> std::io::Result<Option<usize>> {
        self.term.write_line(&format!("{}", style(prompt).bold()))?;
        for (i, candidate) in candidates.iter().enumerate() {
            self.term
                .write_line(&format!("  {} {}", style(format!("[{}]", i + 1)).cyan(), candidate))?;
        }

        for _ in 0..self.attempts {
            self.term.write_str("Enter a number (blank to cancel): ")?;
            let answer = self.term.read_line()?;
            let answer = answer.trim();
            if answer.is_empty() {
                return Ok(None);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=candidates.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => self.term.write_line(&format!(
                    "{} expected a number between 1 and {}",
                    style("!").yellow(),
                    candidates.len()
                ))?,
            }
        }
        Ok(None)
    }
}

impl Selector for TerminalSelector {
    fn select(&self, prompt: &str, candidates: &[String]) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        if !std::io::stdin().is_terminal() || !self.term.is_term() {
            warn!("Several candidates found but no terminal to ask on; pass --workflow or --yes");
            return None;
        }
        self.prompt(prompt, candidates).unwrap_or_else(|e| {
            warn!("Selection prompt failed: {}", e);
            None
        })
    }
}

/// Always picks the first candidate (`--yes`)
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCandidate;

impl Selector for FirstCandidate {
    fn select(&self, _prompt: &str, candidates: &[String]) -> Option<usize> {
        (!candidates.is_empty()).then_some(0)
    }
}
