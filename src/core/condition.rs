//! Step and unit conditions

use crate::core::expression::{strip_wrapper, EvalContext, Expression};
use crate::core::substitution::{expand_dollar_paren, expand_expressions};
use serde::{Serialize, Serializer};
use tracing::warn;

/// An `if:` / `condition:` guard, kept as source text and parsed on demand
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    source: String,
}

impl Condition {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into().trim().to_string(),
        }
    }

    /// Build a condition from an optional field, ignoring blank text
    pub fn parse_optional(source: Option<&str>) -> Option<Self> {
        source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::new)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against the current scope and job status.
    ///
    /// Text the expression parser rejects falls back to literal
    /// substitution: macros are expanded and the result is true unless it
    /// is empty, `false` or `0`.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> bool {
        match Expression::parse(&self.source) {
            Ok(expr) => expr.evaluate(ctx).is_truthy(),
            Err(e) => {
                warn!(
                    "Unsupported condition `{}` ({}), falling back to literal substitution",
                    self.source, e
                );
                literal_truthiness(&self.source, ctx)
            }
        }
    }

    /// Whether the condition asks about job status (`always()`, `failure()`, ...)
    pub fn uses_status_function(&self) -> bool {
        match Expression::parse(&self.source) {
            Ok(expr) => expr.uses_status_function(),
            Err(_) => {
                let lowered = self.source.to_ascii_lowercase();
                ["always()", "failure()", "failed()"]
                    .iter()
                    .any(|f| lowered.contains(f))
            }
        }
    }
}

fn literal_truthiness(source: &str, ctx: &EvalContext<'_>) -> bool {
    let expanded = expand_dollar_paren(&expand_expressions(source, ctx), ctx.scope);
    let text = strip_wrapper(&expanded);
    !(text.is_empty() || text.eq_ignore_ascii_case("false") || text == "0")
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}
