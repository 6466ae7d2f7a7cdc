//! Macro expansion in script text
//!
//! Azure pipelines use `$(Name)` macros, GitHub workflows `${{ expr }}`.
//! Both are expanded just before a step runs, against the scope the step
//! sees at that moment. Unresolved macros are left verbatim.

use crate::core::expression::{EvalContext, Expression};
use crate::core::scope::{EnvMap, EnvScope};
use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::OnceLock;

/// Which macro syntax a workflow's scripts use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroSyntax {
    /// No expansion
    #[default]
    None,
    /// Azure `$(Name)`
    DollarParen,
    /// GitHub `${{ expression }}`
    Expression,
}

fn dollar_paren_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\(([A-Za-z0-9_.\-]+)\)").expect("valid macro regex"))
}

fn expression_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{\{\s*(.*?)\s*\}\}").expect("valid expression regex"))
}

/// Expand macros in `text` using the given syntax
pub fn expand(text: &str, syntax: MacroSyntax, ctx: &EvalContext<'_>) -> String {
    match syntax {
        MacroSyntax::None => text.to_string(),
        MacroSyntax::DollarParen => expand_dollar_paren(text, ctx.scope),
        MacroSyntax::Expression => expand_expressions(text, ctx),
    }
}

/// Expand every value of a variable layer against the scope it is pushed onto.
///
/// Each entry also sees the entries declared before it in the same layer.
pub fn expand_layer(
    layer: &EnvMap,
    syntax: MacroSyntax,
    parent: &EnvScope,
    job_failed: bool,
) -> EnvMap {
    if syntax == MacroSyntax::None {
        return layer.clone();
    }
    let mut expanded = EnvMap::new();
    for (key, value) in layer.iter() {
        let scope = parent.push(&expanded);
        let ctx = EvalContext::new(&scope, job_failed);
        let value = expand(value, syntax, &ctx);
        expanded.insert(key, value);
    }
    expanded
}

/// Replace `$(Name)` with the variable's value; unknown names stay as written
pub fn expand_dollar_paren(text: &str, scope: &EnvScope) -> String {
    if !text.contains("$(") {
        return text.to_string();
    }
    dollar_paren_regex()
        .replace_all(text, |caps: &Captures| {
            scope
                .lookup_macro(&caps[1])
                .map(str::to_string)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Replace `${{ expr }}` with the evaluated expression.
///
/// Expressions that fail to parse are left in place.
pub fn expand_expressions(text: &str, ctx: &EvalContext<'_>) -> String {
    if !text.contains("${{") {
        return text.to_string();
    }
    expression_regex()
        .replace_all(text, |caps: &Captures| match Expression::parse(&caps[1]) {
            Ok(expr) => expr.evaluate(ctx).to_string(),
            Err(_) => caps[0].to_string(),
        })
        .into_owned()
}
