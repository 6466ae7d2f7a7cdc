//! Expression language for conditions and `${{ }}` macros
//!
//! One small language covers both dialects: GitHub's infix style
//! (`github.ref == 'refs/heads/main' && success()`) and Azure's function
//! style (`and(succeeded(), eq(variables['Build.Reason'], 'Manual'))`).
//!
//! Supported:
//! - literals: `'single quoted'` strings (`''` escapes a quote), numbers,
//!   `true`, `false`, `null`
//! - operators: `!`, `&&`, `||`, `==`, `!=`, `<`, `<=`, `>`, `>=`, parentheses
//! - property access: `env.NAME`, `vars.NAME`, `variables.NAME`,
//!   `variables['Dotted.Name']`, `github.ref` / `runner.os` (read from the
//!   matching `GITHUB_*` / `RUNNER_*` variables)
//! - status functions: `success()`/`succeeded()`, `failure()`/`failed()`,
//!   `always()`, `cancelled()`/`canceled()`, `succeededOrFailed()`
//! - `eq ne gt ge lt le and or not xor in notIn contains startsWith endsWith
//!   coalesce format lower upper`
//!
//! String comparisons are case-insensitive in both dialects. Unknown contexts
//! evaluate to null.

use crate::core::scope::EnvScope;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Error raised while parsing an expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("unexpected character '{0}' at offset {1}")]
    UnexpectedChar(char, usize),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' expects {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: &'static str,
        actual: usize,
    },
}

/// Runtime value of an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }

    fn as_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
        }
    }

    fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.eq_ignore_ascii_case(b),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Bool(b), Value::String(s)) | (Value::String(s), Value::Bool(b)) => {
                parse_bool(s) == Some(*b)
            }
            _ => {
                let (a, b) = (self.as_number(), other.as_number());
                !a.is_nan() && !b.is_nan() && a == b
            }
        }
    }

    fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => {
                Some(a.to_lowercase().cmp(&b.to_lowercase()))
            }
            _ => self.as_number().partial_cmp(&other.as_number()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Variables and job status visible to an expression
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub scope: &'a EnvScope,
    /// Whether an earlier step or unit has failed
    pub job_failed: bool,
}

impl<'a> EvalContext<'a> {
    pub fn new(scope: &'a EnvScope, job_failed: bool) -> Self {
        Self { scope, job_failed }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(f64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Not,
    And,
    Or,
    Cmp(CmpOp),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Name(String),
    Index(Expr),
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Path(Vec<Segment>),
    Call(String, Vec<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(CmpOp, Box<Expr>, Box<Expr>),
}

const STATUS_FUNCTIONS: [&str; 8] = [
    "success",
    "succeeded",
    "failure",
    "failed",
    "always",
    "cancelled",
    "canceled",
    "succeededorfailed",
];

/// Strip an optional `${{ ... }}` wrapper
pub fn strip_wrapper(source: &str) -> &str {
    let trimmed = source.trim();
    trimmed
        .strip_prefix("${{")
        .and_then(|rest| rest.strip_suffix("}}"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// A parsed expression
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    root: Expr,
}

impl Expression {
    /// Parse an expression, with or without a `${{ }}` wrapper
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(strip_wrapper(source))?;
        let mut parser = Parser { tokens, pos: 0 };
        let root = parser.parse_or()?;
        match parser.peek() {
            None => Ok(Self { root }),
            Some(token) => Err(ExpressionError::UnexpectedToken(format!("{:?}", token))),
        }
    }

    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Value {
        eval(&self.root, ctx)
    }

    /// Whether the expression calls a job-status function
    pub fn uses_status_function(&self) -> bool {
        uses_status(&self.root)
    }
}

fn uses_status(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(_) => false,
        Expr::Path(segments) => segments.iter().any(|s| match s {
            Segment::Index(e) => uses_status(e),
            Segment::Name(_) => false,
        }),
        Expr::Call(name, args) => {
            STATUS_FUNCTIONS.contains(&name.as_str()) || args.iter().any(uses_status)
        }
        Expr::Not(inner) => uses_status(inner),
        Expr::And(a, b) | Expr::Or(a, b) | Expr::Compare(_, a, b) => {
            uses_status(a) || uses_status(b)
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<Token>, ExpressionError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Cmp(CmpOp::Ne));
                i += 2;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '=' if next == Some('=') => {
                tokens.push(Token::Cmp(CmpOp::Eq));
                i += 2;
            }
            '<' if next == Some('=') => {
                tokens.push(Token::Cmp(CmpOp::Le));
                i += 2;
            }
            '<' => {
                tokens.push(Token::Cmp(CmpOp::Lt));
                i += 1;
            }
            '>' if next == Some('=') => {
                tokens.push(Token::Cmp(CmpOp::Ge));
                i += 2;
            }
            '>' => {
                tokens.push(Token::Cmp(CmpOp::Gt));
                i += 1;
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '\'' => {
                let mut value = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(ExpressionError::UnterminatedString),
                        Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                            value.push('\'');
                            i += 2;
                        }
                        Some('\'') => {
                            i += 1;
                            break;
                        }
                        Some(ch) => {
                            value.push(*ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(value));
            }
            c if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let number = text
                    .parse()
                    .map_err(|_| ExpressionError::UnexpectedToken(text.clone()))?;
                tokens.push(Token::Num(number));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '-')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(ExpressionError::UnexpectedChar(other, i)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, ExpressionError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(ExpressionError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExpressionError> {
        let token = self.next()?;
        if token == expected {
            Ok(())
        } else {
            Err(ExpressionError::UnexpectedToken(format!("{:?}", token)))
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_comparison()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_comparison()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExpressionError> {
        let left = self.parse_unary()?;
        if let Some(Token::Cmp(op)) = self.peek().cloned() {
            self.pos += 1;
            let right = self.parse_unary()?;
            return Ok(Expr::Compare(op, Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        match self.next()? {
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Num(n) => Ok(Expr::Literal(Value::Number(n))),
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) => {
                let lowered = name.to_ascii_lowercase();
                match lowered.as_str() {
                    "true" => return Ok(Expr::Literal(Value::Bool(true))),
                    "false" => return Ok(Expr::Literal(Value::Bool(false))),
                    "null" => return Ok(Expr::Literal(Value::Null)),
                    _ => {}
                }
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.parse_args()?;
                    check_call(&lowered, args.len())?;
                    return Ok(Expr::Call(lowered, args));
                }
                self.parse_path(name)
            }
            other => Err(ExpressionError::UnexpectedToken(format!("{:?}", other))),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ExpressionError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            match self.next()? {
                Token::Comma => continue,
                Token::RParen => return Ok(args),
                other => return Err(ExpressionError::UnexpectedToken(format!("{:?}", other))),
            }
        }
    }

    fn parse_path(&mut self, head: String) -> Result<Expr, ExpressionError> {
        let mut segments = vec![Segment::Name(head)];
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    match self.next()? {
                        Token::Ident(name) => segments.push(Segment::Name(name)),
                        Token::Num(n) => segments.push(Segment::Name(Value::Number(n).to_string())),
                        other => {
                            return Err(ExpressionError::UnexpectedToken(format!("{:?}", other)))
                        }
                    }
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.parse_or()?;
                    self.expect(Token::RBracket)?;
                    segments.push(Segment::Index(index));
                }
                _ => return Ok(Expr::Path(segments)),
            }
        }
    }
}

fn check_call(name: &str, argc: usize) -> Result<(), ExpressionError> {
    let (ok, expected) = match name {
        "success" | "succeeded" | "failure" | "failed" | "always" | "cancelled" | "canceled"
        | "succeededorfailed" => (true, "any"),
        "eq" | "ne" | "gt" | "ge" | "lt" | "le" | "xor" | "contains" | "startswith"
        | "endswith" => (argc == 2, "2"),
        "not" | "lower" | "upper" => (argc == 1, "1"),
        "and" | "or" => (argc >= 2, "at least 2"),
        "in" | "notin" | "coalesce" | "format" => (argc >= 1, "at least 1"),
        _ => return Err(ExpressionError::UnknownFunction(name.to_string())),
    };
    if ok {
        Ok(())
    } else {
        Err(ExpressionError::Arity {
            name: name.to_string(),
            expected,
            actual: argc,
        })
    }
}

fn eval(expr: &Expr, ctx: &EvalContext<'_>) -> Value {
    match expr {
        Expr::Literal(value) => value.clone(),
        Expr::Path(segments) => resolve_path(segments, ctx),
        Expr::Call(name, args) => call(name, args, ctx),
        Expr::Not(inner) => Value::Bool(!eval(inner, ctx).is_truthy()),
        Expr::And(a, b) => {
            let left = eval(a, ctx);
            if left.is_truthy() {
                eval(b, ctx)
            } else {
                left
            }
        }
        Expr::Or(a, b) => {
            let left = eval(a, ctx);
            if left.is_truthy() {
                left
            } else {
                eval(b, ctx)
            }
        }
        Expr::Compare(op, a, b) => Value::Bool(apply_cmp(*op, &eval(a, ctx), &eval(b, ctx))),
    }
}

fn apply_cmp(op: CmpOp, left: &Value, right: &Value) -> bool {
    match op {
        CmpOp::Eq => left.loose_eq(right),
        CmpOp::Ne => !left.loose_eq(right),
        CmpOp::Lt => left.compare(right) == Some(Ordering::Less),
        CmpOp::Le => matches!(left.compare(right), Some(Ordering::Less | Ordering::Equal)),
        CmpOp::Gt => left.compare(right) == Some(Ordering::Greater),
        CmpOp::Ge => matches!(left.compare(right), Some(Ordering::Greater | Ordering::Equal)),
    }
}

fn resolve_path(segments: &[Segment], ctx: &EvalContext<'_>) -> Value {
    let names: Vec<String> = segments
        .iter()
        .map(|segment| match segment {
            Segment::Name(name) => name.clone(),
            Segment::Index(expr) => eval(expr, ctx).to_string(),
        })
        .collect();

    let found = match (names[0].to_ascii_lowercase().as_str(), names.len()) {
        ("env" | "vars" | "variables", n) if n > 1 => {
            ctx.scope.lookup_variable(&names[1..].join("."))
        }
        ("github" | "runner", n) if n > 1 => {
            let env_name = format!("{}_{}", names[0], names[1..].join("_")).to_uppercase();
            ctx.scope.get(&env_name)
        }
        (_, 1) => ctx.scope.lookup_variable(&names[0]),
        _ => None,
    };

    found
        .map(|value| Value::String(value.to_string()))
        .unwrap_or(Value::Null)
}

fn call(name: &str, args: &[Expr], ctx: &EvalContext<'_>) -> Value {
    let arg = |i: usize| eval(&args[i], ctx);
    let text = |i: usize| eval(&args[i], ctx).to_string().to_lowercase();

    match name {
        "success" | "succeeded" => Value::Bool(!ctx.job_failed),
        "failure" | "failed" => Value::Bool(ctx.job_failed),
        "always" | "succeededorfailed" => Value::Bool(true),
        "cancelled" | "canceled" => Value::Bool(false),
        "eq" => Value::Bool(apply_cmp(CmpOp::Eq, &arg(0), &arg(1))),
        "ne" => Value::Bool(apply_cmp(CmpOp::Ne, &arg(0), &arg(1))),
        "gt" => Value::Bool(apply_cmp(CmpOp::Gt, &arg(0), &arg(1))),
        "ge" => Value::Bool(apply_cmp(CmpOp::Ge, &arg(0), &arg(1))),
        "lt" => Value::Bool(apply_cmp(CmpOp::Lt, &arg(0), &arg(1))),
        "le" => Value::Bool(apply_cmp(CmpOp::Le, &arg(0), &arg(1))),
        "not" => Value::Bool(!arg(0).is_truthy()),
        "and" => Value::Bool(args.iter().all(|a| eval(a, ctx).is_truthy())),
        "or" => Value::Bool(args.iter().any(|a| eval(a, ctx).is_truthy())),
        "xor" => Value::Bool(arg(0).is_truthy() != arg(1).is_truthy()),
        "contains" => Value::Bool(text(0).contains(&text(1))),
        "startswith" => Value::Bool(text(0).starts_with(&text(1))),
        "endswith" => Value::Bool(text(0).ends_with(&text(1))),
        "in" | "notin" => {
            let needle = arg(0);
            let found = args[1..].iter().any(|a| needle.loose_eq(&eval(a, ctx)));
            Value::Bool(if name == "in" { found } else { !found })
        }
        "coalesce" => args
            .iter()
            .map(|a| eval(a, ctx))
            .find(|v| !v.to_string().is_empty())
            .unwrap_or(Value::Null),
        "format" => {
            let mut out = arg(0).to_string();
            for (i, a) in args[1..].iter().enumerate() {
                out = out.replace(&format!("{{{}}}", i), &eval(a, ctx).to_string());
            }
            Value::String(out)
        }
        "lower" => Value::String(text(0)),
        "upper" => Value::String(arg(0).to_string().to_uppercase()),
        _ => Value::Null,
    }
}
