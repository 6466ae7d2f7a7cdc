//! Core domain models for localci
//!
//! This module defines the vendor-neutral execution model every pipeline
//! format is normalized into, plus the environment scope, condition and
//! result types the engine works with.

pub mod condition;
pub mod config;
pub mod error;
pub mod expression;
pub mod scope;
pub mod state;
pub mod step;
pub mod substitution;
pub mod vendor;
pub mod workflow;

pub use condition::Condition;
pub use config::RunnerConfig;
pub use error::{RunnerError, RunnerResult};
pub use scope::{EnvMap, EnvScope};
pub use state::*;
pub use step::*;
pub use substitution::MacroSyntax;
pub use vendor::Vendor;
pub use workflow::*;
