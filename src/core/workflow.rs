//! Normalized workflow model shared by every vendor

use crate::core::condition::Condition;
use crate::core::scope::EnvMap;
use crate::core::step::Step;
use crate::core::substitution::MacroSyntax;
use crate::core::Vendor;
use serde::Serialize;

/// Root of one run, built by a format adapter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workflow {
    /// Key identifying the workflow inside its document
    pub id: String,

    /// Human-readable name, when the document declares one
    pub name: Option<String>,

    pub vendor: Vendor,

    /// Workflow-global variables, synthesized vendor variables included
    pub global_env: EnvMap,

    /// Stages or jobs in declaration order
    pub units: Vec<ExecutionUnit>,

    /// Macro syntax expanded in scripts before they run
    pub substitution: MacroSyntax,

    /// Informational fields (runner image, toolchain versions, timeouts)
    pub metadata: EnvMap,
}

impl Workflow {
    pub fn new(id: impl Into<String>, vendor: Vendor) -> Self {
        Self {
            id: id.into(),
            name: None,
            vendor,
            global_env: EnvMap::new(),
            units: Vec::new(),
            substitution: MacroSyntax::None,
            metadata: EnvMap::new(),
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_global_env(mut self, env: EnvMap) -> Self {
        self.global_env = env;
        self
    }

    pub fn with_units(mut self, units: Vec<ExecutionUnit>) -> Self {
        self.units = units;
        self
    }

    pub fn with_substitution(mut self, syntax: MacroSyntax) -> Self {
        self.substitution = syntax;
        self
    }

    pub fn with_metadata(mut self, metadata: EnvMap) -> Self {
        self.metadata = metadata;
        self
    }

    /// Name to show the user: declared name, else the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Total number of steps across all units
    pub fn step_count(&self) -> usize {
        self.units.iter().map(ExecutionUnit::step_count).sum()
    }
}

/// A stage (composite) or job (leaf)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionUnit {
    pub name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    pub env: EnvMap,
    pub body: UnitBody,
}

/// Contents of a unit: either nested units or steps, never both
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitBody {
    Composite(Vec<ExecutionUnit>),
    Leaf(Vec<Step>),
}

impl ExecutionUnit {
    /// A job holding steps
    pub fn leaf(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self::with_body(name.into(), UnitBody::Leaf(steps))
    }

    /// A stage holding jobs
    pub fn composite(name: impl Into<String>, children: Vec<ExecutionUnit>) -> Self {
        Self::with_body(name.into(), UnitBody::Composite(children))
    }

    fn with_body(name: String, body: UnitBody) -> Self {
        Self {
            display_name: name.clone(),
            name,
            condition: None,
            env: EnvMap::new(),
            body,
        }
    }

    pub fn with_display_name(mut self, display_name: Option<String>) -> Self {
        if let Some(display_name) = display_name {
            self.display_name = display_name;
        }
        self
    }

    pub fn with_condition(mut self, condition: Option<Condition>) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_env(mut self, env: EnvMap) -> Self {
        self.env = env;
        self
    }

    pub fn step_count(&self) -> usize {
        match &self.body {
            UnitBody::Composite(children) => children.iter().map(ExecutionUnit::step_count).sum(),
            UnitBody::Leaf(steps) => steps.len(),
        }
    }
}
