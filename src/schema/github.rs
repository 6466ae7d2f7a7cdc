//! GitHub Actions workflow document shape

use crate::schema::ordered::{EnvValue, OrderedMap};
use serde::Deserialize;
use serde_yaml::Value;

/// A `.github/workflows/*.yml` file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubWorkflow {
    #[serde(default)]
    pub name: Option<String>,

    /// Triggers are accepted but never evaluated locally
    #[serde(default)]
    pub on: Option<Value>,

    #[serde(default)]
    pub env: OrderedMap<EnvValue>,

    #[serde(default)]
    pub defaults: Option<Defaults>,

    pub jobs: OrderedMap<Job>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub run: Option<RunDefaults>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunDefaults {
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub working_directory: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Job {
    #[serde(default)]
    pub name: Option<String>,

    /// Runner label or list of labels; informational only
    #[serde(default)]
    pub runs_on: Option<Value>,

    /// Single job id or list of ids; order is not resolved locally
    #[serde(default)]
    pub needs: Option<Value>,

    #[serde(default, rename = "if")]
    pub condition: Option<EnvValue>,

    #[serde(default)]
    pub env: OrderedMap<EnvValue>,

    #[serde(default)]
    pub defaults: Option<Defaults>,

    #[serde(default)]
    pub steps: Vec<Step>,

    #[serde(default)]
    pub timeout_minutes: Option<EnvValue>,

    /// Reusable workflow call
    #[serde(default)]
    pub uses: Option<String>,

    #[serde(default)]
    pub with: OrderedMap<EnvValue>,

    #[serde(default)]
    pub strategy: Option<Value>,

    #[serde(default)]
    pub environment: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub uses: Option<String>,

    #[serde(default)]
    pub run: Option<String>,

    #[serde(default)]
    pub shell: Option<String>,

    #[serde(default)]
    pub with: OrderedMap<EnvValue>,

    #[serde(default)]
    pub env: OrderedMap<EnvValue>,

    #[serde(default, rename = "if")]
    pub condition: Option<EnvValue>,

    /// Either a boolean or an expression string
    #[serde(default)]
    pub continue_on_error: Option<EnvValue>,

    #[serde(default)]
    pub working_directory: Option<String>,

    #[serde(default)]
    pub timeout_minutes: Option<EnvValue>,
}

impl Defaults {
    pub fn shell(&self) -> Option<&str> {
        self.run.as_ref().and_then(|r| r.shell.as_deref())
    }

    pub fn working_directory(&self) -> Option<&str> {
        self.run.as_ref().and_then(|r| r.working_directory.as_deref())
    }
}
