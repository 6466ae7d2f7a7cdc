//! Azure DevOps pipeline document shape

use crate::schema::ordered::{EnvValue, OrderedMap};
use serde::Deserialize;
use serde_yaml::Value;

/// An `azure-pipelines.yml` file.
///
/// Exactly one of `stages`, `jobs` or `steps` is expected at the root; the
/// adapter enforces that.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzurePipeline {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub trigger: Option<Value>,

    #[serde(default)]
    pub pr: Option<Value>,

    #[serde(default)]
    pub pool: Option<Value>,

    #[serde(default)]
    pub variables: Option<Variables>,

    #[serde(default)]
    pub stages: Option<Vec<Stage>>,

    #[serde(default)]
    pub jobs: Option<Vec<Job>>,

    #[serde(default)]
    pub steps: Option<Vec<Step>>,
}

/// `variables:` in map form or list form
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Variables {
    Map(OrderedMap<EnvValue>),
    List(Vec<VariableEntry>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VariableEntry {
    Named {
        name: String,
        #[serde(default)]
        value: EnvValue,
        #[serde(default)]
        readonly: Option<bool>,
    },
    Group {
        group: String,
    },
    Template {
        template: String,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    #[serde(default)]
    pub stage: Option<String>,

    /// Stage template reference
    #[serde(default)]
    pub template: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub depends_on: Option<Value>,

    #[serde(default)]
    pub condition: Option<EnvValue>,

    #[serde(default)]
    pub variables: Option<Variables>,

    #[serde(default)]
    pub pool: Option<Value>,

    #[serde(default)]
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default)]
    pub job: Option<String>,

    #[serde(default)]
    pub deployment: Option<String>,

    /// Job template reference
    #[serde(default)]
    pub template: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub depends_on: Option<Value>,

    #[serde(default)]
    pub condition: Option<EnvValue>,

    #[serde(default)]
    pub continue_on_error: Option<EnvValue>,

    #[serde(default)]
    pub variables: Option<Variables>,

    #[serde(default)]
    pub pool: Option<Value>,

    #[serde(default)]
    pub timeout_in_minutes: Option<EnvValue>,

    #[serde(default)]
    pub strategy: Option<Value>,

    #[serde(default)]
    pub environment: Option<Value>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub bash: Option<String>,
    #[serde(default)]
    pub pwsh: Option<String>,
    #[serde(default)]
    pub powershell: Option<String>,

    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub inputs: OrderedMap<EnvValue>,

    #[serde(default)]
    pub checkout: Option<String>,
    #[serde(default)]
    pub download: Option<String>,
    #[serde(default)]
    pub publish: Option<String>,
    #[serde(default)]
    pub template: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub condition: Option<EnvValue>,
    #[serde(default)]
    pub continue_on_error: Option<EnvValue>,
    #[serde(default)]
    pub enabled: Option<EnvValue>,
    #[serde(default)]
    pub env: OrderedMap<EnvValue>,
    #[serde(default)]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub timeout_in_minutes: Option<EnvValue>,
}

impl Job {
    /// Job identifier: `job`, else `deployment`
    pub fn id(&self) -> Option<&str> {
        self.job.as_deref().or(self.deployment.as_deref())
    }
}
