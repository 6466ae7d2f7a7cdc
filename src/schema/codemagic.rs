//! CodeMagic `codemagic.yaml` document shape

use crate::schema::ordered::{EnvValue, OrderedMap};
use serde::Deserialize;
use serde_yaml::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct CodeMagicConfig {
    /// Shared definitions; only `definitions.scripts` is interpreted
    #[serde(default)]
    pub definitions: Option<Definitions>,

    pub workflows: OrderedMap<Workflow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Definitions {
    /// A list of named entries or a map of name to entry
    #[serde(default)]
    pub scripts: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub max_build_duration: Option<EnvValue>,

    #[serde(default)]
    pub instance_type: Option<String>,

    #[serde(default)]
    pub environment: Option<Environment>,

    #[serde(default)]
    pub scripts: Vec<ScriptEntry>,

    #[serde(default)]
    pub triggering: Option<Value>,

    #[serde(default)]
    pub artifacts: Option<Value>,

    #[serde(default)]
    pub publishing: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub vars: OrderedMap<EnvValue>,

    #[serde(default)]
    pub groups: Vec<String>,

    #[serde(default)]
    pub flutter: Option<EnvValue>,
    #[serde(default)]
    pub xcode: Option<EnvValue>,
    #[serde(default)]
    pub cocoapods: Option<EnvValue>,
    #[serde(default)]
    pub node: Option<EnvValue>,
    #[serde(default)]
    pub java: Option<EnvValue>,

    #[serde(default)]
    pub android_signing: Option<Value>,
    #[serde(default)]
    pub ios_signing: Option<Value>,
}

/// One entry of a workflow's `scripts` list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScriptEntry {
    /// A literal command, or a `*name` reference into `definitions.scripts`
    Command(String),
    Inline(InlineScript),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InlineScript {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub ignore_failure: Option<bool>,
}

impl Environment {
    /// Informational toolchain settings, in a fixed order
    pub fn toolchain(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let versions = [
            ("flutter", &self.flutter),
            ("xcode", &self.xcode),
            ("cocoapods", &self.cocoapods),
            ("node", &self.node),
            ("java", &self.java),
        ];
        for (key, value) in versions {
            if let Some(value) = value {
                out.push((key, value.0.clone()));
            }
        }
        if self.android_signing.is_some() {
            out.push(("android_signing", "configured".to_string()));
        }
        if self.ios_signing.is_some() {
            out.push(("ios_signing", "configured".to_string()));
        }
        out
    }
}
