//! Error types for loading and running pipelines

use crate::core::Vendor;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Error types for runner operations
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The document does not match any recognized shape for the vendor
    #[error("{vendor} schema error: {message}")]
    Schema { vendor: Vendor, message: String },

    /// A named script, template or workflow reference could not be resolved
    #[error("unresolved reference '{name}' in {context}")]
    Reference { name: String, context: String },

    /// The shell or interpreter could not be started
    #[error("failed to launch '{program}': {source}")]
    ProcessLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not detect the pipeline type of {0}")]
    UnknownVendor(PathBuf),

    #[error("no pipeline definition found in {0}")]
    NoPipelineFound(PathBuf),

    #[error("workflow '{name}' not found (available: {available})")]
    UnknownWorkflow { name: String, available: String },
}

impl RunnerError {
    /// Shorthand for a schema error
    pub fn schema(vendor: Vendor, message: impl Into<String>) -> Self {
        RunnerError::Schema {
            vendor,
            message: message.into(),
        }
    }

    /// Shorthand for a reference error
    pub fn reference(name: impl Into<String>, context: impl Into<String>) -> Self {
        RunnerError::Reference {
            name: name.into(),
            context: context.into(),
        }
    }

    /// Whether this error aborts the run.
    ///
    /// Reference errors are reported as warnings and the affected step is
    /// skipped; everything else stops the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RunnerError::Reference { .. })
    }
}
