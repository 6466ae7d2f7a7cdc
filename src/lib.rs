//! localci - run GitHub Actions, Azure DevOps and CodeMagic pipelines locally

pub mod adapters;
pub mod cli;
pub mod core;
pub mod discovery;
pub mod execution;
pub mod schema;

// Re-export commonly used types
pub use adapters::{adapter_for, AdapterContext, FormatAdapter};
pub use core::{
    ExecutionUnit, RunnerConfig, RunnerError, RunnerResult, Step, StepResult, StepStatus,
    Vendor, Workflow, WorkflowResult,
};
pub use discovery::{LoadRequest, LoadedPipeline, PipelineLoader};
pub use execution::{ExecutionEngine, ExecutionEvent, ScriptExecutor, ShellExecutor};
