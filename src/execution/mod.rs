//! Workflow execution: engine, step executor and script executor

pub mod engine;
pub mod executor;
pub mod process;

pub use engine::{describe_abort, EventHandler, ExecutionEngine, ExecutionEvent};
pub use executor::StepExecutor;
pub use process::{ScriptExecutor, ScriptOutput, ScriptRequest, ShellExecutor};
