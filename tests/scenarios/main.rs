//! Scenario-based tests for localci

mod helpers;

mod azure_substitution;
mod codemagic_references;
mod conditions;
mod empty_workflows;
mod environment_layering;
mod failure_handling;
mod ordering;
mod round_trip;
