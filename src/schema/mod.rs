//! Serde models of the supported pipeline formats
//!
//! These types mirror the YAML as written. Format adapters turn them into
//! the vendor-neutral [`Workflow`](crate::core::Workflow).

pub mod azure;
pub mod codemagic;
pub mod github;
pub mod ordered;

pub use ordered::{scalar_to_string, EnvValue, OrderedMap};
