//! Access to the managed workflow service
//!
//! The rest of the crate talks to the service only through the traits in
//! [`traits`]; [`backends::OmicsBackend`] implements them against AWS
//! HealthOmics and [`backends::MemoryService`] in memory.

pub mod backends;
pub mod traits;
pub mod types;

pub use backends::{MemoryService, OmicsBackend, ServiceCall};
pub use traits::{RunCacheDirectory, RunSubmitter, WorkflowRegistry};
pub use types::{
    CacheBehavior, ParameterSpec, RegisteredWorkflow, RunCache, RunCacheSettings, RunLogLevel,
    RunReceipt, RunRequest, StorageType, WorkflowDefinition, WorkflowStatus,
};
