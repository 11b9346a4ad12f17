//! Workflow service backend implementations

pub mod aws;
pub mod memory;

pub use aws::OmicsBackend;
pub use memory::{MemoryService, ServiceCall};
