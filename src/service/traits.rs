//! Seams between the tool and the workflow service

use async_trait::async_trait;

use super::types::*;
use crate::error::Result;

/// Private workflow catalog, looked up by name.
#[async_trait]
pub trait WorkflowRegistry: Send + Sync {
    /// Workflows registered under exactly `name`, in listing order.
    async fn find(&self, name: &str) -> Result<Vec<RegisteredWorkflow>>;

    /// Register a new workflow and return its id.
    async fn create(&self, definition: &WorkflowDefinition) -> Result<String>;

    /// Current record for `id`, including any status message.
    async fn describe(&self, id: &str) -> Result<RegisteredWorkflow>;
}

#[async_trait]
pub trait RunSubmitter: Send + Sync {
    async fn start_run(&self, request: &RunRequest) -> Result<RunReceipt>;
}

#[async_trait]
pub trait RunCacheDirectory: Send + Sync {
    /// Run caches whose name is exactly `name`.
    async fn find_by_name(&self, name: &str) -> Result<Vec<RunCache>>;
}
