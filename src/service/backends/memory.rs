//! In-memory workflow service for testing

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::service::traits::{RunCacheDirectory, RunSubmitter, WorkflowRegistry};
use crate::service::types::*;

/// A call made against [`MemoryService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    Find(String),
    Create(String),
    Describe(String),
    StartRun(String),
    FindCache(String),
}

#[derive(Default)]
struct State {
    workflows: Vec<RegisteredWorkflow>,
    /// Statuses returned by successive `describe` calls before settling.
    status_script: HashMap<String, VecDeque<WorkflowStatus>>,
    created: Vec<WorkflowDefinition>,
    runs: Vec<RunRequest>,
    caches: Vec<RunCache>,
    calls: Vec<ServiceCall>,
    create_error: Option<String>,
    run_error: Option<String>,
    next_id: u64,
}

/// Records every call and serves workflows, runs and caches from memory.
#[derive(Clone)]
pub struct MemoryService {
    state: Arc<RwLock<State>>,
    region: String,
}

impl MemoryService {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                next_id: 1000001,
                ..Default::default()
            })),
            region: "us-east-1".to_string(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub async fn add_workflow(&self, id: &str, name: &str, status: WorkflowStatus) {
        self.state.write().await.workflows.push(RegisteredWorkflow {
            id: id.to_string(),
            name: name.to_string(),
            status,
            status_message: None,
        });
    }

    /// Make `describe(id)` walk through `statuses` before reporting the
    /// stored status. A `Failed` entry also becomes the stored status.
    pub async fn script_statuses(&self, id: &str, statuses: Vec<WorkflowStatus>) {
        self.state
            .write()
            .await
            .status_script
            .insert(id.to_string(), statuses.into());
    }

    pub async fn add_run_cache(&self, id: &str, name: &str) {
        self.state.write().await.caches.push(RunCache {
            id: id.to_string(),
            name: Some(name.to_string()),
            status: Some("ACTIVE".to_string()),
        });
    }

    pub async fn fail_create(&self, message: &str) {
        self.state.write().await.create_error = Some(message.to_string());
    }

    pub async fn fail_runs(&self, message: &str) {
        self.state.write().await.run_error = Some(message.to_string());
    }

    pub async fn calls(&self) -> Vec<ServiceCall> {
        self.state.read().await.calls.clone()
    }

    pub async fn created(&self) -> Vec<WorkflowDefinition> {
        self.state.read().await.created.clone()
    }

    pub async fn runs(&self) -> Vec<RunRequest> {
        self.state.read().await.runs.clone()
    }
}

impl Default for MemoryService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowRegistry for MemoryService {
    async fn find(&self, name: &str) -> Result<Vec<RegisteredWorkflow>> {
        let mut state = self.state.write().await;
        state.calls.push(ServiceCall::Find(name.to_string()));
        Ok(state
            .workflows
            .iter()
            .filter(|w| w.name == name)
            .cloned()
            .collect())
    }

    async fn create(&self, definition: &WorkflowDefinition) -> Result<String> {
        let mut state = self.state.write().await;
        state.calls.push(ServiceCall::Create(definition.name.clone()));
        if let Some(message) = &state.create_error {
            return Err(Error::Registration(format!(
                "CreateWorkflow failed: {message}"
            )));
        }

        let id = state.next_id.to_string();
        state.next_id += 1;
        state.created.push(definition.clone());
        state.workflows.push(RegisteredWorkflow {
            id: id.clone(),
            name: definition.name.clone(),
            status: WorkflowStatus::Active,
            status_message: None,
        });
        Ok(id)
    }

    async fn describe(&self, id: &str) -> Result<RegisteredWorkflow> {
        let mut state = self.state.write().await;
        state.calls.push(ServiceCall::Describe(id.to_string()));

        let scripted = state.status_script.get_mut(id).and_then(VecDeque::pop_front);
        let workflow = state
            .workflows
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| Error::Registration(format!("GetWorkflow failed: no workflow {id}")))?;

        match scripted {
            Some(WorkflowStatus::Failed) => {
                workflow.status = WorkflowStatus::Failed;
                workflow.status_message = Some("workflow definition is invalid".to_string());
                Ok(workflow.clone())
            }
            Some(status) => Ok(RegisteredWorkflow {
                status,
                ..workflow.clone()
            }),
            None => Ok(workflow.clone()),
        }
    }
}

#[async_trait]
impl RunSubmitter for MemoryService {
    async fn start_run(&self, request: &RunRequest) -> Result<RunReceipt> {
        let mut state = self.state.write().await;
        state
            .calls
            .push(ServiceCall::StartRun(request.workflow_id.clone()));
        if let Some(message) = &state.run_error {
            return Err(Error::Submission(format!("StartRun failed: {message}")));
        }

        let run_id = state.next_id.to_string();
        state.next_id += 1;
        state.runs.push(request.clone());
        Ok(RunReceipt::new(&request.workflow_id, &run_id, &self.region))
    }
}

#[async_trait]
impl RunCacheDirectory for MemoryService {
    async fn find_by_name(&self, name: &str) -> Result<Vec<RunCache>> {
        let mut state = self.state.write().await;
        state.calls.push(ServiceCall::FindCache(name.to_string()));
        Ok(state
            .caches
            .iter()
            .filter(|c| c.name.as_deref() == Some(name))
            .cloned()
            .collect())
    }
}
