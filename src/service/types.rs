//! Service-side records and requests

use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a registered workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowStatus {
    Creating,
    Active,
    Updating,
    Inactive,
    Deleted,
    Failed,
    Other(String),
}

impl WorkflowStatus {
    pub fn parse(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "CREATING" => Self::Creating,
            "ACTIVE" => Self::Active,
            "UPDATING" => Self::Updating,
            "INACTIVE" => Self::Inactive,
            "DELETED" => Self::Deleted,
            "FAILED" => Self::Failed,
            _ => Self::Other(status.to_string()),
        }
    }

    /// Whether a workflow in this status may be reused for a new run.
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Deleted | Self::Failed)
    }

    /// Whether the service is still working on the workflow.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Creating | Self::Updating)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creating => write!(f, "CREATING"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Updating => write!(f, "UPDATING"),
            Self::Inactive => write!(f, "INACTIVE"),
            Self::Deleted => write!(f, "DELETED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredWorkflow {
    pub id: String,
    pub name: String,
    pub status: WorkflowStatus,
    pub status_message: Option<String>,
}

/// One entry of a workflow's parameter template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub description: String,
    pub optional: bool,
}

/// Everything needed to register a workflow bundle.
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    pub name: String,
    /// Archive path of the main document.
    pub main: String,
    pub archive: Vec<u8>,
    pub parameter_template: BTreeMap<String, ParameterSpec>,
    pub tags: BTreeMap<String, String>,
    pub request_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheBehavior {
    Always,
    OnFailure,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunLogLevel {
    #[default]
    All,
    Error,
    Fatal,
    Off,
}

/// A run cache chosen for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCacheSettings {
    pub id: String,
    pub behavior: Option<CacheBehavior>,
}

/// A `StartRun` request, built once and submitted once.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub workflow_id: String,
    pub role_arn: String,
    pub output_uri: String,
    pub parameters: Map<String, Value>,
    pub name: Option<String>,
    pub priority: Option<i32>,
    pub run_group_id: Option<String>,
    pub storage_type: Option<StorageType>,
    pub storage_capacity: Option<i32>,
    pub cache: Option<RunCacheSettings>,
    pub log_level: RunLogLevel,
    pub request_id: String,
}

/// What the tool prints after a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReceipt {
    pub workflow_id: String,
    pub run_id: String,
    pub run_console: String,
}

impl RunReceipt {
    pub fn new(workflow_id: &str, run_id: &str, region: &str) -> Self {
        Self {
            workflow_id: workflow_id.to_string(),
            run_id: run_id.to_string(),
            run_console: format!(
                "https://{region}.console.aws.amazon.com/omics/home?region={region}#/runs/{run_id}"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCache {
    pub id: String,
    pub name: Option<String>,
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_usability() {
        assert!(WorkflowStatus::parse("ACTIVE").is_usable());
        assert!(WorkflowStatus::parse("creating").is_pending());
        assert!(!WorkflowStatus::parse("DELETED").is_usable());
        assert!(!WorkflowStatus::parse("FAILED").is_usable());
        assert_eq!(
            WorkflowStatus::parse("ARCHIVED"),
            WorkflowStatus::Other("ARCHIVED".into())
        );
    }

    #[test]
    fn test_receipt_console_url() {
        let receipt = RunReceipt::new("1234567", "7654321", "us-west-2");
        assert_eq!(
            receipt.run_console,
            "https://us-west-2.console.aws.amazon.com/omics/home?region=us-west-2#/runs/7654321"
        );
        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["workflowId"], "1234567");
        assert_eq!(json["runId"], "7654321");
    }
}
