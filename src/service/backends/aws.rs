//! AWS HealthOmics backend

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_omics::error::DisplayErrorContext;
use aws_sdk_omics::primitives::Blob;
use aws_sdk_omics::types::{
    CacheBehavior as SdkCacheBehavior, RunLogLevel as SdkRunLogLevel,
    StorageType as SdkStorageType, WorkflowEngine, WorkflowParameter, WorkflowType,
};
use aws_sdk_omics::Client;
use aws_smithy_types::{Document, Number};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::service::traits::{RunCacheDirectory, RunSubmitter, WorkflowRegistry};
use crate::service::types::*;

/// Client for the HealthOmics private workflow and run APIs.
pub struct OmicsBackend {
    client: Client,
    region: String,
}

impl OmicsBackend {
    /// Load AWS configuration from the environment, overriding the region
    /// when one is given.
    pub async fn new(region: Option<&str>) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let sdk_config = loader.load().await;

        let region = sdk_config
            .region()
            .map(|r| r.to_string())
            .ok_or_else(|| {
                Error::Config(
                    "no AWS region configured; set --region, AWS_REGION or a profile region"
                        .to_string(),
                )
            })?;
        info!("Using HealthOmics in {}", region);

        Ok(Self {
            client: Client::new(&sdk_config),
            region,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl WorkflowRegistry for OmicsBackend {
    async fn find(&self, name: &str) -> Result<Vec<RegisteredWorkflow>> {
        debug!("Listing private workflows named {}", name);
        let items = self
            .client
            .list_workflows()
            .name(name)
            .r#type(WorkflowType::Private)
            .into_paginator()
            .items()
            .send()
            .collect::<std::result::Result<Vec<_>, _>>()
            .await
            .map_err(|e| {
                Error::Registration(format!("ListWorkflows failed: {}", DisplayErrorContext(&e)))
            })?;

        Ok(items
            .into_iter()
            .filter(|item| item.name() == Some(name))
            .filter_map(|item| {
                Some(RegisteredWorkflow {
                    id: item.id()?.to_string(),
                    name: name.to_string(),
                    status: item
                        .status()
                        .map(|s| WorkflowStatus::parse(s.as_str()))
                        .unwrap_or_else(|| WorkflowStatus::Other("UNKNOWN".into())),
                    status_message: None,
                })
            })
            .collect())
    }

    async fn create(&self, definition: &WorkflowDefinition) -> Result<String> {
        let mut request = self
            .client
            .create_workflow()
            .name(&definition.name)
            .engine(WorkflowEngine::Wdl)
            .definition_zip(Blob::new(definition.archive.clone()))
            .main(&definition.main)
            .request_id(&definition.request_id);

        for (key, spec) in &definition.parameter_template {
            request = request.parameter_template(
                key,
                WorkflowParameter::builder()
                    .description(&spec.description)
                    .optional(spec.optional)
                    .build(),
            );
        }
        for (key, value) in &definition.tags {
            request = request.tags(key, value);
        }

        let output = request.send().await.map_err(|e| {
            Error::Registration(format!("CreateWorkflow failed: {}", DisplayErrorContext(&e)))
        })?;

        output
            .id()
            .map(str::to_string)
            .ok_or_else(|| Error::Registration("CreateWorkflow returned no workflow id".into()))
    }

    async fn describe(&self, id: &str) -> Result<RegisteredWorkflow> {
        let output = self
            .client
            .get_workflow()
            .id(id)
            .r#type(WorkflowType::Private)
            .send()
            .await
            .map_err(|e| {
                Error::Registration(format!("GetWorkflow failed: {}", DisplayErrorContext(&e)))
            })?;

        Ok(RegisteredWorkflow {
            id: output.id().unwrap_or(id).to_string(),
            name: output.name().unwrap_or_default().to_string(),
            status: output
                .status()
                .map(|s| WorkflowStatus::parse(s.as_str()))
                .unwrap_or_else(|| WorkflowStatus::Other("UNKNOWN".into())),
            status_message: output.status_message().map(str::to_string),
        })
    }
}

#[async_trait]
impl RunSubmitter for OmicsBackend {
    async fn start_run(&self, request: &RunRequest) -> Result<RunReceipt> {
        let parameters = json_to_document(&Value::Object(request.parameters.clone()));
        debug!("StartRun parameters: {:?}", parameters);

        let mut call = self
            .client
            .start_run()
            .workflow_id(&request.workflow_id)
            .workflow_type(WorkflowType::Private)
            .role_arn(&request.role_arn)
            .output_uri(&request.output_uri)
            .parameters(parameters)
            .log_level(match request.log_level {
                RunLogLevel::All => SdkRunLogLevel::All,
                RunLogLevel::Error => SdkRunLogLevel::Error,
                RunLogLevel::Fatal => SdkRunLogLevel::Fatal,
                RunLogLevel::Off => SdkRunLogLevel::Off,
            })
            .request_id(&request.request_id)
            .set_name(request.name.clone())
            .set_priority(request.priority)
            .set_run_group_id(request.run_group_id.clone())
            .set_storage_capacity(request.storage_capacity);

        if let Some(storage_type) = request.storage_type {
            call = call.storage_type(match storage_type {
                StorageType::Static => SdkStorageType::Static,
                StorageType::Dynamic => SdkStorageType::Dynamic,
            });
        }
        if let Some(cache) = &request.cache {
            call = call.cache_id(&cache.id);
            if let Some(behavior) = cache.behavior {
                call = call.cache_behavior(match behavior {
                    CacheBehavior::Always => SdkCacheBehavior::CacheAlways,
                    CacheBehavior::OnFailure => SdkCacheBehavior::CacheOnFailure,
                });
            }
        }

        let output = call.send().await.map_err(|e| {
            Error::Submission(format!("StartRun failed: {}", DisplayErrorContext(&e)))
        })?;
        let run_id = output
            .id()
            .ok_or_else(|| Error::Submission("StartRun returned no run id".into()))?;

        Ok(RunReceipt::new(&request.workflow_id, run_id, &self.region))
    }
}

#[async_trait]
impl RunCacheDirectory for OmicsBackend {
    async fn find_by_name(&self, name: &str) -> Result<Vec<RunCache>> {
        let items = self
            .client
            .list_run_caches()
            .into_paginator()
            .items()
            .send()
            .collect::<std::result::Result<Vec<_>, _>>()
            .await
            .map_err(|e| {
                Error::Submission(format!("ListRunCaches failed: {}", DisplayErrorContext(&e)))
            })?;

        Ok(items
            .into_iter()
            .filter(|item| item.name() == Some(name))
            .filter_map(|item| {
                Some(RunCache {
                    id: item.id()?.to_string(),
                    name: item.name().map(str::to_string),
                    status: item.status().map(|s| s.as_str().to_string()),
                })
            })
            .collect())
    }
}

/// Convert validated JSON inputs into the SDK's document type.
fn json_to_document(value: &Value) -> Document {
    match value {
        Value::Null => Document::Null,
        Value::Bool(b) => Document::Bool(*b),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Document::Number(Number::PosInt(u))
            } else if let Some(i) = n.as_i64() {
                Document::Number(Number::NegInt(i))
            } else {
                Document::Number(Number::Float(n.as_f64().unwrap_or_default()))
            }
        }
        Value::String(s) => Document::String(s.clone()),
        Value::Array(items) => Document::Array(items.iter().map(json_to_document).collect()),
        Value::Object(map) => Document::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_document(v)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_to_document() {
        let doc = json_to_document(&json!({
            "threads": 4,
            "offset": -2,
            "ratio": 0.5,
            "tags": ["a"],
            "note": null,
            "flag": true
        }));
        let Document::Object(map) = doc else {
            panic!("expected object");
        };
        assert_eq!(map["threads"], Document::Number(Number::PosInt(4)));
        assert_eq!(map["offset"], Document::Number(Number::NegInt(-2)));
        assert_eq!(map["ratio"], Document::Number(Number::Float(0.5)));
        assert_eq!(
            map["tags"],
            Document::Array(vec![Document::String("a".into())])
        );
        assert_eq!(map["note"], Document::Null);
        assert_eq!(map["flag"], Document::Bool(true));
    }
}
