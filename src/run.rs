//! Building and submitting run requests

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::service::{
    CacheBehavior, RunCacheDirectory, RunCacheSettings, RunLogLevel, RunReceipt, RunRequest,
    RunSubmitter, StorageType,
};

/// How the run cache is chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CacheSelection {
    #[default]
    Disabled,
    Id(String),
    Name(String),
}

/// Run settings gathered from flags, environment and configuration.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub role_arn: Option<String>,
    pub output_uri: Option<String>,
    pub name: Option<String>,
    pub priority: Option<i32>,
    pub run_group_id: Option<String>,
    pub storage_type: Option<StorageType>,
    pub storage_capacity: Option<i32>,
    pub cache: CacheSelection,
    pub cache_behavior: Option<CacheBehavior>,
    pub log_level: RunLogLevel,
}

impl RunOptions {
    /// Check the settings that can be checked without the service.
    pub fn validate(&self) -> Result<()> {
        if self.role_arn.is_none() {
            return Err(Error::Usage(
                "--role-arn is required to start a run".to_string(),
            ));
        }
        match self.output_uri.as_deref() {
            None => {
                return Err(Error::Usage(
                    "--output-uri is required to start a run".to_string(),
                ))
            }
            Some(uri) if !uri.starts_with("s3://") => {
                return Err(Error::Usage(format!(
                    "--output-uri must be an s3:// URI, got {uri}"
                )))
            }
            Some(_) => {}
        }
        if self.storage_capacity.is_some() && self.storage_type != Some(StorageType::Static) {
            return Err(Error::Usage(
                "--storage-capacity requires --storage-type static".to_string(),
            ));
        }
        if self.cache_behavior.is_some() && self.cache == CacheSelection::Disabled {
            return Err(Error::Usage(
                "--cache-behavior requires --cache or --cache-id".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the cache selection to a concrete cache id.
    pub async fn resolve_cache(
        &self,
        directory: &dyn RunCacheDirectory,
    ) -> Result<Option<RunCacheSettings>> {
        let id = match &self.cache {
            CacheSelection::Disabled => return Ok(None),
            CacheSelection::Id(id) => id.clone(),
            CacheSelection::Name(name) => {
                let caches = directory.find_by_name(name).await?;
                let cache = caches
                    .last()
                    .ok_or_else(|| Error::Usage(format!("no run cache named {name}")))?;
                debug!("Run cache {} is {}", name, cache.id);
                cache.id.clone()
            }
        };
        Ok(Some(RunCacheSettings {
            id,
            behavior: self.cache_behavior,
        }))
    }

    /// Assemble the request for one run of `workflow_id`.
    pub fn request(
        &self,
        workflow_id: &str,
        parameters: Map<String, Value>,
        cache: Option<RunCacheSettings>,
    ) -> Result<RunRequest> {
        let role_arn = self
            .role_arn
            .clone()
            .ok_or_else(|| Error::Usage("--role-arn is required to start a run".into()))?;
        let output_uri = self
            .output_uri
            .clone()
            .ok_or_else(|| Error::Usage("--output-uri is required to start a run".into()))?;

        Ok(RunRequest {
            workflow_id: workflow_id.to_string(),
            role_arn,
            output_uri,
            parameters,
            name: self.name.clone(),
            priority: self.priority,
            run_group_id: self.run_group_id.clone(),
            storage_type: self.storage_type,
            storage_capacity: self.storage_capacity,
            cache,
            log_level: self.log_level,
            request_id: uuid::Uuid::new_v4().to_string(),
        })
    }
}

/// Submit `request` exactly once.
pub async fn submit(submitter: &dyn RunSubmitter, request: &RunRequest) -> Result<RunReceipt> {
    let parameters = Value::Object(request.parameters.clone());
    debug!("StartRun workflow {} with {}", request.workflow_id, parameters);
    let receipt = submitter.start_run(request).await?;
    info!("Started run {} of workflow {}", receipt.run_id, receipt.workflow_id);
    Ok(receipt)
}
