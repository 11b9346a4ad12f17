//! Reuse-or-register policy for workflow bundles

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::bundle::LoadedWorkflow;
use crate::error::{Error, Result};
use crate::fingerprint::BundleFingerprint;
use crate::service::{
    ParameterSpec, RegisteredWorkflow, WorkflowDefinition, WorkflowRegistry, WorkflowStatus,
};
use crate::wdl::Executable;

/// Tag carrying the full bundle digest on registered workflows. It is
/// informational: lookup matches on the fingerprint suffix of the name alone.
pub const FINGERPRINT_TAG: &str = "wdl-omics-run:sha256";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Parameter template advertised to the service: one entry per declared
/// input.
pub fn parameter_template(executable: &Executable) -> BTreeMap<String, ParameterSpec> {
    executable
        .inputs
        .iter()
        .map(|input| {
            (
                input.name.clone(),
                ParameterSpec {
                    description: input
                        .description
                        .clone()
                        .unwrap_or_else(|| input.name.clone()),
                    optional: !input.required(),
                },
            )
        })
        .collect()
}

/// Registration request for `loaded` under its fingerprint-derived name.
pub fn workflow_definition(loaded: &LoadedWorkflow) -> Result<WorkflowDefinition> {
    let executable = loaded.executable()?;
    let fingerprint = loaded.bundle.fingerprint();
    Ok(WorkflowDefinition {
        name: fingerprint.workflow_name(&executable.name),
        main: loaded.bundle.main_entry().to_string(),
        archive: loaded.bundle.bytes().to_vec(),
        parameter_template: parameter_template(executable),
        tags: BTreeMap::from([fingerprint_tag(&fingerprint)]),
        request_id: uuid::Uuid::new_v4().to_string(),
    })
}

/// Finds or registers workflows and waits for them to become ready.
pub struct Registrar<'a> {
    registry: &'a dyn WorkflowRegistry,
    poll_interval: Duration,
}

impl<'a> Registrar<'a> {
    pub fn new(registry: &'a dyn WorkflowRegistry) -> Self {
        Self {
            registry,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Id of a usable workflow registered for `definition.name`, creating
    /// one when none exists. Deleted and failed matches are ignored.
    pub async fn ensure_workflow(&self, definition: &WorkflowDefinition) -> Result<String> {
        let usable: Vec<RegisteredWorkflow> = self
            .registry
            .find(&definition.name)
            .await?
            .into_iter()
            .filter(|w| w.status.is_usable())
            .collect();

        if usable.len() > 1 {
            warn!(
                "{} workflows are registered as {}; using one arbitrarily",
                usable.len(),
                definition.name
            );
        }

        if let Some(existing) = usable.last() {
            info!(
                "Reusing workflow {} ({}, {})",
                existing.id, definition.name, existing.status
            );
            return Ok(existing.id.clone());
        }

        debug!(
            "Registering {} ({} bytes, main {})",
            definition.name,
            definition.archive.len(),
            definition.main
        );
        let id = self.registry.create(definition).await?;
        info!("Registered workflow {} as {}", definition.name, id);
        Ok(id)
    }

    /// Poll until the workflow leaves its pending states.
    pub async fn await_ready(&self, id: &str) -> Result<RegisteredWorkflow> {
        loop {
            let workflow = self.registry.describe(id).await?;
            if workflow.status.is_pending() {
                debug!("Workflow {} is {}; waiting", id, workflow.status);
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }

            if workflow.status == WorkflowStatus::Failed {
                return Err(Error::Registration(format!(
                    "workflow {id} failed: {}",
                    workflow
                        .status_message
                        .as_deref()
                        .unwrap_or("no status message")
                )));
            }
            return Ok(workflow);
        }
    }

    /// Reuse or register `loaded`, then wait for it to be ready.
    pub async fn resolve(&self, loaded: &LoadedWorkflow) -> Result<String> {
        let definition = workflow_definition(loaded)?;
        let id = self.ensure_workflow(&definition).await?;
        self.await_ready(&id).await?;
        Ok(id)
    }
}

/// Fingerprint tag value for a bundle.
pub fn fingerprint_tag(fingerprint: &BundleFingerprint) -> (String, String) {
    (FINGERPRINT_TAG.to_string(), fingerprint.to_string())
}
