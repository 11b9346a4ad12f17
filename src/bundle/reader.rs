//! Reading WDL sources from disk, over HTTP, or from memory

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::debug;

use super::source::SourceLocation;
use crate::error::{Error, Result};

/// Fetches the text of a WDL document.
#[async_trait]
pub trait SourceReader: Send + Sync {
    async fn read(&self, location: &SourceLocation) -> Result<String>;
}

/// Filesystem and HTTP(S) reader used by the CLI.
pub struct DefaultSourceReader {
    client: Client,
}

impl DefaultSourceReader {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for DefaultSourceReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceReader for DefaultSourceReader {
    async fn read(&self, location: &SourceLocation) -> Result<String> {
        match location {
            SourceLocation::Local(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| Error::Fetch(format!("cannot read {}: {e}", path.display()))),
            SourceLocation::Remote(url) => {
                debug!("downloading {}", url);
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| Error::Fetch(format!("failed to download {url}: {e}")))?;

                if !response.status().is_success() {
                    return Err(Error::Fetch(format!(
                        "failed to download {url}: HTTP status {}",
                        response.status()
                    )));
                }

                response
                    .text()
                    .await
                    .map_err(|e| Error::Fetch(format!("failed to read body of {url}: {e}")))
            }
        }
    }
}

/// In-memory reader for tests; records every location requested.
#[derive(Clone, Default)]
pub struct MemorySourceReader {
    documents: HashMap<String, String>,
    reads: Arc<RwLock<Vec<SourceLocation>>>,
}

impl MemorySourceReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `source` for `reference`, keyed the way the location displays
    /// once parsed.
    pub fn with_document(mut self, reference: &str, source: &str) -> Self {
        let key = SourceLocation::parse(reference)
            .map(|location| location.to_string())
            .unwrap_or_else(|_| reference.to_string());
        self.documents.insert(key, source.to_string());
        self
    }

    pub async fn reads(&self) -> Vec<SourceLocation> {
        self.reads.read().await.clone()
    }
}

#[async_trait]
impl SourceReader for MemorySourceReader {
    async fn read(&self, location: &SourceLocation) -> Result<String> {
        self.reads.write().await.push(location.clone());
        self.documents
            .get(&location.to_string())
            .cloned()
            .ok_or_else(|| Error::Fetch(format!("cannot read {location}: not found")))
    }
}
