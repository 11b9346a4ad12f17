//! Content fingerprints and the workflow names derived from them

use std::fmt;

use sha2::{Digest, Sha256};

/// Longest executable-name prefix kept in a derived workflow name, leaving
/// room for the separator and the short digest within the service's
/// 128-character name limit.
const MAX_NAME_PREFIX: usize = 111;
const SHORT_LEN: usize = 16;

/// SHA-256 of a bundle archive, as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BundleFingerprint(String);

impl BundleFingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 16 hex characters.
    pub fn short(&self) -> &str {
        &self.0[..SHORT_LEN]
    }

    /// `<executable name, truncated>.<short digest>`
    pub fn workflow_name(&self, executable: &str) -> String {
        let prefix: String = executable.chars().take(MAX_NAME_PREFIX).collect();
        format!("{prefix}.{}", self.short())
    }
}

impl fmt::Display for BundleFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
