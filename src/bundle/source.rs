//! Locations of WDL documents and import resolution

use std::fmt;
use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::error::{Error, Result};

/// Where a WDL document lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceLocation {
    Local(PathBuf),
    Remote(Url),
}

fn is_http(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

impl SourceLocation {
    /// Interpret a user-supplied reference: `http(s)://` URLs are remote,
    /// anything without a scheme is a local path.
    pub fn parse(reference: &str) -> Result<Self> {
        if is_http(reference) {
            let url = Url::parse(reference)
                .map_err(|e| Error::Usage(format!("invalid URL {reference}: {e}")))?;
            return Ok(SourceLocation::Remote(url));
        }
        if reference.contains("://") {
            return Err(Error::Fetch(format!(
                "unsupported WDL source scheme: {reference}"
            )));
        }
        Ok(SourceLocation::Local(normalize(Path::new(reference))))
    }

    /// Anchor a local location at the current directory so archive entry
    /// names do not depend on how the path was typed. Remote locations are
    /// returned unchanged.
    pub fn absolute(&self) -> Result<Self> {
        match self {
            SourceLocation::Local(path) => {
                Ok(SourceLocation::Local(normalize(&std::path::absolute(path)?)))
            }
            SourceLocation::Remote(_) => Ok(self.clone()),
        }
    }

    /// Candidate locations for `import` as seen from this document, in the
    /// order they should be tried. Relative local imports fall back to each
    /// search directory.
    pub fn import_candidates(&self, import: &str, search_paths: &[PathBuf]) -> Result<Vec<Self>> {
        if is_http(import) {
            return Ok(vec![Self::parse(import)?]);
        }

        match self {
            SourceLocation::Remote(base) => {
                let url = base.join(import).map_err(|e| {
                    Error::Fetch(format!("cannot resolve import {import} against {base}: {e}"))
                })?;
                Ok(vec![SourceLocation::Remote(url)])
            }
            SourceLocation::Local(path) => {
                if import.contains("://") {
                    return Err(Error::Fetch(format!("unsupported import scheme: {import}")));
                }
                let import_path = Path::new(import);
                if import_path.is_absolute() {
                    return Ok(vec![SourceLocation::Local(normalize(import_path))]);
                }
                let base = path.parent().unwrap_or_else(|| Path::new(""));
                let mut candidates = vec![SourceLocation::Local(normalize(&base.join(import_path)))];
                candidates.extend(
                    search_paths
                        .iter()
                        .map(|dir| SourceLocation::Local(normalize(&dir.join(import_path)))),
                );
                candidates.dedup();
                Ok(candidates)
            }
        }
    }

    /// Final path component, used as the archive name of the main document.
    pub fn file_name(&self) -> String {
        match self {
            SourceLocation::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "main.wdl".to_string()),
            SourceLocation::Remote(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| "main.wdl".to_string()),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Local(path) => write!(f, "{}", path.display()),
            SourceLocation::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Lexically normalize a path, folding `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
