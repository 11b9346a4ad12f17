//! Workflow bundle construction
//!
//! Loads the main WDL document and every document it transitively imports,
//! rewrites import literals so they point inside the archive, and encodes the
//! result as a canonical zip suitable for registration and fingerprinting.

mod archive;
pub mod reader;
pub mod source;

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::fingerprint::BundleFingerprint;
use crate::wdl::{Executable, StructDef, WdlDocument};
use archive::{relative_entry_path, write_archive, ArchiveLayout};
pub use reader::{DefaultSourceReader, MemorySourceReader, SourceReader};
pub use source::SourceLocation;
use source::normalize;

/// A zip archive holding the main WDL document and its imports.
#[derive(Debug, Clone)]
pub struct WorkflowBundle {
    main_entry: String,
    entries: BTreeMap<String, String>,
    archive: Vec<u8>,
}

impl WorkflowBundle {
    /// Archive path of the main document.
    pub fn main_entry(&self) -> &str {
        &self.main_entry
    }

    /// Archive paths in archive order.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Contents of an entry as stored in the archive (imports rewritten).
    pub fn entry(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.archive
    }

    pub fn fingerprint(&self) -> BundleFingerprint {
        BundleFingerprint::of(&self.archive)
    }
}

/// A bundle together with the parsed main document.
#[derive(Debug, Clone)]
pub struct LoadedWorkflow {
    pub bundle: WorkflowBundle,
    pub document: WdlDocument,
    /// Struct definitions from every bundled document.
    pub structs: Vec<StructDef>,
}

impl LoadedWorkflow {
    pub fn executable(&self) -> Result<&Executable> {
        self.document.executable()
    }
}

struct LoadedDocument {
    location: SourceLocation,
    source: String,
    document: WdlDocument,
    /// Resolved target of each entry in `document.imports`.
    targets: Vec<SourceLocation>,
}

/// Builds a [`WorkflowBundle`] by walking the import graph.
pub struct BundleBuilder<'a> {
    reader: &'a dyn SourceReader,
    search_paths: Vec<PathBuf>,
}

impl<'a> BundleBuilder<'a> {
    pub fn new(reader: &'a dyn SourceReader) -> Self {
        Self {
            reader,
            search_paths: Vec::new(),
        }
    }

    /// Extra directories searched for relative local imports.
    pub fn search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    pub async fn build(&self, main: &SourceLocation) -> Result<LoadedWorkflow> {
        let main = &main.absolute()?;
        let search_paths = self
            .search_paths
            .iter()
            .map(|dir| Ok(normalize(&std::path::absolute(dir)?)))
            .collect::<Result<Vec<_>>>()?;
        let documents = self.load_all(main, &search_paths).await?;

        let layout = ArchiveLayout::new(main);
        let mut entry_of: HashMap<&SourceLocation, String> = HashMap::new();
        let mut claimed: HashMap<String, &SourceLocation> = HashMap::new();
        for doc in &documents {
            let entry = layout.entry_path(&doc.location);
            if let Some(other) = claimed.insert(entry.clone(), &doc.location) {
                return Err(Error::Fetch(format!(
                    "{} and {} would both be stored as {entry}",
                    other, doc.location
                )));
            }
            entry_of.insert(&doc.location, entry);
        }

        let mut entries = BTreeMap::new();
        for doc in &documents {
            let entry = &entry_of[&doc.location];
            let rewritten = rewrite_imports(doc, entry, &entry_of);
            entries.insert(entry.clone(), rewritten);
        }

        let archive = write_archive(&entries)?;
        let main_entry = entry_of[main].clone();
        info!(
            "bundled {} ({} documents, {} bytes)",
            main,
            entries.len(),
            archive.len()
        );

        let structs = documents
            .iter()
            .flat_map(|d| d.document.structs.iter().cloned())
            .collect();
        let document = documents
            .into_iter()
            .next()
            .map(|d| d.document)
            .ok_or_else(|| Error::Fetch(format!("cannot read {main}")))?;

        Ok(LoadedWorkflow {
            bundle: WorkflowBundle {
                main_entry,
                entries,
                archive,
            },
            document,
            structs,
        })
    }

    /// Breadth-first walk of the import graph; the main document comes first.
    async fn load_all(
        &self,
        main: &SourceLocation,
        search_paths: &[PathBuf],
    ) -> Result<Vec<LoadedDocument>> {
        let mut documents = Vec::new();
        let mut seen: HashSet<SourceLocation> = HashSet::new();
        let mut queue: VecDeque<(SourceLocation, String)> = VecDeque::new();

        let source = self.reader.read(main).await?;
        seen.insert(main.clone());
        queue.push_back((main.clone(), source));

        while let Some((location, source)) = queue.pop_front() {
            let document = WdlDocument::parse(&source, &location.to_string())?;

            let mut targets = Vec::with_capacity(document.imports.len());
            for import in &document.imports {
                let candidates = location.import_candidates(&import.uri, search_paths)?;
                let (target, fetched) = self.first_readable(&candidates, &seen).await?;
                if let Some(text) = fetched {
                    debug!("{} imports {}", location, target);
                    seen.insert(target.clone());
                    queue.push_back((target.clone(), text));
                }
                targets.push(target);
            }

            documents.push(LoadedDocument {
                location,
                source,
                document,
                targets,
            });
        }

        Ok(documents)
    }

    /// Returns the first candidate already loaded, or the first one that can
    /// be read along with its text. The error reported on total failure is
    /// the one for the primary candidate.
    async fn first_readable(
        &self,
        candidates: &[SourceLocation],
        seen: &HashSet<SourceLocation>,
    ) -> Result<(SourceLocation, Option<String>)> {
        let mut first_error = None;
        for candidate in candidates {
            if seen.contains(candidate) {
                return Ok((candidate.clone(), None));
            }
            match self.reader.read(candidate).await {
                Ok(text) => return Ok((candidate.clone(), Some(text))),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        Err(first_error.unwrap_or_else(|| Error::Fetch("import has no candidate location".into())))
    }
}

/// Replace import literals whose archive-relative path differs from what the
/// document wrote.
fn rewrite_imports(
    doc: &LoadedDocument,
    entry: &str,
    entry_of: &HashMap<&SourceLocation, String>,
) -> String {
    let mut replacements: Vec<(std::ops::Range<usize>, String)> = doc
        .document
        .imports
        .iter()
        .zip(&doc.targets)
        .filter_map(|(import, target)| {
            let wanted = relative_entry_path(entry, &entry_of[target]);
            (wanted != import.uri).then(|| (import.span.clone(), format!("\"{wanted}\"")))
        })
        .collect();

    if replacements.is_empty() {
        return doc.source.clone();
    }

    replacements.sort_by_key(|(span, _)| std::cmp::Reverse(span.start));
    let mut text = doc.source.clone();
    for (span, literal) in replacements {
        text.replace_range(span, &literal);
    }
    text
}
