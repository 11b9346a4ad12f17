//! Archive layout and canonical zip encoding

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::{Component, Path};

use url::Url;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::source::SourceLocation;
use crate::error::Result;

const OUTSIDE_DIR: &str = "__outside_wdl";
const URL_DIR: &str = "__url";

/// Maps document locations to archive entry paths relative to the main
/// document's directory (or base URL).
pub(crate) struct ArchiveLayout {
    root: SourceLocation,
}

impl ArchiveLayout {
    pub(crate) fn new(main: &SourceLocation) -> Self {
        let root = match main {
            SourceLocation::Local(path) => {
                SourceLocation::Local(path.parent().unwrap_or_else(|| Path::new("")).to_path_buf())
            }
            SourceLocation::Remote(url) => {
                SourceLocation::Remote(url.join(".").unwrap_or_else(|_| url.clone()))
            }
        };
        Self { root }
    }

    pub(crate) fn entry_path(&self, location: &SourceLocation) -> String {
        match (location, &self.root) {
            (SourceLocation::Local(path), SourceLocation::Local(root)) => {
                match path.strip_prefix(root) {
                    Ok(relative) => join_components(relative),
                    Err(_) => format!("{OUTSIDE_DIR}/{}", outside_path(root, path)),
                }
            }
            (SourceLocation::Remote(url), SourceLocation::Remote(root)) => {
                match url.as_str().strip_prefix(root.as_str()) {
                    Some(relative) if !relative.is_empty() => strip_query(relative).to_string(),
                    _ => url_entry(url),
                }
            }
            (SourceLocation::Remote(url), SourceLocation::Local(_)) => url_entry(url),
            (SourceLocation::Local(path), SourceLocation::Remote(_)) => {
                format!("{OUTSIDE_DIR}/{}", join_components(path))
            }
        }
    }
}

fn strip_query(s: &str) -> &str {
    s.split(['?', '#']).next().unwrap_or(s)
}

fn url_entry(url: &Url) -> String {
    let host = url.host_str().unwrap_or("localhost");
    format!("{URL_DIR}/{host}{}", url.path())
}

/// Render `path` relative to `root`, spelling each `..` step as `__up` so the
/// entry stays inside the archive and is independent of the absolute root.
fn outside_path(root: &Path, path: &Path) -> String {
    let root_parts: Vec<Component> = root.components().collect();
    let path_parts: Vec<Component> = path.components().collect();
    let common = root_parts
        .iter()
        .zip(&path_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = root_parts[common..]
        .iter()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count();
    let mut parts: Vec<String> = vec!["__up".to_string(); ups];
    parts.extend(path_parts[common..].iter().filter_map(entry_segment));
    parts.join("/")
}

fn entry_segment(component: &Component) -> Option<String> {
    match component {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        Component::ParentDir => Some("__up".to_string()),
        _ => None,
    }
}

fn join_components(path: &Path) -> String {
    path.components()
        .filter_map(|c| entry_segment(&c))
        .collect::<Vec<_>>()
        .join("/")
}

/// Path of entry `to` as written in an import statement inside entry `from`.
pub(crate) fn relative_entry_path(from: &str, to: &str) -> String {
    let from_dir: Vec<&str> = match from.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let to_parts: Vec<&str> = to.split('/').collect();
    let common = from_dir
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from_dir.len() - common];
    parts.extend(&to_parts[common..]);
    parts.join("/")
}

/// Encode entries as a zip archive with sorted names, fixed timestamps and
/// fixed permissions, so equal contents always produce equal bytes.
pub(crate) fn write_archive(entries: &BTreeMap<String, String>) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    for (name, contents) in entries {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(contents.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn local(path: &str) -> SourceLocation {
        SourceLocation::parse(path).unwrap()
    }

    #[test]
    fn test_entry_paths_for_local_documents() {
        let layout = ArchiveLayout::new(&local("/work/wf/main.wdl"));
        assert_eq!(layout.entry_path(&local("/work/wf/main.wdl")), "main.wdl");
        assert_eq!(
            layout.entry_path(&local("/work/wf/lib/tasks.wdl")),
            "lib/tasks.wdl"
        );
        assert_eq!(
            layout.entry_path(&local("/work/common/util.wdl")),
            "__outside_wdl/__up/common/util.wdl"
        );
    }

    #[test]
    fn test_outside_path_without_shared_prefix_keeps_up_steps() {
        let layout = ArchiveLayout::new(&local("wf/main.wdl"));
        assert_eq!(
            layout.entry_path(&local("common/util.wdl")),
            "__outside_wdl/__up/common/util.wdl"
        );
    }

    #[test]
    fn test_entry_paths_for_remote_documents() {
        let layout = ArchiveLayout::new(&local("https://example.com/wf/main.wdl"));
        assert_eq!(
            layout.entry_path(&local("https://example.com/wf/sub/a.wdl")),
            "sub/a.wdl"
        );
        assert_eq!(
            layout.entry_path(&local("https://other.org/lib/b.wdl")),
            "__url/other.org/lib/b.wdl"
        );

        let local_layout = ArchiveLayout::new(&local("/work/wf/main.wdl"));
        assert_eq!(
            local_layout.entry_path(&local("https://other.org/lib/b.wdl")),
            "__url/other.org/lib/b.wdl"
        );
    }

    #[test]
    fn test_relative_entry_path() {
        assert_eq!(relative_entry_path("main.wdl", "lib/tasks.wdl"), "lib/tasks.wdl");
        assert_eq!(
            relative_entry_path("lib/tasks.wdl", "lib/common.wdl"),
            "common.wdl"
        );
        assert_eq!(
            relative_entry_path("lib/tasks.wdl", "__url/x.org/a.wdl"),
            "../__url/x.org/a.wdl"
        );
    }

    #[test]
    fn test_archive_is_sorted_and_deterministic() {
        let mut entries = BTreeMap::new();
        entries.insert("z.wdl".to_string(), "version 1.0\n".to_string());
        entries.insert("a/b.wdl".to_string(), "version 1.0\n".to_string());

        let first = write_archive(&entries).unwrap();
        let second = write_archive(&entries).unwrap();
        assert_eq!(first, second);

        let mut archive = ZipArchive::new(Cursor::new(first)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut file = archive.by_index(0).unwrap();
        assert_eq!(file.name(), "a/b.wdl");
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "version 1.0\n");
    }
}
