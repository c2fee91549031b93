use crate::{DocumentDescriptor, IngestError};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

const INDEXABLE_EXTENSIONS: [&str; 1] = ["pdf"];

/// Whether the extractor understands the document behind `locator`. Judged
/// on the extension of the path part, so `a.PDF?download=1` still counts.
pub fn is_indexable_locator(locator: &str) -> bool {
    let path = locator
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or_default();

    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            INDEXABLE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

pub fn load_manifest(path: &Path) -> Result<Vec<DocumentDescriptor>, IngestError> {
    let raw = fs::read_to_string(path)?;
    let manifest: Vec<DocumentDescriptor> = serde_json::from_str(&raw)?;
    Ok(manifest)
}

/// Builds a manifest from every file under `folder`, in path order. Locators
/// are relative to `folder`; the category is the containing directory.
pub fn discover_manifest(folder: &Path) -> Result<Vec<DocumentDescriptor>, IngestError> {
    if !folder.is_dir() {
        return Err(IngestError::InvalidArgument(format!(
            "not a directory: {}",
            folder.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if entry.file_type().is_file() {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort_unstable();

    let manifest = files
        .iter()
        .filter_map(|path| {
            let relative = path.strip_prefix(folder).ok()?;
            let title = relative.file_stem()?.to_string_lossy().to_string();
            let category = relative
                .parent()
                .map(slash_path)
                .unwrap_or_default();

            Some(DocumentDescriptor {
                title,
                locator: slash_path(relative),
                category,
            })
        })
        .collect();

    Ok(manifest)
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
