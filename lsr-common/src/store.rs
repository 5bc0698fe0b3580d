//! Record store: annotation file load and persist
//!
//! The annotation file for a dataset named `<name>` lives at
//! `<data_dir>/<name>/<name>_annotation.json`. Once it exists it is the
//! single source of truth: uploading the same dataset name again resumes
//! from it instead of re-reading the upload.
//!
//! Every field mutation rewrites the whole file. There is no batching, so at
//! most the edit in flight is lost on a crash.

use crate::model::DatasetItem;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of loading a dataset upload
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub items: Vec<DatasetItem>,
    pub path: PathBuf,
    pub name: String,
    /// True when an existing annotation file was reused
    pub resumed: bool,
}

/// Dataset name derived from an upload file name (`labs/chem.json` → `chem`)
pub fn dataset_name(upload_name: &str) -> Result<String> {
    let stem = Path::new(upload_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    if stem.is_empty() || stem.starts_with('.') {
        return Err(Error::InvalidInput(format!(
            "Cannot derive dataset name from '{}'",
            upload_name
        )));
    }
    Ok(stem.to_string())
}

/// `<data_dir>/<name>/<name>_annotation.json`
pub fn annotation_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(name).join(format!("{}_annotation.json", name))
}

/// Load a dataset, resuming from its annotation file when one exists
///
/// A fresh upload that is a single JSON object becomes a one-element list.
/// Invalid JSON fails before anything is written.
pub fn load(upload_name: &str, upload: &[u8], data_dir: &Path) -> Result<LoadedDataset> {
    let name = dataset_name(upload_name)?;
    let path = annotation_path(data_dir, &name);

    if path.exists() {
        let items = read_annotation_file(&path)?;
        info!(
            "Loaded annotation file {} ({} items)",
            path.display(),
            items.len()
        );
        return Ok(LoadedDataset {
            items,
            path,
            name,
            resumed: true,
        });
    }

    let items: Vec<DatasetItem> = match serde_json::from_slice(upload)? {
        Value::Array(records) => records.into_iter().map(DatasetItem::new).collect(),
        other => vec![DatasetItem::new(other)],
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    persist(&items, &path)?;
    info!(
        "Created annotation file {} ({} items)",
        path.display(),
        items.len()
    );

    Ok(LoadedDataset {
        items,
        path,
        name,
        resumed: false,
    })
}

/// Read an existing annotation file; the top level must be an array
///
/// Records are kept as read, whatever fields they carry.
pub fn read_annotation_file(path: &Path) -> Result<Vec<DatasetItem>> {
    let bytes = std::fs::read(path)?;
    match serde_json::from_slice(&bytes)? {
        Value::Array(records) => Ok(records.into_iter().map(DatasetItem::new).collect()),
        _ => Err(Error::InvalidInput(format!(
            "Annotation file {} is not a JSON array",
            path.display()
        ))),
    }
}

/// Serialize items exactly as `persist` writes them (4-space indent)
pub fn to_pretty_json(items: &[DatasetItem]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    items.serialize(&mut ser)?;
    Ok(buf)
}

/// Overwrite the annotation file with the full item list
pub fn persist(items: &[DatasetItem], path: &Path) -> Result<()> {
    let bytes = to_pretty_json(items)?;
    std::fs::write(path, &bytes)?;
    debug!("Persisted {} items to {}", items.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_name_from_upload() {
        assert_eq!(dataset_name("chem_labs.json").unwrap(), "chem_labs");
        assert_eq!(dataset_name("uploads/bio.json").unwrap(), "bio");
        assert!(dataset_name("").is_err());
        assert!(dataset_name(".json").is_err());
    }

    #[test]
    fn test_annotation_path_layout() {
        let path = annotation_path(Path::new("data"), "chem");
        assert_eq!(path, PathBuf::from("data/chem/chem_annotation.json"));
    }

    #[test]
    fn test_pretty_json_uses_four_spaces() {
        let items = vec![DatasetItem::new(serde_json::json!({"Topic": "Physics"}))];
        let text = String::from_utf8(to_pretty_json(&items).unwrap()).unwrap();
        assert_eq!(text, "[\n    {\n        \"Topic\": \"Physics\"\n    }\n]");
    }

    #[test]
    fn test_load_accepts_unexpected_field_types() {
        let dir = tempfile::TempDir::new().unwrap();
        let loaded = load("num.json", br#"[{"Topic": 7, "Scenario": "s"}, 42]"#, dir.path()).unwrap();

        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.items[0].record()["Topic"], 7);
        assert_eq!(loaded.items[1].record(), &serde_json::json!(42));
    }
}
