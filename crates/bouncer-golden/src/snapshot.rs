//! Stored call outcomes
//!
//! Snapshot `<category>/<name>` lives at `<dir>/<category>/<name>.json`.
//! Overwriting one keeps the previous file next to it as
//! `<name>.json.bak-<timestamp>`.

use crate::{GoldenError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

pub const FORMAT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Id of the corpus case
    pub name: String,

    pub metadata: SnapshotMetadata,

    /// The response body, or `{"status": ..., "message": ...}` for a failed call
    pub content: Value,

    /// Paths left out of every comparison against this snapshot
    #[serde(default)]
    pub ignore_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub version: String,

    /// RFC 3339
    pub created_at: String,

    pub updated_at: String,

    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl Snapshot {
    pub fn new(
        name: impl Into<String>,
        content: Value,
        description: Option<String>,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            name: name.into(),
            metadata: SnapshotMetadata {
                version: FORMAT_VERSION.to_string(),
                created_at: now.clone(),
                updated_at: now,
                description,
                tags,
            },
            content,
            ignore_fields: Vec::new(),
        }
    }
}

pub struct SnapshotManager {
    dir: PathBuf,
}

impl SnapshotManager {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// File of a snapshot; names that would leave the directory are rejected
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let inside = !name.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !inside {
            return Err(GoldenError::CorpusError(format!(
                "Invalid snapshot name '{}'",
                name
            )));
        }
        Ok(self.dir.join(format!("{}.json", name)))
    }

    /// `None` when the case was never recorded
    pub fn load(&self, name: &str) -> Result<Option<Snapshot>> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(None);
        }
        let snapshot = serde_json::from_str(&fs::read_to_string(&path)?)?;
        Ok(Some(snapshot))
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<PathBuf> {
        let path = self.path_for(&snapshot.name)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut text = serde_json::to_string_pretty(snapshot)?;
        text.push('\n');
        fs::write(&path, text)?;
        Ok(path)
    }

    /// Overwrite the content of a stored snapshot, backing up the old file
    pub fn replace(&self, mut snapshot: Snapshot, content: Value) -> Result<Snapshot> {
        let path = self.path_for(&snapshot.name)?;
        if path.exists() {
            let stamp = Utc::now().format("%Y%m%d%H%M%S");
            fs::copy(&path, path.with_extension(format!("json.bak-{}", stamp)))?;
        }

        snapshot.content = content;
        snapshot.metadata.updated_at = Utc::now().to_rfc3339();
        self.save(&snapshot)?;
        Ok(snapshot)
    }

    /// Names of every stored snapshot, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&self.dir).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Ok(relative) = path.with_extension("").strip_prefix(&self.dir) {
                let parts: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect();
                names.push(parts.join("/"));
            }
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_and_list() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SnapshotManager::new(temp_dir.path());

        assert!(manager.load("scalars/double").unwrap().is_none());

        let snapshot = Snapshot::new(
            "scalars/double",
            json!({"int32_val": 6}),
            Some("doubled".to_string()),
            vec!["scalars".to_string()],
        );
        let path = manager.save(&snapshot).unwrap();
        assert!(path.ends_with("scalars/double.json"));
        assert!(fs::read_to_string(&path).unwrap().ends_with("}\n"));

        let loaded = manager.load("scalars/double").unwrap().unwrap();
        assert_eq!(loaded.content, json!({"int32_val": 6}));
        assert_eq!(loaded.metadata.version, FORMAT_VERSION);

        manager
            .save(&Snapshot::new("echo", json!({}), None, Vec::new()))
            .unwrap();
        assert_eq!(manager.list().unwrap(), ["echo", "scalars/double"]);
    }

    #[test]
    fn test_replace_keeps_backup_out_of_listing() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SnapshotManager::new(temp_dir.path());

        let snapshot = Snapshot::new("time/skew", json!({"n": 1}), None, Vec::new());
        manager.save(&snapshot).unwrap();
        let replaced = manager.replace(snapshot, json!({"n": 2})).unwrap();
        assert_eq!(replaced.content, json!({"n": 2}));

        let backups = fs::read_dir(temp_dir.path().join("time"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".json.bak-"))
            .count();
        assert_eq!(backups, 1);
        assert_eq!(manager.list().unwrap(), ["time/skew"]);

        let loaded = manager.load("time/skew").unwrap().unwrap();
        assert_eq!(loaded.content, json!({"n": 2}));
    }

    #[test]
    fn test_names_cannot_leave_the_directory() {
        let manager = SnapshotManager::new("/tmp/snapshots");
        assert!(manager.path_for("../outside").is_err());
        assert!(manager.path_for("/etc/passwd").is_err());
        assert!(manager.path_for("").is_err());
        assert!(manager.path_for("struct/nested").is_ok());
    }
}
