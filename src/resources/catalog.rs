//! Resource directory scanning and access.
//!
//! # Responsibilities
//! - Walk the resource directory once at startup
//! - Map request-style names ("/css/site.css") to files on disk
//! - Read resource bytes on demand
//!
//! # Design Decisions
//! - Only files present at startup are servable; names never reach the
//!   filesystem unless they are catalog keys, so traversal is impossible
//! - An unreadable root directory is fatal; unreadable subdirectories are skipped

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StartupError;

/// Name → file table for one resource directory.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    root: PathBuf,
    entries: HashMap<String, PathBuf>,
}

impl ResourceCatalog {
    /// Scan `root` recursively.
    pub fn scan(root: impl Into<PathBuf>) -> Result<Self, StartupError> {
        let root = root.into();
        let mut entries = HashMap::new();

        let top = fs::read_dir(&root).map_err(|source| StartupError::ResourceDir {
            path: root.clone(),
            source,
        })?;
        collect(top, "", &mut entries);

        tracing::info!(
            dir = %root.display(),
            resources = entries.len(),
            "Resource catalog built"
        );
        Ok(Self { root, entries })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing a resource name.
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    /// The catalog's own copy of a resource name.
    pub fn name(&self, name: &str) -> Option<&str> {
        self.entries.get_key_value(name).map(|(key, _)| key.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Resource names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes of a resource. `None` when the name is unknown or the file is gone.
    pub async fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        let Some(path) = self.get(name) else {
            return Ok(None);
        };
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(resource = %name, "Resource disappeared since startup");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn collect(dir: fs::ReadDir, prefix: &str, entries: &mut HashMap<String, PathBuf>) {
    for entry in dir.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            tracing::debug!(path = ?entry.path(), "Skipping non UTF-8 resource name");
            continue;
        };
        let name = format!("{}/{}", prefix, file_name);

        if file_type.is_dir() {
            match fs::read_dir(entry.path()) {
                Ok(sub) => collect(sub, &name, entries),
                Err(e) => tracing::warn!(
                    dir = %entry.path().display(),
                    error = %e,
                    "Skipping unreadable resource directory"
                ),
            }
        } else if file_type.is_file() || entry.path().is_file() {
            tracing::trace!(resource = %name, "Added resource");
            entries.insert(name, entry.path());
        }
    }
}
