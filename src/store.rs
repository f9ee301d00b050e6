//! Snapshot store: JSON documents under one data directory.
//!
//! Writes go to a hidden sibling temp file which is then renamed over the
//! destination, so readers only ever see a complete old or new document.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Idempotent; call once per run before any `persist`.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create data directory: {}", self.root.display()))
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn persist<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.path(name);
        let mut json = serde_json::to_vec_pretty(value)
            .with_context(|| format!("Failed to serialize {}", name))?;
        json.push(b'\n');
        atomic_write(&path, &json)?;
        debug!("Saved {} ({} bytes)", path.display(), json.len());
        Ok(path)
    }

    /// `None` when the file is missing or does not hold valid JSON.
    pub fn load(&self, name: &str) -> Result<Option<Value>> {
        let path = self.path(name);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };
        match serde_json::from_slice(&bytes) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                debug!("Ignoring unreadable snapshot {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }
}

/// Atomic write via temp file + rename
fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = parent_dir(path);
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("snapshot");
    let temp_path = parent.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    let written = File::create(&temp_path)
        .and_then(|mut f| {
            f.write_all(content)?;
            f.sync_all()
        })
        .with_context(|| format!("Failed to write temp file: {}", temp_path.display()));
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e).with_context(|| format!("Failed to rename temp file to {}", path.display()));
    }
    sync_dir(parent).with_context(|| format!("Failed to sync directory {}", parent.display()))
}

// A bare file name has an empty parent, which cannot be opened.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Makes the rename itself durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
