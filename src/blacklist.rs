// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Persisted per-species blacklist
//!
//! Each species folder may hold a pretty-printed JSON array of excluded
//! filenames. A missing file is the empty set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{CuratorError, Result};

/// Blacklist mutation requested by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Add,
    Remove,
}

impl fmt::Display for ToggleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToggleAction::Add => write!(f, "add"),
            ToggleAction::Remove => write!(f, "remove"),
        }
    }
}

/// Reject names that could escape the folder they are joined onto
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(CuratorError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// File-backed blacklist store rooted at the species collection
#[derive(Debug, Clone)]
pub struct BlacklistStore {
    root: PathBuf,
    file_name: String,
}

impl BlacklistStore {
    pub fn new(root: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Resolve an existing species folder
    pub fn species_dir(&self, species: &str) -> Result<PathBuf> {
        validate_name(species)?;
        let dir = self.root.join(species);
        if !dir.is_dir() {
            return Err(CuratorError::SpeciesNotFound(species.to_string()));
        }
        Ok(dir)
    }

    /// Read the blacklist of an existing species
    pub fn read(&self, species: &str) -> Result<Vec<String>> {
        let dir = self.species_dir(species)?;
        Ok(read_list(&dir.join(&self.file_name)))
    }

    /// Add or remove one filename and persist the whole set.
    ///
    /// Returns whether the file is blacklisted afterwards.
    pub fn toggle(&self, species: &str, filename: &str, action: ToggleAction) -> Result<bool> {
        validate_name(filename)?;
        let dir = self.species_dir(species)?;
        let path = dir.join(&self.file_name);
        let mut list = read_list(&path);

        let blacklisted = match action {
            ToggleAction::Add => {
                if !list.iter().any(|f| f == filename) {
                    list.push(filename.to_string());
                }
                true
            }
            ToggleAction::Remove => {
                list.retain(|f| f != filename);
                false
            }
        };

        write_list(&path, &list)?;
        info!("Blacklist {} {}/{} ({} entries)", action, species, filename, list.len());

        Ok(blacklisted)
    }
}

/// Load a blacklist file, normalizing anything unexpected to a clean list
pub fn read_list(path: &Path) -> Vec<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!("Failed to read blacklist {:?}: {}", path, e);
            return Vec::new();
        }
    };

    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!("Malformed blacklist {:?}: {}", path, e);
            return Vec::new();
        }
    };

    let items = match value {
        serde_json::Value::Array(items) => items,
        other => {
            warn!("Blacklist {:?} is not an array ({}), treating as empty", path, kind_of(&other));
            return Vec::new();
        }
    };

    let mut list: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        match item {
            serde_json::Value::String(name) => {
                if !list.contains(&name) {
                    list.push(name);
                }
            }
            other => debug!("Skipping non-string blacklist entry in {:?}: {}", path, other),
        }
    }
    list
}

/// Replace the file in one step: write a uniquely named sibling temp file,
/// sync it, then rename it over the destination
fn write_list(path: &Path, list: &[String]) -> Result<()> {
    let payload = serde_json::to_string_pretty(list)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(payload.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    // Best effort: make the rename itself durable
    if let Ok(handle) = std::fs::File::open(dir) {
        let _ = handle.sync_all();
    }
    Ok(())
}

fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
