//! Persisted per-middleware order/enabled overrides.
//!
//! Stored as a JSON object mapping middleware name to `{order, enabled}`,
//! rewritten in full on every mutation.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use {
    serde::{Deserialize, Serialize},
    switchyard_common::json_file::{read_json, write_json_atomic},
    tracing::{debug, info},
};

use crate::error::Result;

/// Override layered over a middleware's registration defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    pub order: i32,
    pub enabled: bool,
}

/// One entry of a bulk [`CustomizationStore::set_customizations`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomizationEntry {
    pub name: String,
    pub order: i32,
    pub enabled: bool,
}

impl CustomizationEntry {
    pub fn new(name: impl Into<String>, order: i32, enabled: bool) -> Self {
        Self {
            name: name.into(),
            order,
            enabled,
        }
    }
}

/// File-backed customization mapping.
pub struct CustomizationStore {
    path: PathBuf,
    entries: BTreeMap<String, Customization>,
}

impl CustomizationStore {
    /// Load the mapping from `path`. A missing file is created holding `{}`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match read_json::<BTreeMap<String, Customization>>(&path)? {
            Some(entries) => {
                debug!(path = %path.display(), count = entries.len(), "loaded middleware customizations");
                entries
            },
            None => {
                let entries = BTreeMap::new();
                write_json_atomic(&path, &entries)?;
                info!(path = %path.display(), "created empty middleware customizations file");
                entries
            },
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<Customization> {
        self.entries.get(name).copied()
    }

    pub fn all(&self) -> &BTreeMap<String, Customization> {
        &self.entries
    }

    /// Upsert every entry, then persist the whole mapping.
    pub fn set_customizations(
        &mut self,
        entries: impl IntoIterator<Item = CustomizationEntry>,
    ) -> Result<()> {
        let mut updated = self.entries.clone();
        for CustomizationEntry {
            name,
            order,
            enabled,
        } in entries
        {
            updated.insert(name, Customization { order, enabled });
        }
        write_json_atomic(&self.path, &updated)?;
        self.entries = updated;
        info!(count = self.entries.len(), "middleware customizations saved");
        Ok(())
    }

    /// Drop every override and persist the empty mapping.
    pub fn reset_customizations(&mut self) -> Result<()> {
        let empty = BTreeMap::new();
        write_json_atomic(&self.path, &empty)?;
        self.entries = empty;
        info!("middleware customizations reset");
        Ok(())
    }
}
