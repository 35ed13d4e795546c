//! Process-wide `name -> serial` table and normalized-name reverse index
//! (component E). Persisted to disk outside the transactional key-value
//! store, as a single opaque blob rewritten atomically after each
//! change-log batch.

use crate::error::{MirrorError, Result};
use crate::name::normalize;
use crate::types::Serial;
use crate::xmlrpc_client::XmlRpcClient;
use dashmap::DashMap;
use mirror_core::error::CoreError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Default)]
struct RegistryBlob {
    name2serials: std::collections::HashMap<String, u64>,
    normname2name: std::collections::HashMap<String, String>,
}

/// Holds `name2serials` and `normname2name`. Shared between the sole writer
/// (`ChangelogLoop`) and many concurrent readers (`Stage`, request
/// handlers), hence the concurrent maps rather than a single `RwLock`ed
/// struct.
pub struct MirrorRegistry {
    name2serials: DashMap<String, Serial>,
    normname2name: DashMap<String, String>,
}

impl MirrorRegistry {
    pub(crate) fn empty() -> Self {
        Self {
            name2serials: DashMap::new(),
            normname2name: DashMap::new(),
        }
    }

    /// Records `serial` for `name`, updating the reverse index if the
    /// normalized form differs from the raw name. Returns the normalized
    /// name.
    pub fn set(&self, name: &str, serial: Serial) -> String {
        let normalized = normalize(name);
        self.name2serials.insert(name.to_string(), serial);
        if normalized != name {
            self.normname2name.insert(normalized.clone(), name.to_string());
        }
        normalized
    }

    /// The maximum serial currently known, used as the change-log cursor.
    pub fn max_serial(&self) -> Serial {
        self.name2serials
            .iter()
            .map(|entry| *entry.value())
            .max()
            .unwrap_or(Serial::ZERO)
    }

    /// Resolves `name` (raw or normalized spelling) to its canonical raw
    /// upstream name, or `None` if unknown.
    pub fn resolve(&self, name: &str) -> Option<String> {
        let normalized = normalize(name);
        if let Some(raw) = self.normname2name.get(&normalized) {
            return Some(raw.clone());
        }
        if self.name2serials.contains_key(&normalized) {
            return Some(normalized);
        }
        None
    }

    /// The known serial for a raw name, if present.
    pub fn serial_for(&self, raw_name: &str) -> Option<Serial> {
        self.name2serials.get(raw_name).map(|entry| *entry.value())
    }

    /// All known raw project names, sorted.
    pub fn project_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .name2serials
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Atomically rewrites the on-disk blob (write-temp-then-rename).
    pub fn persist(&self, path: &Path) -> Result<()> {
        let blob = RegistryBlob {
            name2serials: self
                .name2serials
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().0))
                .collect(),
            normname2name: self
                .normname2name
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
        };
        let bytes = serde_json::to_vec_pretty(&blob).map_err(CoreError::from)?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(CoreError::from)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(CoreError::from)?;
        tmp.write_all(&bytes).map_err(CoreError::from)?;
        tmp.persist(path)
            .map_err(|e| CoreError::from(e.error))?;
        Ok(())
    }

    /// Loads a registry from a previously persisted blob.
    fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(CoreError::from)?;
        let blob: RegistryBlob =
            serde_json::from_slice(&bytes).map_err(|e| MirrorError::registry_corrupt(path.display().to_string(), e))?;

        let registry = Self::empty();
        for (name, serial) in blob.name2serials {
            registry.name2serials.insert(name, Serial(serial));
        }
        for (normalized, raw) in blob.normname2name {
            registry.normname2name.insert(normalized, raw);
        }
        Ok(registry)
    }

    /// If `path` exists and is non-empty, loads it; otherwise bootstraps
    /// from a live `list_packages_with_serial` call. Fatal (returns
    /// `Err(MirrorError::BootstrapFailed)`) if neither is available — the
    /// only fatal condition in this system.
    pub async fn bootstrap(client: &impl XmlRpcClient, path: &Path) -> Result<Self> {
        if path.exists() {
            if let Ok(metadata) = std::fs::metadata(path) {
                if metadata.len() > 0 {
                    if let Ok(registry) = Self::load(path) {
                        return Ok(registry);
                    }
                    tracing::warn!(path = %path.display(), "persisted registry blob unreadable, re-bootstrapping from upstream");
                }
            }
        }

        let Some(packages) = client.list_packages_with_serial().await else {
            return Err(MirrorError::BootstrapFailed);
        };

        let registry = Self::empty();
        for (name, serial) in packages {
            registry.set(&name, Serial(serial));
        }
        Ok(registry)
    }
}
