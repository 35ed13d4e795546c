//! Runtime configuration for the mirror daemon.
//!
//! Can be loaded from a JSON file via `--config`; every field has a
//! sensible default so an empty (or absent) file is a valid configuration.
//!
//! # Examples
//!
//! ```
//! use mirror_server::config::MirrorConfig;
//!
//! let config: MirrorConfig = serde_json::from_str("{}").unwrap();
//! assert_eq!(config.refresh_interval_secs, 30);
//! assert!(!config.replica.enabled);
//! ```

use serde::Deserialize;

/// The on-disk layout tag. Bumping this purges `{basedir}/{stage_name}` on
/// next startup (spec's "Version tag" / version-sentinel-file behavior).
pub const MIRROR_VERSION_TAG: &str = "1";

#[derive(Debug, Deserialize)]
pub struct MirrorConfig {
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_pypi_base_url")]
    pub pypi_base_url: String,

    #[serde(default = "default_stage_name")]
    pub stage_name: String,

    #[serde(default = "default_basedir")]
    pub basedir: String,

    #[serde(default)]
    pub replica: ReplicaConfig,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            pypi_base_url: default_pypi_base_url(),
            stage_name: default_stage_name(),
            basedir: default_basedir(),
            replica: ReplicaConfig::default(),
        }
    }
}

/// Replica-mode settings. `enabled` mirrors spec §6's "replica flag"; the
/// simple-index fetches go through `master_url` instead of `pypi_base_url`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReplicaConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub master_url: Option<String>,
}

fn default_refresh_interval_secs() -> u64 {
    30
}

fn default_pypi_base_url() -> String {
    "https://pypi.org/".to_string()
}

fn default_stage_name() -> String {
    "pypi".to_string()
}

fn default_basedir() -> String {
    "./mirror-data".to_string()
}
