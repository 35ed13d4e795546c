//! Process wiring for the PyPI caching-mirror daemon: configuration loading
//! and the on-disk state-directory version sentinel. The mirror logic
//! itself lives in `mirror_pypi`; this crate only owns the process
//! lifetime, CLI, and ambient configuration.

pub mod config;
pub mod startup;

pub use config::{MirrorConfig, ReplicaConfig, MIRROR_VERSION_TAG};
