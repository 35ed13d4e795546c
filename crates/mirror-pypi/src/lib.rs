//! PyPI caching-mirror core.
//!
//! Presents upstream PyPI as a local, read-through, serial-consistent
//! namespace of projects and their release artifacts: a mirror freshness
//! engine (registry + change-log loop), a simple-index parser and one-hop
//! crawler, and a per-project cache with replica-coordination support.
//!
//! # Architecture
//!
//! - [`xmlrpc_client`]: upstream XML-RPC client (`list_packages_with_serial`,
//!   `changelog_since_serial`).
//! - [`parser`] / [`crawler`]: turn a simple-index HTML page (plus one hop
//!   of rel-linked scrape pages) into an ordered, deduplicated release-link
//!   list.
//! - [`cache`]: per-project `{serial, latest_serial, entries}` record,
//!   persisted through `mirror_core::kv::TransactionalStore`.
//! - [`registry`]: process-wide `name -> serial` table, persisted to its own
//!   on-disk blob.
//! - [`changelog`]: background task reconciling the registry and cache
//!   against upstream's change log.
//! - [`stage`]: the public facade tying the above together per request.
//!
//! # Example
//!
//! ```no_run
//! use mirror_pypi::name::normalize;
//!
//! assert_eq!(normalize("Flask-Login"), "flask-login");
//! assert_eq!(normalize("flask_login"), "flask-login");
//! ```

pub mod cache;
pub mod changelog;
pub mod crawler;
pub mod error;
pub mod filename;
pub mod name;
pub mod parser;
pub mod registry;
pub mod stage;
pub mod types;
pub mod xmlrpc_client;

pub use cache::ProjectCache;
pub use changelog::ChangelogLoop;
pub use crawler::Crawler;
pub use error::{MirrorError, Result};
pub use name::{normalize, ProjectName};
pub use parser::IndexParser;
pub use registry::MirrorRegistry;
pub use stage::{FileStore, ProjectConfigOutcome, Stage, StageConfig, StageOutcome, VersionConfig};
pub use types::{BasenameMeta, Entry, LinkKind, ProjectCacheRecord, ReleaseLink, Serial};
pub use xmlrpc_client::{ChangelogEntry, PypiXmlRpcClient, XmlRpcClient};
