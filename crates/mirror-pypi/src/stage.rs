//! Public facade: orchestrates cache hit / upstream fetch / parse / crawl /
//! persist for one project query (component G).

use crate::cache::ProjectCache;
use crate::crawler::Crawler;
use crate::filename;
use crate::name::normalize;
use crate::parser::IndexParser;
use crate::registry::MirrorRegistry;
use crate::types::{Entry, ReleaseLink, Serial};
use mirror_core::http::Fetcher;
use mirror_core::kv::TransactionalStore;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps a parsed `ReleaseLink` to its locally addressable handle. Owned by
/// the file-blob store, out of scope for this crate — this is just the seam
/// `Stage` calls through.
pub trait FileStore: Send + Sync {
    fn maplink(&self, link: &ReleaseLink) -> Entry;
}

/// Discriminated result of `getreleaselinks`, replacing the source's
/// overloaded "list or small integer" return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Entries(Vec<Entry>),
    UnknownProject,
    UpstreamStatus(u16),
    Stale,
    ReplicaDesync,
    Unreachable,
}

/// Capabilities `Stage` needs, passed at construction instead of a
/// back-reference to a container object.
pub struct StageConfig {
    /// e.g. `https://pypi.org/` (primary) or the replica's master URL.
    pub base_simple_url: String,
    pub is_replica: bool,
}

/// Last non-empty path segment of a URL, percent-decoded — the project name
/// as it actually appears in the (possibly redirected) response URL.
fn last_path_segment(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).next_back()?;
    Some(urlencoding::decode(segment).map(|s| s.into_owned()).unwrap_or_else(|_| segment.to_string()))
}

/// Orchestrates one project query across the cache, upstream fetch, parser,
/// and crawler.
pub struct Stage<S: TransactionalStore, F: FileStore> {
    registry: Arc<MirrorRegistry>,
    store: Arc<S>,
    cache: ProjectCache<S>,
    fetcher: Fetcher,
    file_store: F,
    config: StageConfig,
}

impl<S: TransactionalStore, F: FileStore> Stage<S, F> {
    pub fn new(
        registry: Arc<MirrorRegistry>,
        store: Arc<S>,
        fetcher: Fetcher,
        file_store: F,
        config: StageConfig,
    ) -> Self {
        let cache = ProjectCache::new(store.clone());
        Self {
            registry,
            store,
            cache,
            fetcher,
            file_store,
            config,
        }
    }

    async fn load_fresh(&self, normalized: &str) -> Option<Vec<Entry>> {
        let record = self.cache.load(normalized).await?;
        record.is_fresh().then_some(record.entrylist)
    }

    /// Resolves `name`, serves a fresh cache hit, or fetches upstream and
    /// refreshes the cache. See spec step numbering in module docs for the
    /// ten-step algorithm this follows.
    pub async fn getreleaselinks(&self, name: &str) -> StageOutcome {
        let Some(raw_name) = self.registry.resolve(name) else {
            return StageOutcome::UnknownProject;
        };
        let normalized = normalize(&raw_name);

        if let Some(entries) = self.load_fresh(&normalized).await {
            return StageOutcome::Entries(entries);
        }

        let url = format!(
            "{}simple/{}/",
            self.config.base_simple_url,
            urlencoding::encode(&raw_name)
        );
        let response = match self.fetcher.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%url, error = %e, "upstream simple page unreachable");
                return StageOutcome::Unreachable;
            }
        };

        if response.status != 200 {
            return StageOutcome::UpstreamStatus(response.status);
        }

        if self.config.is_replica {
            let Some(target_serial) = response.devpi_serial else {
                tracing::warn!(%url, "replica response missing X-DEVPI-SERIAL header");
                return StageOutcome::ReplicaDesync;
            };
            self.store.wait_for_serial(target_serial).await;
            return match self.load_fresh(&normalized).await {
                Some(entries) => StageOutcome::Entries(entries),
                None => StageOutcome::ReplicaDesync,
            };
        }

        if let Some(real_name) = last_path_segment(&response.final_url) {
            if normalize(&real_name) != normalized {
                tracing::error!(
                    %url,
                    final_url = %response.final_url,
                    %real_name,
                    expected = %raw_name,
                    "response URL project name does not match looked-up canonical name"
                );
                return StageOutcome::UnknownProject;
            }
        }

        let returned_serial = Serial(response.pypi_last_serial.unwrap_or(0));
        if let Some(known) = self.registry.serial_for(&raw_name) {
            if returned_serial < known {
                return StageOutcome::Stale;
            }
        }

        let mut parser = IndexParser::new(normalized.clone());
        if let Err(e) = parser.parse_index(&response.final_url, &response.body, true) {
            tracing::warn!(%url, error = %e, "failed to parse simple index page, treating as empty");
        } else {
            let crawler = Crawler::new(&self.fetcher);
            crawler.crawl(&mut parser).await;
        }

        let entries: Vec<Entry> = parser
            .releaselinks()
            .iter()
            .map(|link| self.file_store.maplink(link))
            .collect();

        if let Err(e) = self
            .cache
            .store(&normalized, &raw_name, entries.clone(), returned_serial)
            .await
        {
            tracing::error!(name = %raw_name, error = %e, "failed to write project cache record");
        }

        StageOutcome::Entries(entries)
    }

    /// Groups `getreleaselinks`' entries by parsed version, deriving the
    /// version from each entry's `keyname` (the archive basename the file
    /// store preserved). Entries whose basename does not parse as an
    /// archive of this project (egg references, mainly) fall into their own
    /// bucket keyed by the basename itself.
    pub async fn getprojectconfig(&self, name: &str) -> ProjectConfigOutcome {
        let Some(raw_name) = self.registry.resolve(name) else {
            return ProjectConfigOutcome::UnknownProject;
        };
        let normalized = normalize(&raw_name);

        match self.getreleaselinks(name).await {
            StageOutcome::Entries(entries) => {
                let mut versions: HashMap<String, VersionConfig> = HashMap::new();
                for entry in entries {
                    let key = filename::parse_basename_meta(&entry.keyname, &normalized)
                        .and_then(|meta| meta.version.map(|v| v.to_string()))
                        .unwrap_or_else(|| format!("egg={}", entry.keyname));

                    let config = versions.entry(key.clone()).or_insert_with(|| VersionConfig {
                        name: raw_name.clone(),
                        version: key.clone(),
                        files: HashMap::new(),
                    });
                    config.files.insert(entry.keyname.clone(), entry.relpath.clone());
                }
                ProjectConfigOutcome::Versions(versions)
            }
            StageOutcome::UnknownProject => ProjectConfigOutcome::UnknownProject,
            StageOutcome::UpstreamStatus(code) => ProjectConfigOutcome::UpstreamStatus(code),
            StageOutcome::Stale => ProjectConfigOutcome::Stale,
            StageOutcome::ReplicaDesync => ProjectConfigOutcome::ReplicaDesync,
            StageOutcome::Unreachable => ProjectConfigOutcome::Unreachable,
        }
    }
}

/// One version bucket of `getprojectconfig`'s grouped output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConfig {
    pub name: String,
    pub version: String,
    /// basename -> relpath
    pub files: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectConfigOutcome {
    Versions(HashMap<String, VersionConfig>),
    UnknownProject,
    UpstreamStatus(u16),
    Stale,
    ReplicaDesync,
    Unreachable,
}
