//! Parses a simple-index HTML page into release links, egg links, and
//! crawl candidates (component B). Mirrors `IndexParser.parse_index` from
//! the reference `devpi_server.extpypi` implementation.

use crate::error::{MirrorError, Result};
use crate::filename;
use crate::name::normalize;
use crate::types::{LinkKind, ReleaseLink};
use std::collections::{HashMap, HashSet};
use url::Url;

/// Accumulates parsed links across one or more calls to `parse_index`,
/// so that the crawler can feed rel-linked pages back into the same
/// parser state (`scrape=false`) after the initial page (`scrape=true`).
pub struct IndexParser {
    normalized_project: String,
    basename_to_link: HashMap<String, ReleaseLink>,
    egg_links: Vec<ReleaseLink>,
    crawl_urls: HashSet<String>,
}

impl IndexParser {
    /// Creates a parser for the project whose normalized name is
    /// `normalized_project`.
    pub fn new(normalized_project: impl Into<String>) -> Self {
        Self {
            normalized_project: normalized_project.into(),
            basename_to_link: HashMap::new(),
            egg_links: Vec::new(),
            crawl_urls: HashSet::new(),
        }
    }

    /// Parses `body` (the HTML of the page at `base_url`) and merges its
    /// links into this parser's accumulated state.
    ///
    /// When `scrape` is `false`, egg-fragment handling and crawl-set
    /// collection are skipped entirely — used for the one-hop pages the
    /// crawler feeds back in.
    pub fn parse_index(&mut self, base_url: &str, body: &str, scrape: bool) -> Result<()> {
        let base = Url::parse(base_url)
            .map_err(|e| MirrorError::invalid_index_page(base_url, e.to_string()))?;

        let dom = tl::parse(body, tl::ParserOptions::default())
            .map_err(|e| MirrorError::invalid_index_page(base_url, e.to_string()))?;
        let parser = dom.parser();

        let Some(anchors) = dom.query_selector("a") else {
            return Ok(());
        };

        for handle in anchors {
            let Some(node) = handle.get(parser) else {
                continue;
            };
            let Some(tag) = node.as_tag() else {
                continue;
            };
            let attrs = tag.attributes();

            let Some(href) = attrs
                .get("href")
                .flatten()
                .map(|v| v.as_utf8_str().into_owned())
            else {
                continue;
            };

            let Ok(resolved) = base.join(&href) else {
                continue;
            };
            if resolved.scheme() != "http" && resolved.scheme() != "https" {
                continue;
            }

            let has_rel = attrs.get("rel").flatten().is_some();
            let fragment = resolved.fragment().map(str::to_string);
            let egg_fragment = fragment
                .as_deref()
                .and_then(|f| f.strip_prefix("egg="))
                .map(str::to_string);

            let basename = resolved
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .unwrap_or("")
                .to_string();

            if let Some(egg) = egg_fragment {
                if scrape {
                    if !normalize(&egg).starts_with(self.normalized_project.as_str()) {
                        // egg-fragment for a different project: dropped.
                        continue;
                    }
                    if basename.is_empty() {
                        tracing::warn!(url = %resolved, "egg link has no filename component, skipping");
                        continue;
                    }
                    let link = ReleaseLink {
                        basename,
                        url: resolved.to_string(),
                        digest: None,
                        egg_fragment: Some(egg),
                        kind: LinkKind::Egg,
                    };
                    if !self.egg_links.iter().any(|existing| existing.url == link.url) {
                        self.egg_links.insert(0, link);
                    }
                    continue;
                }
                // scrape=false: fall through to the archive check below, which
                // will simply not match an egg-style basename.
            }

            if filename::is_archive_of_project(&basename, &self.normalized_project) {
                let digest = fragment.as_deref().and_then(parse_digest_fragment);
                let candidate = ReleaseLink {
                    basename: basename.clone(),
                    url: resolved.to_string(),
                    digest,
                    egg_fragment: None,
                    kind: LinkKind::Archive,
                };
                self.merge_archive_link(basename, candidate);
                continue;
            }

            if scrape && has_rel {
                self.crawl_urls.insert(resolved.to_string());
            }
        }

        Ok(())
    }

    fn merge_archive_link(&mut self, basename: String, candidate: ReleaseLink) {
        match self.basename_to_link.get(&basename) {
            None => {
                self.basename_to_link.insert(basename, candidate);
            }
            Some(existing) if !existing.has_digest() && candidate.has_digest() => {
                self.basename_to_link.insert(basename, candidate);
            }
            Some(_) => {
                // existing link kept: either it already has a digest, or
                // neither does and the first-seen one wins.
            }
        }
    }

    /// The set of URLs collected for one-hop crawling (populated only by
    /// `scrape=true` calls).
    pub fn crawl_urls(&self) -> &HashSet<String> {
        &self.crawl_urls
    }

    /// Final ordered release-link list: egg links (front-insertion order),
    /// followed by archive links in descending parsed-version order.
    pub fn releaselinks(&self) -> Vec<ReleaseLink> {
        let mut archives: Vec<_> = self
            .basename_to_link
            .iter()
            .filter_map(|(basename, link)| {
                filename::parse_basename_meta(basename, &self.normalized_project)
                    .map(|meta| (meta, link))
            })
            .collect();
        archives.sort_by(|a, b| a.0.cmp(&b.0));

        let mut result = self.egg_links.clone();
        result.extend(archives.into_iter().map(|(_, link)| link.clone()));
        result
    }
}

fn parse_digest_fragment(fragment: &str) -> Option<String> {
    fragment.split_once('=').map(|(_, hex)| hex.to_string())
}
