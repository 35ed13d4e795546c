//! Archive filename classification: recognizing whether a basename is a
//! release artifact of a given project, and parsing its `(project, version,
//! build-tag)` components for ordering. The direct counterpart of
//! `devpi_common.metadata.is_archive_of_project` / `BasenameMeta`.

use crate::name::normalize;
use crate::types::BasenameMeta;
use std::str::FromStr;

/// Recognized archive extensions, longest first so `.tar.gz` is matched
/// before the generic `.gz`.
pub const ARCHIVE_EXTENSIONS: &[&str] = &[
    ".tar.gz", ".tar.bz2", ".tar.xz", ".tar.zst", ".whl", ".egg", ".zip", ".tgz", ".exe",
];

fn strip_archive_extension(basename: &str) -> Option<(&str, &str)> {
    let lower = basename.to_lowercase();
    ARCHIVE_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map(|ext| (&basename[..basename.len() - ext.len()], *ext))
}

/// `true` if `basename` is recognizably an archive of the project whose
/// normalized name is `normalized_project`.
pub fn is_archive_of_project(basename: &str, normalized_project: &str) -> bool {
    parse_basename_meta(basename, normalized_project).is_some()
}

/// Parses `basename` into its `(project, version, build-tag)` components,
/// requiring the project prefix to normalize to `normalized_project`.
///
/// Tries increasingly long name prefixes (`flask`, then `flask-login`, ...)
/// so project names that themselves contain a `-` are still recognized.
pub fn parse_basename_meta(basename: &str, normalized_project: &str) -> Option<BasenameMeta> {
    let (stem, _ext) = strip_archive_extension(basename)?;
    if stem.is_empty() {
        return None;
    }
    let parts: Vec<&str> = stem.split('-').collect();
    if parts.len() < 2 {
        return None;
    }

    for split_at in 1..parts.len() {
        let candidate_project = parts[..split_at].join("-");
        if normalize(&candidate_project) != normalized_project {
            continue;
        }
        let version_str = parts[split_at];
        let Ok(version) = pep440_rs::Version::from_str(version_str) else {
            continue;
        };
        let build_tag = if split_at + 1 < parts.len() {
            Some(parts[split_at + 1..].join("-"))
        } else {
            None
        };
        return Some(BasenameMeta {
            project: candidate_project,
            version: Some(version),
            build_tag,
            basename: basename.to_string(),
        });
    }
    None
}
