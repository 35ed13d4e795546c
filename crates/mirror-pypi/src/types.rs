//! Core data types: serials, parsed release links, cache entries, and the
//! persisted per-project cache record.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A monotonically non-decreasing upstream event counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Serial(pub u64);

impl Serial {
    pub const ZERO: Serial = Serial(0);
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Serial {
    fn from(value: u64) -> Self {
        Serial(value)
    }
}

/// Distinguishes the two link flavors `IndexParser` produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkKind {
    /// A release artifact whose filename identifies the project.
    Archive,
    /// An editable/source egg reference (`#egg=<designator>`).
    Egg,
}

/// A parsed upstream artifact URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseLink {
    /// The final path component of the URL (e.g. `Django-3.0.tar.gz`).
    pub basename: String,
    /// The fully resolved, absolute URL.
    pub url: String,
    /// Content digest carried in the URL fragment, if any (e.g. an MD5 hex
    /// string from `#md5=...`).
    pub digest: Option<String>,
    /// The `egg=<designator>` fragment value, present only for egg links.
    pub egg_fragment: Option<String>,
    pub kind: LinkKind,
}

impl ReleaseLink {
    /// `true` if this is the "has a digest" variant used by the
    /// digest-upgrade merge rule (§8 invariant 6).
    pub fn has_digest(&self) -> bool {
        self.digest.is_some()
    }
}

/// The file-store's locally addressable handle for a `ReleaseLink`.
/// Opaque to this crate beyond these three fields; produced by the external
/// file store's `maplink` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub relpath: String,
    pub digest: Option<String>,
    pub keyname: String,
}

/// The persisted `PYPILINKS(name)` record.
///
/// Invariant: `latest_serial >= serial`. The record is *fresh* iff
/// `serial >= latest_serial` (equivalently, equality — `store` always sets
/// them equal, and only `bump_latest` can push `latest_serial` ahead).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCacheRecord {
    pub serial: Serial,
    pub latest_serial: Serial,
    pub entrylist: Vec<Entry>,
    pub projectname: String,
}

impl ProjectCacheRecord {
    /// Builds a freshly-stored record: `serial == latest_serial`.
    pub fn new(projectname: impl Into<String>, serial: Serial, entrylist: Vec<Entry>) -> Self {
        Self {
            serial,
            latest_serial: serial,
            entrylist,
            projectname: projectname.into(),
        }
    }

    /// `record.serial >= record.latest_serial`.
    pub fn is_fresh(&self) -> bool {
        self.serial >= self.latest_serial
    }
}

/// Parsed `project-version[-buildtag]` components used to order archive
/// links in descending version order, the direct counterpart of
/// `devpi_common.metadata.BasenameMeta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasenameMeta {
    pub project: String,
    pub version: Option<pep440_rs::Version>,
    pub build_tag: Option<String>,
    pub basename: String,
}

impl PartialOrd for BasenameMeta {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BasenameMeta {
    /// Descending by parsed version, then by build tag, tie-broken
    /// lexicographically on the full basename (spec §4.B ordering rule).
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.version, &other.version) {
            (Some(a), Some(b)) => b
                .cmp(a)
                .then_with(|| self.build_tag.cmp(&other.build_tag))
                .then_with(|| self.basename.cmp(&other.basename)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.basename.cmp(&other.basename),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_serial_ordering() {
        assert!(Serial(5) < Serial(6));
        assert_eq!(Serial::ZERO, Serial(0));
    }

    #[test]
    fn test_record_is_fresh_when_equal() {
        let record = ProjectCacheRecord::new("Django", Serial(7), vec![]);
        assert!(record.is_fresh());
    }

    #[test]
    fn test_record_is_stale_after_bump() {
        let mut record = ProjectCacheRecord::new("Django", Serial(7), vec![]);
        record.latest_serial = Serial(9);
        assert!(!record.is_fresh());
    }

    #[test]
    fn test_release_link_has_digest() {
        let with = ReleaseLink {
            basename: "a".into(),
            url: "https://x/a".into(),
            digest: Some("abc".into()),
            egg_fragment: None,
            kind: LinkKind::Archive,
        };
        let without = ReleaseLink {
            digest: None,
            ..with.clone()
        };
        assert!(with.has_digest());
        assert!(!without.has_digest());
    }

    #[test]
    fn test_basename_meta_descending_version_order() {
        let mut metas = vec![
            BasenameMeta {
                project: "django".into(),
                version: Some(pep440_rs::Version::from_str("2.0").unwrap()),
                build_tag: None,
                basename: "Django-2.0.tar.gz".into(),
            },
            BasenameMeta {
                project: "django".into(),
                version: Some(pep440_rs::Version::from_str("3.0").unwrap()),
                build_tag: None,
                basename: "Django-3.0.tar.gz".into(),
            },
        ];
        metas.sort();
        assert_eq!(metas[0].basename, "Django-3.0.tar.gz");
        assert_eq!(metas[1].basename, "Django-2.0.tar.gz");
    }

    #[test]
    fn test_basename_meta_unparseable_version_sorts_last() {
        let mut metas = vec![
            BasenameMeta {
                project: "foo".into(),
                version: None,
                build_tag: None,
                basename: "foo-weird.tar.gz".into(),
            },
            BasenameMeta {
                project: "foo".into(),
                version: Some(pep440_rs::Version::from_str("1.0").unwrap()),
                build_tag: None,
                basename: "foo-1.0.tar.gz".into(),
            },
        ];
        metas.sort();
        assert_eq!(metas[0].basename, "foo-1.0.tar.gz");
        assert_eq!(metas[1].basename, "foo-weird.tar.gz");
    }
}
