//! Version-sentinel handling for the on-disk mirror state directory.
//!
//! On startup, `{basedir}/{stage_name}/.mirrorversion` is compared against
//! the current layout tag; a mismatch (or missing file, treated as `"0"`)
//! purges the whole stage directory before recreating it and writing the
//! current tag.

use std::io;
use std::path::{Path, PathBuf};

/// Ensures `{basedir}/{stage_name}` exists and carries the current version
/// tag, purging it first if an older (or absent) tag is found. Returns the
/// stage directory path.
pub fn prepare_stage_dir(basedir: &Path, stage_name: &str, version_tag: &str) -> io::Result<PathBuf> {
    let dir = basedir.join(stage_name);
    let sentinel = dir.join(".mirrorversion");

    let on_disk_tag = std::fs::read_to_string(&sentinel).unwrap_or_else(|_| "0".to_string());

    if on_disk_tag.trim() != version_tag {
        if dir.exists() {
            tracing::warn!(
                dir = %dir.display(),
                old = %on_disk_tag.trim(),
                new = version_tag,
                "mirror version tag mismatch, purging stage directory"
            );
            std::fs::remove_dir_all(&dir)?;
        }
        std::fs::create_dir_all(&dir)?;
        std::fs::write(&sentinel, version_tag)?;
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_sentinel_creates_dir_and_writes_tag() {
        let base = tempdir().unwrap();
        let dir = prepare_stage_dir(base.path(), "pypi", "1").unwrap();

        assert!(dir.exists());
        let tag = std::fs::read_to_string(dir.join(".mirrorversion")).unwrap();
        assert_eq!(tag, "1");
    }

    #[test]
    fn test_matching_tag_leaves_existing_files() {
        let base = tempdir().unwrap();
        let dir = prepare_stage_dir(base.path(), "pypi", "1").unwrap();
        std::fs::write(dir.join("marker.txt"), "keep me").unwrap();

        let dir_again = prepare_stage_dir(base.path(), "pypi", "1").unwrap();
        assert_eq!(dir, dir_again);
        assert!(dir_again.join("marker.txt").exists());
    }

    #[test]
    fn test_mismatched_tag_purges_directory() {
        let base = tempdir().unwrap();
        let dir = prepare_stage_dir(base.path(), "pypi", "1").unwrap();
        std::fs::write(dir.join("stale.txt"), "old layout").unwrap();

        let dir_again = prepare_stage_dir(base.path(), "pypi", "2").unwrap();
        assert!(!dir_again.join("stale.txt").exists());
        let tag = std::fs::read_to_string(dir_again.join(".mirrorversion")).unwrap();
        assert_eq!(tag, "2");
    }
}
