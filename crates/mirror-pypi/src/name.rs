//! Project name normalization (PEP 503).
//!
//! Lookups in the registry and the per-project cache are always keyed by
//! normalized name; the raw upstream spelling is preserved separately for
//! display and for building upstream URLs.

use std::fmt;

/// A project's raw upstream spelling paired with its normalized form.
///
/// Invariant: `raw` is whatever the registry or caller supplied; `normalized`
/// is always `normalize(raw)`. Two `ProjectName`s with equal `normalized`
/// fields refer to the same project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectName {
    pub raw: String,
    pub normalized: String,
}

impl ProjectName {
    /// Builds a `ProjectName` from a raw upstream spelling.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        Self { raw, normalized }
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Normalizes a project name: lowercase, with runs of `-`, `_`, `.`
/// collapsed to a single `-`.
///
/// Idempotent: `normalize(normalize(n)) == normalize(n)` for all `n`.
pub fn normalize(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut result = String::with_capacity(lowered.len());
    let mut prev_was_sep = false;

    for c in lowered.chars() {
        if c == '-' || c == '_' || c == '.' {
            if !prev_was_sep && !result.is_empty() {
                result.push('-');
            }
            prev_was_sep = true;
        } else {
            result.push(c);
            prev_was_sep = false;
        }
    }

    // A separator run at the very end collapses away entirely, matching the
    // reference implementation's treatment of trailing punctuation.
    if result.ends_with('-') {
        result.pop();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases() {
        assert_eq!(normalize("Django"), "django");
    }

    #[test]
    fn test_normalize_collapses_separator_runs() {
        assert_eq!(normalize("Flask-Login"), "flask-login");
        assert_eq!(normalize("flask_login"), "flask-login");
        assert_eq!(normalize("flask.login"), "flask-login");
        assert_eq!(normalize("flask___login"), "flask-login");
        assert_eq!(normalize("flask-_.login"), "flask-login");
    }

    #[test]
    fn test_normalize_idempotent() {
        for name in ["Django", "Flask-Login", "zope.interface", "A__B--C..D"] {
            let once = normalize(name);
            let twice = normalize(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_project_name_tracks_both_forms() {
        let pn = ProjectName::new("Flask-Login");
        assert_eq!(pn.raw, "Flask-Login");
        assert_eq!(pn.normalized, "flask-login");
    }

    #[test]
    fn test_project_name_raw_equals_normalized_when_already_normal() {
        let pn = ProjectName::new("requests");
        assert_eq!(pn.raw, pn.normalized);
    }
}
