//! Errors specific to the PyPI mirror layer.
//!
//! These cover malformed upstream responses and on-disk registry faults
//! that are specific to this crate's domain; ambient transport/XML-RPC/KV
//! faults are `mirror_core::error::CoreError` and convert into this type
//! via `From`.

use thiserror::Error;

/// Errors specific to the PyPI mirror layer.
#[derive(Error, Debug)]
pub enum MirrorError {
    /// The upstream response body is not valid simple-index HTML (in the
    /// narrow sense of "could not be parsed at all" — individual malformed
    /// links are logged and skipped, not an error).
    #[error("could not parse simple-index page at {url}: {message}")]
    InvalidIndexPage { url: String, message: String },

    /// The registry's on-disk blob is corrupt or unreadable.
    #[error("registry blob at {path} is invalid: {source}")]
    RegistryCorrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Bootstrap failed: neither a persisted registry blob nor a live
    /// upstream `list_packages_with_serial` call produced any data. The
    /// only fatal condition in this system (spec §7).
    #[error("mirror bootstrap failed: no persisted registry and upstream unreachable")]
    BootstrapFailed,

    /// Ambient transport, XML-RPC, or key-value store fault.
    #[error(transparent)]
    Core(#[from] mirror_core::error::CoreError),
}

/// Result type alias for `mirror-pypi` operations.
pub type Result<T> = std::result::Result<T, MirrorError>;

impl MirrorError {
    /// Builds an `InvalidIndexPage` error.
    pub fn invalid_index_page(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidIndexPage {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Builds a `RegistryCorrupt` error.
    pub fn registry_corrupt(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::RegistryCorrupt {
            path: path.into(),
            source,
        }
    }
}
