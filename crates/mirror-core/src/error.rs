use thiserror::Error;

/// Ambient faults raised by `mirror-core`'s transport, wire-codec, and
/// key-value store abstractions.
///
/// Business-level outcomes (unknown project, stale cache, upstream
/// unreachable) are *not* modeled here — they are expected, pattern-matched
/// results produced by `mirror_pypi::stage::Stage`, not failures.
///
/// # Examples
///
/// ```
/// use mirror_core::error::{CoreError, Result};
///
/// fn require_nonempty(body: &str) -> Result<()> {
///     if body.is_empty() {
///         return Err(CoreError::xmlrpc("empty response body"));
///     }
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed XML-RPC envelope: {message}")]
    XmlRpc { message: String },

    #[error("key-value store error: {message}")]
    Store { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, CoreError>`.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Build a `Transport` error from a `reqwest::Error` and the URL it was
    /// produced by.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// Build an `XmlRpc` error with a human-readable cause.
    pub fn xmlrpc(message: impl Into<String>) -> Self {
        Self::XmlRpc {
            message: message.into(),
        }
    }

    /// Build a `Store` error with a human-readable cause.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CoreError::store("write transaction already in progress");
        assert!(error.to_string().contains("write transaction"));
    }

    #[test]
    fn test_xmlrpc_error() {
        let error = CoreError::xmlrpc("unexpected end of document");
        assert_eq!(
            error.to_string(),
            "malformed XML-RPC envelope: unexpected end of document"
        );
    }

    #[test]
    fn test_json_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let error: CoreError = json_err.into();
        assert!(matches!(error, CoreError::Json(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: CoreError = io_err.into();
        assert!(error.to_string().contains("I/O error"));
    }
}
