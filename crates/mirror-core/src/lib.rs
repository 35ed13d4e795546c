//! Ambient, PyPI-agnostic stack shared by `mirror-pypi`.
//!
//! This crate provides the foundation the PyPI-specific caching mirror is
//! built on top of:
//!
//! - **Transport**: `http::Fetcher`, a redirect-following HTTP client used
//!   by both the crawler and the simple-index fetch path.
//! - **Wire codec**: `xmlrpc`, a minimal `methodCall`/`methodResponse`
//!   encoder/decoder for the two XML-RPC methods PyPI's legacy mirroring
//!   API exposes.
//! - **Storage**: `kv::TransactionalStore`, the transactional key-value
//!   abstraction the per-project cache is built on, with `kv::MemStore` as
//!   the in-memory reference implementation.
//! - **Errors**: `error::CoreError`, the unified ambient error type.
//!
//! # Examples
//!
//! ```no_run
//! use mirror_core::http::Fetcher;
//!
//! # async fn example() -> mirror_core::error::Result<()> {
//! let fetcher = Fetcher::new();
//! let page = fetcher.get("https://pypi.org/simple/requests/").await?;
//! if page.is_html() {
//!     println!("{} bytes of simple-index HTML", page.body.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod http;
pub mod kv;
pub mod xmlrpc;

pub use error::{CoreError, Result};
pub use http::{FetchResponse, Fetcher};
pub use kv::{MemStore, TransactionalStore};
pub use xmlrpc::{encode_method_call, parse_method_response, Value as XmlRpcValue};
