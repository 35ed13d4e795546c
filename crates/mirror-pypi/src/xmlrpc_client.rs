//! Issues `list_packages_with_serial` and `changelog_since_serial(s)` calls
//! against the upstream XML-RPC endpoint (component A).
//!
//! Contract: on transport error or non-200 response, returns a distinguished
//! *absent* result — this client never raises. The only fatal case is the
//! bootstrap call returning absent on first use (handled one layer up, in
//! `MirrorRegistry::bootstrap`).

use async_trait::async_trait;
use mirror_core::xmlrpc::{encode_method_call, parse_method_response, Value as XmlRpcValue};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

/// One row of the upstream change-log, in the order PyPI's XML-RPC API
/// returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub name: String,
    pub version: String,
    pub action: String,
    pub date: i64,
    pub serial: u64,
}

/// Abstraction over the two PyPI XML-RPC methods this mirror consumes,
/// so `MirrorRegistry`/`ChangelogLoop` tests can substitute a stub.
#[async_trait]
pub trait XmlRpcClient: Send + Sync {
    async fn list_packages_with_serial(&self) -> Option<HashMap<String, u64>>;
    async fn changelog_since_serial(&self, since: u64) -> Option<Vec<ChangelogEntry>>;
}

/// Real client, POSTing XML-RPC envelopes built by `mirror_core::xmlrpc`.
pub struct PypiXmlRpcClient {
    client: Client,
    endpoint: String,
}

impl PypiXmlRpcClient {
    /// Builds a client against `endpoint` (PyPI's `/pypi` XML-RPC URL).
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(mirror_core::http::user_agent())
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create HTTP client");
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    async fn call(&self, method: &str, params: &[XmlRpcValue]) -> Option<XmlRpcValue> {
        let body = encode_method_call(method, params);

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .header(reqwest::header::ACCEPT, "text/xml")
            .body(body)
            .send()
            .await
            .inspect_err(|e| tracing::warn!(%method, error = %e, "xml-rpc transport failure"))
            .ok()?;

        if !response.status().is_success() {
            tracing::warn!(%method, status = %response.status(), "xml-rpc non-200 response");
            return None;
        }

        let text = response.text().await.ok()?;
        match parse_method_response(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%method, error = %e, "xml-rpc malformed response");
                None
            }
        }
    }
}

#[async_trait]
impl XmlRpcClient for PypiXmlRpcClient {
    async fn list_packages_with_serial(&self) -> Option<HashMap<String, u64>> {
        let value = self.call("list_packages_with_serial", &[]).await?;
        let members = value.as_struct()?;
        Some(
            members
                .iter()
                .filter_map(|(name, serial)| serial.as_int().map(|n| (name.clone(), n.max(0) as u64)))
                .collect(),
        )
    }

    async fn changelog_since_serial(&self, since: u64) -> Option<Vec<ChangelogEntry>> {
        let value = self
            .call(
                "changelog_since_serial",
                &[XmlRpcValue::Int(since as i64)],
            )
            .await?;
        let rows = value.as_array()?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(fields) = row.as_array() else {
                continue;
            };
            if fields.len() < 5 {
                continue;
            }
            let (Some(name), Some(serial)) = (fields[0].as_str(), fields[4].as_int()) else {
                continue;
            };
            entries.push(ChangelogEntry {
                name: name.to_string(),
                version: fields[1].as_str().unwrap_or_default().to_string(),
                action: fields[2].as_str().unwrap_or_default().to_string(),
                date: fields[3].as_int().unwrap_or_default(),
                serial: serial.max(0) as u64,
            });
        }
        Some(entries)
    }
}
