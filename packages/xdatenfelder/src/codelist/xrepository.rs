//! Code lists from the XRepository registry.
//!
//! Resolution takes two requests: the registry first reports the currently
//! valid version of a code list, then serves that version as JSON.

use reqwest::blocking::Client;
use roxmltree::Document;
use serde::Deserialize;
use serde_json::Value;

use super::{CodeEntry, CodeListResolution, CodeListResolver};
use crate::config::{
    code_list_json_url, code_list_version_url, pinned_code_list_version, HttpConfig, RetryPolicy,
    XREPOSITORY_URL,
};
use crate::error::{FimError, Result};
use crate::http::{create_client, download_bytes, download_text};
use crate::xml::child_text;

/// JSON rendering of a code-list version. Only the data rows are used.
#[derive(Debug, Deserialize)]
struct CodeListVersionJson {
    daten: Vec<Vec<Value>>,
}

/// Resolves code lists against an XRepository instance.
#[derive(Debug, Clone)]
pub struct XRepositoryResolver {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl XRepositoryResolver {
    /// Create a resolver for the public XRepository.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
            base_url: XREPOSITORY_URL.to_string(),
            retry: config.retry,
        })
    }

    /// Use a different registry base URL (mirrors, test servers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Look up the URN of the currently valid version of `urn`.
    fn current_version(&self, urn: &str) -> Result<String> {
        if let Some(version) = pinned_code_list_version(urn) {
            return Ok(version.to_string());
        }

        let url = code_list_version_url(&self.base_url, urn);
        let xml = download_text(&self.client, &url, &self.retry)?;
        parse_version_response(&xml, &url)
    }

    fn fetch(&self, urn: &str) -> Result<Vec<CodeEntry>> {
        let version = self.current_version(urn)?;
        let url = code_list_json_url(&self.base_url, &version);
        tracing::info!(urn, version = %version, "Downloading code list");

        let bytes = download_bytes(&self.client, &url, &self.retry)?;
        parse_code_list_json(&bytes)
    }
}

impl CodeListResolver for XRepositoryResolver {
    fn resolve(&self, uri: &str) -> CodeListResolution {
        match self.fetch(uri) {
            Ok(entries) => {
                tracing::debug!(uri, entries = entries.len(), "Resolved code list");
                CodeListResolution::Resolved(entries)
            }
            Err(e) => {
                tracing::warn!(uri, error = %e, "Unable to find code list in XRepository");
                CodeListResolution::unresolved(format!("unable to find {uri} in XRepository: {e}"))
            }
        }
    }
}

/// Extract the version URN from a `gueltigeVersion` response.
fn parse_version_response(xml: &str, url: &str) -> Result<String> {
    let doc = Document::parse(xml)?;
    child_text(doc.root_element(), "kennung")
        .filter(|kennung| !kennung.is_empty())
        .ok_or_else(|| FimError::MissingElement {
            element: "kennung".to_string(),
            context: url.to_string(),
        })
}

/// Turn the `daten` rows of a code-list JSON document into entries.
///
/// Column 0 is the code and column 1 the label. Rows without a label are
/// skipped.
fn parse_code_list_json(bytes: &[u8]) -> Result<Vec<CodeEntry>> {
    let document: CodeListVersionJson = serde_json::from_slice(bytes)?;

    Ok(document
        .daten
        .iter()
        .filter_map(|row| {
            let label = row.get(1).and_then(cell_to_string)?;
            Some(CodeEntry {
                code: row.first().and_then(cell_to_string),
                label,
            })
        })
        .collect())
}

fn cell_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
