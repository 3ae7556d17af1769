//! Loading FIM documents from inline text, files or URLs.

use std::fs;
use std::path::PathBuf;

use crate::config::HttpConfig;
use crate::error::{FimError, Result};
use crate::http::{bytes_to_string, create_client, download_bytes};

/// Where a FIM document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// XML passed directly as text.
    Inline(String),
    File(PathBuf),
    Url(String),
}

impl DocumentSource {
    /// Classify user input.
    ///
    /// # Examples
    /// ```
    /// use ozg_xdatenfelder::DocumentSource;
    ///
    /// assert!(matches!(DocumentSource::detect("https://fimportal.de/x.xml"), DocumentSource::Url(_)));
    /// assert!(matches!(DocumentSource::detect("  <xdf:x/>"), DocumentSource::Inline(_)));
    /// assert!(matches!(DocumentSource::detect("S00000036.xml"), DocumentSource::File(_)));
    /// ```
    #[must_use]
    pub fn detect(input: &str) -> Self {
        if input.starts_with("http://") || input.starts_with("https://") {
            Self::Url(input.to_string())
        } else if input.trim_start().starts_with('<') {
            Self::Inline(input.to_string())
        } else {
            Self::File(PathBuf::from(input))
        }
    }

    /// Read the document text.
    ///
    /// # Errors
    /// `Io` for unreadable files, `DocumentDownload` or `RetriesExhausted`
    /// for failed downloads.
    pub fn load(&self, http: &HttpConfig) -> Result<String> {
        match self {
            Self::Inline(xml) => Ok(xml.clone()),
            Self::File(path) => {
                tracing::debug!(path = %path.display(), "Reading FIM document");
                Ok(fs::read_to_string(path)?)
            }
            Self::Url(url) => {
                tracing::info!(url, "Downloading FIM document");
                let client = create_client(http)?;
                let bytes = download_bytes(&client, url, &http.retry).map_err(|e| match e {
                    FimError::Http(source) => FimError::DocumentDownload {
                        url: url.clone(),
                        source,
                    },
                    other => other,
                })?;
                Ok(bytes_to_string(bytes, url))
            }
        }
    }
}
