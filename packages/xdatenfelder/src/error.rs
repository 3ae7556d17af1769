//! Error types for the converter.
//!
//! Only fatal conditions are represented here. Recoverable problems (broken
//! validation JSON, unresolvable code lists) are handled where they occur and
//! never surface as a `FimError`.

use thiserror::Error;

/// Main error type for the converter library.
#[derive(Debug, Error)]
pub enum FimError {
    /// The root namespace does not match a supported XDatenfelder version.
    #[error("Unsupported XDatenfelder version: namespace '{namespace}' is not supported")]
    UnsupportedVersion { namespace: String },

    /// A forced version string could not be understood.
    #[error("Unknown XDatenfelder version '{0}'. Expected 1, 2 or a namespace URI")]
    UnknownVersion(String),

    /// A structure holds neither exactly one field nor exactly one field group.
    #[error(
        "Unrecognized structure content at {location} (structure #{position}): \
         found {fields} field(s) and {groups} field group(s)"
    )]
    UnrecognizedStructure {
        location: String,
        position: usize,
        fields: usize,
        groups: usize,
    },

    /// Malformed `min:max` cardinality.
    #[error("Invalid cardinality '{value}' at {location}")]
    InvalidCardinality { value: String, location: String },

    /// Missing required XML element.
    #[error("Missing required XML element: {element} in {context}")]
    MissingElement { element: String, context: String },

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to download a FIM document.
    #[error("Failed to download document from {url}: {source}")]
    DocumentDownload {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// All retry attempts for a request failed.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for converter operations.
pub type Result<T> = std::result::Result<T, FimError>;
