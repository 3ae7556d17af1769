//! XDatenfelder version detection.
//!
//! The two major versions of the standard share most of their vocabulary but
//! differ in where a few values live. Everything version specific is kept on
//! [`FimVersion`] so the parser never branches on namespace strings.

use std::fmt;
use std::str::FromStr;

use roxmltree::Node;

use crate::config::{NAMESPACE_PREFIX, NAMESPACE_V1, NAMESPACE_V2};
use crate::error::{FimError, Result};

/// Supported XDatenfelder versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FimVersion {
    /// XDatenfelder 1.x.
    V1,
    /// XDatenfelder 2.x.
    V2,
}

impl FimVersion {
    /// Map a namespace URI to a version.
    #[must_use]
    pub fn from_namespace(namespace: &str) -> Option<Self> {
        match namespace {
            NAMESPACE_V1 => Some(Self::V1),
            NAMESPACE_V2 => Some(Self::V2),
            _ => None,
        }
    }

    /// The namespace URI of this version.
    #[must_use]
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::V1 => NAMESPACE_V1,
            Self::V2 => NAMESPACE_V2,
        }
    }

    /// Path of the element id inside a header-bearing element.
    #[must_use]
    pub fn id_path(&self) -> &'static str {
        match self {
            Self::V1 => "id",
            Self::V2 => "identifikation/id",
        }
    }

    /// Path of the code-list URI inside a select field.
    #[must_use]
    pub fn code_list_path(&self) -> &'static str {
        match self {
            Self::V1 => "codeliste/kennung",
            Self::V2 => "codelisteReferenz/genericodeIdentification/canonicalIdentification",
        }
    }
}

impl fmt::Display for FimVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "XDatenfelder 1"),
            Self::V2 => write!(f, "XDatenfelder 2"),
        }
    }
}

impl FromStr for FimVersion {
    type Err = FimError;

    /// Accepts `1`, `2`, `v1`, `v2` or a full namespace URI.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "v1" => Ok(Self::V1),
            "2" | "v2" => Ok(Self::V2),
            other => {
                Self::from_namespace(other).ok_or_else(|| FimError::UnknownVersion(s.to_string()))
            }
        }
    }
}

/// Detect the version from the document's root element.
///
/// Looks at the namespace bound to the `xdf` prefix first and falls back to
/// the root element's own namespace.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use ozg_xdatenfelder::version::{detect_version, FimVersion};
///
/// let xml = r#"<xdf:schema xmlns:xdf="urn:xoev-de:fim:standard:xdatenfelder_2"/>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(detect_version(doc.root_element()).unwrap(), FimVersion::V2);
/// ```
pub fn detect_version(root: Node<'_, '_>) -> Result<FimVersion> {
    let namespace = root
        .lookup_namespace_uri(Some(NAMESPACE_PREFIX))
        .or_else(|| root.tag_name().namespace());

    match namespace {
        Some(ns) => FimVersion::from_namespace(ns).ok_or_else(|| FimError::UnsupportedVersion {
            namespace: ns.to_string(),
        }),
        None => Err(FimError::UnsupportedVersion {
            namespace: "<none>".to_string(),
        }),
    }
}
