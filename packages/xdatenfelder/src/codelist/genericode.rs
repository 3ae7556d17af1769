//! Local code lists in OASIS genericode format.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Document;

use super::{CodeEntry, CodeListResolution, CodeListResolver};
use crate::error::{FimError, Result};
use crate::xml::{child_text, find_by_path, find_children, get_text};

/// Parse the rows of a genericode document.
///
/// The first value of each row is the code, the second the label. Rows with
/// fewer than two values are skipped.
///
/// # Errors
/// `XmlParse` for malformed XML, `MissingElement` if the document has no
/// `SimpleCodeList` rows.
///
/// # Examples
/// ```
/// use ozg_xdatenfelder::codelist::parse_genericode;
///
/// let xml = r#"<gc:CodeList xmlns:gc="http://docs.oasis-open.org/codelist/ns/genericode/1.0/">
///   <SimpleCodeList>
///     <Row>
///       <Value ColumnRef="code"><SimpleValue>DE</SimpleValue></Value>
///       <Value ColumnRef="name"><SimpleValue>Deutschland</SimpleValue></Value>
///     </Row>
///   </SimpleCodeList>
/// </gc:CodeList>"#;
///
/// let entries = parse_genericode(xml).unwrap();
/// assert_eq!(entries[0].code.as_deref(), Some("DE"));
/// assert_eq!(entries[0].label, "Deutschland");
/// ```
pub fn parse_genericode(xml: &str) -> Result<Vec<CodeEntry>> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();

    let list = find_by_path(root, "SimpleCodeList").ok_or_else(|| FimError::MissingElement {
        element: "SimpleCodeList".to_string(),
        context: root.tag_name().name().to_string(),
    })?;

    let rows: Vec<_> = find_children(list, "Row").collect();
    if rows.is_empty() {
        return Err(FimError::MissingElement {
            element: "Row".to_string(),
            context: "SimpleCodeList".to_string(),
        });
    }

    let entries = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let values: Vec<String> = find_children(row, "Value")
                .map(|value| child_text(value, "SimpleValue").unwrap_or_default())
                .collect();
            match values.as_slice() {
                [code, label, ..] => Some(CodeEntry::new(code.as_str(), label.as_str())),
                _ => {
                    tracing::warn!(row = index + 1, "Skipping genericode row with fewer than two values");
                    None
                }
            }
        })
        .collect();

    Ok(entries)
}

/// Canonical URI declared in a genericode document's identification block.
pub fn canonical_uri(xml: &str) -> Result<Option<String>> {
    let doc = Document::parse(xml)?;
    Ok(find_by_path(doc.root_element(), "Identification/CanonicalUri")
        .map(get_text)
        .filter(|uri| !uri.is_empty()))
}

/// Resolves code lists from genericode files on disk.
#[derive(Debug, Clone, Default)]
pub struct GenericodeFileResolver {
    files: HashMap<String, PathBuf>,
}

impl GenericodeFileResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` as the source for `uri`.
    #[must_use]
    pub fn with_file(mut self, uri: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.insert(uri, path);
        self
    }

    /// Register `path` as the source for `uri`, replacing earlier entries.
    pub fn insert(&mut self, uri: impl Into<String>, path: impl Into<PathBuf>) {
        self.files.insert(uri.into(), path.into());
    }

    /// Register a file under the canonical URI it declares.
    ///
    /// # Returns
    /// The URI the file was registered for.
    ///
    /// # Errors
    /// IO and XML errors, or `MissingElement` if the file declares no URI.
    pub fn register_file(&mut self, path: &Path) -> Result<String> {
        let xml = fs::read_to_string(path)?;
        let uri = canonical_uri(&xml)?.ok_or_else(|| FimError::MissingElement {
            element: "Identification/CanonicalUri".to_string(),
            context: path.display().to_string(),
        })?;
        tracing::debug!(uri = %uri, path = %path.display(), "Registered local code list");
        self.insert(uri.clone(), path);
        Ok(uri)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn load(path: &Path) -> Result<Vec<CodeEntry>> {
        let xml = fs::read_to_string(path)?;
        parse_genericode(&xml)
    }
}

impl CodeListResolver for GenericodeFileResolver {
    fn resolve(&self, uri: &str) -> CodeListResolution {
        let Some(path) = self.files.get(uri) else {
            return CodeListResolution::unresolved(format!("no local code list registered for {uri}"));
        };

        match Self::load(path) {
            Ok(entries) => {
                tracing::debug!(uri, path = %path.display(), entries = entries.len(), "Loaded local code list");
                CodeListResolution::Resolved(entries)
            }
            Err(e) => {
                tracing::warn!(uri, path = %path.display(), error = %e, "Unable to load local code list");
                CodeListResolution::unresolved(format!(
                    "unable to load code list from {}: {e}",
                    path.display()
                ))
            }
        }
    }
}
