//! Common metadata of header-bearing FIM elements.
//!
//! Schemas (`stammdatenschema`), field groups and fields all start with the
//! same block of identifying elements. [`Header`] holds that block and
//! [`HasHeader`] exposes it uniformly.

use roxmltree::Node;

use crate::config::EMPTY_VALUES;
use crate::error::{FimError, Result};
use crate::version::FimVersion;
use crate::xml::child_text;

/// Metadata shared by every header-bearing element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    /// FIM identifier (e.g. `S00000036`, `G60000001`, `F60000227`).
    pub id: String,

    /// Internal name.
    pub name: String,

    /// Description.
    pub description: Option<String>,

    /// Label shown when entering data (`bezeichnungEingabe`).
    pub input_name: Option<String>,

    /// Label shown when presenting entered data (`bezeichnungAusgabe`).
    pub output_name: Option<String>,

    /// Internal FIM definition/documentation.
    pub internal_definition: Option<String>,

    /// Relation to other standards and laws (`bezug`).
    pub relation: Option<String>,
}

impl Header {
    /// Extract the header of `node`.
    ///
    /// `context` names the location for error messages.
    ///
    /// # Errors
    /// `MissingElement` if the id or name element is absent.
    pub fn parse(node: Node<'_, '_>, version: FimVersion, context: &str) -> Result<Self> {
        let id = child_text(node, version.id_path()).ok_or_else(|| FimError::MissingElement {
            element: version.id_path().to_string(),
            context: context.to_string(),
        })?;

        let name = child_text(node, "name").ok_or_else(|| FimError::MissingElement {
            element: "name".to_string(),
            context: if id.is_empty() {
                context.to_string()
            } else {
                id.clone()
            },
        })?;

        Ok(Self {
            id,
            name,
            description: optional_text(node, "beschreibung"),
            input_name: optional_text(node, "bezeichnungEingabe"),
            output_name: optional_text(node, "bezeichnungAusgabe"),
            internal_definition: optional_text(node, "definition"),
            relation: optional_text(node, "bezug"),
        })
    }
}

/// Normalize FIM "empty" placeholders to `None`.
///
/// # Examples
/// ```
/// use ozg_xdatenfelder::header::normalize_empty;
///
/// assert_eq!(normalize_empty("-"), None);
/// assert_eq!(normalize_empty("."), None);
/// assert_eq!(normalize_empty(""), None);
/// assert_eq!(normalize_empty("Vorname"), Some("Vorname".to_string()));
/// ```
pub fn normalize_empty(value: &str) -> Option<String> {
    if EMPTY_VALUES.contains(&value.trim()) {
        None
    } else {
        Some(value.to_string())
    }
}

/// Text of the element at `path`, absent if missing or a placeholder.
pub(crate) fn optional_text(node: Node<'_, '_>, path: &str) -> Option<String> {
    child_text(node, path).and_then(|text| normalize_empty(&text))
}

/// Uniform access to header metadata.
pub trait HasHeader {
    /// The element's header.
    fn header(&self) -> &Header;

    fn id(&self) -> &str {
        &self.header().id
    }

    fn name(&self) -> &str {
        &self.header().name
    }

    fn description(&self) -> Option<&str> {
        self.header().description.as_deref()
    }

    fn input_name(&self) -> Option<&str> {
        self.header().input_name.as_deref()
    }

    fn output_name(&self) -> Option<&str> {
        self.header().output_name.as_deref()
    }

    fn internal_definition(&self) -> Option<&str> {
        self.header().internal_definition.as_deref()
    }

    fn relation(&self) -> Option<&str> {
        self.header().relation.as_deref()
    }

    /// Title for rendering: the input name, falling back to the name.
    fn display_title(&self) -> &str {
        self.input_name().unwrap_or_else(|| self.name())
    }
}

impl HasHeader for Header {
    fn header(&self) -> &Header {
        self
    }
}
