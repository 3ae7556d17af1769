//! Element model of a parsed FIM document.
//!
//! The tree is built once by [`crate::parser`] and never mutated afterwards.
//! Every node has exactly one owner: a [`FormDocument`] owns its top-level
//! [`Structure`]s, a structure owns its single [`Element`] and a
//! [`FieldGroup`] owns its child structures.

use std::fmt;

use crate::config::CARDINALITY_PATTERN;
use crate::error::{FimError, Result};
use crate::header::{HasHeader, Header};
use crate::version::FimVersion;

/// Upper bound of a structure's cardinality.
///
/// Variant order matters: `Unbounded` compares greater than every bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MaxItems {
    Bounded(u64),
    Unbounded,
}

impl MaxItems {
    /// Whether more than one instance is allowed.
    #[must_use]
    pub fn allows_many(&self) -> bool {
        match self {
            Self::Bounded(n) => *n > 1,
            Self::Unbounded => true,
        }
    }
}

impl fmt::Display for MaxItems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(n) => write!(f, "{n}"),
            Self::Unbounded => write!(f, "*"),
        }
    }
}

/// How often a structure's element may occur (`anzahl`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cardinality {
    pub min_items: u64,
    pub max_items: MaxItems,
}

impl Cardinality {
    /// Parse a `min:max` token; `*` as max means unbounded.
    ///
    /// # Errors
    /// `InvalidCardinality` if the token is malformed or `min > max`.
    ///
    /// # Examples
    /// ```
    /// use ozg_xdatenfelder::model::{Cardinality, MaxItems};
    ///
    /// let c = Cardinality::parse("1:*", "S1").unwrap();
    /// assert_eq!(c.min_items, 1);
    /// assert_eq!(c.max_items, MaxItems::Unbounded);
    /// ```
    pub fn parse(value: &str, location: &str) -> Result<Self> {
        let invalid = || FimError::InvalidCardinality {
            value: value.to_string(),
            location: location.to_string(),
        };

        let captures = CARDINALITY_PATTERN.captures(value).ok_or_else(invalid)?;
        let min_items: u64 = captures[1].parse().map_err(|_| invalid())?;
        let max_items = match &captures[2] {
            "*" => MaxItems::Unbounded,
            max => MaxItems::Bounded(max.parse().map_err(|_| invalid())?),
        };

        if MaxItems::Bounded(min_items) > max_items {
            return Err(invalid());
        }

        Ok(Self {
            min_items,
            max_items,
        })
    }

    /// Exactly one instance at most, so the element is rendered inline.
    #[must_use]
    pub fn is_single(&self) -> bool {
        self.max_items == MaxItems::Bounded(1) && self.min_items <= 1
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.min_items > 0
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.min_items, self.max_items)
    }
}

/// Kind of form control (`feldart`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Input,
    Select,
    Label,
    /// Any other code, kept verbatim.
    Other(String),
}

impl FieldType {
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "input" => Self::Input,
            "select" => Self::Select,
            "label" => Self::Label,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Input => "input",
            Self::Select => "select",
            Self::Label => "label",
            Self::Other(code) => code,
        }
    }
}

/// Value type of a field (`datentyp`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    /// Text.
    Text,
    /// Datum.
    Date,
    /// Wahrheitswert.
    Bool,
    /// Nummer.
    Num,
    /// Ganzzahl.
    NumInt,
    /// Geldbetrag.
    NumCurrency,
    /// Anlage (Datei).
    File,
    /// Objekt (Blob).
    Obj,
    /// Any other code, kept verbatim.
    Other(String),
}

impl DataType {
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "text" => Self::Text,
            "date" => Self::Date,
            "bool" => Self::Bool,
            "num" => Self::Num,
            "num_int" => Self::NumInt,
            "num_currency" => Self::NumCurrency,
            "file" => Self::File,
            "obj" => Self::Obj,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Date => "date",
            Self::Bool => "bool",
            Self::Num => "num",
            Self::NumInt => "num_int",
            Self::NumCurrency => "num_currency",
            Self::File => "file",
            Self::Obj => "obj",
            Self::Other(code) => code,
        }
    }
}

/// A single form field (`datenfeld`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub header: Header,
    pub field_type: FieldType,
    pub data_type: DataType,
    /// Constraint blob (`praezisierung`), expected to hold JSON.
    pub validation_details: Option<String>,
    /// Default value (`inhalt`); display text for label fields.
    pub default_value: Option<String>,
    pub input_hint: Option<String>,
    pub output_hint: Option<String>,
    /// Code-list reference, only read for select fields.
    pub reference_value_uri: Option<String>,
}

/// A group of structures (`datenfeldgruppe`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldGroup {
    pub header: Header,
    /// Child structures in document order.
    pub children: Vec<Structure>,
}

/// The element contained in a structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Field(Field),
    FieldGroup(FieldGroup),
}

/// Cardinality wrapper around exactly one element (`struktur`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    pub cardinality: Cardinality,
    /// Related field or standard (e.g. `XÖV-Kernkomponente.NameOrganisation`).
    pub related_field: Option<String>,
    pub contains: Element,
}

impl Structure {
    /// Id of the contained element.
    #[must_use]
    pub fn id(&self) -> &str {
        self.contains.id()
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.cardinality.is_required()
    }
}

/// A parsed FIM document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDocument {
    pub header: Header,
    pub version: FimVersion,
    /// Top-level structures (form sections) in document order.
    pub structures: Vec<Structure>,
}

impl HasHeader for Field {
    fn header(&self) -> &Header {
        &self.header
    }
}

impl HasHeader for FieldGroup {
    fn header(&self) -> &Header {
        &self.header
    }
}

impl HasHeader for Element {
    fn header(&self) -> &Header {
        match self {
            Self::Field(field) => &field.header,
            Self::FieldGroup(group) => &group.header,
        }
    }
}

impl HasHeader for FormDocument {
    fn header(&self) -> &Header {
        &self.header
    }
}

impl FormDocument {
    /// Iterate over all fields of the document, depth first.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        let mut stack: Vec<&Structure> = self.structures.iter().rev().collect();
        std::iter::from_fn(move || {
            while let Some(structure) = stack.pop() {
                match &structure.contains {
                    Element::Field(field) => return Some(field),
                    Element::FieldGroup(group) => stack.extend(group.children.iter().rev()),
                }
            }
            None
        })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Field[id = {}, name = {}, field_type = {}, data_type = {}",
            self.header.id,
            self.header.name,
            self.field_type.as_str(),
            self.data_type.as_str()
        )?;
        if let Some(uri) = &self.reference_value_uri {
            write!(f, ", reference_value_uri = {uri}")?;
        }
        write!(f, "]")
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldGroup[id = {}, name = {}]", self.header.id, self.header.name)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => field.fmt(f),
            Self::FieldGroup(group) => group.fmt(f),
        }
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.contains, self.cardinality)
    }
}

/// Render the document as an indented tree, one structure per line.
#[must_use]
pub fn render_tree(document: &FormDocument) -> String {
    fn walk(structures: &[Structure], depth: usize, out: &mut Vec<String>) {
        for structure in structures {
            out.push(format!("{}- {structure}", "  ".repeat(depth)));
            if let Element::FieldGroup(group) = &structure.contains {
                walk(&group.children, depth + 1, out);
            }
        }
    }

    let mut lines = vec![format!(
        "{} {} ({})",
        document.header.id, document.header.name, document.version
    )];
    walk(&document.structures, 0, &mut lines);
    lines.join("\n")
}
