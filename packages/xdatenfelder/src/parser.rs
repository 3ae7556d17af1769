//! Recursive construction of the element model.
//!
//! The parser walks `struktur` elements top-down. The active version and the
//! path of enclosing ids travel in an explicit [`ParseContext`], so nested
//! nodes never consult global state and errors can name where they happened.

use roxmltree::{Document, Node};

use crate::config::ParseOptions;
use crate::error::{FimError, Result};
use crate::header::{optional_text, Header};
use crate::model::{
    Cardinality, DataType, Element, Field, FieldGroup, FieldType, FormDocument, MaxItems,
    Structure,
};
use crate::version::{detect_version, FimVersion};
use crate::xml::{child_text, find_child, find_children};

/// Name given to documents that are a bare field-group export.
const BARE_GROUP_DOCUMENT_NAME: &str = "Data Fields";

/// State passed down the recursion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseContext {
    /// Version of the document being parsed.
    pub version: FimVersion,

    /// Ids of the enclosing schema and field groups.
    pub path: Vec<String>,
}

impl ParseContext {
    /// Create a root context.
    #[must_use]
    pub fn new(version: FimVersion) -> Self {
        Self {
            version,
            path: Vec::new(),
        }
    }

    /// Create a child context one level deeper.
    #[must_use]
    pub fn with_segment(&self, id: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.path.push(id.into());
        new
    }

    /// Human-readable location for error messages.
    #[must_use]
    pub fn location(&self) -> String {
        if self.path.is_empty() {
            "document root".to_string()
        } else {
            self.path.join("/")
        }
    }
}

/// Parse a FIM document from XML text.
///
/// # Errors
/// `XmlParse` for malformed XML, `UnsupportedVersion` for unknown namespaces
/// and any structural error raised while building the tree.
pub fn parse_document(xml: &str, options: &ParseOptions) -> Result<FormDocument> {
    let doc = Document::parse(xml)?;
    parse_form(&doc, options)
}

/// Build the element model from an already parsed XML document.
pub fn parse_form(doc: &Document<'_>, options: &ParseOptions) -> Result<FormDocument> {
    let root = doc.root_element();

    let version = match options.version {
        Some(version) => {
            tracing::debug!(%version, "Using forced XDatenfelder version");
            version
        }
        None => detect_version(root)?,
    };
    let context = ParseContext::new(version);

    if let Some(schema) = find_child(root, "stammdatenschema") {
        let header = Header::parse(schema, version, &context.location())?;
        let context = context.with_segment(header.id.clone());
        let structures = parse_structures(schema, &context)?;

        tracing::debug!(
            id = %header.id,
            %version,
            sections = structures.len(),
            "Parsed FIM schema"
        );

        return Ok(FormDocument {
            header,
            version,
            structures,
        });
    }

    if let Some(group_node) = find_child(root, "datenfeldgruppe") {
        let group = parse_field_group(group_node, &context)?;
        let header = Header {
            id: group.header.id.clone(),
            name: BARE_GROUP_DOCUMENT_NAME.to_string(),
            ..Header::default()
        };

        tracing::debug!(id = %header.id, %version, "Parsed bare field group document");

        return Ok(FormDocument {
            header,
            version,
            structures: vec![Structure {
                cardinality: Cardinality {
                    min_items: 1,
                    max_items: MaxItems::Bounded(1),
                },
                related_field: None,
                contains: Element::FieldGroup(group),
            }],
        });
    }

    Err(FimError::MissingElement {
        element: "stammdatenschema".to_string(),
        context: root.tag_name().name().to_string(),
    })
}

/// Parse every `struktur` child of `parent`, keeping document order.
fn parse_structures(parent: Node<'_, '_>, context: &ParseContext) -> Result<Vec<Structure>> {
    find_children(parent, "struktur")
        .enumerate()
        .map(|(index, node)| parse_structure(node, context, index + 1))
        .collect()
}

/// Parse a single `struktur` element.
///
/// `position` is the 1-based index of the structure within its parent and is
/// only used for error messages.
pub fn parse_structure(
    node: Node<'_, '_>,
    context: &ParseContext,
    position: usize,
) -> Result<Structure> {
    let location = context.location();

    let token = child_text(node, "anzahl").ok_or_else(|| FimError::MissingElement {
        element: "anzahl".to_string(),
        context: format!("{location} (structure #{position})"),
    })?;
    let cardinality = Cardinality::parse(&token, &location)?;
    let related_field = optional_text(node, "bezug");
    let contains = parse_element(node, context, position)?;

    Ok(Structure {
        cardinality,
        related_field,
        contains,
    })
}

/// Build the element held by a `struktur` node.
///
/// Accepts exactly one `enthaelt/datenfeld`, exactly one
/// `enthaelt/datenfeldgruppe`, or exactly one `datenfeldgruppe` directly
/// below the structure (single-level exports).
///
/// # Errors
/// `UnrecognizedStructure` for any other shape.
pub fn parse_element(
    structure: Node<'_, '_>,
    context: &ParseContext,
    position: usize,
) -> Result<Element> {
    let container = find_child(structure, "enthaelt");
    let fields: Vec<Node<'_, '_>> = container
        .map(|c| find_children(c, "datenfeld").collect())
        .unwrap_or_default();
    let groups: Vec<Node<'_, '_>> = container
        .map(|c| find_children(c, "datenfeldgruppe").collect())
        .unwrap_or_default();
    let direct_groups: Vec<Node<'_, '_>> = find_children(structure, "datenfeldgruppe").collect();

    match (fields.as_slice(), groups.as_slice(), direct_groups.as_slice()) {
        ([field], _, _) => Ok(Element::Field(parse_field(*field, context)?)),
        (_, [group], _) | (_, _, [group]) => {
            Ok(Element::FieldGroup(parse_field_group(*group, context)?))
        }
        _ => Err(FimError::UnrecognizedStructure {
            location: context.location(),
            position,
            fields: fields.len(),
            groups: groups.len() + direct_groups.len(),
        }),
    }
}

/// Parse a `datenfeldgruppe` and, recursively, its structures.
pub fn parse_field_group(node: Node<'_, '_>, context: &ParseContext) -> Result<FieldGroup> {
    let header = Header::parse(node, context.version, &context.location())?;
    let children = parse_structures(node, &context.with_segment(header.id.clone()))?;

    tracing::trace!(id = %header.id, children = children.len(), "Parsed field group");

    Ok(FieldGroup { header, children })
}

/// Parse a `datenfeld`.
pub fn parse_field(node: Node<'_, '_>, context: &ParseContext) -> Result<Field> {
    let header = Header::parse(node, context.version, &context.location())?;

    let code = |path: &str| {
        child_text(node, path).ok_or_else(|| FimError::MissingElement {
            element: path.to_string(),
            context: header.id.clone(),
        })
    };
    let field_type = FieldType::from_code(&code("feldart/code")?);
    let data_type = DataType::from_code(&code("datentyp/code")?);

    let reference_value_uri = if field_type == FieldType::Select {
        let uri = optional_text(node, context.version.code_list_path());
        if uri.is_none() {
            tracing::debug!(id = %header.id, "Select field without code-list reference");
        }
        uri
    } else {
        None
    };

    Ok(Field {
        validation_details: child_text(node, "praezisierung").filter(|s| !s.is_empty()),
        default_value: optional_text(node, "inhalt"),
        input_hint: optional_text(node, "hilfetextEingabe"),
        output_hint: optional_text(node, "hilfetextAusgabe"),
        reference_value_uri,
        field_type,
        data_type,
        header,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HasHeader;

    const NS_V1: &str = "urn:xoev-de:fim:standard:xdatenfelder_1";
    const NS_V2: &str = "urn:xoev-de:fim:standard:xdatenfelder_2";

    fn field_xml(id: &str, field_type: &str, extra: &str) -> String {
        format!(
            "<xdf:datenfeld><xdf:id>{id}</xdf:id><xdf:name>{id}</xdf:name>\
             <xdf:feldart><code>{field_type}</code></xdf:feldart>\
             <xdf:datentyp><code>text</code></xdf:datentyp>{extra}</xdf:datenfeld>"
        )
    }

    fn wrap_v1(structures: &str) -> String {
        format!(
            r#"<xdf:xdatenfelder.stammdatenschema.0102 xmlns:xdf="{NS_V1}">
                <xdf:stammdatenschema>
                    <xdf:id>S1</xdf:id><xdf:name>Schema</xdf:name>
                    {structures}
                </xdf:stammdatenschema>
            </xdf:xdatenfelder.stammdatenschema.0102>"#
        )
    }

    fn structure_xml(token: &str, content: &str) -> String {
        format!("<xdf:struktur><xdf:anzahl>{token}</xdf:anzahl><xdf:bezug/>{content}</xdf:struktur>")
    }

    #[test]
    fn test_parse_context_location() {
        let ctx = ParseContext::new(FimVersion::V1);
        assert_eq!(ctx.location(), "document root");

        let nested = ctx.with_segment("S1").with_segment("G1");
        assert_eq!(nested.location(), "S1/G1");
        assert_eq!(nested.version, FimVersion::V1);
        assert!(ctx.path.is_empty());
    }

    #[test]
    fn test_parse_field_structure() {
        let xml = wrap_v1(&structure_xml(
            "0:1",
            &format!("<xdf:enthaelt>{}</xdf:enthaelt>", field_xml("F1", "input", "")),
        ));
        let document = parse_document(&xml, &ParseOptions::default()).unwrap();

        assert_eq!(document.version, FimVersion::V1);
        assert_eq!(document.id(), "S1");
        assert_eq!(document.structures.len(), 1);

        let structure = &document.structures[0];
        assert_eq!(structure.cardinality.min_items, 0);
        assert_eq!(structure.cardinality.max_items, MaxItems::Bounded(1));
        assert_eq!(structure.related_field, None);
        assert!(matches!(structure.contains, Element::Field(ref f) if f.id() == "F1"));
    }

    #[test]
    fn test_parse_nested_groups_keep_order() {
        let inner = format!(
            "{}{}{}",
            structure_xml("1:1", &format!("<xdf:enthaelt>{}</xdf:enthaelt>", field_xml("F3", "input", ""))),
            structure_xml("0:1", &format!("<xdf:enthaelt>{}</xdf:enthaelt>", field_xml("F1", "input", ""))),
            structure_xml("0:*", &format!("<xdf:enthaelt>{}</xdf:enthaelt>", field_xml("F2", "input", ""))),
        );
        let group = format!(
            "<xdf:enthaelt><xdf:datenfeldgruppe><xdf:id>G1</xdf:id><xdf:name>Gruppe</xdf:name>{inner}</xdf:datenfeldgruppe></xdf:enthaelt>"
        );
        let xml = wrap_v1(&structure_xml("1:1", &group));
        let document = parse_document(&xml, &ParseOptions::default()).unwrap();

        let Element::FieldGroup(group) = &document.structures[0].contains else {
            panic!("expected a field group");
        };
        let ids: Vec<&str> = group.children.iter().map(Structure::id).collect();
        assert_eq!(ids, vec!["F3", "F1", "F2"]);
        assert_eq!(group.children[2].cardinality.max_items, MaxItems::Unbounded);
    }

    #[test]
    fn test_parse_direct_field_group() {
        let content = "<xdf:datenfeldgruppe><xdf:id>G9</xdf:id><xdf:name>Direkt</xdf:name></xdf:datenfeldgruppe>";
        let xml = wrap_v1(&structure_xml("1:1", content));
        let document = parse_document(&xml, &ParseOptions::default()).unwrap();
        assert!(matches!(
            document.structures[0].contains,
            Element::FieldGroup(ref g) if g.id() == "G9" && g.children.is_empty()
        ));
    }

    #[test]
    fn test_empty_container_is_unrecognized() {
        let xml = wrap_v1(&structure_xml("1:1", "<xdf:enthaelt/>"));
        let err = parse_document(&xml, &ParseOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            FimError::UnrecognizedStructure { ref location, position: 1, fields: 0, groups: 0 }
                if location == "S1"
        ));
    }

    #[test]
    fn test_two_fields_is_unrecognized() {
        let content = format!(
            "<xdf:enthaelt>{}{}</xdf:enthaelt>",
            field_xml("F1", "input", ""),
            field_xml("F2", "input", "")
        );
        let xml = wrap_v1(&format!(
            "{}{}",
            structure_xml("1:1", &format!("<xdf:enthaelt>{}</xdf:enthaelt>", field_xml("F0", "input", ""))),
            structure_xml("1:1", &content)
        ));
        let err = parse_document(&xml, &ParseOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            FimError::UnrecognizedStructure { position: 2, fields: 2, .. }
        ));
    }

    #[test]
    fn test_missing_cardinality() {
        let xml = wrap_v1(&format!(
            "<xdf:struktur><xdf:enthaelt>{}</xdf:enthaelt></xdf:struktur>",
            field_xml("F1", "input", "")
        ));
        let err = parse_document(&xml, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, FimError::MissingElement { ref element, .. } if element == "anzahl"));
    }

    #[test]
    fn test_select_reference_v1() {
        let extra = "<xdf:codeliste><xdf:kennung>urn:de:bund:destatis:bevoelkerungsstatistik:schluessel:staat</xdf:kennung></xdf:codeliste>";
        let xml = wrap_v1(&structure_xml(
            "1:1",
            &format!("<xdf:enthaelt>{}</xdf:enthaelt>", field_xml("F1", "select", extra)),
        ));
        let document = parse_document(&xml, &ParseOptions::default()).unwrap();
        let field = document.fields().next().unwrap();
        assert_eq!(
            field.reference_value_uri.as_deref(),
            Some("urn:de:bund:destatis:bevoelkerungsstatistik:schluessel:staat")
        );
    }

    #[test]
    fn test_select_reference_v2() {
        let xml = format!(
            r#"<xdf:root xmlns:xdf="{NS_V2}"><xdf:stammdatenschema>
                <xdf:identifikation><xdf:id>S2</xdf:id></xdf:identifikation><xdf:name>Schema</xdf:name>
                <xdf:struktur><xdf:anzahl>1:1</xdf:anzahl><xdf:enthaelt><xdf:datenfeld>
                    <xdf:identifikation><xdf:id>F2</xdf:id></xdf:identifikation><xdf:name>Staat</xdf:name>
                    <xdf:feldart><code>select</code></xdf:feldart><xdf:datentyp><code>text</code></xdf:datentyp>
                    <xdf:codelisteReferenz>
                        <xdf:identifikation><xdf:id>C1</xdf:id></xdf:identifikation>
                        <xdf:genericodeIdentification>
                            <xdf:canonicalIdentification>urn:de:example:staat</xdf:canonicalIdentification>
                            <xdf:version>2020-01-01</xdf:version>
                        </xdf:genericodeIdentification>
                    </xdf:codelisteReferenz>
                </xdf:datenfeld></xdf:enthaelt></xdf:struktur>
            </xdf:stammdatenschema></xdf:root>"#
        );
        let document = parse_document(&xml, &ParseOptions::default()).unwrap();
        assert_eq!(document.version, FimVersion::V2);
        assert_eq!(document.id(), "S2");
        let field = document.fields().next().unwrap();
        assert_eq!(field.id(), "F2");
        assert_eq!(field.reference_value_uri.as_deref(), Some("urn:de:example:staat"));
    }

    #[test]
    fn test_select_without_reference() {
        let xml = wrap_v1(&structure_xml(
            "1:1",
            &format!("<xdf:enthaelt>{}</xdf:enthaelt>", field_xml("F1", "select", "")),
        ));
        let document = parse_document(&xml, &ParseOptions::default()).unwrap();
        assert_eq!(document.fields().next().unwrap().reference_value_uri, None);
    }

    #[test]
    fn test_reference_ignored_for_input_fields() {
        let extra = "<xdf:codeliste><xdf:kennung>urn:de:example</xdf:kennung></xdf:codeliste>";
        let xml = wrap_v1(&structure_xml(
            "1:1",
            &format!("<xdf:enthaelt>{}</xdf:enthaelt>", field_xml("F1", "input", extra)),
        ));
        let document = parse_document(&xml, &ParseOptions::default()).unwrap();
        assert_eq!(document.fields().next().unwrap().reference_value_uri, None);
    }

    #[test]
    fn test_field_values_are_normalized() {
        let extra = "<xdf:praezisierung>{\"maxLength\":\"10\"}</xdf:praezisierung>\
                     <xdf:inhalt>-</xdf:inhalt><xdf:hilfetextEingabe>Bitte angeben</xdf:hilfetextEingabe>\
                     <xdf:hilfetextAusgabe>.</xdf:hilfetextAusgabe>";
        let xml = wrap_v1(&structure_xml(
            "1:1",
            &format!("<xdf:enthaelt>{}</xdf:enthaelt>", field_xml("F1", "input", extra)),
        ));
        let document = parse_document(&xml, &ParseOptions::default()).unwrap();
        let field = document.fields().next().unwrap();

        assert_eq!(field.validation_details.as_deref(), Some("{\"maxLength\":\"10\"}"));
        assert_eq!(field.default_value, None);
        assert_eq!(field.input_hint.as_deref(), Some("Bitte angeben"));
        assert_eq!(field.output_hint, None);
    }

    #[test]
    fn test_missing_field_type() {
        let field = "<xdf:datenfeld><xdf:id>F1</xdf:id><xdf:name>x</xdf:name>\
                     <xdf:datentyp><code>text</code></xdf:datentyp></xdf:datenfeld>";
        let xml = wrap_v1(&structure_xml("1:1", &format!("<xdf:enthaelt>{field}</xdf:enthaelt>")));
        let err = parse_document(&xml, &ParseOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            FimError::MissingElement { ref element, ref context } if element == "feldart/code" && context == "F1"
        ));
    }

    #[test]
    fn test_unsupported_namespace_produces_no_tree() {
        let xml = wrap_v1("").replace(NS_V1, "urn:xoev-de:fim:standard:xdatenfelder_9");
        let err = parse_document(&xml, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, FimError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_forced_version_skips_detection() {
        let xml = wrap_v1("").replace(NS_V1, "urn:example:other");
        let options = ParseOptions {
            version: Some(FimVersion::V1),
        };
        let document = parse_document(&xml, &options).unwrap();
        assert_eq!(document.version, FimVersion::V1);
        assert_eq!(document.id(), "S1");
    }

    #[test]
    fn test_bare_field_group_document() {
        let xml = format!(
            r#"<xdf:xdatenfelder.datenfeldgruppe.0103 xmlns:xdf="{NS_V1}">
                <xdf:datenfeldgruppe><xdf:id>G5</xdf:id><xdf:name>Anschrift</xdf:name>
                {}
                </xdf:datenfeldgruppe>
            </xdf:xdatenfelder.datenfeldgruppe.0103>"#,
            structure_xml("1:1", &format!("<xdf:enthaelt>{}</xdf:enthaelt>", field_xml("F1", "input", "")))
        );
        let document = parse_document(&xml, &ParseOptions::default()).unwrap();

        assert_eq!(document.id(), "G5");
        assert_eq!(document.name(), "Data Fields");
        assert_eq!(document.input_name(), None);
        assert_eq!(document.structures.len(), 1);
        assert!(document.structures[0].cardinality.is_single());
    }

    #[test]
    fn test_root_without_schema_or_group() {
        let xml = format!(r#"<xdf:root xmlns:xdf="{NS_V1}"><xdf:other/></xdf:root>"#);
        let err = parse_document(&xml, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, FimError::MissingElement { ref element, .. } if element == "stammdatenschema"));
    }

    #[test]
    fn test_malformed_xml() {
        let err = parse_document("<unclosed>", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, FimError::XmlParse(_)));
    }
}
