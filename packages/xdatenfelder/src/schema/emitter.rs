//! Recursive emitter from the element model to JSON Schema.

use std::collections::HashMap;
use std::mem;

use serde_json::{json, Map, Value};

use super::field::{input_schema, label_schema, other_schema, select_schema};
use crate::codelist::{CodeListResolution, CodeListResolver};
use crate::config::{EmitOptions, DISPLAY_EXPANSION_PANELS, JSON_SCHEMA_DIALECT, UNBOUNDED_MAX_ITEMS};
use crate::header::HasHeader;
use crate::model::{Element, Field, FieldGroup, FieldType, FormDocument, MaxItems, Structure};

/// Turns parsed FIM documents into JSON Schema.
///
/// One emitter is one conversion session: each code-list URI is resolved
/// at most once, however many fields or documents reference it.
pub struct SchemaEmitter<'r> {
    resolver: &'r dyn CodeListResolver,
    options: EmitOptions,
    definitions: Map<String, Value>,
    code_lists: HashMap<String, CodeListResolution>,
}

impl<'r> SchemaEmitter<'r> {
    #[must_use]
    pub fn new(resolver: &'r dyn CodeListResolver, options: EmitOptions) -> Self {
        Self {
            resolver,
            options,
            definitions: Map::new(),
            code_lists: HashMap::new(),
        }
    }

    /// Emit the complete schema for `document`.
    ///
    /// Definitions collected for an earlier document are not carried over.
    pub fn emit_document(&mut self, document: &FormDocument) -> Value {
        self.definitions.clear();

        let properties: Map<String, Value> = document
            .structures
            .iter()
            .map(|structure| (structure.id().to_string(), self.emit_root_structure(structure)))
            .collect();

        let mut schema = Map::new();
        schema.insert("$schema".to_string(), json!(JSON_SCHEMA_DIALECT));
        schema.insert("title".to_string(), json!(document.display_title()));
        if let Some(description) = document.description() {
            schema.insert("description".to_string(), json!(description));
        }
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("x-display".to_string(), json!(DISPLAY_EXPANSION_PANELS));
        if self.options.deduplicate {
            schema.insert("$defs".to_string(), Value::Object(mem::take(&mut self.definitions)));
        }

        tracing::debug!(
            id = document.id(),
            sections = document.structures.len(),
            code_lists = self.code_lists.len(),
            "Emitted JSON schema"
        );

        Value::Object(schema)
    }

    /// Top-level structures become form sections wrapping the structure.
    fn emit_root_structure(&mut self, structure: &Structure) -> Value {
        let inner = self.emit_structure(structure);
        let element = &structure.contains;

        let mut section = Map::new();
        section.insert("title".to_string(), json!(element.display_title()));
        if let Some(description) = element.description() {
            section.insert("description".to_string(), json!(description));
        }
        section.insert("type".to_string(), json!("object"));
        let mut properties = Map::new();
        properties.insert(structure.id().to_string(), inner);
        section.insert("properties".to_string(), Value::Object(properties));
        Value::Object(section)
    }

    /// Emit a structure: the element itself (or its reference) when it occurs
    /// at most once, an array otherwise.
    pub fn emit_structure(&mut self, structure: &Structure) -> Value {
        let fragment = self.emit_element(&structure.contains);
        let element = if self.options.deduplicate {
            self.define(structure.id(), fragment)
        } else {
            fragment
        };

        if structure.cardinality.is_single() {
            return element;
        }

        let cardinality = structure.cardinality;
        let max_items = match cardinality.max_items {
            MaxItems::Bounded(n) => n,
            MaxItems::Unbounded => UNBOUNDED_MAX_ITEMS,
        };
        let title = if cardinality.max_items.allows_many() {
            format!("Liste von {}", structure.contains.display_title())
        } else {
            structure.contains.display_title().to_string()
        };

        json!({
            "minItems": cardinality.min_items,
            "maxItems": max_items,
            "title": title,
            "type": "array",
            "items": element,
        })
    }

    pub fn emit_element(&mut self, element: &Element) -> Value {
        match element {
            Element::Field(field) => self.emit_field(field),
            Element::FieldGroup(group) => self.emit_field_group(group),
        }
    }

    pub fn emit_field_group(&mut self, group: &FieldGroup) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for child in &group.children {
            properties.insert(child.id().to_string(), self.emit_structure(child));
            if child.is_required() {
                required.push(child.id().to_string());
            }
        }

        let mut schema = Map::new();
        schema.insert("title".to_string(), json!(group.name()));
        if let Some(description) = group.description() {
            schema.insert("description".to_string(), json!(description));
        }
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("required".to_string(), json!(required));
        Value::Object(schema)
    }

    pub fn emit_field(&mut self, field: &Field) -> Value {
        match &field.field_type {
            FieldType::Input => input_schema(field),
            FieldType::Select => {
                let resolution = field
                    .reference_value_uri
                    .as_deref()
                    .map(|uri| self.code_list(uri).clone());
                select_schema(field, resolution.as_ref())
            }
            FieldType::Label => label_schema(field),
            FieldType::Other(code) => {
                tracing::debug!(id = field.id(), field_type = %code, "Rendering unknown field type as text");
                other_schema(field)
            }
        }
    }

    /// Definitions collected so far for the current document.
    #[must_use]
    pub fn definitions(&self) -> &Map<String, Value> {
        &self.definitions
    }

    /// Resolve a code list, consulting the resolver only on first use.
    fn code_list(&mut self, uri: &str) -> &CodeListResolution {
        let resolver = self.resolver;
        self.code_lists
            .entry(uri.to_string())
            .or_insert_with(|| resolver.resolve(uri))
    }

    /// Record `fragment` under `id` unless already defined; returns the `$ref`.
    fn define(&mut self, id: &str, fragment: Value) -> Value {
        match self.definitions.get(id) {
            Some(existing) if *existing != fragment => {
                tracing::debug!(id, "Element emitted differently on later occurrence, keeping first definition");
            }
            Some(_) => {}
            None => {
                self.definitions.insert(id.to_string(), fragment);
            }
        }
        json!({ "$ref": format!("#/$defs/{id}") })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codelist::{CodeEntry, DisabledResolver};
    use crate::config::ParseOptions;
    use crate::header::Header;
    use crate::model::{Cardinality, DataType};
    use crate::parser::parse_document;
    use crate::version::FimVersion;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    /// Answers every URI with the same list and counts the calls.
    struct CountingResolver {
        calls: Cell<usize>,
    }

    impl CodeListResolver for CountingResolver {
        fn resolve(&self, _uri: &str) -> CodeListResolution {
            self.calls.set(self.calls.get() + 1);
            CodeListResolution::Resolved(vec![CodeEntry::new("1", "ja"), CodeEntry::new("0", "nein")])
        }
    }

    fn header(id: &str, name: &str) -> Header {
        Header {
            id: id.to_string(),
            name: name.to_string(),
            ..Header::default()
        }
    }

    fn text_field(id: &str, name: &str) -> Field {
        Field {
            header: header(id, name),
            field_type: FieldType::Input,
            data_type: DataType::Text,
            validation_details: None,
            default_value: None,
            input_hint: None,
            output_hint: None,
            reference_value_uri: None,
        }
    }

    fn select_field(id: &str, uri: &str) -> Field {
        Field {
            field_type: FieldType::Select,
            reference_value_uri: Some(uri.to_string()),
            ..text_field(id, "Auswahl")
        }
    }

    fn structure(token: &str, contains: Element) -> Structure {
        Structure {
            cardinality: Cardinality::parse(token, "test").unwrap(),
            related_field: None,
            contains,
        }
    }

    fn document(structures: Vec<Structure>) -> FormDocument {
        FormDocument {
            header: Header {
                input_name: Some("Antrag".to_string()),
                description: Some("Ein Antrag".to_string()),
                ..header("S1", "antrag")
            },
            version: FimVersion::V2,
            structures,
        }
    }

    #[test]
    fn test_optional_single_field_is_reference() {
        let resolver = DisabledResolver;
        let mut emitter = SchemaEmitter::new(&resolver, EmitOptions::default());
        let s = structure("0:1", Element::Field(text_field("F1", "Vorname")));

        let fragment = emitter.emit_structure(&s);
        assert_eq!(fragment, json!({"$ref": "#/$defs/F1"}));
        assert!(fragment.get("minItems").is_none());
        assert_eq!(emitter.definitions()["F1"], json!({"type": "string", "title": "Vorname"}));
    }

    #[test]
    fn test_unbounded_structure_is_array() {
        let resolver = DisabledResolver;
        let mut emitter = SchemaEmitter::new(&resolver, EmitOptions::default());
        let s = structure("1:*", Element::Field(text_field("F1", "Vorname")));

        assert_eq!(
            emitter.emit_structure(&s),
            json!({
                "minItems": 1,
                "maxItems": 9999,
                "title": "Liste von Vorname",
                "type": "array",
                "items": {"$ref": "#/$defs/F1"}
            })
        );
    }

    #[test]
    fn test_zero_max_keeps_plain_title() {
        let resolver = DisabledResolver;
        let mut emitter = SchemaEmitter::new(&resolver, EmitOptions { deduplicate: false });
        let s = structure("0:0", Element::Field(text_field("F1", "Vorname")));

        let fragment = emitter.emit_structure(&s);
        assert_eq!(fragment["title"], json!("Vorname"));
        assert_eq!(fragment["maxItems"], json!(0));
        assert_eq!(fragment["items"], json!({"type": "string", "title": "Vorname"}));
    }

    #[test]
    fn test_field_group_required_in_order() {
        let resolver = DisabledResolver;
        let mut emitter = SchemaEmitter::new(&resolver, EmitOptions { deduplicate: false });
        let group = FieldGroup {
            header: Header {
                description: Some("Angaben zur Person".to_string()),
                ..header("G1", "Person")
            },
            children: vec![
                structure("1:1", Element::Field(text_field("F3", "Name"))),
                structure("0:1", Element::Field(text_field("F1", "Titel"))),
                structure("2:5", Element::Field(text_field("F2", "Vorname"))),
            ],
        };

        let schema = emitter.emit_field_group(&group);
        assert_eq!(schema["title"], json!("Person"));
        assert_eq!(schema["description"], json!("Angaben zur Person"));
        assert_eq!(schema["required"], json!(["F3", "F2"]));
        let keys: Vec<&String> = schema["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["F3", "F1", "F2"]);
    }

    #[test]
    fn test_first_definition_wins() {
        let resolver = DisabledResolver;
        let mut emitter = SchemaEmitter::new(&resolver, EmitOptions::default());
        let first = structure("1:1", Element::Field(text_field("F1", "Erster")));
        let second = structure("1:1", Element::Field(text_field("F1", "Zweiter")));

        emitter.emit_structure(&first);
        emitter.emit_structure(&second);

        assert_eq!(emitter.definitions().len(), 1);
        assert_eq!(emitter.definitions()["F1"]["title"], json!("Erster"));
    }

    #[test]
    fn test_document_envelope() {
        let resolver = DisabledResolver;
        let mut emitter = SchemaEmitter::new(&resolver, EmitOptions::default());
        let doc = document(vec![structure("1:1", Element::Field(text_field("F1", "Vorname")))]);

        assert_eq!(
            emitter.emit_document(&doc),
            json!({
                "$schema": "https://json-schema.org/draft/2020-12/schema",
                "title": "Antrag",
                "description": "Ein Antrag",
                "type": "object",
                "properties": {
                    "F1": {
                        "title": "Vorname",
                        "type": "object",
                        "properties": {"F1": {"$ref": "#/$defs/F1"}}
                    }
                },
                "x-display": "expansion-panels",
                "$defs": {
                    "F1": {"type": "string", "title": "Vorname"}
                }
            })
        );
    }

    #[test]
    fn test_document_without_deduplication_has_no_defs() {
        let resolver = DisabledResolver;
        let mut emitter = SchemaEmitter::new(&resolver, EmitOptions { deduplicate: false });
        let doc = document(vec![structure("0:1", Element::Field(text_field("F1", "Vorname")))]);

        let schema = emitter.emit_document(&doc);
        assert!(schema.get("$defs").is_none());
        assert_eq!(
            schema["properties"]["F1"]["properties"]["F1"],
            json!({"type": "string", "title": "Vorname"})
        );
    }

    #[test]
    fn test_empty_defs_still_emitted() {
        let resolver = DisabledResolver;
        let mut emitter = SchemaEmitter::new(&resolver, EmitOptions::default());
        let schema = emitter.emit_document(&document(Vec::new()));
        assert_eq!(schema["$defs"], json!({}));
        assert_eq!(schema["properties"], json!({}));
    }

    #[test]
    fn test_code_lists_resolved_once_per_session() {
        let resolver = CountingResolver { calls: Cell::new(0) };
        let mut emitter = SchemaEmitter::new(&resolver, EmitOptions::default());
        let doc = document(vec![
            structure("1:1", Element::Field(select_field("F1", "urn:de:jn"))),
            structure("0:1", Element::Field(select_field("F2", "urn:de:jn"))),
        ]);

        let schema = emitter.emit_document(&doc);
        emitter.emit_document(&doc);

        assert_eq!(resolver.calls.get(), 1);
        assert_eq!(schema["$defs"]["F2"]["enum"], json!(["ja", "nein"]));
    }

    #[test]
    fn test_select_without_reference_is_unresolved() {
        let resolver = CountingResolver { calls: Cell::new(0) };
        let mut emitter = SchemaEmitter::new(&resolver, EmitOptions::default());
        let field = Field {
            reference_value_uri: None,
            ..select_field("F1", "unused")
        };

        let schema = emitter.emit_field(&field);
        assert_eq!(resolver.calls.get(), 0);
        assert_eq!(schema["enum"], json!([]));
        assert!(schema.get("x-codelist-unresolved").is_some());
    }

    #[test]
    fn test_emit_parsed_document() {
        let xml = r#"<xdf:xdatenfelder.stammdatenschema.0102 xmlns:xdf="urn:xoev-de:fim:standard:xdatenfelder_1">
  <xdf:stammdatenschema>
    <xdf:id>S1</xdf:id>
    <xdf:name>Meldung</xdf:name>
    <xdf:beschreibung>-</xdf:beschreibung>
    <xdf:struktur>
      <xdf:anzahl>0:3</xdf:anzahl>
      <xdf:enthaelt>
        <xdf:datenfeldgruppe>
          <xdf:id>G1</xdf:id>
          <xdf:name>Kind</xdf:name>
          <xdf:bezeichnungEingabe>Angaben zum Kind</xdf:bezeichnungEingabe>
          <xdf:struktur>
            <xdf:anzahl>1:1</xdf:anzahl>
            <xdf:enthaelt>
              <xdf:datenfeld>
                <xdf:id>F1</xdf:id>
                <xdf:name>Geburtsdatum</xdf:name>
                <xdf:feldart><code>input</code></xdf:feldart>
                <xdf:datentyp><code>date</code></xdf:datentyp>
              </xdf:datenfeld>
            </xdf:enthaelt>
          </xdf:struktur>
        </xdf:datenfeldgruppe>
      </xdf:enthaelt>
    </xdf:struktur>
  </xdf:stammdatenschema>
</xdf:xdatenfelder.stammdatenschema.0102>"#;
        let doc = parse_document(xml, &ParseOptions::default()).unwrap();
        let resolver = DisabledResolver;
        let schema = SchemaEmitter::new(&resolver, EmitOptions::default()).emit_document(&doc);

        assert_eq!(schema["title"], json!("Meldung"));
        assert!(schema.get("description").is_none());
        assert_eq!(
            schema["properties"]["G1"]["properties"]["G1"],
            json!({
                "minItems": 0,
                "maxItems": 3,
                "title": "Liste von Angaben zum Kind",
                "type": "array",
                "items": {"$ref": "#/$defs/G1"}
            })
        );
        let defs: Vec<&String> = schema["$defs"].as_object().unwrap().keys().collect();
        assert_eq!(defs, vec!["F1", "G1"]);
        assert_eq!(schema["$defs"]["G1"]["required"], json!(["F1"]));
        assert_eq!(schema["$defs"]["F1"]["format"], json!("date"));
    }
}
