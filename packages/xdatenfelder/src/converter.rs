//! End-to-end conversion: load, parse and emit.

use serde_json::Value;

use crate::codelist::CodeListResolver;
use crate::config::{ConvertOptions, EmitOptions};
use crate::error::Result;
use crate::loader::DocumentSource;
use crate::model::FormDocument;
use crate::parser::parse_document;
use crate::schema::SchemaEmitter;

/// Emit the JSON Schema for an already parsed document.
#[must_use]
pub fn convert_document(
    document: &FormDocument,
    options: &EmitOptions,
    resolver: &dyn CodeListResolver,
) -> Value {
    SchemaEmitter::new(resolver, *options).emit_document(document)
}

/// Convert a FIM document given as inline XML, file path or URL.
///
/// # Errors
/// Loading errors and every fatal parse error. Code-list failures are not
/// errors; they show up as `x-codelist-unresolved` in the schema.
pub fn convert(
    input: &str,
    options: &ConvertOptions,
    resolver: &dyn CodeListResolver,
) -> Result<Value> {
    let xml = DocumentSource::detect(input).load(&options.http)?;
    let document = parse_document(&xml, &options.parse)?;

    tracing::info!(
        id = %document.header.id,
        version = %document.version,
        fields = document.fields().count(),
        "Converting FIM document"
    );

    Ok(convert_document(&document, &options.emit, resolver))
}
