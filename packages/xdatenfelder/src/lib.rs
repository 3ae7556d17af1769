//! OZG XDatenfelder - Convert FIM form definitions into JSON Schema.
//!
//! FIM (Föderales Informationsmanagement) publishes form definitions in the
//! XDatenfelder XML standard. This crate parses versions 1 and 2 of that
//! standard into an element model and renders it as a JSON Schema that form
//! renderers can consume directly.
//!
//! # Example
//!
//! ```
//! use ozg_xdatenfelder::{convert_document, parse_document, DisabledResolver, EmitOptions, ParseOptions};
//!
//! let xml = r#"<xdf:xdatenfelder.stammdatenschema.0102 xmlns:xdf="urn:xoev-de:fim:standard:xdatenfelder_1">
//!   <xdf:stammdatenschema>
//!     <xdf:id>S1</xdf:id>
//!     <xdf:name>Anmeldung</xdf:name>
//!   </xdf:stammdatenschema>
//! </xdf:xdatenfelder.stammdatenschema.0102>"#;
//!
//! let document = parse_document(xml, &ParseOptions::default()).unwrap();
//! let schema = convert_document(&document, &EmitOptions::default(), &DisabledResolver);
//! assert_eq!(schema["title"], "Anmeldung");
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, option types and registry URLs
//! - [`error`]: Error types and Result alias
//! - [`version`]: XDatenfelder version detection
//! - [`xml`]: XML utilities
//! - [`header`]: Shared element metadata
//! - [`model`]: Element model (structures, fields, field groups)
//! - [`parser`]: XML to element model
//! - [`codelist`]: Code-list resolvers (XRepository, genericode files)
//! - [`schema`]: Element model to JSON Schema
//! - [`http`]: HTTP client with retries
//! - [`loader`]: Inline, file and URL document sources
//! - [`converter`]: Load, parse and emit in one call
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod codelist;
pub mod config;
pub mod converter;
pub mod error;
pub mod header;
pub mod http;
pub mod loader;
pub mod model;
pub mod parser;
pub mod schema;
pub mod version;
pub mod xml;

// Re-export main functions
pub use converter::{convert, convert_document};
pub use parser::parse_document;

// Re-export commonly used items
pub use codelist::{
    CodeEntry, CodeListResolution, CodeListResolver, DisabledResolver, GenericodeFileResolver,
    ResolverChain, XRepositoryResolver,
};
pub use config::{ConvertOptions, EmitOptions, HttpConfig, ParseOptions, RetryPolicy};
pub use error::{FimError, Result};
pub use header::{HasHeader, Header};
pub use loader::DocumentSource;
pub use model::{Cardinality, Element, Field, FieldGroup, FormDocument, MaxItems, Structure};
pub use schema::SchemaEmitter;
pub use version::FimVersion;
