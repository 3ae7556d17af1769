//! JSON Schema generation.
//!
//! [`SchemaEmitter`] walks a [`crate::model::FormDocument`] and renders each
//! structure, field group and field as a JSON Schema fragment. Field
//! fragments are built in `field`.

mod emitter;
mod field;

pub use emitter::SchemaEmitter;
