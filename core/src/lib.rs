//! Core schema types, model merging and schema rendering for prismix.
//!
//! This crate defines the structured representation of a Prisma-style schema
//! and the two algorithms that operate on it:
//!
//! - [`Model`], [`Field`], [`Enum`], [`Datasource`], [`Generator`]: the
//!   structured schema, shaped after the upstream DMMF.
//! - [`SchemaParser`]: the contract a structural parser implements.
//! - [`merge_models`]: folds the models of many fragments into one model per
//!   name.
//! - [`render_schema`]: turns a structured schema back into schema text.
//!
//! # Example
//!
//! ```
//! use prismix_core::*;
//!
//! let alias = Model::new("User").with_field(Field::scalar("id", "Int").id());
//! let full = Model::new("User")
//!     .with_field(Field::scalar("id", "Int").id())
//!     .with_field(Field::scalar("email", "String").unique());
//!
//! let schema = Schema {
//!     models: merge_models(vec![alias, full]),
//!     ..Schema::default()
//! };
//! let text = render_schema(&schema).unwrap();
//! assert!(text.starts_with(GENERATED_MARKER));
//! assert!(text.contains("\temail String @unique\n"));
//! ```

mod merge;
mod parser;
mod render;
mod types;

pub use merge::{merge_model, merge_models};
pub use parser::SchemaParser;
pub use render::{
    GENERATED_MARKER, RenderError, assemble_block, render_datasource, render_datasources,
    render_default, render_enum, render_enums, render_field, render_generator, render_generators,
    render_model, render_models, render_schema,
};
pub use types::*;
