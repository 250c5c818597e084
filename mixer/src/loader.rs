//! Two-phase fragment loading: structural parse, then textual overlay.
//!
//! The parser supplies models, enums and config blocks. Attributes it does
//! not expose are recovered by [`scan_schema`] from the same text and written
//! onto the matching fields and models. Swapping the parser does not affect
//! the merge or render stages.

use std::path::Path;

use prismix_core::{Model, Schema, SchemaParser};
use tracing::debug;

use crate::error::LoadError;
use crate::scan::{RecoveredModel, scan_schema};

/// Loads schema fragments through a [`SchemaParser`].
///
/// # Examples
///
/// ```
/// use prismix::SchemaLoader;
/// use prismix_parser::PslParser;
///
/// let loader = SchemaLoader::new(PslParser::new());
/// let schema = loader
///     .load_source("model User {\n  id Int @id\n  name String @map(\"user_name\")\n}\n")
///     .unwrap();
/// let name = schema.models[0].find_field("name").unwrap();
/// assert_eq!(name.column_name.as_deref(), Some("user_name"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader<P> {
    parser: P,
}

impl<P: SchemaParser> SchemaLoader<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Reads and loads the fragment at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the file cannot be read, or
    /// [`LoadError::Parse`] if the parser rejects its content.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Schema, LoadError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let schema = self.parse_and_enrich(&source).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;

        debug!(
            path = %path.display(),
            models = schema.models.len(),
            enums = schema.enums.len(),
            "Loaded fragment"
        );
        Ok(schema)
    }

    /// Loads a fragment from in-memory text.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Parse`] (with an empty path) if the parser rejects
    /// `source`.
    pub fn load_source(&self, source: &str) -> Result<Schema, LoadError> {
        self.parse_and_enrich(source)
            .map_err(|source| LoadError::Parse {
                path: Default::default(),
                source: Box::new(source),
            })
    }

    fn parse_and_enrich(&self, source: &str) -> Result<Schema, P::Error> {
        let mut schema = self.parser.parse_schema(source)?;
        let mut recovered = scan_schema(source);
        for model in &mut schema.models {
            if let Some(found) = recovered.remove(&model.name) {
                overlay(model, found);
            }
        }
        Ok(schema)
    }
}

/// Writes recovered attributes onto `model` and its fields.
///
/// Recovered values replace whatever the parser reported. Relation update
/// behaviour is only applied to relation fields.
pub fn overlay(model: &mut Model, recovered: RecoveredModel) {
    let RecoveredModel {
        mut fields,
        index_declarations,
    } = recovered;

    for field in &mut model.fields {
        let Some(attributes) = fields.remove(&field.name) else {
            continue;
        };
        if attributes.column_name.is_some() {
            field.column_name = attributes.column_name;
        }
        if attributes.native_type.is_some() {
            field.native_type = attributes.native_type;
        }
        if let Some(relation) = field.relation.as_mut() {
            if attributes.relation_on_update.is_some() {
                relation.on_update = attributes.relation_on_update;
            }
        }
    }
    model.index_declarations = index_declarations;
}
