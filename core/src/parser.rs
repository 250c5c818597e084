//! Contract between the loader and a structural schema parser.

use crate::{Configuration, Datamodel, Schema};

/// Parses schema source text into structured models and config blocks.
///
/// Implementations are expected to expose the same information the upstream
/// DMMF exposes. Attributes such as field `@map` or `@db.*` may be missing;
/// the loader recovers them from the raw text.
pub trait SchemaParser {
    /// Error returned for malformed or semantically invalid source text.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Parses the models and enums of `source`.
    fn parse_datamodel(&self, source: &str) -> Result<Datamodel, Self::Error>;

    /// Parses the datasource and generator blocks of `source`.
    fn parse_configuration(&self, source: &str) -> Result<Configuration, Self::Error>;

    /// Parses both halves of `source` into one [`Schema`].
    fn parse_schema(&self, source: &str) -> Result<Schema, Self::Error> {
        let datamodel = self.parse_datamodel(source)?;
        let configuration = self.parse_configuration(source)?;
        Ok(Schema::from_parts(datamodel, configuration))
    }
}
