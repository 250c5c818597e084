//! Structural parser for Prisma schema files.
//!
//! Parsing runs in three stages:
//!
//! - [`tokenize`] splits the source into tokens with line numbers.
//! - [`parse_ast`] builds a [`SchemaAst`] of `model`, `enum`, `datasource`
//!   and `generator` blocks.
//! - Lowering turns the tree into the [`prismix_core`] data model and checks
//!   that every field type resolves.
//!
//! [`PslParser`] wires the stages behind the [`SchemaParser`] contract. The
//! structured output matches what the upstream DMMF exposes, so field `@map`,
//! `@db.*`, relation `onUpdate` and `@@index` are accepted but not reported.
//!
//! # Example
//!
//! ```
//! use prismix_core::{FieldKind, SchemaParser};
//! use prismix_parser::PslParser;
//!
//! let source = r#"
//! model User {
//!   id    Int    @id @default(autoincrement())
//!   email String @unique @map("email_address")
//!   posts Post[]
//! }
//!
//! model Post {
//!   id       Int  @id
//!   authorId Int
//!   author   User @relation(fields: [authorId], references: [id])
//! }
//! "#;
//!
//! let datamodel = PslParser::new().parse_datamodel(source).unwrap();
//! let user = &datamodel.models[0];
//! assert_eq!(user.find_field("posts").unwrap().kind, FieldKind::Object);
//! assert_eq!(user.find_field("email").unwrap().column_name, None);
//! ```

use std::collections::HashMap;

use prismix_core::{Configuration, Datamodel, SchemaParser};

pub mod ast;
mod config;
mod datamodel;
mod error;
mod lexer;
mod parse;

pub use ast::SchemaAst;
pub use datamodel::implicit_relation_name;
pub use error::{ParseError, Result};
pub use lexer::{Token, TokenKind, tokenize};
pub use parse::parse_ast;

/// [`SchemaParser`] for the Prisma schema language.
///
/// `env("VAR")` values resolve through the process environment unless an
/// explicit map is supplied with [`PslParser::with_env`].
#[derive(Debug, Clone, Default)]
pub struct PslParser {
    env: Option<HashMap<String, String>>,
}

impl PslParser {
    /// Creates a parser that reads the process environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser that resolves `env("VAR")` from `env` only.
    pub fn with_env(env: HashMap<String, String>) -> Self {
        Self { env: Some(env) }
    }

    fn lookup(&self, var: &str) -> Option<String> {
        match &self.env {
            Some(env) => env.get(var).cloned(),
            None => std::env::var(var).ok(),
        }
    }
}

impl SchemaParser for PslParser {
    type Error = ParseError;

    fn parse_datamodel(&self, source: &str) -> Result<Datamodel> {
        datamodel::lower_datamodel(&parse_ast(source)?)
    }

    fn parse_configuration(&self, source: &str) -> Result<Configuration> {
        config::lower_configuration(&parse_ast(source)?, &|var| self.lookup(var))
    }
}

/// Parses the models and enums of `source` using the process environment.
pub fn parse_datamodel(source: &str) -> Result<Datamodel> {
    PslParser::new().parse_datamodel(source)
}

/// Parses the datasource and generator blocks of `source` using the process
/// environment.
pub fn parse_configuration(source: &str) -> Result<Configuration> {
    PslParser::new().parse_configuration(source)
}
