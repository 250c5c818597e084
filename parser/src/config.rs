//! Lowering of `datasource` and `generator` blocks into [`Configuration`].

use std::collections::HashSet;

use prismix_core::{Configuration, Datasource, EnvValue, Generator};
use tracing::debug;

use crate::ast::{Block, BlockBody, BlockKind, Expr, Property, SchemaAst};
use crate::error::{ParseError, Result};

/// Lowers every config block of `ast`, resolving `env("VAR")` values through
/// `lookup`.
///
/// An unset variable is not an error; the value is left unresolved so the
/// caller can tell a placeholder datasource from a concrete one.
pub fn lower_configuration(
    ast: &SchemaAst,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<Configuration> {
    let mut configuration = Configuration::default();
    let mut seen = HashSet::new();

    for block in &ast.blocks {
        let BlockBody::Config { properties } = &block.body else {
            continue;
        };
        if !seen.insert((block.kind.keyword(), block.name.as_str())) {
            return Err(ParseError::DuplicateBlock {
                kind: block.kind.keyword().to_string(),
                name: block.name.clone(),
            });
        }

        let lowering = ConfigBlock {
            block,
            properties,
            lookup,
        };
        match block.kind {
            BlockKind::Datasource => configuration.datasources.push(lowering.datasource()?),
            BlockKind::Generator => configuration.generators.push(lowering.generator()?),
            BlockKind::Model | BlockKind::Enum => {}
        }
    }

    debug!(
        datasources = configuration.datasources.len(),
        generators = configuration.generators.len(),
        "Lowered configuration"
    );
    Ok(configuration)
}

struct ConfigBlock<'a> {
    block: &'a Block,
    properties: &'a [Property],
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl ConfigBlock<'_> {
    fn datasource(&self) -> Result<Datasource> {
        let provider = self.required("provider")?;
        let provider = self
            .env_value("provider", provider)?
            .value
            .ok_or_else(|| self.invalid("provider", "provider must be a literal string"))?;
        let url = self.env_value("url", self.required("url")?)?;

        Ok(Datasource {
            name: self.block.name.clone(),
            active_provider: provider,
            url,
        })
    }

    fn generator(&self) -> Result<Generator> {
        let provider = self.env_value("provider", self.required("provider")?)?;
        let output = self
            .optional("output")
            .map(|value| self.env_value("output", value))
            .transpose()?;
        let binary_targets = self.string_list("binaryTargets")?;
        let preview_features = self.string_list("previewFeatures")?;

        Ok(Generator {
            name: self.block.name.clone(),
            provider,
            output,
            binary_targets,
            preview_features,
        })
    }

    /// Last assignment of `key`, matching how repeated keys override.
    fn optional(&self, key: &str) -> Option<&Expr> {
        self.properties
            .iter()
            .rev()
            .find(|property| property.key == key)
            .map(|property| &property.value)
    }

    fn required(&self, key: &str) -> Result<&Expr> {
        self.optional(key)
            .ok_or_else(|| ParseError::MissingProperty {
                kind: self.block.kind.keyword().to_string(),
                name: self.block.name.clone(),
                property: key.to_string(),
            })
    }

    fn env_value(&self, key: &str, value: &Expr) -> Result<EnvValue> {
        match value {
            Expr::Str(literal) => Ok(EnvValue::literal(literal)),
            Expr::Call { name, args } if name == "env" => {
                let var = match args.as_slice() {
                    [arg] if arg.name.is_none() => arg.value.as_str(),
                    _ => None,
                }
                .ok_or_else(|| self.invalid(key, "env() takes one string argument"))?;
                let resolved = (self.lookup)(var);
                if resolved.is_none() {
                    debug!(block = %self.block.name, var, "Environment variable is not set");
                }
                Ok(EnvValue::env(var, resolved.as_deref()))
            }
            other => Err(self.invalid(
                key,
                &format!("expected a string or env(\"VAR\"), found `{}`", other.to_source()),
            )),
        }
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>> {
        let Some(value) = self.optional(key) else {
            return Ok(Vec::new());
        };
        let items = match value {
            Expr::Array(items) => items.as_slice(),
            single @ Expr::Str(_) => std::slice::from_ref(single),
            _ => return Err(self.invalid(key, "expected a list of strings")),
        };
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(String::from)
                    .ok_or_else(|| self.invalid(key, "expected a list of strings"))
            })
            .collect()
    }

    fn invalid(&self, key: &str, message: &str) -> ParseError {
        ParseError::InvalidProperty {
            kind: self.block.kind.keyword().to_string(),
            name: self.block.name.clone(),
            property: key.to_string(),
            message: message.to_string(),
        }
    }
}
