//! Lowering of model and enum blocks into [`Datamodel`].
//!
//! Only the attributes the upstream DMMF exposes are lowered. Field `@map`,
//! `@db.*`, relation `onUpdate` and `@@index` are accepted but dropped here;
//! the loader recovers them from the source text.

use std::collections::{HashMap, HashSet};

use prismix_core::{
    Datamodel, DefaultValue, Enum, EnumValue, Field, FieldKind, Model, PrimaryKey, RelationInfo,
    SCALAR_TYPES, UniqueConstraint,
};
use tracing::debug;

use crate::ast::{
    Arity, Attribute, Block, BlockBody, BlockKind, EnumValueDecl, Expr, FieldDecl, SchemaAst,
};
use crate::error::{ParseError, Result};

/// Field attributes that parse but are not part of the structured output.
const PASSTHROUGH_FIELD_ATTRIBUTES: &[&str] = &["map", "ignore"];

/// Block attributes that parse but are not part of the structured output.
const PASSTHROUGH_BLOCK_ATTRIBUTES: &[&str] = &["index", "fulltext", "ignore", "schema"];

/// Lowers every model and enum block of `ast`.
///
/// # Errors
///
/// Fails on duplicate names, field types that resolve to nothing, unknown
/// attributes and malformed attribute arguments.
pub fn lower_datamodel(ast: &SchemaAst) -> Result<Datamodel> {
    let types = TypeTable::collect(ast)?;

    let mut datamodel = Datamodel::default();
    for block in &ast.blocks {
        match &block.body {
            BlockBody::Model { fields, attributes } => {
                datamodel
                    .models
                    .push(lower_model(block, fields, attributes, &types)?);
            }
            BlockBody::Enum { values, attributes } => {
                datamodel.enums.push(lower_enum(block, values, attributes)?);
            }
            BlockBody::Config { .. } => {}
        }
    }

    debug!(
        models = datamodel.models.len(),
        enums = datamodel.enums.len(),
        "Lowered datamodel"
    );
    Ok(datamodel)
}

/// Names of declared models and enums; both share one namespace.
struct TypeTable {
    kinds: HashMap<String, FieldKind>,
}

impl TypeTable {
    fn collect(ast: &SchemaAst) -> Result<Self> {
        let mut kinds = HashMap::new();
        for block in &ast.blocks {
            let kind = match block.kind {
                BlockKind::Model => FieldKind::Object,
                BlockKind::Enum => FieldKind::Enum,
                BlockKind::Datasource | BlockKind::Generator => continue,
            };
            if SCALAR_TYPES.contains(&block.name.as_str())
                || kinds.insert(block.name.clone(), kind).is_some()
            {
                return Err(ParseError::DuplicateBlock {
                    kind: block.kind.keyword().to_string(),
                    name: block.name.clone(),
                });
            }
        }
        Ok(Self { kinds })
    }

    fn resolve(&self, type_name: &str) -> Option<FieldKind> {
        if SCALAR_TYPES.contains(&type_name) {
            return Some(FieldKind::Scalar);
        }
        self.kinds.get(type_name).copied()
    }
}

fn lower_model(
    block: &Block,
    fields: &[FieldDecl],
    attributes: &[Attribute],
    types: &TypeTable,
) -> Result<Model> {
    let mut model = Model::new(&block.name);

    let mut seen = HashSet::new();
    for decl in fields {
        if !seen.insert(decl.name.as_str()) {
            return Err(ParseError::DuplicateField {
                block: format!("model {}", block.name),
                name: decl.name.clone(),
            });
        }
        model.fields.push(lower_field(&block.name, decl, types)?);
    }

    for attribute in attributes {
        let target = format!("model {}", block.name);
        match attribute.name.as_str() {
            "id" => {
                let fields = field_list(attribute, &target)?;
                model.primary_key = Some(PrimaryKey {
                    name: optional_string(attribute, "name", &target)?,
                    fields: fields.clone(),
                });
                model.id_fields = fields;
            }
            "unique" => {
                model.unique_fields.push(UniqueConstraint {
                    name: optional_string(attribute, "name", &target)?,
                    fields: field_list(attribute, &target)?,
                });
            }
            "map" => {
                model.db_name = Some(required_string(attribute, &target)?);
            }
            name if PASSTHROUGH_BLOCK_ATTRIBUTES.contains(&name) => {}
            _ => return Err(unknown_attribute(attribute, &target)),
        }
    }

    Ok(model)
}

fn lower_field(model: &str, decl: &FieldDecl, types: &TypeTable) -> Result<Field> {
    let target = format!("{model}.{}", decl.name);

    let (kind, field_type) = match &decl.field_type.unsupported {
        Some(column_type) => (
            FieldKind::Unsupported,
            format!("Unsupported({})", Expr::Str(column_type.clone()).to_source()),
        ),
        None => {
            let kind = types.resolve(&decl.field_type.name).ok_or_else(|| {
                ParseError::UnknownType {
                    model: model.to_string(),
                    field: decl.name.clone(),
                    type_name: decl.field_type.name.clone(),
                }
            })?;
            (kind, decl.field_type.name.clone())
        }
    };

    let mut field = match kind {
        FieldKind::Scalar => Field::scalar(&decl.name, &field_type),
        FieldKind::Enum => Field::enumeration(&decl.name, &field_type),
        FieldKind::Object => Field::relation(&decl.name, &field_type, RelationInfo::default()),
        FieldKind::Unsupported => Field::unsupported(&decl.name, &field_type),
    };
    match decl.field_type.arity {
        Arity::Required => {}
        Arity::Optional => field = field.optional(),
        Arity::List => field = field.list(),
    }

    for attribute in &decl.attributes {
        match attribute.name.as_str() {
            "id" => field.is_id = true,
            "unique" => field.is_unique = true,
            "updatedAt" => field.is_updated_at = true,
            "default" => {
                let value = attribute.arg("value").ok_or_else(|| invalid_attribute(
                    attribute,
                    &target,
                    "missing default value",
                ))?;
                field.default = Some(lower_default(value, &field, attribute, &target)?);
            }
            "relation" => {
                let Some(relation) = field.relation.as_mut() else {
                    return Err(invalid_attribute(
                        attribute,
                        &target,
                        "only relation fields accept @relation",
                    ));
                };
                lower_relation(attribute, relation, &target)?;
            }
            name if name.starts_with("db.") => {}
            name if PASSTHROUGH_FIELD_ATTRIBUTES.contains(&name) => {}
            _ => return Err(unknown_attribute(attribute, &target)),
        }
    }

    if let Some(relation) = field.relation.as_mut() {
        if relation.name.is_none() {
            relation.name = Some(implicit_relation_name(model, &field.field_type));
        }
    }

    Ok(field)
}

fn lower_default(
    value: &Expr,
    field: &Field,
    attribute: &Attribute,
    target: &str,
) -> Result<DefaultValue> {
    match value {
        Expr::Str(text) => Ok(DefaultValue::String(text.clone())),
        Expr::Number(number) => number
            .parse::<serde_json::Number>()
            .map(DefaultValue::Number)
            .map_err(|_| invalid_attribute(attribute, target, &format!("invalid number `{number}`"))),
        Expr::Path(path) if path == "true" || path == "false" => {
            Ok(DefaultValue::Boolean(path == "true"))
        }
        Expr::Path(variant) if field.kind == FieldKind::Enum => {
            Ok(DefaultValue::String(variant.clone()))
        }
        Expr::Path(other) => Err(invalid_attribute(
            attribute,
            target,
            &format!("`{other}` is not a valid default for type {}", field.field_type),
        )),
        Expr::Call { name, args } => Ok(DefaultValue::Function {
            name: name.clone(),
            args: args.iter().map(|arg| arg.to_source()).collect(),
        }),
        Expr::Array(items) => items
            .iter()
            .map(|item| lower_default(item, field, attribute, target))
            .collect::<Result<Vec<_>>>()
            .map(DefaultValue::List),
    }
}

fn lower_relation(attribute: &Attribute, relation: &mut RelationInfo, target: &str) -> Result<()> {
    if let Some(name) = attribute.arg("name") {
        let name = name
            .as_str()
            .ok_or_else(|| invalid_attribute(attribute, target, "relation name must be a string"))?;
        relation.name = Some(name.to_string());
    }
    if let Some(fields) = attribute.named_arg("fields") {
        relation.from_fields = fields
            .as_path_list()
            .ok_or_else(|| invalid_attribute(attribute, target, "fields must be a field list"))?;
    }
    if let Some(references) = attribute.named_arg("references") {
        relation.to_fields = references.as_path_list().ok_or_else(|| {
            invalid_attribute(attribute, target, "references must be a field list")
        })?;
    }
    if relation.from_fields.len() != relation.to_fields.len() {
        return Err(invalid_attribute(
            attribute,
            target,
            "fields and references must have the same length",
        ));
    }
    if let Some(action) = attribute.named_arg("onDelete") {
        let action = action
            .as_path()
            .ok_or_else(|| invalid_attribute(attribute, target, "onDelete must be an action"))?;
        relation.on_delete = Some(action.to_string());
    }
    Ok(())
}

fn lower_enum(block: &Block, values: &[EnumValueDecl], attributes: &[Attribute]) -> Result<Enum> {
    let mut definition = Enum::new(&block.name, &[]);
    let mut seen = HashSet::new();

    for decl in values {
        if !seen.insert(decl.name.as_str()) {
            return Err(ParseError::DuplicateField {
                block: format!("enum {}", block.name),
                name: decl.name.clone(),
            });
        }
        let target = format!("{}.{}", block.name, decl.name);
        let mut value = EnumValue {
            name: decl.name.clone(),
            db_name: None,
        };
        for attribute in &decl.attributes {
            match attribute.name.as_str() {
                "map" => value.db_name = Some(required_string(attribute, &target)?),
                _ => return Err(unknown_attribute(attribute, &target)),
            }
        }
        definition.values.push(value);
    }

    for attribute in attributes {
        let target = format!("enum {}", block.name);
        match attribute.name.as_str() {
            "map" => definition.db_name = Some(required_string(attribute, &target)?),
            "schema" => {}
            _ => return Err(unknown_attribute(attribute, &target)),
        }
    }

    Ok(definition)
}

/// Relation name used when `@relation` does not give one: both model names
/// sorted and joined with `To`.
pub fn implicit_relation_name(model: &str, related: &str) -> String {
    if model <= related {
        format!("{model}To{related}")
    } else {
        format!("{related}To{model}")
    }
}

fn field_list(attribute: &Attribute, target: &str) -> Result<Vec<String>> {
    attribute
        .arg("fields")
        .and_then(Expr::as_path_list)
        .filter(|fields| !fields.is_empty())
        .ok_or_else(|| invalid_attribute(attribute, target, "expected a list of fields"))
}

fn required_string(attribute: &Attribute, target: &str) -> Result<String> {
    attribute
        .arg("name")
        .and_then(Expr::as_str)
        .map(String::from)
        .ok_or_else(|| invalid_attribute(attribute, target, "expected a string argument"))
}

fn optional_string(attribute: &Attribute, name: &str, target: &str) -> Result<Option<String>> {
    match attribute.named_arg(name) {
        None => Ok(None),
        Some(value) => value.as_str().map(|s| Some(s.to_string())).ok_or_else(|| {
            invalid_attribute(attribute, target, &format!("`{name}` must be a string"))
        }),
    }
}

fn invalid_attribute(attribute: &Attribute, target: &str, message: &str) -> ParseError {
    ParseError::InvalidAttribute {
        target: target.to_string(),
        attribute: attribute.name.clone(),
        message: format!("{message} (line {})", attribute.line),
    }
}

fn unknown_attribute(attribute: &Attribute, target: &str) -> ParseError {
    invalid_attribute(attribute, target, "unknown attribute")
}
