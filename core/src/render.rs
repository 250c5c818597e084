//! Rendering structured schemas back into schema language text.
//!
//! The renderer works from the structured representation only. Attributes
//! the structural parser does not expose must be filled in beforehand (the
//! loader overlays them from the raw source text).
//!
//! # Example
//!
//! ```
//! use prismix_core::*;
//!
//! let user = Model::new("User")
//!     .with_field(Field::scalar("id", "Int").id())
//!     .with_field(Field::scalar("name", "String").with_column_name("user_name"));
//!
//! let text = render_model(&user).unwrap();
//! assert_eq!(
//!     text,
//!     "model User {\n\tid Int @id\n\tname String @map(\"user_name\")\n}"
//! );
//! ```

use thiserror::Error;

use crate::{
    Datasource, DefaultValue, Enum, EnvValue, Field, FieldKind, Generator, Model, Schema,
    UniqueConstraint,
};

/// First line of every generated schema file.
pub const GENERATED_MARKER: &str = "// *** GENERATED BY PRISMIX :: DO NOT EDIT ***";

/// Errors raised for values the schema language cannot express.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// Field kind is neither scalar, relation nor enum.
    #[error("unsupported field kind \"{kind}\" on {model}.{field}")]
    UnsupportedFieldKind {
        model: String,
        field: String,
        kind: FieldKind,
    },
    /// Default value shape has no textual form.
    #[error("unsupported field attribute @default({value}) on {model}.{field}")]
    UnsupportedDefault {
        model: String,
        field: String,
        value: String,
    },
}

/// Convenience alias for results with [`RenderError`].
pub type Result<T> = std::result::Result<T, RenderError>;

/// Renders a complete output document.
///
/// Sections appear in the order datasources, generators, models, enums,
/// prefixed by [`GENERATED_MARKER`]. Empty sections are dropped and the rest
/// are separated by a blank line.
///
/// # Errors
///
/// Returns a [`RenderError`] when any model contains an unrepresentable field
/// kind or default value. Nothing is produced in that case.
pub fn render_schema(schema: &Schema) -> Result<String> {
    let sections = [
        GENERATED_MARKER.to_string(),
        render_datasources(&schema.datasources),
        render_generators(&schema.generators),
        render_models(&schema.models)?,
        render_enums(&schema.enums),
    ];

    let mut output = sections
        .into_iter()
        .filter(|section| !section.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    output.push('\n');
    Ok(output)
}

/// Renders every model block.
pub fn render_models(models: &[Model]) -> Result<String> {
    let blocks = models.iter().map(render_model).collect::<Result<Vec<_>>>()?;
    Ok(blocks.join("\n\n"))
}

/// Renders every enum block.
pub fn render_enums(enums: &[Enum]) -> String {
    enums.iter().map(render_enum).collect::<Vec<_>>().join("\n\n")
}

/// Renders every datasource block.
pub fn render_datasources(datasources: &[Datasource]) -> String {
    datasources
        .iter()
        .map(render_datasource)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders every generator block.
pub fn render_generators(generators: &[Generator]) -> String {
    generators
        .iter()
        .map(render_generator)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders one model block: fields, uniqueness groups, raw index
/// declarations, table mapping and compound identity.
pub fn render_model(model: &Model) -> Result<String> {
    let mut items = Vec::with_capacity(model.fields.len() + 4);
    for field in &model.fields {
        items.push(render_field(&model.name, field)?);
    }
    items.extend(model.unique_fields.iter().map(render_unique));
    items.extend(model.index_declarations.iter().cloned());
    items.push(render_db_name(model.db_name.as_deref()));
    items.push(render_id_fields(model));

    Ok(assemble_block("model", &model.name, &items))
}

/// Renders one field line without indentation.
///
/// # Errors
///
/// Returns [`RenderError::UnsupportedFieldKind`] for
/// [`FieldKind::Unsupported`] and [`RenderError::UnsupportedDefault`] for list
/// defaults.
///
/// # Examples
///
/// ```
/// use prismix_core::*;
///
/// let field = Field::scalar("nickname", "String").optional();
/// assert_eq!(render_field("User", &field).unwrap(), "nickname String?");
///
/// let posts = Field::relation("posts", "Post", RelationInfo::named("PostToUser")).list();
/// assert_eq!(
///     render_field("User", &posts).unwrap(),
///     "posts Post[] @relation(name: \"PostToUser\")"
/// );
/// ```
pub fn render_field(model: &str, field: &Field) -> Result<String> {
    let attributes = match field.kind {
        FieldKind::Scalar | FieldKind::Enum => render_scalar_attributes(model, field)?,
        FieldKind::Object => render_relation(field),
        FieldKind::Unsupported => {
            return Err(RenderError::UnsupportedFieldKind {
                model: model.to_string(),
                field: field.name.clone(),
                kind: field.kind,
            });
        }
    };

    let marker = if field.is_list {
        "[]"
    } else if field.is_required {
        ""
    } else {
        "?"
    };

    let mut line = format!("{} {}{marker}", field.name, field.field_type);
    if !attributes.is_empty() {
        line.push(' ');
        line.push_str(&attributes);
    }
    Ok(line)
}

fn render_scalar_attributes(model: &str, field: &Field) -> Result<String> {
    let clauses = [
        render_default(model, field)?,
        flag_clause(field.is_id, "@id"),
        flag_clause(field.is_unique, "@unique"),
        flag_clause(field.is_updated_at, "@updatedAt"),
        field
            .column_name
            .as_deref()
            .map(|column| format!("@map({})", quote(column)))
            .unwrap_or_default(),
        field
            .native_type
            .as_deref()
            .map(|native| format!("@db.{native}"))
            .unwrap_or_default(),
    ];

    Ok(clauses
        .into_iter()
        .filter(|clause| !clause.is_empty())
        .collect::<Vec<_>>()
        .join(" "))
}

fn flag_clause(set: bool, clause: &str) -> String {
    if set { clause.to_string() } else { String::new() }
}

/// Renders the `@default(...)` clause of a field, or an empty string.
///
/// Enum defaults render bare, `Boolean` fields always render, string
/// defaults are quoted except on `BigInt` fields.
///
/// # Examples
///
/// ```
/// use prismix_core::*;
///
/// let flag = Field::scalar("active", "Boolean").with_default(DefaultValue::Boolean(false));
/// assert_eq!(render_default("User", &flag).unwrap(), "@default(false)");
///
/// let role = Field::enumeration("role", "Role").with_default(DefaultValue::String("USER".into()));
/// assert_eq!(render_default("User", &role).unwrap(), "@default(USER)");
/// ```
pub fn render_default(model: &str, field: &Field) -> Result<String> {
    let Some(value) = &field.default else {
        return Ok(String::new());
    };

    let rendered = match value {
        DefaultValue::List(_) => {
            return Err(RenderError::UnsupportedDefault {
                model: model.to_string(),
                field: field.name.clone(),
                value: value.to_string(),
            });
        }
        _ if field.kind == FieldKind::Enum => value.to_string(),
        _ if field.field_type == "Boolean" => value.to_string(),
        DefaultValue::String(text) if field.field_type != "BigInt" => quote(text),
        DefaultValue::String(text) => text.clone(),
        DefaultValue::Boolean(_) | DefaultValue::Number(_) | DefaultValue::Function { .. } => {
            value.to_string()
        }
    };

    Ok(format!("@default({rendered})"))
}

fn render_relation(field: &Field) -> String {
    let Some(relation) = &field.relation else {
        return String::new();
    };

    if relation.from_fields.is_empty() {
        return relation
            .name
            .as_deref()
            .map(|name| format!("@relation(name: {})", quote(name)))
            .unwrap_or_default();
    }

    let mut args = Vec::with_capacity(5);
    if let Some(name) = &relation.name {
        args.push(format!("name: {}", quote(name)));
    }
    args.push(format!("fields: [{}]", relation.from_fields.join(", ")));
    args.push(format!("references: [{}]", relation.to_fields.join(", ")));
    if let Some(action) = &relation.on_delete {
        args.push(format!("onDelete: {action}"));
    }
    if let Some(action) = &relation.on_update {
        args.push(format!("onUpdate: {action}"));
    }
    format!("@relation({})", args.join(", "))
}

fn render_unique(unique: &UniqueConstraint) -> String {
    match &unique.name {
        Some(name) => format!(
            "@@unique([{}], name: {})",
            unique.fields.join(", "),
            quote(name)
        ),
        None => format!("@@unique([{}])", unique.fields.join(", ")),
    }
}

fn render_id_fields(model: &Model) -> String {
    let fields = if !model.id_fields.is_empty() {
        &model.id_fields
    } else {
        match &model.primary_key {
            Some(pk) if !pk.fields.is_empty() => &pk.fields,
            _ => return String::new(),
        }
    };

    match model.primary_key.as_ref().and_then(|pk| pk.name.as_deref()) {
        Some(name) => format!("@@id([{}], name: {})", fields.join(", "), quote(name)),
        None => format!("@@id([{}])", fields.join(", ")),
    }
}

fn render_db_name(db_name: Option<&str>) -> String {
    db_name
        .map(|name| format!("@@map({})", quote(name)))
        .unwrap_or_default()
}

/// Renders one enum block.
pub fn render_enum(definition: &Enum) -> String {
    let mut items: Vec<String> = definition
        .values
        .iter()
        .map(|value| match &value.db_name {
            Some(db_name) if *db_name != value.name => {
                format!("{} @map({})", value.name, quote(db_name))
            }
            _ => value.name.clone(),
        })
        .collect();
    items.push(render_db_name(definition.db_name.as_deref()));

    assemble_block("enum", &definition.name, &items)
}

/// Renders one datasource block.
pub fn render_datasource(datasource: &Datasource) -> String {
    assemble_block(
        "datasource",
        &datasource.name,
        &[
            format!("provider = {}", quote(&datasource.active_provider)),
            render_property("url", Some(&datasource.url)),
        ],
    )
}

/// Renders one generator block.
pub fn render_generator(generator: &Generator) -> String {
    assemble_block(
        "generator",
        &generator.name,
        &[
            render_property("provider", Some(&generator.provider)),
            render_property("output", generator.output.as_ref()),
            render_list_property("binaryTargets", &generator.binary_targets),
            render_list_property("previewFeatures", &generator.preview_features),
        ],
    )
}

fn render_property(key: &str, value: Option<&EnvValue>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match (&value.from_env_var, &value.value) {
        (Some(var), _) => format!("{key} = env({})", quote(var)),
        (None, Some(literal)) => format!("{key} = {}", quote(literal)),
        (None, None) => String::new(),
    }
}

fn render_list_property(key: &str, values: &[String]) -> String {
    if values.is_empty() {
        return String::new();
    }
    format!("{key} = {}", serde_json::Value::from(values.to_vec()))
}

/// Assembles `<kind> <name> { ... }` with one tab-indented line per item.
///
/// Items shorter than two characters after trimming count as empty and are
/// dropped.
///
/// # Examples
///
/// ```
/// use prismix_core::assemble_block;
///
/// let block = assemble_block("enum", "Role", &["USER".into(), "".into(), "ADMIN".into()]);
/// assert_eq!(block, "enum Role {\n\tUSER\n\tADMIN\n}");
/// ```
pub fn assemble_block(kind: &str, name: &str, items: &[String]) -> String {
    let body: Vec<String> = items
        .iter()
        .filter(|item| item.trim().chars().count() >= 2)
        .map(|item| format!("\t{item}"))
        .collect();
    format!("{kind} {name} {{\n{}\n}}", body.join("\n"))
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}
