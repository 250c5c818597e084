//! Schema type definitions for Prisma-style data models.
//!
//! These types mirror the shape of the upstream DMMF (data model meta format)
//! closely enough that a structural parser can fill them directly, plus a few
//! attributes that only the text scanner recovers (`column_name`,
//! `native_type`, relation `on_update`, raw `@@index` declarations). They
//! serialize with [`serde`] using the DMMF camelCase field names.

use serde::{Deserialize, Serialize};

/// Built-in scalar type names of the schema language.
pub const SCALAR_TYPES: &[&str] = &[
    "String", "Boolean", "Int", "BigInt", "Float", "Decimal", "DateTime", "Json", "Bytes",
];

/// Kind of a model field.
///
/// # Examples
///
/// ```
/// use prismix_core::FieldKind;
///
/// assert_eq!(FieldKind::Object.as_str(), "object");
/// assert!(FieldKind::Scalar.is_renderable());
/// assert!(!FieldKind::Unsupported.is_renderable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Built-in scalar (`String`, `Int`, ...).
    Scalar,
    /// Relation to another model.
    Object,
    /// Reference to a declared enum.
    Enum,
    /// `Unsupported("...")` database column type.
    Unsupported,
}

impl FieldKind {
    /// Returns the DMMF name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Object => "object",
            Self::Enum => "enum",
            Self::Unsupported => "unsupported",
        }
    }

    /// Returns `true` if the renderer can turn a field of this kind back
    /// into schema text.
    pub fn is_renderable(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default value of a field, as exposed by the structural parser.
///
/// Enum defaults are carried as [`DefaultValue::String`] holding the bare
/// variant name, the same way DMMF does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// `true` / `false`.
    Boolean(bool),
    /// Integer or floating point literal.
    Number(serde_json::Number),
    /// String literal (or enum variant name).
    String(String),
    /// Generator function such as `autoincrement()` or `dbgenerated("...")`.
    ///
    /// `args` hold the raw argument text as written in the schema.
    Function { name: String, args: Vec<String> },
    /// List literal (`[1, 2]`).
    List(Vec<DefaultValue>),
}

impl DefaultValue {
    /// Creates a function default with no arguments.
    ///
    /// # Examples
    ///
    /// ```
    /// use prismix_core::DefaultValue;
    ///
    /// let value = DefaultValue::function("autoincrement");
    /// assert_eq!(value.to_string(), "autoincrement()");
    /// ```
    pub fn function(name: &str) -> Self {
        Self::Function {
            name: name.to_string(),
            args: Vec::new(),
        }
    }
}

impl std::fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
            Self::Function { name, args } => write!(f, "{name}({})", args.join(", ")),
            Self::List(values) => {
                let items: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

/// Relation metadata of an `object` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RelationInfo {
    /// Relation name (explicit or implicit `AToB`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Columns on this model holding the foreign key.
    #[serde(rename = "relationFromFields", default)]
    pub from_fields: Vec<String>,
    /// Referenced columns on the related model.
    #[serde(rename = "relationToFields", default)]
    pub to_fields: Vec<String>,
    /// Referential action on delete.
    #[serde(rename = "relationOnDelete", default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
    /// Referential action on update. Recovered by the text scanner only.
    #[serde(rename = "relationOnUpdate", default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
}

impl RelationInfo {
    /// Creates relation metadata with only a relation name (back-relation side).
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Sets the own/referenced column lists.
    pub fn with_columns(mut self, from_fields: &[&str], to_fields: &[&str]) -> Self {
        self.from_fields = from_fields.iter().map(|s| s.to_string()).collect();
        self.to_fields = to_fields.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Sets the on-delete referential action.
    pub fn with_on_delete(mut self, action: &str) -> Self {
        self.on_delete = Some(action.to_string());
        self
    }
}

/// A model field.
///
/// Use the constructors [`scalar`](Field::scalar),
/// [`enumeration`](Field::enumeration) and [`relation`](Field::relation), then
/// chain builder methods.
///
/// # Examples
///
/// ```
/// use prismix_core::{DefaultValue, Field, FieldKind};
///
/// let id = Field::scalar("id", "Int")
///     .id()
///     .with_default(DefaultValue::function("autoincrement"));
/// assert_eq!(id.kind, FieldKind::Scalar);
/// assert!(id.is_id && id.is_required);
///
/// let tags = Field::scalar("tags", "String").list();
/// assert!(tags.is_list && !tags.is_required);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    /// Declared type name (`String`, `User`, `Role`, ...).
    #[serde(rename = "type")]
    pub field_type: String,
    pub is_required: bool,
    pub is_list: bool,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_id: bool,
    #[serde(default)]
    pub is_updated_at: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// Present iff `kind` is [`FieldKind::Object`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationInfo>,
    /// Explicit column name (`@map`). Recovered by the text scanner only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    /// Native database type without the `@db.` prefix (e.g. `VarChar(255)`).
    /// Recovered by the text scanner only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_type: Option<String>,
}

impl Field {
    fn new(name: &str, kind: FieldKind, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            field_type: field_type.to_string(),
            is_required: true,
            is_list: false,
            is_unique: false,
            is_id: false,
            is_updated_at: false,
            default: None,
            relation: None,
            column_name: None,
            native_type: None,
        }
    }

    /// Creates a required scalar field.
    pub fn scalar(name: &str, field_type: &str) -> Self {
        Self::new(name, FieldKind::Scalar, field_type)
    }

    /// Creates a required enum field.
    pub fn enumeration(name: &str, enum_name: &str) -> Self {
        Self::new(name, FieldKind::Enum, enum_name)
    }

    /// Creates a required relation field.
    pub fn relation(name: &str, model: &str, relation: RelationInfo) -> Self {
        let mut field = Self::new(name, FieldKind::Object, model);
        field.relation = Some(relation);
        field
    }

    /// Creates a field whose column type the schema language cannot express.
    pub fn unsupported(name: &str, field_type: &str) -> Self {
        Self::new(name, FieldKind::Unsupported, field_type)
    }

    /// Marks the field optional (`Type?`).
    pub fn optional(mut self) -> Self {
        self.is_required = false;
        self
    }

    /// Marks the field as a list (`Type[]`).
    pub fn list(mut self) -> Self {
        self.is_list = true;
        self.is_required = false;
        self
    }

    /// Marks the field as the model identity (`@id`).
    pub fn id(mut self) -> Self {
        self.is_id = true;
        self
    }

    /// Marks the field unique (`@unique`).
    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Marks the field as auto-updated timestamp (`@updatedAt`).
    pub fn updated_at(mut self) -> Self {
        self.is_updated_at = true;
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the explicit column name.
    pub fn with_column_name(mut self, column: &str) -> Self {
        self.column_name = Some(column.to_string());
        self
    }

    /// Sets the native database type.
    pub fn with_native_type(mut self, native_type: &str) -> Self {
        self.native_type = Some(native_type.to_string());
        self
    }

    /// Returns `true` if this is a relation field.
    pub fn is_relation(&self) -> bool {
        self.kind == FieldKind::Object
    }
}

/// A named uniqueness group (`@@unique([a, b], name: "...")`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub fields: Vec<String>,
}

impl UniqueConstraint {
    /// Creates an unnamed uniqueness group.
    pub fn new(fields: &[&str]) -> Self {
        Self {
            name: None,
            fields: fields.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Sets the constraint name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// Compound primary key (`@@id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub fields: Vec<String>,
}

/// A model (table definition).
///
/// # Examples
///
/// ```
/// use prismix_core::{Field, Model};
///
/// let user = Model::new("User")
///     .with_field(Field::scalar("id", "Int").id())
///     .with_field(Field::scalar("email", "String").unique());
/// assert_eq!(user.field_names(), vec!["id", "email"]);
/// assert!(user.find_field("email").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub name: String,
    /// Table name mapping (`@@map`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    pub fields: Vec<Field>,
    /// Explicit identity field list (`@@id([...])`).
    #[serde(default)]
    pub id_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<PrimaryKey>,
    /// Uniqueness groups (`@@unique`).
    #[serde(default)]
    pub unique_fields: Vec<UniqueConstraint>,
    /// Raw `@@index(...)` declarations recovered from the source text.
    #[serde(default)]
    pub index_declarations: Vec<String>,
}

impl Model {
    /// Creates an empty model.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            db_name: None,
            fields: Vec::new(),
            id_fields: Vec::new(),
            primary_key: None,
            unique_fields: Vec::new(),
            index_declarations: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Sets the table name mapping.
    pub fn with_db_name(mut self, db_name: &str) -> Self {
        self.db_name = Some(db_name.to_string());
        self
    }

    /// Appends a uniqueness group.
    pub fn with_unique(mut self, unique: UniqueConstraint) -> Self {
        self.unique_fields.push(unique);
        self
    }

    /// Looks up a field by name.
    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a mutable field by name.
    pub fn find_field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Returns field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// One enum variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub name: String,
    /// Raw mapped name (`@map`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
}

/// An enum declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enum {
    pub name: String,
    pub values: Vec<EnumValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
}

impl Enum {
    /// Creates an enum with unmapped values.
    pub fn new(name: &str, values: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            values: values
                .iter()
                .map(|v| EnumValue {
                    name: v.to_string(),
                    db_name: None,
                })
                .collect(),
            db_name: None,
        }
    }
}

/// A config value that is either a literal or an `env("VAR")` reference.
///
/// # Examples
///
/// ```
/// use prismix_core::EnvValue;
///
/// let literal = EnvValue::literal("file:./dev.db");
/// assert!(literal.has_value());
///
/// let unresolved = EnvValue::env("DATABASE_URL", None);
/// assert!(!unresolved.has_value());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnvValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_env_var: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl EnvValue {
    /// Creates a literal value.
    pub fn literal(value: &str) -> Self {
        Self {
            from_env_var: None,
            value: Some(value.to_string()),
        }
    }

    /// Creates an environment reference with its resolved value, if any.
    pub fn env(var: &str, resolved: Option<&str>) -> Self {
        Self {
            from_env_var: Some(var.to_string()),
            value: resolved.map(String::from),
        }
    }

    /// Returns `true` if a concrete value is known.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

/// A `datasource` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datasource {
    pub name: String,
    pub active_provider: String,
    pub url: EnvValue,
}

/// A `generator` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generator {
    pub name: String,
    pub provider: EnvValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<EnvValue>,
    #[serde(default)]
    pub binary_targets: Vec<String>,
    #[serde(default)]
    pub preview_features: Vec<String>,
}

impl Generator {
    /// Creates a generator with a literal provider.
    pub fn new(name: &str, provider: &str) -> Self {
        Self {
            name: name.to_string(),
            provider: EnvValue::literal(provider),
            output: None,
            binary_targets: Vec::new(),
            preview_features: Vec::new(),
        }
    }
}

/// Models and enums of one parsed source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Datamodel {
    pub models: Vec<Model>,
    pub enums: Vec<Enum>,
}

/// Datasources and generators of one parsed source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Configuration {
    pub datasources: Vec<Datasource>,
    pub generators: Vec<Generator>,
}

/// A complete structured schema (one fragment, or the merged result).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Schema {
    pub models: Vec<Model>,
    pub enums: Vec<Enum>,
    pub datasources: Vec<Datasource>,
    pub generators: Vec<Generator>,
}

impl Schema {
    /// Combines the two halves produced by a [`SchemaParser`](crate::SchemaParser).
    pub fn from_parts(datamodel: Datamodel, configuration: Configuration) -> Self {
        Self {
            models: datamodel.models,
            enums: datamodel.enums,
            datasources: configuration.datasources,
            generators: configuration.generators,
        }
    }

    /// Looks up a model by name.
    pub fn find_model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Returns `true` if at least one datasource has a concrete url.
    pub fn has_concrete_datasource(&self) -> bool {
        self.datasources.iter().any(|d| d.url.has_value())
    }
}
