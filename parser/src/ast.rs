//! Syntax tree produced by the parser before lowering.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaAst {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Model,
    Enum,
    Datasource,
    Generator,
}

impl BlockKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "model" => Some(Self::Model),
            "enum" => Some(Self::Enum),
            "datasource" => Some(Self::Datasource),
            "generator" => Some(Self::Generator),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Enum => "enum",
            Self::Datasource => "datasource",
            Self::Generator => "generator",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub name: String,
    pub line: usize,
    pub body: BlockBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockBody {
    Model {
        fields: Vec<FieldDecl>,
        attributes: Vec<Attribute>,
    },
    Enum {
        values: Vec<EnumValueDecl>,
        attributes: Vec<Attribute>,
    },
    Config {
        properties: Vec<Property>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Required,
    Optional,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    /// Column type text of `Unsupported("...")`.
    pub unsupported: Option<String>,
    pub arity: Arity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub field_type: TypeRef,
    pub attributes: Vec<Attribute>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueDecl {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub key: String,
    pub value: Expr,
    pub line: usize,
}

/// `@name(args)` or `@@name(args)`; dotted names such as `db.VarChar` are
/// joined with `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub args: Vec<Argument>,
    pub line: usize,
}

impl Attribute {
    /// The argument called `name`, or else the first unnamed argument.
    pub fn arg(&self, name: &str) -> Option<&Expr> {
        self.args
            .iter()
            .find(|arg| arg.name.as_deref() == Some(name))
            .or_else(|| self.args.iter().find(|arg| arg.name.is_none()))
            .map(|arg| &arg.value)
    }

    /// Argument called `name` only.
    pub fn named_arg(&self, name: &str) -> Option<&Expr> {
        self.args
            .iter()
            .find(|arg| arg.name.as_deref() == Some(name))
            .map(|arg| &arg.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Expr,
}

impl Argument {
    pub fn to_source(&self) -> String {
        match &self.name {
            Some(name) => format!("{name}: {}", self.value.to_source()),
            None => self.value.to_source(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Str(String),
    Number(String),
    /// Identifier or dotted path (`Cascade`, `true`, `db.Uuid`).
    Path(String),
    Call { name: String, args: Vec<Argument> },
    Array(Vec<Expr>),
}

impl Expr {
    /// Writes the expression back as schema text.
    pub fn to_source(&self) -> String {
        match self {
            Self::Str(value) => {
                let escaped = value
                    .replace('\\', "\\\\")
                    .replace('"', "\\\"")
                    .replace('\n', "\\n");
                format!("\"{escaped}\"")
            }
            Self::Number(value) | Self::Path(value) => value.clone(),
            Self::Call { name, args } => {
                let args: Vec<String> = args.iter().map(Argument::to_source).collect();
                format!("{name}({})", args.join(", "))
            }
            Self::Array(items) => {
                let items: Vec<String> = items.iter().map(Expr::to_source).collect();
                format!("[{}]", items.join(", "))
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&str> {
        match self {
            Self::Path(value) => Some(value),
            _ => None,
        }
    }

    /// Items of an array of identifiers (`[a, b]`). A single identifier is
    /// accepted as a one-element list.
    pub fn as_path_list(&self) -> Option<Vec<String>> {
        match self {
            Self::Array(items) => items
                .iter()
                .map(|item| match item {
                    // `@@index([title(ops: raw("x"))])` style entries keep their name
                    Self::Call { name, .. } => Some(name.clone()),
                    other => other.as_path().map(String::from),
                })
                .collect(),
            Self::Path(value) => Some(vec![value.clone()]),
            _ => None,
        }
    }
}
