//! Recursive-descent parser from tokens to [`SchemaAst`].

use crate::ast::{
    Argument, Arity, Attribute, Block, BlockBody, BlockKind, EnumValueDecl, Expr, FieldDecl,
    Property, SchemaAst, TypeRef,
};
use crate::error::{ParseError, Result};
use crate::lexer::{Token, TokenKind, tokenize};

/// Parses schema source text into a syntax tree.
pub fn parse_ast(source: &str) -> Result<SchemaAst> {
    let tokens = tokenize(source)?;
    Parser { tokens, pos: 0 }.parse_schema()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn line(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].line
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::syntax(
            self.line(),
            format!("expected {expected}, found {}", self.peek()),
        )
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<()> {
        if *self.peek() == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<String> {
        match self.peek() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn skip_newlines(&mut self) {
        while *self.peek() == TokenKind::Newline {
            self.advance();
        }
    }

    /// A declaration ends at a newline or right before the closing brace.
    fn end_of_declaration(&mut self) -> Result<()> {
        match self.peek() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::RBrace => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    fn parse_schema(mut self) -> Result<SchemaAst> {
        let mut blocks = Vec::new();
        loop {
            self.skip_newlines();
            if *self.peek() == TokenKind::Eof {
                break;
            }
            blocks.push(self.parse_block()?);
        }
        Ok(SchemaAst { blocks })
    }

    fn parse_block(&mut self) -> Result<Block> {
        let line = self.line();
        let keyword = self.expect_ident("block keyword")?;
        let kind = BlockKind::from_keyword(&keyword).ok_or_else(|| {
            ParseError::syntax(line, format!("unknown block type `{keyword}`"))
        })?;
        let name = self.expect_ident("block name")?;
        self.expect(TokenKind::LBrace, "`{`")?;

        let body = match kind {
            BlockKind::Model => self.parse_model_body()?,
            BlockKind::Enum => self.parse_enum_body()?,
            BlockKind::Datasource | BlockKind::Generator => self.parse_config_body()?,
        };
        self.expect(TokenKind::RBrace, "`}`")?;

        Ok(Block {
            kind,
            name,
            line,
            body,
        })
    }

    fn parse_model_body(&mut self) -> Result<BlockBody> {
        let mut fields = Vec::new();
        let mut attributes = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek() {
                TokenKind::RBrace => break,
                TokenKind::DoubleAt => {
                    self.advance();
                    attributes.push(self.parse_attribute()?);
                }
                _ => fields.push(self.parse_field()?),
            }
            self.end_of_declaration()?;
        }
        Ok(BlockBody::Model { fields, attributes })
    }

    fn parse_enum_body(&mut self) -> Result<BlockBody> {
        let mut values = Vec::new();
        let mut attributes = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek() {
                TokenKind::RBrace => break,
                TokenKind::DoubleAt => {
                    self.advance();
                    attributes.push(self.parse_attribute()?);
                }
                _ => {
                    let line = self.line();
                    let name = self.expect_ident("enum value")?;
                    let attributes = self.parse_field_attributes()?;
                    values.push(EnumValueDecl {
                        name,
                        attributes,
                        line,
                    });
                }
            }
            self.end_of_declaration()?;
        }
        Ok(BlockBody::Enum { values, attributes })
    }

    fn parse_config_body(&mut self) -> Result<BlockBody> {
        let mut properties = Vec::new();
        loop {
            self.skip_newlines();
            if *self.peek() == TokenKind::RBrace {
                break;
            }
            let line = self.line();
            let key = self.expect_ident("property name")?;
            self.expect(TokenKind::Equals, "`=`")?;
            let value = self.parse_expr()?;
            properties.push(Property { key, value, line });
            self.end_of_declaration()?;
        }
        Ok(BlockBody::Config { properties })
    }

    fn parse_field(&mut self) -> Result<FieldDecl> {
        let line = self.line();
        let name = self.expect_ident("field name")?;
        let field_type = self.parse_type()?;
        let attributes = self.parse_field_attributes()?;
        Ok(FieldDecl {
            name,
            field_type,
            attributes,
            line,
        })
    }

    fn parse_type(&mut self) -> Result<TypeRef> {
        let name = self.expect_ident("field type")?;
        let mut unsupported = None;
        if *self.peek() == TokenKind::LParen {
            if name != "Unsupported" {
                return Err(self.unexpected("field attribute or end of line"));
            }
            self.advance();
            match self.advance() {
                TokenKind::Str(column_type) => unsupported = Some(column_type),
                _ => {
                    return Err(ParseError::syntax(
                        self.line(),
                        "Unsupported(...) takes a string literal",
                    ));
                }
            }
            self.expect(TokenKind::RParen, "`)`")?;
        }

        let arity = match self.peek() {
            TokenKind::Question => {
                self.advance();
                Arity::Optional
            }
            TokenKind::LBracket => {
                self.advance();
                self.expect(TokenKind::RBracket, "`]`")?;
                Arity::List
            }
            _ => Arity::Required,
        };

        Ok(TypeRef {
            name,
            unsupported,
            arity,
        })
    }

    fn parse_field_attributes(&mut self) -> Result<Vec<Attribute>> {
        let mut attributes = Vec::new();
        while *self.peek() == TokenKind::At {
            self.advance();
            attributes.push(self.parse_attribute()?);
        }
        Ok(attributes)
    }

    /// Parses the part after `@` / `@@`.
    fn parse_attribute(&mut self) -> Result<Attribute> {
        let line = self.line();
        let name = self.parse_path()?;
        let args = if *self.peek() == TokenKind::LParen {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Attribute { name, args, line })
    }

    fn parse_path(&mut self) -> Result<String> {
        let mut path = self.expect_ident("identifier")?;
        while *self.peek() == TokenKind::Dot {
            self.advance();
            path.push('.');
            path.push_str(&self.expect_ident("identifier after `.`")?);
        }
        Ok(path)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Argument>> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        while *self.peek() != TokenKind::RParen {
            let name = match (self.peek(), self.peek_at(1)) {
                (TokenKind::Ident(name), TokenKind::Colon) => {
                    let name = name.clone();
                    self.advance();
                    self.advance();
                    Some(name)
                }
                _ => None,
            };
            let value = self.parse_expr()?;
            args.push(Argument { name, value });
            if *self.peek() == TokenKind::Comma {
                self.advance();
            } else if *self.peek() != TokenKind::RParen {
                return Err(self.unexpected("`,` or `)`"));
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(args)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        match self.peek().clone() {
            TokenKind::Str(value) => {
                self.advance();
                Ok(Expr::Str(value))
            }
            TokenKind::Number(value) => {
                self.advance();
                Ok(Expr::Number(value))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                while *self.peek() != TokenKind::RBracket {
                    items.push(self.parse_expr()?);
                    if *self.peek() == TokenKind::Comma {
                        self.advance();
                    } else if *self.peek() != TokenKind::RBracket {
                        return Err(self.unexpected("`,` or `]`"));
                    }
                }
                self.advance();
                Ok(Expr::Array(items))
            }
            TokenKind::Ident(_) => {
                let name = self.parse_path()?;
                if *self.peek() == TokenKind::LParen {
                    let args = self.parse_arguments()?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Path(name))
                }
            }
            _ => Err(self.unexpected("value")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_body(source: &str) -> (Vec<FieldDecl>, Vec<Attribute>) {
        let ast = parse_ast(source).expect("parse");
        match ast.blocks.into_iter().next().map(|b| b.body) {
            Some(BlockBody::Model { fields, attributes }) => (fields, attributes),
            other => panic!("expected model body, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_model_fields_and_arity() {
        let (fields, _) = model_body(
            "model User {\n  id Int @id\n  nickname String?\n  tags String[]\n}\n",
        );
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].field_type.arity, Arity::Required);
        assert_eq!(fields[1].field_type.arity, Arity::Optional);
        assert_eq!(fields[2].field_type.arity, Arity::List);
        assert_eq!(fields[0].attributes[0].name, "id");
    }

    #[test]
    fn test_parse_named_arguments_and_arrays() {
        let (fields, attributes) = model_body(
            "model Post {\n  author User @relation(\"Authored\", fields: [authorId], references: [id], onDelete: Cascade)\n  @@unique([title, authorId], name: \"title_author\")\n}",
        );
        let relation = &fields[0].attributes[0];
        assert_eq!(relation.name, "relation");
        assert_eq!(relation.arg("name"), Some(&Expr::Str("Authored".into())));
        assert_eq!(
            relation.named_arg("fields").and_then(Expr::as_path_list),
            Some(vec!["authorId".to_string()])
        );
        assert_eq!(
            relation.named_arg("onDelete"),
            Some(&Expr::Path("Cascade".into()))
        );
        assert_eq!(attributes[0].name, "unique");
        assert_eq!(
            attributes[0].named_arg("name"),
            Some(&Expr::Str("title_author".into()))
        );
    }

    #[test]
    fn test_parse_dotted_native_type_attribute() {
        let (fields, _) = model_body("model A {\n  name String @db.VarChar(255)\n}");
        assert_eq!(fields[0].attributes[0].name, "db.VarChar");
        assert_eq!(fields[0].attributes[0].args[0].value, Expr::Number("255".into()));
    }

    #[test]
    fn test_parse_unsupported_type() {
        let (fields, _) = model_body("model Shop {\n  location Unsupported(\"point\")?\n}");
        assert_eq!(fields[0].field_type.unsupported.as_deref(), Some("point"));
        assert_eq!(fields[0].field_type.arity, Arity::Optional);
    }

    #[test]
    fn test_parse_single_line_block() {
        let (fields, _) = model_body("model User { id Int @id }");
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_parse_config_properties() {
        let ast = parse_ast(
            "datasource db {\n  provider = \"postgresql\"\n  url = env(\"DATABASE_URL\")\n}",
        )
        .unwrap();
        let BlockBody::Config { properties } = &ast.blocks[0].body else {
            panic!("expected config body");
        };
        assert_eq!(properties[0].key, "provider");
        assert!(matches!(&properties[1].value, Expr::Call { name, .. } if name == "env"));
    }

    #[test]
    fn test_function_default_round_trips_to_source() {
        let (fields, _) = model_body(
            "model A {\n  id String @default(dbgenerated(\"gen_random_uuid()\"))\n}",
        );
        let default = fields[0].attributes[0].arg("value").unwrap();
        assert_eq!(default.to_source(), "dbgenerated(\"gen_random_uuid()\")");
    }

    #[test]
    fn test_two_fields_on_one_line_is_rejected() {
        let err = parse_ast("model A {\n  id Int name String\n}").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 2, .. }));
    }

    #[test]
    fn test_unknown_block_keyword_is_rejected() {
        let err = parse_ast("table A {\n}").unwrap_err();
        assert!(err.to_string().contains("unknown block type `table`"));
    }

    #[test]
    fn test_unclosed_block_is_rejected() {
        let err = parse_ast("model A {\n  id Int\n").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }
}
