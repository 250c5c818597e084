//! Tokenizer for schema source text.

use crate::error::{ParseError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Number(String),
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Equals,
    Question,
    Dot,
    At,
    DoubleAt,
    Newline,
    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "identifier `{name}`"),
            Self::Str(value) => write!(f, "string \"{value}\""),
            Self::Number(value) => write!(f, "number `{value}`"),
            Self::LBrace => f.write_str("`{`"),
            Self::RBrace => f.write_str("`}`"),
            Self::LParen => f.write_str("`(`"),
            Self::RParen => f.write_str("`)`"),
            Self::LBracket => f.write_str("`[`"),
            Self::RBracket => f.write_str("`]`"),
            Self::Comma => f.write_str("`,`"),
            Self::Colon => f.write_str("`:`"),
            Self::Equals => f.write_str("`=`"),
            Self::Question => f.write_str("`?`"),
            Self::Dot => f.write_str("`.`"),
            Self::At => f.write_str("`@`"),
            Self::DoubleAt => f.write_str("`@@`"),
            Self::Newline => f.write_str("end of line"),
            Self::Eof => f.write_str("end of file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

/// Splits `source` into tokens.
///
/// Newlines are significant (one declaration per line) except inside
/// parentheses and brackets, where arguments may span lines. Comments,
/// including `///` doc comments, are dropped.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;
    let mut depth = 0usize;

    while let Some(ch) = chars.next() {
        let kind = match ch {
            '\n' => {
                let current = line;
                line += 1;
                if depth > 0 {
                    continue;
                }
                tokens.push(Token {
                    kind: TokenKind::Newline,
                    line: current,
                });
                continue;
            }
            c if c.is_whitespace() => continue,
            '/' => {
                if chars.peek() != Some(&'/') {
                    return Err(ParseError::syntax(line, "unexpected character `/`"));
                }
                while chars.peek().is_some_and(|&next| next != '\n') {
                    chars.next();
                }
                continue;
            }
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '(' => {
                depth += 1;
                TokenKind::LParen
            }
            ')' => {
                depth = depth.saturating_sub(1);
                TokenKind::RParen
            }
            '[' => {
                depth += 1;
                TokenKind::LBracket
            }
            ']' => {
                depth = depth.saturating_sub(1);
                TokenKind::RBracket
            }
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '=' => TokenKind::Equals,
            '?' => TokenKind::Question,
            '.' => TokenKind::Dot,
            '@' => {
                if chars.peek() == Some(&'@') {
                    chars.next();
                    TokenKind::DoubleAt
                } else {
                    TokenKind::At
                }
            }
            '"' => TokenKind::Str(read_string(&mut chars, line)?),
            c if c.is_ascii_digit() || (c == '-' && chars.peek().is_some_and(char::is_ascii_digit)) => {
                let mut number = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_digit() || next == '.' {
                        number.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                TokenKind::Number(number)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        ident.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                TokenKind::Ident(ident)
            }
            other => {
                return Err(ParseError::syntax(
                    line,
                    format!("unexpected character `{other}`"),
                ));
            }
        };
        tokens.push(Token { kind, line });
    }

    tokens.push(Token {
        kind: TokenKind::Newline,
        line,
    });
    tokens.push(Token {
        kind: TokenKind::Eof,
        line,
    });
    Ok(tokens)
}

fn read_string(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, line: usize) -> Result<String> {
    let mut value = String::new();
    loop {
        match chars.next() {
            Some('"') => return Ok(value),
            Some('\\') => match chars.next() {
                Some('"') => value.push('"'),
                Some('\\') => value.push('\\'),
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some(other) => {
                    return Err(ParseError::syntax(
                        line,
                        format!("unknown escape sequence `\\{other}`"),
                    ));
                }
                None => break,
            },
            Some('\n') | None => break,
            Some(other) => value.push(other),
        }
    }
    Err(ParseError::syntax(line, "unterminated string literal"))
}
