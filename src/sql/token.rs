//! Tokens for every statement sent to the table index store.
//!
//! Queries, DDL and row DML are all assembled as a [`TokenStream`] and
//! serialized once. Physical identifiers from [`naming`](super::naming)
//! are emitted bare; anything caller-supplied goes through a quoting
//! token or becomes a bind.

use std::fmt::{self, Write};

/// One element of generated SQL.
///
/// Adding a variant forces every match below to handle it.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Query keywords
    Select,
    Distinct,
    From,
    Join,
    Left,
    Right,
    On,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Asc,
    Desc,
    Limit,
    Offset,
    As,

    // Predicates
    And,
    Or,
    Not,
    Is,
    In,
    Between,
    Like,
    Escape,
    Null,
    True,
    False,
    Case,
    When,
    Then,
    Else,
    End,

    // DDL
    Create,
    Alter,
    Drop,
    Table,
    Column,
    Columns,
    Index,
    Primary,
    Key,
    Add,
    Modify,
    Rename,
    To,
    If,
    Exists,
    Show,

    // DML
    Insert,
    Replace,
    Into,
    Values,
    Duplicate,
    Update,
    Delete,

    // Punctuation and operators
    Comma,
    Dot,
    Star,
    LParen,
    RParen,
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Space,

    /// Physical name such as `T123`, `_C1_` or `ROW_ID`.
    ///
    /// Never built from caller text, so it is emitted unquoted.
    Ident(String),
    /// Caller-supplied alias, backtick quoted with backticks doubled.
    QuotedIdent(String),
    /// Named placeholder, `:<name>`.
    Bind(String),
    LitInt(i64),
    LitString(String),
    /// Upper-cased on output.
    FunctionName(String),
    /// Static SQL fragment such as physical type syntax.
    ///
    /// Never caller input.
    Raw(String),
}

impl Token {
    /// Fixed text of a keyword, operator or punctuation token.
    fn fixed(&self) -> Option<&'static str> {
        let text = match self {
            Token::Select => "SELECT",
            Token::Distinct => "DISTINCT",
            Token::From => "FROM",
            Token::Join => "JOIN",
            Token::Left => "LEFT",
            Token::Right => "RIGHT",
            Token::On => "ON",
            Token::Where => "WHERE",
            Token::GroupBy => "GROUP BY",
            Token::Having => "HAVING",
            Token::OrderBy => "ORDER BY",
            Token::Asc => "ASC",
            Token::Desc => "DESC",
            Token::Limit => "LIMIT",
            Token::Offset => "OFFSET",
            Token::As => "AS",

            Token::And => "AND",
            Token::Or => "OR",
            Token::Not => "NOT",
            Token::Is => "IS",
            Token::In => "IN",
            Token::Between => "BETWEEN",
            Token::Like => "LIKE",
            Token::Escape => "ESCAPE",
            Token::Null => "NULL",
            Token::True => "TRUE",
            Token::False => "FALSE",
            Token::Case => "CASE",
            Token::When => "WHEN",
            Token::Then => "THEN",
            Token::Else => "ELSE",
            Token::End => "END",

            Token::Create => "CREATE",
            Token::Alter => "ALTER",
            Token::Drop => "DROP",
            Token::Table => "TABLE",
            Token::Column => "COLUMN",
            Token::Columns => "COLUMNS",
            Token::Index => "INDEX",
            Token::Primary => "PRIMARY",
            Token::Key => "KEY",
            Token::Add => "ADD",
            Token::Modify => "MODIFY",
            Token::Rename => "RENAME",
            Token::To => "TO",
            Token::If => "IF",
            Token::Exists => "EXISTS",
            Token::Show => "SHOW",

            Token::Insert => "INSERT",
            Token::Replace => "REPLACE",
            Token::Into => "INTO",
            Token::Values => "VALUES",
            Token::Duplicate => "DUPLICATE",
            Token::Update => "UPDATE",
            Token::Delete => "DELETE",

            Token::Comma => ",",
            Token::Dot => ".",
            Token::Star | Token::Mul => "*",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Eq => "=",
            Token::Ne => "<>",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Lte => "<=",
            Token::Gte => ">=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Div => "/",
            Token::Mod => "%",
            Token::Space => " ",

            Token::Ident(_)
            | Token::QuotedIdent(_)
            | Token::Bind(_)
            | Token::LitInt(_)
            | Token::LitString(_)
            | Token::FunctionName(_)
            | Token::Raw(_) => return None,
        };
        Some(text)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = self.fixed() {
            return f.write_str(text);
        }
        match self {
            Token::Ident(name) | Token::Raw(name) => f.write_str(name),
            Token::QuotedIdent(name) => write!(f, "`{}`", name.replace('`', "``")),
            Token::Bind(name) => write!(f, ":{}", name),
            Token::LitInt(n) => write!(f, "{}", n),
            Token::LitString(s) => f.write_str(&quote_string(s)),
            Token::FunctionName(name) => f.write_str(&name.to_uppercase()),
            _ => Ok(()),
        }
    }
}

/// Shortest round-trip text of a double.
///
/// Non-finite values have no SQL literal; they live in the shadow column
/// and render as `NULL` here.
pub fn format_float(f: f64) -> String {
    if !f.is_finite() {
        return "NULL".into();
    }
    ryu::Buffer::new().format(f).to_string()
}

/// Single-quoted string literal, MySQL escaping.
pub fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}

/// Ordered tokens, serialized into one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        self.tokens.extend(tokens);
        self
    }

    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    /// Append each stream, separated by `, `.
    pub fn comma_separated<'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a TokenStream>,
    ) -> &mut Self {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.comma().space();
            }
            self.append(item);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            // Writing to a String cannot fail.
            let _ = write!(out, "{}", token);
        }
        out
    }

    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }

    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }

    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }

    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }

    pub fn ident(&mut self, name: impl Into<String>) -> &mut Self {
        self.push(Token::Ident(name.into()))
    }
}
