//! Hand-written lexer for the amod language.
//!
//! Two bits of state make this a hand-rolled lexer instead of a regex
//! dispatch:
//!
//! - *pattern mode*: between `[` and `]` whitespace is significant (it
//!   separates slots), `*` is a wildcard, and `?name` is a variable. A run
//!   of whitespace is emitted as a single `PatternSpace` token. Outside a
//!   pattern, whitespace is discarded.
//! - *section scoping*: the identifier set which counts as keywords depends
//!   on which `~~ section ~~` we are currently lexing.
//!
//! Line endings are normalized (`\r\n` and `\r` become `\n`) before lexing.

use std::fmt;

/// The four file sections, in the order they must appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Model,
    Config,
    Init,
    Productions,
}

impl Section {
    pub fn name(self) -> &'static str {
        match self {
            Section::Model => "model",
            Section::Config => "config",
            Section::Init => "init",
            Section::Productions => "productions",
        }
    }

    fn from_name(name: &str) -> Option<Section> {
        match name {
            "model" => Some(Section::Model),
            "config" => Some(Section::Config),
            "init" => Some(Section::Init),
            "productions" => Some(Section::Productions),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Comment,
    Ident,
    Keyword,
    Number,
    Str,
    Char,
    Equality,
    Inequality,
    SectionHeader,
    PatternSpace,
    PatternVar,
    PatternWildcard,
    Eof,
    Error,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Comment => "comment",
            TokenKind::Ident => "identifier",
            TokenKind::Keyword => "keyword",
            TokenKind::Number => "number",
            TokenKind::Str => "string",
            TokenKind::Char => "char",
            TokenKind::Equality => "equality",
            TokenKind::Inequality => "inequality",
            TokenKind::SectionHeader => "section header",
            TokenKind::PatternSpace => "space",
            TokenKind::PatternVar => "pattern var",
            TokenKind::PatternWildcard => "pattern wildcard",
            TokenKind::Eof => "EOF",
            TokenKind::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// One lexeme. `value` holds the raw source text (strings keep their
/// quotes - the parser unquotes them). Columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    /// Column one past the last character of this token.
    pub fn column_end(&self) -> usize {
        self.column + self.value.chars().count()
    }
}

// Keywords are scoped per section so e.g. `match` stays a plain identifier
// in the config section.
const KEYWORDS_MODEL: &[&str] = &["authors", "description", "examples", "name", "nil"];
const KEYWORDS_CONFIG: &[&str] = &["chunks", "gactar", "modules", "nil"];
const KEYWORDS_INIT: &[&str] = &["nil", "similar"];
const KEYWORDS_PRODUCTIONS: &[&str] = &[
    "clear",
    "description",
    "do",
    "is",
    "match",
    "nil",
    "print",
    "recall",
    "set",
    "stop",
    "to",
    "when",
    "with",
];

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    line_start: usize, // index into chars of the first char of the current line

    section: Section,
    in_pattern: bool,
    emitted_eof: bool,
}

impl Lexer {
    pub fn new(src: &str) -> Self {
        let normalized = src.replace("\r\n", "\n").replace('\r', "\n");
        Self {
            chars: normalized.chars().collect(),
            pos: 0,
            line: 1,
            line_start: 0,
            section: Section::Model,
            in_pattern: false,
            emitted_eof: false,
        }
    }

    /// Lex the whole input. Always ends in either an `Eof` or an `Error`
    /// token; lexing stops at the first error.
    pub fn tokenize(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        let mut tokens = Vec::new();
        for token in &mut lexer {
            let is_err = token.kind == TokenKind::Error;
            tokens.push(token);
            if is_err {
                break;
            }
        }
        tokens
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(c)
    }

    fn column(&self, start: usize) -> usize {
        start - self.line_start + 1
    }

    fn token(&self, kind: TokenKind, start: usize, line: usize, column: usize) -> Token {
        Token {
            kind,
            value: self.chars[start..self.pos].iter().collect(),
            line,
            column,
        }
    }

    fn error_token(&self, message: &str, line: usize, column: usize) -> Token {
        Token {
            kind: TokenKind::Error,
            value: message.to_string(),
            line,
            column,
        }
    }

    fn is_ident_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    fn lookup_keyword(&self, id: &str) -> bool {
        let keywords = match self.section {
            Section::Model => KEYWORDS_MODEL,
            Section::Config => KEYWORDS_CONFIG,
            Section::Init => KEYWORDS_INIT,
            Section::Productions => KEYWORDS_PRODUCTIONS,
        };
        keywords.contains(&id)
    }

    /// Consume whitespace. In pattern mode the caller turns the run into a
    /// `PatternSpace` token; outside patterns it is simply discarded.
    fn eat_space(&mut self) -> bool {
        let mut ate = false;
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' || c == '\n' {
                self.bump();
                ate = true;
            } else {
                break;
            }
        }
        ate
    }

    fn lex_identifier(&mut self, start: usize, line: usize, column: usize) -> Token {
        while let Some(c) = self.peek() {
            if Self::is_ident_char(c) {
                self.bump();
            } else {
                break;
            }
        }

        let value: String = self.chars[start..self.pos].iter().collect();

        let kind = if value.starts_with('?') {
            TokenKind::PatternVar
        } else if self.lookup_keyword(&value) {
            TokenKind::Keyword
        } else {
            TokenKind::Ident
        };

        Token {
            kind,
            value,
            line,
            column,
        }
    }

    fn lex_number(&mut self, start: usize, line: usize, column: usize) -> Token {
        // optional sign was already consumed by the caller
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') && !self.chars[start..self.pos].contains(&'.') {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        self.token(TokenKind::Number, start, line, column)
    }

    fn lex_string(&mut self, quote: char, start: usize, line: usize, column: usize) -> Token {
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some('\n') | None => {
                        return self.error_token("unterminated quoted string", line, column);
                    }
                    Some(_) => {}
                },
                Some('\n') | None => {
                    return self.error_token("unterminated quoted string", line, column);
                }
                Some(c) if c == quote => break,
                Some(_) => {}
            }
        }
        self.token(TokenKind::Str, start, line, column)
    }

    /// Lex `~~ name ~~`. The opening `~~` has been consumed.
    fn lex_section_header(&mut self, line: usize, column: usize) -> Token {
        self.eat_space();

        let name_start = self.pos;
        while self.peek().is_some_and(Self::is_ident_char) {
            self.bump();
        }
        let name: String = self.chars[name_start..self.pos].iter().collect();

        self.eat_space();

        let closed = self.peek() == Some('~') && self.peek_at(1) == Some('~');
        if closed {
            self.bump();
            self.bump();
        }

        match Section::from_name(&name) {
            Some(section) if closed => {
                self.section = section;
                Token {
                    kind: TokenKind::SectionHeader,
                    value: name,
                    line,
                    column,
                }
            }
            _ => self.error_token("unrecognized section", line, column),
        }
    }

    /// Check for the backward-compatible `==name==` section spelling.
    /// Returns None when this is not a section header (the caller then
    /// treats `==` as the equality token).
    fn try_compat_section_header(&mut self, line: usize, column: usize) -> Option<Token> {
        let mut offset = 0;
        while self.peek_at(offset).is_some_and(Self::is_ident_char) {
            offset += 1;
        }
        if offset == 0 || self.peek_at(offset) != Some('=') || self.peek_at(offset + 1) != Some('=')
        {
            return None;
        }

        let name: String = self.chars[self.pos..self.pos + offset].iter().collect();
        let section = Section::from_name(&name)?;

        for _ in 0..offset + 2 {
            self.bump();
        }

        self.section = section;
        Some(Token {
            kind: TokenKind::SectionHeader,
            value: name,
            line,
            column,
        })
    }

    fn next_token(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }

        // whitespace: significant inside patterns, discarded outside
        let space_line = self.line;
        let space_column = self.column(self.pos);
        if self.eat_space() && self.in_pattern {
            return Some(Token {
                kind: TokenKind::PatternSpace,
                value: " ".to_string(),
                line: space_line,
                column: space_column,
            });
        }

        let start = self.pos;
        let line = self.line;
        let column = self.column(start);

        let c = match self.bump() {
            Some(c) => c,
            None => {
                self.emitted_eof = true;
                return Some(Token {
                    kind: TokenKind::Eof,
                    value: String::new(),
                    line,
                    column,
                });
            }
        };

        let token = match c {
            '0'..='9' => self.lex_number(start, line, column),

            '.' => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.lex_number(start, line, column)
                } else {
                    self.token(TokenKind::Char, start, line, column)
                }
            }

            '+' | '-' => {
                let starts_number = match self.peek() {
                    Some(d) if d.is_ascii_digit() => true,
                    Some('.') => self.peek_at(1).is_some_and(|d| d.is_ascii_digit()),
                    _ => false,
                };
                if starts_number {
                    if self.peek() == Some('.') {
                        self.bump();
                    }
                    self.lex_number(start, line, column)
                } else {
                    self.token(TokenKind::Char, start, line, column)
                }
            }

            '=' => {
                if self.peek() == Some('=') {
                    self.bump();
                    if let Some(header) = self.try_compat_section_header(line, column) {
                        header
                    } else {
                        self.token(TokenKind::Equality, start, line, column)
                    }
                } else {
                    self.token(TokenKind::Char, start, line, column)
                }
            }

            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    self.token(TokenKind::Inequality, start, line, column)
                } else {
                    self.token(TokenKind::Char, start, line, column)
                }
            }

            '/' => {
                if self.peek() == Some('/') {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                    self.token(TokenKind::Comment, start, line, column)
                } else {
                    self.token(TokenKind::Char, start, line, column)
                }
            }

            '"' | '\'' => self.lex_string(c, start, line, column),

            '[' => {
                self.in_pattern = true;
                self.token(TokenKind::Char, start, line, column)
            }

            ']' => {
                self.in_pattern = false;
                self.token(TokenKind::Char, start, line, column)
            }

            '?' => {
                if self.peek().is_some_and(Self::is_ident_char) {
                    self.lex_identifier(start, line, column)
                } else {
                    self.token(TokenKind::Char, start, line, column)
                }
            }

            '*' => {
                if self.in_pattern {
                    self.token(TokenKind::PatternWildcard, start, line, column)
                } else {
                    self.token(TokenKind::Char, start, line, column)
                }
            }

            '~' => {
                if self.peek() == Some('~') {
                    self.bump();
                    self.lex_section_header(line, column)
                } else {
                    self.token(TokenKind::Char, start, line, column)
                }
            }

            c if c.is_alphanumeric() || c == '_' => self.lex_identifier(start, line, column),

            c if c.is_ascii() && !c.is_control() => {
                self.token(TokenKind::Char, start, line, column)
            }

            c => self.error_token(&format!("unrecognized character '{c}'"), line, column),
        };

        Some(token)
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}
