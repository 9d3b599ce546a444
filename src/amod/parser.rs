//! Recursive-descent parser: token stream -> parse tree.
//!
//! A single syntactic defect aborts the parse with one error; the semantic
//! pass requires a successful parse. Comment tokens are skipped wherever
//! they appear. `PatternSpace` tokens (emitted only inside `[...]`) are the
//! slot separators and are consumed explicitly by the pattern rules.

use thiserror::Error;

use super::ast::*;
use super::lexer::{Section, Token, TokenKind};
use crate::issues::Location;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub location: Location,
}

type Result<T> = std::result::Result<T, ParseError>;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse_file(tokens: Vec<Token>) -> Result<File> {
        let mut parser = Parser::new(tokens);

        parser.expect_section(Section::Model)?;
        let model = parser.parse_model_section()?;

        parser.expect_section(Section::Config)?;
        let config = parser.parse_config_section()?;

        parser.expect_section(Section::Init)?;
        let init = parser.parse_init_section()?;

        parser.expect_section(Section::Productions)?;
        let productions = parser.parse_productions_section()?;

        Ok(File {
            model,
            config,
            init,
            productions,
        })
    }

    /// Parse a lone pattern, as used for user-supplied initial buffer
    /// contents.
    pub fn parse_standalone_pattern(tokens: Vec<Token>) -> Result<Pattern> {
        let mut parser = Parser::new(tokens);
        let pattern = parser.parse_pattern()?;
        let next = parser.peek()?.clone();
        if next.kind != TokenKind::Eof {
            return Err(Self::unexpected(&next, "\"<EOF>\""));
        }
        Ok(pattern)
    }

    // ─── token plumbing ────────────────────────────────────────────────

    fn skip_comments(&mut self) {
        while self
            .tokens
            .get(self.pos)
            .is_some_and(|t| t.kind == TokenKind::Comment)
        {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Result<&Token> {
        self.skip_comments();
        let token = self.tokens.get(self.pos).expect("token stream ends in EOF");
        if token.kind == TokenKind::Error {
            return Err(ParseError {
                message: token.value.clone(),
                location: Self::loc(token),
            });
        }
        Ok(token)
    }

    /// Peek past any comments *and* pattern spaces; used by the slot rule
    /// to look ahead without consuming the separator.
    fn peek_past_space(&mut self) -> Result<&Token> {
        self.skip_comments();
        let mut pos = self.pos;
        while self
            .tokens
            .get(pos)
            .is_some_and(|t| matches!(t.kind, TokenKind::Comment | TokenKind::PatternSpace))
        {
            pos += 1;
        }
        let token = self.tokens.get(pos).expect("token stream ends in EOF");
        if token.kind == TokenKind::Error {
            return Err(ParseError {
                message: token.value.clone(),
                location: Self::loc(token),
            });
        }
        Ok(token)
    }

    fn advance(&mut self) -> Result<Token> {
        let token = self.peek()?.clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        Ok(token)
    }

    fn loc(token: &Token) -> Location {
        Location::new(token.line, token.column, token.column_end())
    }

    fn display_value(token: &Token) -> String {
        if token.kind == TokenKind::Eof {
            "<EOF>".to_string()
        } else {
            token.value.clone()
        }
    }

    fn unexpected(token: &Token, expected: &str) -> ParseError {
        ParseError {
            message: format!(
                "unexpected token \"{}\" (expected {})",
                Self::display_value(token),
                expected
            ),
            location: Self::loc(token),
        }
    }

    fn is_char(token: &Token, c: char) -> bool {
        token.kind == TokenKind::Char && token.value.chars().next() == Some(c)
    }

    fn is_keyword(token: &Token, kw: &str) -> bool {
        token.kind == TokenKind::Keyword && token.value == kw
    }

    fn expect_char(&mut self, c: char) -> Result<Token> {
        let token = self.peek()?.clone();
        if Self::is_char(&token, c) {
            self.advance()
        } else {
            Err(Self::unexpected(&token, &format!("\"{c}\"")))
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<Token> {
        let token = self.peek()?.clone();
        if Self::is_keyword(&token, kw) {
            self.advance()
        } else {
            Err(Self::unexpected(&token, &format!("\"{kw}\"")))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<Token> {
        let token = self.peek()?.clone();
        if token.kind == TokenKind::Ident {
            self.advance()
        } else {
            Err(Self::unexpected(&token, expected))
        }
    }

    fn expect_string(&mut self) -> Result<(String, Token)> {
        let token = self.peek()?.clone();
        if token.kind == TokenKind::Str {
            self.advance()?;
            Ok((unquote(&token.value), token))
        } else {
            Err(Self::unexpected(&token, "a string"))
        }
    }

    fn expect_section(&mut self, section: Section) -> Result<()> {
        let token = self.peek()?.clone();
        if token.kind == TokenKind::SectionHeader && token.value == section.name() {
            self.advance()?;
            Ok(())
        } else {
            Err(Self::unexpected(
                &token,
                &format!("\"~~ {} ~~\"", section.name()),
            ))
        }
    }

    fn skip_pattern_space(&mut self) -> Result<()> {
        while self.peek()?.kind == TokenKind::PatternSpace {
            self.advance()?;
        }
        Ok(())
    }

    // ─── model section ─────────────────────────────────────────────────

    fn parse_model_section(&mut self) -> Result<ModelSection> {
        self.expect_keyword("name")?;
        self.expect_char(':')?;

        let token = self.peek()?.clone();
        let name = match token.kind {
            TokenKind::Str => {
                self.advance()?;
                unquote(&token.value)
            }
            TokenKind::Ident => {
                self.advance()?;
                token.value
            }
            _ => return Err(Self::unexpected(&token, "a model name")),
        };

        let mut description = None;
        if Self::is_keyword(self.peek()?, "description") {
            self.advance()?;
            self.expect_char(':')?;
            description = Some(self.expect_string()?.0);
        }

        let mut authors = Vec::new();
        if Self::is_keyword(self.peek()?, "authors") {
            self.advance()?;
            self.expect_char('{')?;
            while self.peek()?.kind == TokenKind::Str {
                authors.push(self.expect_string()?.0);
            }
            self.expect_char('}')?;
        }

        let mut examples = Vec::new();
        if Self::is_keyword(self.peek()?, "examples") {
            self.advance()?;
            self.expect_char('{')?;
            while Self::is_char(self.peek_past_space()?, '[') {
                self.skip_pattern_space()?;
                examples.push(self.parse_pattern()?);
            }
            self.skip_pattern_space()?;
            self.expect_char('}')?;
        }

        Ok(ModelSection {
            name,
            description,
            authors,
            examples,
        })
    }

    // ─── config section ────────────────────────────────────────────────

    fn parse_config_section(&mut self) -> Result<ConfigSection> {
        let mut config = ConfigSection::default();

        loop {
            let token = self.peek()?.clone();
            if !matches!(token.kind, TokenKind::Keyword) {
                break;
            }

            match token.value.as_str() {
                "gactar" => {
                    self.advance()?;
                    config.gactar = self.parse_field_list()?;
                }
                "modules" => {
                    self.advance()?;
                    self.expect_char('{')?;
                    while self.peek()?.kind == TokenKind::Ident {
                        let name_token = self.advance()?;
                        let fields = self.parse_field_list()?;
                        config.modules.push(ModuleConfig {
                            name: name_token.value.clone(),
                            name_loc: Self::loc(&name_token),
                            fields,
                        });
                    }
                    self.expect_char('}')?;
                }
                "chunks" => {
                    self.advance()?;
                    self.expect_char('{')?;
                    while Self::is_char(self.peek_past_space()?, '[') {
                        self.skip_pattern_space()?;
                        config.chunks.push(self.parse_chunk_decl()?);
                    }
                    self.skip_pattern_space()?;
                    self.expect_char('}')?;
                }
                _ => break,
            }
        }

        Ok(config)
    }

    fn parse_field_list(&mut self) -> Result<Vec<Field>> {
        let mut fields = Vec::new();

        self.expect_char('{')?;
        loop {
            let token = self.peek()?.clone();
            if Self::is_char(&token, '}') {
                break;
            }
            if token.kind != TokenKind::Ident {
                return Err(Self::unexpected(&token, "\"}\""));
            }
            fields.push(self.parse_field()?);

            if Self::is_char(self.peek()?, ',') {
                self.advance()?;
            }
        }
        self.expect_char('}')?;

        Ok(fields)
    }

    fn parse_field(&mut self) -> Result<Field> {
        let key_token = self.expect_ident("an option name")?;
        let key_loc = Self::loc(&key_token);

        let next = self.peek()?.clone();
        if Self::is_char(&next, '{') {
            let open_loc = Self::loc(&next);
            let fields = self.parse_field_list()?;
            return Ok(Field {
                key: key_token.value,
                key_loc,
                value: FieldValue::Fields(fields),
                value_loc: open_loc,
            });
        }

        self.expect_char(':')?;

        let token = self.peek()?.clone();
        let value = match token.kind {
            TokenKind::Ident => FieldValue::Ident(token.value.clone()),
            TokenKind::Keyword if token.value == "nil" => FieldValue::Ident(token.value.clone()),
            TokenKind::Str => FieldValue::Str(unquote(&token.value)),
            TokenKind::Number => {
                let number: f64 = token.value.parse().map_err(|_| ParseError {
                    message: format!("invalid number \"{}\"", token.value),
                    location: Self::loc(&token),
                })?;
                FieldValue::Number(number)
            }
            _ => return Err(Self::unexpected(&token, "an option value")),
        };
        self.advance()?;

        Ok(Field {
            key: key_token.value,
            key_loc,
            value,
            value_loc: Self::loc(&token),
        })
    }

    fn parse_chunk_decl(&mut self) -> Result<ChunkDecl> {
        let open = self.expect_char('[')?;
        self.skip_pattern_space()?;

        let name_token = self.expect_ident("a chunk type name")?;
        self.skip_pattern_space()?;
        self.expect_char(':')?;

        let mut slots = Vec::new();
        loop {
            self.skip_pattern_space()?;
            let token = self.peek()?.clone();
            if Self::is_char(&token, ']') {
                break;
            }
            if token.kind != TokenKind::Ident {
                return Err(Self::unexpected(&token, "a slot name"));
            }
            slots.push(token.value);
            self.advance()?;
        }

        if slots.is_empty() {
            let token = self.peek()?.clone();
            return Err(Self::unexpected(&token, "a slot name"));
        }

        let close = self.expect_char(']')?;

        Ok(ChunkDecl {
            name: name_token.value.clone(),
            name_loc: Self::loc(&name_token),
            slots,
            loc: Location::new(open.line, open.column, close.column_end()),
        })
    }

    // ─── patterns ──────────────────────────────────────────────────────

    fn parse_pattern(&mut self) -> Result<Pattern> {
        let open = self.expect_char('[')?;
        self.skip_pattern_space()?;

        let name_token = self.expect_ident("a chunk name")?;
        self.skip_pattern_space()?;
        self.expect_char(':')?;

        let mut slots = Vec::new();
        loop {
            self.skip_pattern_space()?;
            let token = self.peek()?.clone();
            if Self::is_char(&token, ']') {
                break;
            }
            slots.push(self.parse_pattern_slot()?);

            // slots are separated by whitespace; anything else glued onto
            // a slot is an error
            let next = self.peek()?.clone();
            if !Self::is_char(&next, ']') && next.kind != TokenKind::PatternSpace {
                return Err(Self::unexpected(&next, "\"]\""));
            }
        }

        if slots.is_empty() {
            let token = self.peek()?.clone();
            return Err(Self::unexpected(&token, "a pattern slot"));
        }

        let close = self.expect_char(']')?;

        Ok(Pattern {
            chunk_name: name_token.value.clone(),
            chunk_name_loc: Self::loc(&name_token),
            slots,
            loc: Location::new(open.line, open.column, close.column_end()),
        })
    }

    fn parse_pattern_slot(&mut self) -> Result<PatternSlot> {
        let first = self.peek()?.clone();
        let mut negated = false;

        if Self::is_char(&first, '!') {
            // a wildcard cannot be negated
            if self.peek_past_char()?.kind == TokenKind::PatternWildcard {
                return Err(Self::unexpected(&first, "\"]\""));
            }
            negated = true;
            self.advance()?;
        }

        let token = self.peek()?.clone();
        let item = match token.kind {
            TokenKind::PatternWildcard => PatternSlotItem::Wildcard,
            TokenKind::Keyword if token.value == "nil" => PatternSlotItem::Nil,
            TokenKind::Ident => PatternSlotItem::Ident(token.value.clone()),
            TokenKind::Str => PatternSlotItem::Str(unquote(&token.value)),
            TokenKind::Number => PatternSlotItem::Number(token.value.clone()),
            TokenKind::PatternVar => {
                PatternSlotItem::Var(token.value.trim_start_matches('?').to_string())
            }
            _ => return Err(Self::unexpected(&token, "a pattern slot")),
        };
        self.advance()?;

        Ok(PatternSlot {
            negated,
            item,
            loc: Location::new(first.line, first.column, token.column_end()),
        })
    }

    /// Peek at the token after the current one, skipping comments.
    fn peek_past_char(&mut self) -> Result<&Token> {
        self.skip_comments();
        let mut pos = self.pos + 1;
        while self
            .tokens
            .get(pos)
            .is_some_and(|t| t.kind == TokenKind::Comment)
        {
            pos += 1;
        }
        Ok(self.tokens.get(pos).expect("token stream ends in EOF"))
    }

    // ─── init section ──────────────────────────────────────────────────

    fn parse_init_section(&mut self) -> Result<InitSection> {
        let mut init = InitSection::default();

        loop {
            let token = self.peek()?.clone();

            if Self::is_keyword(&token, "similar") {
                self.advance()?;
                self.parse_similar_block(&mut init)?;
                continue;
            }

            if token.kind != TokenKind::Ident {
                break;
            }

            let name_token = self.advance()?;
            let name_loc = Self::loc(&name_token);

            let next = self.peek()?.clone();
            let (patterns, braced) = if Self::is_char(&next, '{') {
                self.advance()?;
                let mut patterns = Vec::new();
                loop {
                    let token = self.peek_past_space()?.clone();
                    if Self::is_char(&token, '}') {
                        self.skip_pattern_space()?;
                        break;
                    }
                    self.skip_pattern_space()?;
                    patterns.push(self.parse_named_pattern()?);
                }
                self.expect_char('}')?;

                if patterns.is_empty() {
                    let token = self.peek()?.clone();
                    return Err(Self::unexpected(&token, "an initializer pattern"));
                }

                (patterns, true)
            } else {
                (vec![self.parse_named_pattern()?], false)
            };

            init.initializers.push(Initialization {
                name: name_token.value,
                name_loc,
                patterns,
                braced,
            });
        }

        Ok(init)
    }

    fn parse_named_pattern(&mut self) -> Result<NamedPattern> {
        let token = self.peek()?.clone();

        let chunk_name = if token.kind == TokenKind::Ident {
            self.advance()?;
            Some(token.value.clone())
        } else {
            None
        };

        let pattern = self.parse_pattern()?;
        let loc = if chunk_name.is_some() {
            Location::new(token.line, token.column, pattern.loc.column_end)
        } else {
            pattern.loc
        };

        Ok(NamedPattern {
            chunk_name,
            loc,
            pattern,
        })
    }

    fn parse_similar_block(&mut self, init: &mut InitSection) -> Result<()> {
        self.expect_char('{')?;

        loop {
            let token = self.peek()?.clone();
            if Self::is_char(&token, '}') {
                break;
            }

            let open = self.expect_char('(')?;
            let one = self.expect_ident("a chunk name")?;
            let two = self.expect_ident("a chunk name")?;

            let number_token = self.peek()?.clone();
            if number_token.kind != TokenKind::Number {
                return Err(Self::unexpected(&number_token, "a similarity value"));
            }
            self.advance()?;
            let value: f64 = number_token.value.parse().map_err(|_| ParseError {
                message: format!("invalid number \"{}\"", number_token.value),
                location: Self::loc(&number_token),
            })?;

            let close = self.expect_char(')')?;

            init.similarities.push(SimilarityDecl {
                chunk_one: one.value,
                chunk_two: two.value,
                value,
                loc: Location::new(open.line, open.column, close.column_end()),
            });
        }

        self.expect_char('}')?;
        Ok(())
    }

    // ─── productions section ───────────────────────────────────────────

    fn parse_productions_section(&mut self) -> Result<Vec<ProductionDecl>> {
        let mut productions = Vec::new();

        loop {
            let token = self.peek()?.clone();
            if token.kind == TokenKind::Eof {
                break;
            }
            if token.kind != TokenKind::Ident {
                return Err(Self::unexpected(&token, "a production name"));
            }
            productions.push(self.parse_production()?);
        }

        Ok(productions)
    }

    fn parse_production(&mut self) -> Result<ProductionDecl> {
        let name_token = self.expect_ident("a production name")?;
        self.expect_char('{')?;

        let mut description = None;
        if Self::is_keyword(self.peek()?, "description") {
            self.advance()?;
            self.expect_char(':')?;
            description = Some(self.expect_string()?.0);
        }

        self.expect_keyword("match")?;
        self.expect_char('{')?;
        let mut matches = Vec::new();
        loop {
            let token = self.peek()?.clone();
            if Self::is_char(&token, '}') {
                break;
            }
            matches.push(self.parse_match_item()?);
        }
        if matches.is_empty() {
            let token = self.peek()?.clone();
            return Err(Self::unexpected(&token, "a match"));
        }
        self.expect_char('}')?;

        self.expect_keyword("do")?;
        self.expect_char('{')?;
        let mut statements = Vec::new();
        loop {
            let token = self.peek()?.clone();
            if Self::is_char(&token, '}') {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        if statements.is_empty() {
            let token = self.peek()?.clone();
            return Err(Self::unexpected(&token, "a statement"));
        }
        self.expect_char('}')?;

        self.expect_char('}')?;

        Ok(ProductionDecl {
            name: name_token.value.clone(),
            name_loc: Self::loc(&name_token),
            description,
            matches,
            statements,
            line: name_token.line,
        })
    }

    fn parse_match_item(&mut self) -> Result<MatchItem> {
        let token = self.peek()?.clone();
        if token.kind != TokenKind::Ident {
            return Err(Self::unexpected(&token, "\"}\""));
        }
        let name_token = self.advance()?;
        let name_loc = Self::loc(&name_token);

        if Self::is_keyword(self.peek()?, "is") {
            self.advance()?;

            let state_token = self.peek()?.clone();
            if !matches!(
                state_token.kind,
                TokenKind::Ident | TokenKind::Str | TokenKind::Number
            ) {
                return Err(Self::unexpected(&state_token, "a buffer state"));
            }
            self.advance()?;

            return Ok(MatchItem::State {
                name: name_token.value,
                name_loc,
                // keep the raw token text: a quoted or numeric "state" is
                // reported by the builder, not here
                state: state_token.value.clone(),
                state_loc: Self::loc(&state_token),
            });
        }

        let pattern = self.parse_pattern()?;

        let mut when = Vec::new();
        if Self::is_keyword(self.peek()?, "when") {
            self.advance()?;
            self.expect_char('(')?;
            loop {
                when.push(self.parse_where_expr()?);
                if Self::is_char(self.peek()?, ',') {
                    self.advance()?;
                    continue;
                }
                break;
            }
            self.expect_char(')')?;
        }

        Ok(MatchItem::Pattern {
            name: name_token.value,
            name_loc,
            pattern,
            when,
        })
    }

    fn parse_where_expr(&mut self) -> Result<WhereExpr> {
        let lhs_token = self.peek()?.clone();
        if lhs_token.kind != TokenKind::PatternVar {
            return Err(Self::unexpected(&lhs_token, "a variable"));
        }
        self.advance()?;

        let op = self.peek()?.clone();
        let negated = match op.kind {
            TokenKind::Equality => false,
            TokenKind::Inequality => true,
            _ => return Err(Self::unexpected(&op, "\"==\" or \"!=\"")),
        };
        self.advance()?;

        let rhs = self.parse_arg()?;

        Ok(WhereExpr {
            lhs: lhs_token.value.trim_start_matches('?').to_string(),
            lhs_loc: Self::loc(&lhs_token),
            negated,
            loc: Location::new(lhs_token.line, lhs_token.column, rhs.loc.column_end),
            rhs,
        })
    }

    fn is_arg_start(token: &Token) -> bool {
        matches!(
            token.kind,
            TokenKind::PatternVar | TokenKind::Ident | TokenKind::Str | TokenKind::Number
        ) || Self::is_keyword(token, "nil")
    }

    fn parse_arg(&mut self) -> Result<Arg> {
        let token = self.peek()?.clone();
        let value = match token.kind {
            TokenKind::PatternVar => ArgValue::Var(token.value.trim_start_matches('?').to_string()),
            TokenKind::Ident => ArgValue::Ident(token.value.clone()),
            TokenKind::Str => ArgValue::Str(unquote(&token.value)),
            TokenKind::Number => ArgValue::Number(token.value.clone()),
            TokenKind::Keyword if token.value == "nil" => ArgValue::Nil,
            _ => return Err(Self::unexpected(&token, "a value")),
        };
        self.advance()?;

        Ok(Arg {
            value,
            loc: Self::loc(&token),
        })
    }

    fn parse_statement(&mut self) -> Result<StatementDecl> {
        let token = self.peek()?.clone();
        if token.kind != TokenKind::Keyword {
            return Err(Self::unexpected(&token, "\"}\""));
        }

        match token.value.as_str() {
            "clear" => {
                self.advance()?;
                let mut buffers = Vec::new();
                let first = self.expect_ident("a buffer name")?;
                buffers.push((first.value.clone(), Self::loc(&first)));
                while Self::is_char(self.peek()?, ',') {
                    self.advance()?;
                    let next = self.expect_ident("a buffer name")?;
                    buffers.push((next.value.clone(), Self::loc(&next)));
                }
                let end = buffers.last().map(|(_, loc)| loc.column_end).unwrap_or(0);
                Ok(StatementDecl::Clear {
                    buffers,
                    loc: Location::new(token.line, token.column, end),
                })
            }

            "print" => {
                self.advance()?;
                let mut args = Vec::new();
                while Self::is_arg_start(self.peek()?) {
                    args.push(self.parse_arg()?);
                    if Self::is_char(self.peek()?, ',') {
                        self.advance()?;
                    } else {
                        break;
                    }
                }
                let end = args
                    .last()
                    .map(|arg| arg.loc.column_end)
                    .unwrap_or_else(|| token.column_end());
                Ok(StatementDecl::Print {
                    args,
                    loc: Location::new(token.line, token.column, end),
                })
            }

            "recall" => {
                self.advance()?;
                let pattern = self.parse_pattern()?;

                let mut with = Vec::new();
                while Self::is_keyword(self.peek()?, "with") {
                    self.advance()?;
                    self.expect_char('(')?;
                    loop {
                        let next = self.peek()?.clone();
                        if Self::is_char(&next, ')') {
                            break;
                        }
                        if next.kind != TokenKind::Ident {
                            return Err(Self::unexpected(&next, "\")\""));
                        }
                        with.push(self.parse_field()?);
                        if Self::is_char(self.peek()?, ',') {
                            self.advance()?;
                        }
                    }
                    self.expect_char(')')?;
                }

                let loc = Location::new(token.line, token.column, pattern.loc.column_end);
                Ok(StatementDecl::Recall { pattern, with, loc })
            }

            "set" => {
                self.advance()?;
                let buffer_token = self.expect_ident("a buffer name")?;

                let mut slot = None;
                if Self::is_char(self.peek()?, '.') {
                    self.advance()?;
                    let slot_token = self.expect_ident("a slot name")?;
                    slot = Some((slot_token.value.clone(), Self::loc(&slot_token)));
                }

                self.expect_keyword("to")?;

                let next = self.peek()?.clone();
                let (value, end) = if Self::is_char(&next, '[') {
                    let pattern = self.parse_pattern()?;
                    let end = pattern.loc.column_end;
                    (SetValue::Pattern(pattern), end)
                } else if matches!(
                    next.kind,
                    TokenKind::PatternVar | TokenKind::Str | TokenKind::Number
                ) || Self::is_keyword(&next, "nil")
                    || next.kind == TokenKind::Ident
                {
                    let arg = self.parse_arg()?;
                    let end = arg.loc.column_end;
                    (SetValue::Arg(arg), end)
                } else {
                    return Err(Self::unexpected(&next, "(SetValue | Pattern)"));
                };

                Ok(StatementDecl::Set {
                    buffer: buffer_token.value.clone(),
                    buffer_loc: Self::loc(&buffer_token),
                    slot,
                    value,
                    loc: Location::new(token.line, token.column, end),
                })
            }

            "stop" => {
                self.advance()?;
                Ok(StatementDecl::Stop {
                    loc: Self::loc(&token),
                })
            }

            _ => Err(Self::unexpected(&token, "\"}\"")),
        }
    }
}

/// Strip the surrounding quotes from a string token and resolve `\`
/// escapes.
pub fn unquote(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() < 2 {
        return raw.to_string();
    }

    let inner = &chars[1..chars.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut escaped = false;
    for &c in inner {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            out.push(c);
        }
    }
    out
}
