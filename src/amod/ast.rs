//! Parse tree for one amod file.
//!
//! Every node keeps the source location of the tokens that produced it so
//! the semantic pass can attach precise positions to its diagnostics. The
//! tree is a faithful picture of the source; all cross-referencing (buffer
//! names, chunk types, variable binding) happens later in the builder.

use crate::issues::Location;

#[derive(Debug)]
pub struct File {
    pub model: ModelSection,
    pub config: ConfigSection,
    pub init: InitSection,
    pub productions: Vec<ProductionDecl>,
}

#[derive(Debug)]
pub struct ModelSection {
    pub name: String,
    pub description: Option<String>,
    pub authors: Vec<String>,
    pub examples: Vec<Pattern>,
}

#[derive(Debug, Default)]
pub struct ConfigSection {
    pub gactar: Vec<Field>,
    pub modules: Vec<ModuleConfig>,
    pub chunks: Vec<ChunkDecl>,
}

#[derive(Debug)]
pub struct ModuleConfig {
    pub name: String,
    pub name_loc: Location,
    pub fields: Vec<Field>,
}

#[derive(Debug)]
pub struct ChunkDecl {
    pub name: String,
    pub name_loc: Location,
    pub slots: Vec<String>,
    pub loc: Location,
}

#[derive(Debug)]
pub struct Field {
    pub key: String,
    pub key_loc: Location,
    pub value: FieldValue,
    pub value_loc: Location,
}

#[derive(Debug)]
pub enum FieldValue {
    Ident(String),
    Str(String),
    Number(f64),
    /// Nested field list, e.g. `extra_buffers { buffer1 {} }`.
    Fields(Vec<Field>),
}

impl FieldValue {
    /// Short rendering for error messages.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Ident(s) => s.clone(),
            FieldValue::Str(s) => s.clone(),
            FieldValue::Number(n) => crate::numbers::float_str(*n),
            FieldValue::Fields(_) => "{...}".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct InitSection {
    pub initializers: Vec<Initialization>,
    pub similarities: Vec<SimilarityDecl>,
}

#[derive(Debug)]
pub struct Initialization {
    /// Module or buffer name before the pattern(s).
    pub name: String,
    pub name_loc: Location,
    pub patterns: Vec<NamedPattern>,
    /// Whether the `{ ... }` form was used (multiple patterns allowed).
    pub braced: bool,
}

#[derive(Debug)]
pub struct NamedPattern {
    pub chunk_name: Option<String>,
    pub loc: Location,
    pub pattern: Pattern,
}

#[derive(Debug)]
pub struct SimilarityDecl {
    pub chunk_one: String,
    pub chunk_two: String,
    pub value: f64,
    pub loc: Location,
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub chunk_name: String,
    pub chunk_name_loc: Location,
    pub slots: Vec<PatternSlot>,
    pub loc: Location,
}

#[derive(Debug, Clone)]
pub struct PatternSlot {
    pub negated: bool,
    pub item: PatternSlotItem,
    pub loc: Location,
}

#[derive(Debug, Clone)]
pub enum PatternSlotItem {
    Wildcard,
    Nil,
    Ident(String),
    Str(String),
    /// Numbers in patterns stay as text; nothing downstream needs the value.
    Number(String),
    /// Variable name without the leading `?`.
    Var(String),
}

#[derive(Debug)]
pub struct ProductionDecl {
    pub name: String,
    pub name_loc: Location,
    pub description: Option<String>,
    pub matches: Vec<MatchItem>,
    pub statements: Vec<StatementDecl>,
    pub line: usize,
}

#[derive(Debug)]
pub enum MatchItem {
    /// `buffer [chunk: ...]` with an optional `when ( ... )` clause.
    /// Also covers `module [_status: ...]`; the builder tells them apart
    /// by the chunk name.
    Pattern {
        name: String,
        name_loc: Location,
        pattern: Pattern,
        when: Vec<WhereExpr>,
    },
    /// `buffer is empty|full`
    State {
        name: String,
        name_loc: Location,
        state: String,
        state_loc: Location,
    },
}

#[derive(Debug)]
pub struct WhereExpr {
    /// Left-hand variable name without the leading `?`.
    pub lhs: String,
    pub lhs_loc: Location,
    pub negated: bool, // true for `!=`
    pub rhs: Arg,
    pub loc: Location,
}

/// A single argument value as it appears in statements and where-clauses.
#[derive(Debug, Clone)]
pub struct Arg {
    pub value: ArgValue,
    pub loc: Location,
}

#[derive(Debug, Clone)]
pub enum ArgValue {
    Nil,
    /// Variable name without the leading `?`.
    Var(String),
    Ident(String),
    Str(String),
    Number(String),
}

#[derive(Debug)]
pub enum StatementDecl {
    Clear {
        buffers: Vec<(String, Location)>,
        loc: Location,
    },
    Print {
        args: Vec<Arg>,
        loc: Location,
    },
    Recall {
        pattern: Pattern,
        with: Vec<Field>,
        loc: Location,
    },
    Set {
        buffer: String,
        buffer_loc: Location,
        slot: Option<(String, Location)>,
        value: SetValue,
        loc: Location,
    },
    Stop {
        loc: Location,
    },
}

#[derive(Debug)]
pub enum SetValue {
    Arg(Arg),
    Pattern(Pattern),
}
