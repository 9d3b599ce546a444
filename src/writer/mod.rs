//! Code generation for the supported cognitive-architecture frameworks.
//!
//! Each writer is a pure function from `(model, initial buffers)` to the
//! complete source text of a runnable program. Writers never share state,
//! so the orchestrator may run them concurrently, and for a given input
//! their output is byte-identical from run to run: iteration orders are
//! pinned and the generated header carries no timestamp.

pub mod ccm;
pub mod pyactr;
pub mod vanilla;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::amod::{self, ParseChunkError};
use crate::issues::Log;
use crate::model::{Match, Model, Pattern, Production};

/// Version tag stamped into generated files.
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Basic info describing a framework to the surrounding tooling.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub name: &'static str,
    pub language: &'static str,
    /// Extension of the generated file.
    pub file_extension: &'static str,
    /// Interpreter used to run the generated file.
    pub executable_name: &'static str,
    /// (Python only) packages the generated code imports.
    pub python_required_packages: &'static [&'static str],
}

/// Map from buffer name to a pattern string overriding that buffer's
/// model-declared initializer. Ordered so emission stays deterministic.
pub type InitialBuffers = BTreeMap<String, String>;

/// Buffer overrides after parsing and validation.
pub type ParsedInitialBuffers = BTreeMap<String, Pattern>;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("buffer \"{0}\" not found in model")]
    BufferNotFound(String),

    #[error("initial contents of buffer \"{buffer}\": {source}")]
    InvalidInitialBuffer {
        buffer: String,
        source: ParseChunkError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framework {
    Ccm,
    Pyactr,
    Vanilla,
}

impl Framework {
    pub const ALL: [Framework; 3] = [Framework::Ccm, Framework::Pyactr, Framework::Vanilla];

    pub fn from_name(name: &str) -> Option<Framework> {
        match name {
            "ccm" => Some(Framework::Ccm),
            "pyactr" => Some(Framework::Pyactr),
            "vanilla" => Some(Framework::Vanilla),
            _ => None,
        }
    }

    pub fn info(&self) -> &'static Info {
        match self {
            Framework::Ccm => &ccm::INFO,
            Framework::Pyactr => &pyactr::INFO,
            Framework::Vanilla => &vanilla::INFO,
        }
    }

    /// Pre-flight check for model features this framework cannot express.
    /// Only ever produces warnings.
    pub fn validate_model(&self, model: &Model) -> Log {
        match self {
            Framework::Ccm => ccm::validate_model(model),
            Framework::Pyactr => pyactr::validate_model(model),
            Framework::Vanilla => vanilla::validate_model(model),
        }
    }

    /// Generate the complete program text for this framework.
    pub fn emit(&self, model: &Model, initial_buffers: &InitialBuffers) -> Result<String, EmitError> {
        let patterns = parse_initial_buffers(model, initial_buffers)?;
        match self {
            Framework::Ccm => Ok(ccm::emit(model, &patterns)),
            Framework::Pyactr => Ok(pyactr::emit(model, &patterns)),
            Framework::Vanilla => Ok(vanilla::emit(model, &patterns)),
        }
    }

    /// Side files the generated program needs next to it, as
    /// `(file name, contents)` pairs.
    pub fn support_files(&self, model: &Model) -> Vec<(&'static str, &'static str)> {
        match self {
            Framework::Ccm => ccm::support_files(model),
            Framework::Pyactr => pyactr::support_files(model),
            Framework::Vanilla => Vec::new(),
        }
    }

    /// Name of the generated file, e.g. `ccm_Count.py`.
    pub fn output_file_name(&self, model: &Model) -> String {
        let info = self.info();
        format!("{}_{}.{}", info.name, model.name, info.file_extension)
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info().name)
    }
}

/// Parse and validate user-supplied buffer overrides against the model.
pub fn parse_initial_buffers(
    model: &Model,
    initial_buffers: &InitialBuffers,
) -> Result<ParsedInitialBuffers, EmitError> {
    let mut parsed = ParsedInitialBuffers::new();

    for (buffer_name, text) in initial_buffers {
        if !model.has_buffer(buffer_name) {
            return Err(EmitError::BufferNotFound(buffer_name.clone()));
        }

        let pattern =
            amod::parse_chunk(model, text).map_err(|source| EmitError::InvalidInitialBuffer {
                buffer: buffer_name.clone(),
                source,
            })?;

        parsed.insert(buffer_name.clone(), pattern);
    }

    Ok(parsed)
}

pub use crate::numbers::float_str;

/// Growable text buffer the writers emit into.
#[derive(Debug, Default)]
pub(crate) struct CodeWriter {
    buf: String,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl AsRef<str>) {
        self.buf.push_str(text.as_ref());
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

/// A production match as the query-style frameworks (pyactr, vanilla)
/// want it: a buffer-state and a module-state check on the same buffer
/// fold into one `?buffer>` query.
pub(crate) enum EmitMatch<'a> {
    Pattern {
        buffer: &'a str,
        pattern: &'a Pattern,
    },
    Query {
        buffer: &'a str,
        checks: Vec<(&'static str, &'a str)>,
    },
}

pub(crate) fn merge_matches(production: &Production) -> Vec<EmitMatch<'_>> {
    let mut out: Vec<EmitMatch> = Vec::new();

    for m in &production.matches {
        match m {
            Match::BufferPattern {
                buffer_name,
                pattern,
            } => out.push(EmitMatch::Pattern {
                buffer: buffer_name.as_str(),
                pattern,
            }),

            Match::BufferState { buffer_name, state } => {
                if let Some(query) = lookup_query(&mut out, buffer_name) {
                    query.push(("buffer", state.as_str()));
                } else {
                    out.push(EmitMatch::Query {
                        buffer: buffer_name.as_str(),
                        checks: vec![("buffer", state.as_str())],
                    });
                }
            }

            Match::ModuleState {
                buffer_name, state, ..
            } => {
                if let Some(query) = lookup_query(&mut out, buffer_name) {
                    query.push(("state", state.as_str()));
                } else {
                    out.push(EmitMatch::Query {
                        buffer: buffer_name.as_str(),
                        checks: vec![("state", state.as_str())],
                    });
                }
            }
        }
    }

    out
}

fn lookup_query<'a, 'b>(
    matches: &'b mut [EmitMatch<'a>],
    name: &str,
) -> Option<&'b mut Vec<(&'static str, &'a str)>> {
    matches.iter_mut().find_map(|m| match m {
        EmitMatch::Query { buffer, checks } if *buffer == name => Some(checks),
        _ => None,
    })
}
