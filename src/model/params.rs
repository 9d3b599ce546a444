//! Declarative parameter schemas.
//!
//! Modules and the `gactar` run-options block describe their parameters as
//! data; the builder validates config fields against these schemas and
//! reports mismatches with a uniform set of messages.

use thiserror::Error;

use crate::numbers::float_str;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("unrecognized option \"{0}\"")]
    UnrecognizedOption(String),

    #[error("must be a number")]
    MustBeANumber,

    #[error("must be a string")]
    MustBeAString,

    #[error("must be 'true' or 'false'")]
    MustBeABool,

    #[error("must be one of \"{0}\"")]
    MustBeOneOf(String),

    #[error("must be a positive number")]
    MustBePositive,

    #[error("is out of range ({min}-{max})")]
    OutOfRange { min: String, max: String },

    #[error("is out of range (minimum {0})")]
    BelowMinimum(String),

    #[error("is out of range (maximum {0})")]
    AboveMaximum(String),
}

#[derive(Debug, Clone, Copy)]
pub enum ParamKind {
    Float { min: Option<f64>, max: Option<f64> },
    Int { min: Option<i64>, max: Option<i64> },
    Bool,
    /// String-valued, restricted to a fixed set (e.g. `log_level`).
    Str { valid: &'static [&'static str] },
    /// Identifier-valued, restricted to a fixed set (e.g. the recall
    /// request parameter `recently_retrieved`).
    Enum { valid: &'static [&'static str] },
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParamKind,
}

/// A config value as seen by validation, borrowed from the parse tree.
#[derive(Debug, Clone, Copy)]
pub enum ParamValue<'a> {
    Ident(&'a str),
    Str(&'a str),
    Number(f64),
    /// A nested field list where a scalar was expected.
    Fields,
}

pub const MEMORY_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "latency_factor",
        description: "latency factor (F)",
        kind: ParamKind::Float {
            min: Some(0.0),
            max: None,
        },
    },
    ParamSpec {
        name: "latency_exponent",
        description: "latency exponent (f)",
        kind: ParamKind::Float {
            min: Some(0.0),
            max: None,
        },
    },
    ParamSpec {
        name: "retrieval_threshold",
        description: "retrieval threshold (tau)",
        kind: ParamKind::Float {
            min: None,
            max: None,
        },
    },
    ParamSpec {
        name: "finst_size",
        description: "how many recently-retrieved chunks are retained",
        kind: ParamKind::Int {
            min: Some(0),
            max: None,
        },
    },
    ParamSpec {
        name: "finst_time",
        description: "how long a finst lasts in memory",
        kind: ParamKind::Float {
            min: None,
            max: None,
        },
    },
    ParamSpec {
        name: "decay",
        description: "base-level learning decay; presence turns learning on",
        kind: ParamKind::Float {
            min: Some(0.0),
            max: Some(1.0),
        },
    },
    ParamSpec {
        name: "max_spread_strength",
        description: "maximum associative strength; presence turns on spreading activation",
        kind: ParamKind::Float {
            min: None,
            max: None,
        },
    },
    ParamSpec {
        name: "instantaneous_noise",
        description: "instantaneous noise",
        kind: ParamKind::Float {
            min: None,
            max: None,
        },
    },
    ParamSpec {
        name: "mismatch_penalty",
        description: "mismatch penalty; presence turns on partial matching",
        kind: ParamKind::Float {
            min: Some(0.0),
            max: None,
        },
    },
];

pub const GOAL_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "spreading_activation",
    description: "spreading activation weight of the goal buffer",
    kind: ParamKind::Float {
        min: Some(0.0),
        max: None,
    },
}];

pub const IMAGINAL_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "delay",
    description: "how long a request to the buffer takes to complete (seconds)",
    kind: ParamKind::Float {
        min: Some(0.0),
        max: None,
    },
}];

pub const PROCEDURAL_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "default_action_time",
    description: "time it takes to fire a production (seconds)",
    kind: ParamKind::Float {
        min: Some(0.0),
        max: None,
    },
}];

pub const GACTAR_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "log_level",
        description: "level of logging output",
        kind: ParamKind::Str {
            valid: &["min", "info", "detail"],
        },
    },
    ParamSpec {
        name: "trace_activations",
        description: "output detailed info about activations",
        kind: ParamKind::Bool,
    },
    ParamSpec {
        name: "random_seed",
        description: "seed for generating pseudo-random numbers",
        kind: ParamKind::Int {
            min: Some(0),
            max: None,
        },
    },
];

pub const RECALL_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "recently_retrieved",
    description: "restrict retrieval based on declarative finsts",
    kind: ParamKind::Enum {
        valid: &["t", "nil", "reset"],
    },
}];

pub fn lookup(specs: &[ParamSpec], name: &str) -> Option<ParamSpec> {
    specs.iter().find(|s| s.name == name).copied()
}

/// Validate one key/value against a schema.
pub fn validate(specs: &[ParamSpec], key: &str, value: &ParamValue) -> Result<(), ParamError> {
    let Some(spec) = lookup(specs, key) else {
        return Err(ParamError::UnrecognizedOption(key.to_string()));
    };

    match spec.kind {
        ParamKind::Float { min, max } => {
            let ParamValue::Number(n) = value else {
                return Err(ParamError::MustBeANumber);
            };
            check_range(*n, min, max, float_str)
        }

        ParamKind::Int { min, max } => {
            let ParamValue::Number(n) = value else {
                return Err(ParamError::MustBeANumber);
            };
            if n.fract() != 0.0 {
                return Err(ParamError::MustBeANumber);
            }
            check_range(*n as i64, min, max, |i| i.to_string())
        }

        ParamKind::Bool => match value {
            ParamValue::Ident("true") | ParamValue::Ident("false") => Ok(()),
            _ => Err(ParamError::MustBeABool),
        },

        ParamKind::Str { valid } => match value {
            ParamValue::Str(s) if valid.contains(s) => Ok(()),
            ParamValue::Str(_) => Err(ParamError::MustBeOneOf(valid.join(", "))),
            _ => Err(ParamError::MustBeAString),
        },

        ParamKind::Enum { valid } => match value {
            ParamValue::Ident(s) if valid.contains(s) => Ok(()),
            _ => Err(ParamError::MustBeOneOf(valid.join(", "))),
        },
    }
}

fn check_range<T: PartialOrd + Copy>(
    value: T,
    min: Option<T>,
    max: Option<T>,
    display: impl Fn(T) -> String,
) -> Result<(), ParamError> {
    match (min, max) {
        (Some(lo), Some(hi)) if value < lo || value > hi => Err(ParamError::OutOfRange {
            min: display(lo),
            max: display(hi),
        }),
        // a one-sided minimum of zero reads better as "positive"
        (Some(lo), None) if value < lo => {
            if display(lo) == "0" {
                Err(ParamError::MustBePositive)
            } else {
                Err(ParamError::BelowMinimum(display(lo)))
            }
        }
        (None, Some(hi)) if value > hi => Err(ParamError::AboveMaximum(display(hi))),
        _ => Ok(()),
    }
}
