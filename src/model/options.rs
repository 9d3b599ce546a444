//! Options controlling how a generated model runs.
//!
//! These come from the `gactar {}` config block and ride along on the
//! model; the surrounding tooling may override them per run.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Min,
    #[default]
    Info,
    Detail,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Min => "min",
            LogLevel::Info => "info",
            LogLevel::Detail => "detail",
        };
        write!(f, "{s}")
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "min" => Ok(LogLevel::Min),
            "info" => Ok(LogLevel::Info),
            "detail" => Ok(LogLevel::Detail),
            other => Err(format!("invalid log level: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Options {
    pub log_level: LogLevel,
    pub trace_activations: bool,
    /// Seed for reproducible runs. A u32 because pyactr routes this
    /// through numpy, which takes nothing wider.
    pub random_seed: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_round_trip() {
        for level in ["min", "info", "detail"] {
            assert_eq!(level.parse::<LogLevel>().unwrap().to_string(), level);
        }
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.log_level, LogLevel::Info);
        assert!(!options.trace_activations);
        assert!(options.random_seed.is_none());
    }
}
