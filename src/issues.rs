//! Info/warning/error logging for parsing and compiling amod files.
//!
//! Compilation never bails out of the middle of a phase: every defect is
//! recorded here and later phases decide whether it is safe to continue.

use std::fmt;
use std::io::{self, Write};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warning => write!(f, "WARN"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

/// Position of an issue within the amod source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub line: usize,
    pub column_start: usize,
    pub column_end: usize,
}

impl Location {
    pub fn new(line: usize, column_start: usize, column_end: usize) -> Self {
        Self {
            line,
            column_start,
            column_end,
        }
    }

    /// A location on a line without meaningful column info.
    pub fn line_only(line: usize) -> Self {
        Self {
            line,
            column_start: 0,
            column_end: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub level: Level,
    pub text: String,
    pub location: Option<Location>,
}

/// Ordered list of issues found while processing one amod file.
#[derive(Debug, Default)]
pub struct Log {
    has_error: bool,
    issues: Vec<Issue>,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn info(&mut self, location: Option<Location>, text: impl Into<String>) {
        self.add_entry(location, Level::Info, text.into());
    }

    pub fn warning(&mut self, location: Option<Location>, text: impl Into<String>) {
        self.add_entry(location, Level::Warning, text.into());
    }

    pub fn error(&mut self, location: Option<Location>, text: impl Into<String>) {
        self.add_entry(location, Level::Error, text.into());
        self.has_error = true;
    }

    /// Text of the first entry. Used when parsing user-supplied buffer
    /// contents, where we want a single message rather than a rendered log.
    pub fn first_entry(&self) -> Option<&str> {
        self.issues.first().map(|i| i.text.as_str())
    }

    /// Write the whole log, one entry per line, prefixed with the level and
    /// suffixed with the source location if there is one.
    pub fn write(&self, w: &mut impl Write) -> io::Result<()> {
        for entry in &self.issues {
            write!(w, "{}: {}", entry.level, entry.text)?;
            if let Some(loc) = &entry.location {
                write!(w, " (line {}, col {})", loc.line, loc.column_start)?;
            }
            writeln!(w)?;
        }

        Ok(())
    }

    fn add_entry(&mut self, location: Option<Location>, level: Level, text: String) {
        // A default-constructed location means "not set" - drop it
        let location = location.filter(|loc| *loc != Location::default());

        self.issues.push(Issue {
            level,
            text,
            location,
        });
    }
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.write(&mut buf).map_err(|_| fmt::Error)?;
        write!(f, "{}", String::from_utf8_lossy(&buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_and_order() {
        let mut log = Log::new();
        assert!(!log.has_issues());

        log.info(None, "starting");
        log.warning(Some(Location::new(3, 1, 4)), "odd but ok");
        assert!(!log.has_error());

        log.error(Some(Location::new(5, 2, 8)), "bad");
        assert!(log.has_error());
        assert_eq!(log.all_issues().len(), 3);

        assert_eq!(
            log.to_string(),
            "INFO: starting\nWARN: odd but ok (line 3, col 1)\nERROR: bad (line 5, col 2)\n"
        );
    }

    #[test]
    fn test_empty_location_dropped() {
        let mut log = Log::new();
        log.error(Some(Location::default()), "no position");
        assert_eq!(log.to_string(), "ERROR: no position\n");
    }
}
