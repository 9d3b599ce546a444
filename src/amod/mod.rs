//! Compilation of amod files into [`Model`]s.
//!
//! The pipeline is strictly one-way: source text -> tokens -> parse tree ->
//! model + diagnostics. Nothing here performs I/O; the caller reads the
//! source and decides what to do with the results.

pub mod ast;
pub mod builder;
pub mod lexer;
pub mod parser;

use thiserror::Error;

use crate::issues::Log;
use crate::model::{Model, Pattern};
use lexer::Lexer;
use parser::Parser;

#[derive(Debug, Error)]
#[error("cannot parse chunk: {message}")]
pub struct ParseChunkError {
    pub message: String,
}

/// Compile amod source. All defects are recorded in `log`; a model is
/// returned only when compilation produced no errors.
pub fn generate_model(src: &str, log: &mut Log) -> Option<Model> {
    let tokens = Lexer::tokenize(src);

    let file = match Parser::parse_file(tokens) {
        Ok(file) => file,
        Err(err) => {
            log.error(Some(err.location), err.message);
            return None;
        }
    };

    let model = builder::build(&file, log);

    if log.has_error() { None } else { Some(model) }
}

/// Parse a pattern given as user input (e.g. an initial goal), validating
/// it against the model's chunk types. Surrounding brackets are optional.
pub fn parse_chunk(model: &Model, chunk: &str) -> Result<Pattern, ParseChunkError> {
    let mut text = chunk.trim().to_string();
    if !text.starts_with('[') {
        text.insert(0, '[');
    }
    if !text.ends_with(']') {
        text.push(']');
    }

    let tokens = Lexer::tokenize(&text);
    let ast_pattern = Parser::parse_standalone_pattern(tokens).map_err(|err| ParseChunkError {
        message: err.message,
    })?;

    let mut log = Log::new();
    builder::validate_user_pattern(model, &mut log, &ast_pattern).map_err(|()| ParseChunkError {
        message: log
            .first_entry()
            .unwrap_or("invalid pattern")
            .to_string(),
    })?;

    Ok(builder::user_pattern(&ast_pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(src: &str) -> (Option<Model>, Log) {
        let mut log = Log::new();
        let model = generate_model(src, &mut log);
        (model, log)
    }

    #[test]
    fn test_minimum_model() {
        let (model, log) = generate(
            "
            ~~ model ~~
            name: Test
            ~~ config ~~
            ~~ init ~~
            ~~ productions ~~",
        );

        assert!(!log.has_issues(), "log: {log}");
        let model = model.expect("compiles");
        assert_eq!(model.name, "Test");
        assert!(model.productions.is_empty());
    }

    #[test]
    fn test_parse_error_is_logged() {
        let (model, log) = generate(
            "
            ~~ model ~~
            ~~ config ~~
            ~~ init ~~
            ~~ productions ~~",
        );

        assert!(model.is_none());
        assert!(log.has_error());
        assert!(
            log.to_string().contains("unexpected token"),
            "log: {log}"
        );
    }

    #[test]
    fn test_parse_chunk() {
        let (model, _) = generate(
            "
            ~~ model ~~
            name: Test
            ~~ config ~~
            chunks { [countFrom: start end status] }
            ~~ init ~~
            ~~ productions ~~",
        );
        let model = model.unwrap();

        // brackets are optional
        for text in ["[countFrom: 2 5 starting]", "countFrom: 2 5 starting"] {
            let pattern = parse_chunk(&model, text).expect("valid chunk");
            assert_eq!(pattern.chunk_name, "countFrom");
            assert_eq!(pattern.slots.len(), 3);
        }

        let err = parse_chunk(&model, "[countFrom: 2 5]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot parse chunk: invalid chunk - 'countFrom' expects 3 slots"
        );

        let err = parse_chunk(&model, "[bogus: 1]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot parse chunk: could not find chunk named 'bogus'"
        );
    }
}
