use std::io;
use thiserror::Error;

/// Custom error types for grammar construction, generation and membership checks
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid grammar: {0}")]
    InvalidGrammar(String),

    #[error("Unknown non-terminal: {0}")]
    UnknownNonTerminal(char),

    #[error("Malformed production {lhs} -> {rhs}: {reason}")]
    MalformedProduction {
        lhs: String,
        rhs: String,
        reason: String,
    },

    #[error("Unknown symbol '{symbol}' at position {position}")]
    UnknownSymbol { symbol: char, position: usize },

    #[error("Generation exceeded the maximum depth of {limit}")]
    GenerationDepthExceeded { limit: usize },
}

/// Result type for grammar operations
pub type Result<T> = std::result::Result<T, GrammarError>;

/// Trait extension for Option<T> to convert to GrammarError
pub trait OptionExt<T> {
    fn ok_or_grammar_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_grammar_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.ok_or_else(|| GrammarError::InvalidGrammar(f()))
    }
}

/// Render a symbol sequence the way rules are written, `$` standing for the empty side
pub fn render_symbols(symbols: &[char]) -> String {
    if symbols.is_empty() {
        "$".to_string()
    } else {
        symbols.iter().collect()
    }
}
