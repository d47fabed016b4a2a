//! Syntax error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from running an analysis.
///
/// A sentence the grammar does not derive is not an error: the analyser
/// reports it as `Ok(false)`.
#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error("tokenizer error: {0}")]
    Tokenizer(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("backtracking budget exhausted after {restarts} restarts")]
    BudgetExhausted { restarts: usize },
}

impl SyntaxError {
    /// Wraps a tokenizer failure without reinterpreting it.
    pub fn tokenizer<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SyntaxError::Tokenizer(Box::new(err))
    }

    /// Returns a stable error code for reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            SyntaxError::Tokenizer(_) => "TOKENIZER_ERROR",
            SyntaxError::BudgetExhausted { .. } => "BUDGET_EXHAUSTED",
        }
    }
}

/// Errors from loading a lexicon or looking words up in it.
#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown word: {word}")]
    UnknownWord { word: String },

    #[error("word '{word}' has no categories")]
    EmptyEntry { word: String },

    #[error("tokenizer has no more tokens")]
    Exhausted,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors from the scripted tokenizer's input notation.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("word '{word}' has an empty category")]
    EmptyCategory { word: String },

    #[error("tokenizer has no more tokens")]
    Exhausted,
}

impl LexiconError {
    /// Returns a stable error code for reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            LexiconError::Io { .. } => "IO_ERROR",
            LexiconError::UnknownWord { .. } => "UNKNOWN_WORD",
            LexiconError::EmptyEntry { .. } => "EMPTY_ENTRY",
            LexiconError::Exhausted => "EXHAUSTED",
            LexiconError::Json(_) | LexiconError::Yaml(_) => "BAD_LEXICON",
        }
    }
}
