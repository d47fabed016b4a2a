//! Grammar error types.

use polisin_automata::AutomataError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or compiling a grammar.
///
/// Every variant is fatal: no automaton is produced for a grammar that
/// fails here.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {reason}")]
    InvalidRule { line: usize, reason: String },

    #[error("invalid grammar definition: {reason}")]
    InvalidDefinition { reason: String },

    #[error("grammar has no start symbol")]
    MissingStartSymbol,

    #[error("start symbol '{symbol}' is not a declared nonterminal")]
    UnknownStartSymbol { symbol: String },

    #[error("rule '{rule}' has an undeclared generator")]
    UndeclaredGenerator { rule: String },

    #[error("rule '{rule}' references undeclared nonterminal '{symbol}'")]
    UndeclaredNonTerminal { symbol: String, rule: String },

    #[error("nonterminal '{nonterminal}' has no productions")]
    NoProductions { nonterminal: String },

    #[error("nonterminal '{nonterminal}' is left-recursive")]
    LeftRecursion { nonterminal: String },

    #[error("symbol '{symbol}' is used both as a terminal and a nonterminal")]
    SymbolClash { symbol: String },

    #[error("automaton error: {0}")]
    Automata(#[from] AutomataError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GrammarError {
    /// Returns a stable error code for reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            GrammarError::Io { .. } => "IO_ERROR",
            GrammarError::InvalidRule { .. } => "INVALID_RULE",
            GrammarError::InvalidDefinition { .. } => "INVALID_DEFINITION",
            GrammarError::MissingStartSymbol => "MISSING_START_SYMBOL",
            GrammarError::UnknownStartSymbol { .. } => "UNKNOWN_START_SYMBOL",
            GrammarError::UndeclaredGenerator { .. } => "UNDECLARED_GENERATOR",
            GrammarError::UndeclaredNonTerminal { .. } => "UNDECLARED_NONTERMINAL",
            GrammarError::NoProductions { .. } => "NO_PRODUCTIONS",
            GrammarError::LeftRecursion { .. } => "LEFT_RECURSION",
            GrammarError::SymbolClash { .. } => "SYMBOL_CLASH",
            GrammarError::Automata(e) => e.error_code(),
            GrammarError::Json(_) => "BAD_DEFINITION",
            GrammarError::Yaml(_) => "BAD_DEFINITION",
        }
    }
}
