//! # polisin-syntax
//!
//! Syntax layer for polisin.
//!
//! This crate provides:
//! - Tokens and the tokenizer contract, with scripted and lexicon-backed tokenizers
//! - The syntax tree built as a side effect of automaton transitions
//! - The analysis driver in single-hypothesis and backtracking modes

pub mod analyser;
pub mod builder;
pub mod error;
pub mod lexicon;
pub mod token;
pub mod tree;

pub use analyser::{AnalyserConfig, AnalysisMode, SyntacticAnalyser};
pub use builder::TreeBuilder;
pub use error::{LexiconError, ScriptError, SyntaxError};
pub use lexicon::{Lexicon, LexiconTokenizer};
pub use token::{ScriptedTokenizer, Token, Tokenizer};
pub use tree::{Node, NodeId, SyntaxTree};
