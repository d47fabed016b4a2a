//! # polisin-grammar
//!
//! Grammar layer for polisin.
//!
//! This crate provides:
//! - The context-free grammar model (rules, terminals, nonterminals)
//! - Loaders for the line-based grammar format and a JSON/YAML definition DSL
//! - The compiler turning a grammar into one automaton per nonterminal

pub mod compiler;
pub mod definition;
pub mod error;
pub mod grammar;
pub mod loader;

pub use compiler::{CompiledGrammar, GrammarCompiler, ERROR_STATE, FINAL_STATE};
pub use definition::{GrammarDefinition, RuleDefinition};
pub use error::GrammarError;
pub use grammar::{ContextFreeGrammar, ProductionElement, ProductionRule, EPSILON_WORD};
pub use loader::GrammarLoader;
