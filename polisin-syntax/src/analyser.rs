//! Analysis driver.
//!
//! Feeds token categories to a [`StackMachine`] and lets the tree-building
//! actions on its transitions grow the syntax tree.
//!
//! Two modes are offered:
//!
//! - **Single hypothesis**: one token per word; the first word the machine
//!   cannot consume rejects the sentence.
//! - **Backtracking**: every reading of every word; when a choice leads to
//!   rejection or into an error state, the most recent choice point is moved
//!   to its next reading and the sentence is re-parsed from scratch.

use crate::builder::TreeBuilder;
use crate::error::SyntaxError;
use crate::token::{Token, Tokenizer};
use crate::tree::SyntaxTree;
use polisin_automata::{MachineSet, StackLimits, StackMachine};
use polisin_grammar::CompiledGrammar;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How the analyser treats lexical ambiguity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    #[default]
    Single,
    Backtracking,
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Single => write!(f, "single"),
            AnalysisMode::Backtracking => write!(f, "backtracking"),
        }
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(AnalysisMode::Single),
            "backtracking" => Ok(AnalysisMode::Backtracking),
            other => Err(format!("unknown analysis mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyserConfig {
    /// Full re-parses allowed in one backtracking analysis.
    pub max_restarts: usize,
    pub limits: StackLimits,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            max_restarts: 10_000,
            limits: StackLimits::default(),
        }
    }
}

/// Syntactic analyser over one compiled grammar.
///
/// Each analyser owns its parse session; the machine set underneath is
/// shared and never mutated, so many analysers may use the same grammar.
pub struct SyntacticAnalyser {
    machine: StackMachine,
    builder: TreeBuilder,
    config: AnalyserConfig,
}

impl SyntacticAnalyser {
    pub fn new(grammar: &CompiledGrammar) -> Self {
        Self::with_config(grammar, AnalyserConfig::default())
    }

    pub fn with_config(grammar: &CompiledGrammar, config: AnalyserConfig) -> Self {
        Self::build(Arc::clone(grammar.machines()), config)
    }

    /// Wraps a machine set built by hand. The tree-building actions are
    /// installed on a private copy of its automata.
    pub fn from_machine_set(set: Arc<MachineSet>) -> Self {
        let set = MachineSet::clone(&set).with_tree_actions();
        Self::build(Arc::new(set), AnalyserConfig::default())
    }

    fn build(set: Arc<MachineSet>, config: AnalyserConfig) -> Self {
        let builder = TreeBuilder::new(set.start().name());
        let machine = StackMachine::with_limits(set, config.limits);
        Self {
            machine,
            builder,
            config,
        }
    }

    pub fn config(&self) -> AnalyserConfig {
        self.config
    }

    pub fn tree(&self) -> &SyntaxTree {
        self.builder.tree()
    }

    pub fn stack_machine(&self) -> &StackMachine {
        &self.machine
    }

    /// Restarts the stack machine and empties the tree down to its root.
    pub fn reset(&mut self) {
        self.machine.restart();
        self.builder.reset();
    }

    /// Runs the analysis in the given mode.
    pub fn run<T: Tokenizer>(
        &mut self,
        mode: AnalysisMode,
        tokenizer: &mut T,
    ) -> Result<bool, SyntaxError> {
        match mode {
            AnalysisMode::Single => self.analyse(tokenizer),
            AnalysisMode::Backtracking => self.analyse_backtracking(tokenizer),
        }
    }

    /// Single-hypothesis analysis: the tokenizer's preferred reading of each
    /// word is fed in order.
    pub fn analyse<T: Tokenizer>(&mut self, tokenizer: &mut T) -> Result<bool, SyntaxError> {
        self.reset();
        let mut position = 0;
        while tokenizer.has_more_tokens() {
            let token = tokenizer.next_token().map_err(SyntaxError::tokenizer)?;
            if !self.feed(&token) {
                tracing::debug!(
                    position,
                    category = %token.category,
                    "token not consumed, rejecting"
                );
                return Ok(false);
            }
            position += 1;
        }
        Ok(self.settle())
    }

    /// Single-hypothesis analysis over prepared tokens.
    pub fn analyse_tokens(&mut self, tokens: &[Token]) -> Result<bool, SyntaxError> {
        self.reset();
        for (position, token) in tokens.iter().enumerate() {
            if !self.feed(token) {
                tracing::debug!(
                    position,
                    category = %token.category,
                    "token not consumed, rejecting"
                );
                return Ok(false);
            }
        }
        Ok(self.settle())
    }

    /// Backtracking analysis: every reading of every word is collected
    /// first, then searched.
    pub fn analyse_backtracking<T: Tokenizer>(
        &mut self,
        tokenizer: &mut T,
    ) -> Result<bool, SyntaxError> {
        let mut positions = Vec::new();
        while tokenizer.has_more_tokens() {
            positions.push(
                tokenizer
                    .next_token_candidates()
                    .map_err(SyntaxError::tokenizer)?,
            );
        }
        self.analyse_candidates(&positions)
    }

    /// Backtracking analysis over prepared candidate lists, one list per word
    /// in preference order.
    ///
    /// A single backtrack point is kept: the nearest position whose choice
    /// will be revised next. Positions before it replay their recorded
    /// choice; positions after it start again from their first reading.
    pub fn analyse_candidates(&mut self, positions: &[Vec<Token>]) -> Result<bool, SyntaxError> {
        self.reset();

        let mut choices = vec![0usize; positions.len()];
        let mut backtrack: Option<usize> = None;
        let mut restarts = 0;
        let mut i = 0;

        while i < positions.len() {
            let candidates = &positions[i];
            let first = match backtrack {
                Some(point) if point == i => {
                    let next = choices[i] + 1;
                    if next >= candidates.len() {
                        // Choices at i are used up: revise the one before.
                        let Some(previous) = i.checked_sub(1) else {
                            tracing::debug!(restarts, "backtracking exhausted");
                            return Ok(false);
                        };
                        backtrack = Some(previous);
                        self.restart_search(&mut restarts)?;
                        i = 0;
                        continue;
                    }
                    next
                }
                Some(point) if i < point => choices[i],
                _ => 0,
            };

            let mut consumed = false;
            for (j, token) in candidates.iter().enumerate().skip(first) {
                if self.feed(token) {
                    choices[i] = j;
                    consumed = true;
                    break;
                }
            }

            if !consumed {
                let Some(previous) = i.checked_sub(1) else {
                    tracing::debug!(restarts, "no reading of the first word is accepted");
                    return Ok(false);
                };
                tracing::debug!(position = i, backtrack_to = previous, "no reading consumed");
                backtrack = Some(previous);
                self.restart_search(&mut restarts)?;
                i = 0;
            } else if self.machine.is_at_error() {
                tracing::debug!(
                    position = i,
                    choice = choices[i],
                    "reading led to an error state"
                );
                backtrack = Some(i);
                self.restart_search(&mut restarts)?;
                i = 0;
            } else {
                i += 1;
            }
        }

        Ok(self.settle())
    }

    fn restart_search(&mut self, restarts: &mut usize) -> Result<(), SyntaxError> {
        *restarts += 1;
        if *restarts > self.config.max_restarts {
            tracing::warn!(
                max_restarts = self.config.max_restarts,
                "backtracking budget exhausted"
            );
            return Err(SyntaxError::BudgetExhausted {
                restarts: self.config.max_restarts,
            });
        }
        self.reset();
        Ok(())
    }

    fn feed(&mut self, token: &Token) -> bool {
        self.builder.set_token(token.clone());
        let consumed = self.machine.input(&token.category, &mut self.builder);
        self.builder.commit();
        consumed
    }

    fn settle(&mut self) -> bool {
        self.machine.finish(&mut self.builder);
        self.builder.commit();
        self.machine.is_accepted()
    }
}
