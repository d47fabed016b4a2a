//! Context-free grammar model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Keyword for the empty production.
pub const EPSILON_WORD: &str = "epsilon";

/// One symbol on the right-hand side of a production.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "lowercase")]
pub enum ProductionElement {
    Terminal(String),
    NonTerminal(String),
    Epsilon,
}

impl ProductionElement {
    pub fn name(&self) -> &str {
        match self {
            ProductionElement::Terminal(name) | ProductionElement::NonTerminal(name) => name,
            ProductionElement::Epsilon => EPSILON_WORD,
        }
    }
}

impl fmt::Display for ProductionElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A production `generator -> elements`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductionRule {
    generator: String,
    elements: Vec<ProductionElement>,
}

impl ProductionRule {
    pub fn new(generator: impl Into<String>) -> Self {
        Self {
            generator: generator.into(),
            elements: Vec::new(),
        }
    }

    pub fn generator(&self) -> &str {
        &self.generator
    }

    pub fn elements(&self) -> &[ProductionElement] {
        &self.elements
    }

    pub fn push(&mut self, element: ProductionElement) {
        self.elements.push(element);
    }

    pub fn terminal(mut self, name: impl Into<String>) -> Self {
        self.push(ProductionElement::Terminal(name.into()));
        self
    }

    pub fn nonterminal(mut self, name: impl Into<String>) -> Self {
        self.push(ProductionElement::NonTerminal(name.into()));
        self
    }

    pub fn epsilon(mut self) -> Self {
        self.push(ProductionElement::Epsilon);
        self
    }
}

impl fmt::Display for ProductionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.generator)?;
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str(" +")?;
            }
            write!(f, " {}", element)?;
        }
        Ok(())
    }
}

/// A context-free grammar.
///
/// Nonterminals, terminals and rules keep declaration order; rule order
/// decides which machine call wins when several are eligible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFreeGrammar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<String>,
    nonterminals: Vec<String>,
    terminals: Vec<String>,
    rules: Vec<ProductionRule>,
}

impl ContextFreeGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Option<&str> {
        self.start.as_deref()
    }

    pub fn set_start(&mut self, symbol: impl Into<String>) {
        self.start = Some(symbol.into());
    }

    pub fn nonterminals(&self) -> &[String] {
        &self.nonterminals
    }

    pub fn terminals(&self) -> &[String] {
        &self.terminals
    }

    pub fn rules(&self) -> &[ProductionRule] {
        &self.rules
    }

    /// Rules generated by `nonterminal`, in declaration order.
    pub fn rules_for<'a>(
        &'a self,
        nonterminal: &'a str,
    ) -> impl Iterator<Item = &'a ProductionRule> {
        self.rules.iter().filter(move |r| r.generator == nonterminal)
    }

    pub fn has_nonterminal(&self, name: &str) -> bool {
        self.nonterminals.iter().any(|n| n == name)
    }

    pub fn has_terminal(&self, name: &str) -> bool {
        self.terminals.iter().any(|t| t == name)
    }

    /// Declares a nonterminal. Returns false if it was already declared.
    pub fn add_nonterminal(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.has_nonterminal(&name) {
            return false;
        }
        self.nonterminals.push(name);
        true
    }

    /// Declares a terminal. Returns false if it was already declared.
    pub fn add_terminal(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.has_terminal(&name) {
            return false;
        }
        self.terminals.push(name);
        true
    }

    /// Adds a rule. Returns false for a duplicate of an existing rule.
    pub fn add_rule(&mut self, rule: ProductionRule) -> bool {
        if self.rules.contains(&rule) {
            return false;
        }
        self.rules.push(rule);
        true
    }
}
