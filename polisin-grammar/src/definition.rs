//! Grammar definition DSL.
//!
//! A grammar definition is a small JSON or YAML document:
//!
//! ```json
//! {
//!   "start": "A",
//!   "rules": [
//!     { "lhs": "A", "rhs": ["s", "B"] },
//!     { "lhs": "B", "rhs": "s" },
//!     { "lhs": "B", "rhs": "v" }
//!   ]
//! }
//! ```
//!
//! Every rule's `lhs` is a nonterminal. A right-hand side word naming a
//! nonterminal is a call, `epsilon` (or an empty list) is the empty
//! production, anything else is a terminal.

use crate::error::GrammarError;
use crate::grammar::{ContextFreeGrammar, ProductionElement, ProductionRule, EPSILON_WORD};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw grammar definition as written by users.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrammarDefinition {
    /// Start symbol. Defaults to the generator of the first rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    /// Declared terminals. When non-empty, every terminal used by a rule
    /// must appear here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terminals: Vec<String>,

    pub rules: Vec<RuleDefinition>,

    /// Free-form metadata, ignored by the compiler.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, serde_json::Value>,
}

/// One production.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub lhs: String,

    /// A single string (split on whitespace) or a list of symbols.
    #[serde(default, deserialize_with = "deserialize_rhs")]
    pub rhs: Vec<String>,
}

fn deserialize_rhs<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct RhsVisitor;

    impl<'de> Visitor<'de> for RhsVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or array of strings")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.split_whitespace().map(str::to_string).collect())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut symbols = Vec::new();
            while let Some(s) = seq.next_element::<String>()? {
                symbols.push(s);
            }
            Ok(symbols)
        }
    }

    deserializer.deserialize_any(RhsVisitor)
}

impl GrammarDefinition {
    pub fn from_json(value: serde_json::Value) -> Result<Self, GrammarError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, GrammarError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, GrammarError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Resolves symbols and builds the grammar model.
    pub fn into_grammar(self) -> Result<ContextFreeGrammar, GrammarError> {
        if self.rules.is_empty() {
            return Err(GrammarError::InvalidDefinition {
                reason: "definition has no rules".to_string(),
            });
        }

        let mut grammar = ContextFreeGrammar::new();
        for rule in &self.rules {
            if rule.lhs.trim().is_empty() {
                return Err(GrammarError::InvalidDefinition {
                    reason: "rule with an empty lhs".to_string(),
                });
            }
            grammar.add_nonterminal(rule.lhs.as_str());
        }
        for terminal in &self.terminals {
            grammar.add_terminal(terminal.as_str());
        }

        let strict = !self.terminals.is_empty();
        for rule in &self.rules {
            let mut production = ProductionRule::new(rule.lhs.as_str());
            if rule.rhs.is_empty() {
                production.push(ProductionElement::Epsilon);
            }
            for symbol in &rule.rhs {
                let element = if symbol.eq_ignore_ascii_case(EPSILON_WORD) {
                    ProductionElement::Epsilon
                } else if grammar.has_nonterminal(symbol) {
                    ProductionElement::NonTerminal(symbol.clone())
                } else if strict && !grammar.has_terminal(symbol) {
                    return Err(GrammarError::InvalidDefinition {
                        reason: format!(
                            "rule for '{}' uses undeclared terminal '{}'",
                            rule.lhs, symbol
                        ),
                    });
                } else {
                    grammar.add_terminal(symbol.as_str());
                    ProductionElement::Terminal(symbol.clone())
                };
                production.push(element);
            }
            grammar.add_rule(production);
        }

        let start = match self.start {
            Some(start) => start,
            None => self.rules[0].lhs.clone(),
        };
        grammar.set_start(start);
        Ok(grammar)
    }
}
