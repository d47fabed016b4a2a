//! Grammar compiler.
//!
//! Turns a [`ContextFreeGrammar`] into one automaton per nonterminal. Each
//! automaton is a trie over the right-hand sides of its productions: rules
//! sharing a leading sequence of symbols share the states for it.

use crate::error::GrammarError;
use crate::grammar::{ContextFreeGrammar, ProductionElement};
use polisin_automata::{Action, Automaton, MachineSet, StateId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Name of the accept state in every compiled automaton.
pub const FINAL_STATE: &str = "Final";

/// Name of the error sink in every compiled automaton.
pub const ERROR_STATE: &str = "Error";

/// Output of [`GrammarCompiler::compile`].
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    machines: Arc<MachineSet>,
    grammar: ContextFreeGrammar,
    start: String,
    checksum: String,
}

impl CompiledGrammar {
    /// The compiled automata, start machine first.
    pub fn machines(&self) -> &Arc<MachineSet> {
        &self.machines
    }

    pub fn grammar(&self) -> &ContextFreeGrammar {
        &self.grammar
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    /// CRC32C of the grammar's JSON form, as 8 hex digits.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }
}

/// Compiles grammars into machine sets.
pub struct GrammarCompiler;

impl GrammarCompiler {
    pub fn compile(grammar: &ContextFreeGrammar) -> Result<CompiledGrammar, GrammarError> {
        let start = Self::validate(grammar)?;

        let mut machines = Vec::with_capacity(grammar.nonterminals().len());
        machines.push(Self::compile_nonterminal(grammar, start));
        for nonterminal in grammar.nonterminals() {
            if nonterminal != start {
                machines.push(Self::compile_nonterminal(grammar, nonterminal));
            }
        }

        let set = MachineSet::with_start(machines, start)?;
        let checksum = Self::checksum(grammar)?;

        tracing::debug!(
            start,
            machines = set.len(),
            states = set.state_count(),
            checksum = %checksum,
            "compiled grammar"
        );

        Ok(CompiledGrammar {
            machines: Arc::new(set),
            grammar: grammar.clone(),
            start: start.to_string(),
            checksum,
        })
    }

    fn checksum(grammar: &ContextFreeGrammar) -> Result<String, GrammarError> {
        let json_bytes = serde_json::to_vec(grammar)?;
        Ok(format!("{:08x}", crc32c::crc32c(&json_bytes)))
    }

    /// Checks the grammar is well formed and returns its start symbol.
    fn validate(grammar: &ContextFreeGrammar) -> Result<&str, GrammarError> {
        let start = grammar.start().ok_or(GrammarError::MissingStartSymbol)?;
        if !grammar.has_nonterminal(start) {
            return Err(GrammarError::UnknownStartSymbol {
                symbol: start.to_string(),
            });
        }

        for terminal in grammar.terminals() {
            if grammar.has_nonterminal(terminal) {
                return Err(GrammarError::SymbolClash {
                    symbol: terminal.clone(),
                });
            }
        }

        for rule in grammar.rules() {
            if !grammar.has_nonterminal(rule.generator()) {
                return Err(GrammarError::UndeclaredGenerator {
                    rule: rule.to_string(),
                });
            }
            for element in rule.elements() {
                match element {
                    ProductionElement::NonTerminal(symbol) if !grammar.has_nonterminal(symbol) => {
                        return Err(GrammarError::UndeclaredNonTerminal {
                            symbol: symbol.clone(),
                            rule: rule.to_string(),
                        });
                    }
                    ProductionElement::Terminal(symbol) if grammar.has_nonterminal(symbol) => {
                        return Err(GrammarError::SymbolClash {
                            symbol: symbol.clone(),
                        });
                    }
                    _ => {}
                }
            }
        }

        for nonterminal in grammar.nonterminals() {
            if grammar.rules_for(nonterminal).next().is_none() {
                return Err(GrammarError::NoProductions {
                    nonterminal: nonterminal.clone(),
                });
            }
        }

        Self::check_left_recursion(grammar)?;

        Ok(start)
    }

    /// Rejects nonterminals that can call themselves before consuming a
    /// symbol. The stack machine commits to a call on lookahead alone, so such
    /// a call would recurse until the depth bound stops it.
    fn check_left_recursion(grammar: &ContextFreeGrammar) -> Result<(), GrammarError> {
        let nullable = Self::nullable(grammar);

        // Nonterminals each one may call at the start of a production.
        let mut leading: HashMap<&str, Vec<&str>> = HashMap::new();
        for rule in grammar.rules() {
            let callees = leading.entry(rule.generator()).or_default();
            for element in rule.elements() {
                match element {
                    ProductionElement::Epsilon => continue,
                    ProductionElement::Terminal(_) => break,
                    ProductionElement::NonTerminal(symbol) => {
                        callees.push(symbol.as_str());
                        if !nullable.contains(symbol.as_str()) {
                            break;
                        }
                    }
                }
            }
        }

        for nonterminal in grammar.nonterminals() {
            let mut visited = HashSet::new();
            let mut pending: Vec<&str> = leading
                .get(nonterminal.as_str())
                .cloned()
                .unwrap_or_default();
            while let Some(callee) = pending.pop() {
                if callee == nonterminal.as_str() {
                    return Err(GrammarError::LeftRecursion {
                        nonterminal: nonterminal.clone(),
                    });
                }
                if visited.insert(callee) {
                    if let Some(next) = leading.get(callee) {
                        pending.extend(next.iter().copied());
                    }
                }
            }
        }

        Ok(())
    }

    /// Nonterminals that can derive the empty string.
    fn nullable(grammar: &ContextFreeGrammar) -> HashSet<&str> {
        let mut nullable = HashSet::new();
        loop {
            let mut changed = false;
            for rule in grammar.rules() {
                if nullable.contains(rule.generator()) {
                    continue;
                }
                let empty = rule.elements().iter().all(|element| match element {
                    ProductionElement::Epsilon => true,
                    ProductionElement::Terminal(_) => false,
                    ProductionElement::NonTerminal(symbol) => nullable.contains(symbol.as_str()),
                });
                if empty {
                    nullable.insert(rule.generator());
                    changed = true;
                }
            }
            if !changed {
                return nullable;
            }
        }
    }

    fn compile_nonterminal(grammar: &ContextFreeGrammar, nonterminal: &str) -> Automaton {
        let mut automaton = Automaton::new(nonterminal);
        let initial = automaton.initial();
        let accept = automaton.add_state(FINAL_STATE);
        automaton.set_accept(accept);
        let error = automaton.add_state(ERROR_STATE);
        automaton.set_error(error);
        automaton.set_alternate(error, error, None);

        let mut counter = 1;
        for rule in grammar.rules_for(nonterminal) {
            let mut cursor = initial;
            for element in rule.elements() {
                match element {
                    ProductionElement::Terminal(symbol) => {
                        let existing = automaton
                            .state(cursor)
                            .find_transition(symbol)
                            .map(|t| t.to());
                        cursor = match existing {
                            Some(next) => next,
                            None => {
                                let next = Self::fresh_state(&mut automaton, &mut counter, symbol);
                                automaton.add_transition(
                                    cursor,
                                    next,
                                    symbol.as_str(),
                                    Some(Action::AppendLeaf),
                                );
                                automaton.set_alternate(cursor, error, None);
                                next
                            }
                        };
                    }
                    ProductionElement::NonTerminal(symbol) => {
                        let existing = automaton.state(cursor).find_call(symbol).map(|c| c.to());
                        cursor = match existing {
                            Some(next) => next,
                            None => {
                                let next = Self::fresh_state(&mut automaton, &mut counter, symbol);
                                automaton.add_call(
                                    cursor,
                                    next,
                                    symbol.as_str(),
                                    Some(Action::Descend),
                                    Some(Action::Ascend),
                                );
                                next
                            }
                        };
                    }
                    ProductionElement::Epsilon => {
                        automaton.set_epsilon(initial, accept, None);
                    }
                }
            }
            if cursor != initial {
                automaton.set_epsilon(cursor, accept, None);
            }
        }

        tracing::trace!(
            machine = nonterminal,
            states = automaton.len(),
            "compiled nonterminal"
        );
        automaton
    }

    fn fresh_state(automaton: &mut Automaton, counter: &mut usize, symbol: &str) -> StateId {
        let id = automaton.add_state(format!("State{}_{}", counter, symbol));
        *counter += 1;
        id
    }
}
