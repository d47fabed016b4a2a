//! Grammar file loading.
//!
//! Text grammars hold one production per line:
//!
//! ```text
//! A -> s + B
//! B -> s
//! B -> v
//! C -> epsilon
//! ```
//!
//! The characters `' * - > < = +` separate symbols. The first word of a line
//! is its generator, and the generator of the first line is the start
//! symbol. A word that is the generator of some line is a nonterminal,
//! `epsilon` (any case) is the empty production, and anything else is a
//! terminal. Blank lines and lines starting with `#` are skipped.

use crate::definition::GrammarDefinition;
use crate::error::GrammarError;
use crate::grammar::{ContextFreeGrammar, ProductionElement, ProductionRule, EPSILON_WORD};
use std::path::Path;

const SEPARATORS: &[char] = &['\'', '*', '-', '>', '<', '=', '+'];

/// Reads grammars from disk or from strings.
pub struct GrammarLoader;

impl GrammarLoader {
    /// Loads a grammar, choosing the format from the file extension:
    /// `.json`, `.yaml`/`.yml`, or the line-based text format otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<ContextFreeGrammar, GrammarError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| GrammarError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let grammar = match extension.as_deref() {
            Some("json") => GrammarDefinition::from_json_str(&content)?.into_grammar()?,
            Some("yaml") | Some("yml") => {
                GrammarDefinition::from_yaml_str(&content)?.into_grammar()?
            }
            _ => Self::parse_text(&content)?,
        };

        tracing::debug!(
            path = %path.display(),
            rules = grammar.rules().len(),
            nonterminals = grammar.nonterminals().len(),
            "loaded grammar"
        );
        Ok(grammar)
    }

    /// Parses the line-based text format.
    pub fn parse_text(text: &str) -> Result<ContextFreeGrammar, GrammarError> {
        let lines: Vec<(usize, Vec<&str>)> = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim_start().starts_with('#'))
            .map(|(i, line)| {
                let words: Vec<&str> = line
                    .split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
                    .filter(|w| !w.is_empty())
                    .collect();
                (i + 1, words)
            })
            .filter(|(_, words)| !words.is_empty())
            .collect();

        let mut grammar = ContextFreeGrammar::new();

        // Generators first, so later words can be classified.
        for (_, words) in &lines {
            grammar.add_nonterminal(words[0]);
        }
        if let Some((_, words)) = lines.first() {
            grammar.set_start(words[0]);
        }

        for (line, words) in &lines {
            if words.len() < 2 {
                return Err(GrammarError::InvalidRule {
                    line: *line,
                    reason: format!(
                        "production for '{}' has no right-hand side (use '{}')",
                        words[0], EPSILON_WORD
                    ),
                });
            }

            let mut rule = ProductionRule::new(words[0]);
            for &symbol in &words[1..] {
                let element = if grammar.has_nonterminal(symbol) {
                    ProductionElement::NonTerminal(symbol.to_string())
                } else if symbol.eq_ignore_ascii_case(EPSILON_WORD) {
                    ProductionElement::Epsilon
                } else {
                    grammar.add_terminal(symbol);
                    ProductionElement::Terminal(symbol.to_string())
                };
                rule.push(element);
            }
            grammar.add_rule(rule);
        }

        Ok(grammar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    const SAMPLE: &str = "A -> s + B\nB -> s\n\nB -> v\n";

    #[test]
    fn test_parse_text() {
        let grammar = GrammarLoader::parse_text(SAMPLE).unwrap();
        assert_eq!(grammar.start(), Some("A"));
        assert_eq!(grammar.nonterminals(), ["A", "B"]);
        assert_eq!(grammar.terminals(), ["s", "v"]);
        let rules: Vec<String> = grammar.rules().iter().map(|r| r.to_string()).collect();
        assert_eq!(rules, vec!["A -> s + B", "B -> s", "B -> v"]);
    }

    #[test]
    fn test_separators_and_epsilon() {
        let grammar =
            GrammarLoader::parse_text("S = 'det' * N\nN => Epsilon\n# comment\n").unwrap();
        let s = &grammar.rules()[0];
        assert_eq!(
            s.elements(),
            [
                ProductionElement::Terminal("det".into()),
                ProductionElement::NonTerminal("N".into())
            ]
        );
        assert_eq!(grammar.rules()[1].elements(), [ProductionElement::Epsilon]);
    }

    #[test]
    fn test_duplicate_lines_collapse() {
        let grammar = GrammarLoader::parse_text("A -> s\nA -> s\n").unwrap();
        assert_eq!(grammar.rules().len(), 1);
    }

    #[test]
    fn test_missing_rhs() {
        let err = GrammarLoader::parse_text("A -> s\nB ->\n").unwrap_err();
        match err {
            GrammarError::InvalidRule { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_text_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let grammar = GrammarLoader::load(file.path()).unwrap();
        assert_eq!(grammar.rules().len(), 3);
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(b"start: A\nrules:\n  - lhs: A\n    rhs: [s, B]\n  - lhs: B\n    rhs: v\n")
            .unwrap();

        let grammar = GrammarLoader::load(file.path()).unwrap();
        assert_eq!(grammar.rules()[0].to_string(), "A -> s + B");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = GrammarLoader::load(dir.path().join("absent.grammar")).unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
