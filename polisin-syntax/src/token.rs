//! Tokens and the tokenizer contract.

use crate::error::ScriptError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One lexical reading of a word.
///
/// `category` is the grammar terminal fed to the automata; `lexeme` is the
/// surface form kept on the syntax tree leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub category: String,
    pub lexeme: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Token {
    pub fn new(category: impl Into<String>, lexeme: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            lexeme: lexeme.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.lexeme, self.category)
    }
}

/// Source of tokens for the analyser.
///
/// Single-hypothesis analysis pulls one token per word with
/// [`next_token`](Tokenizer::next_token); backtracking analysis pulls every
/// reading of the word, in preference order, with
/// [`next_token_candidates`](Tokenizer::next_token_candidates).
pub trait Tokenizer {
    type Error: std::error::Error + Send + Sync + 'static;

    fn set_input(&mut self, text: &str) -> Result<(), Self::Error>;

    fn has_more_tokens(&self) -> bool;

    fn next_token(&mut self) -> Result<Token, Self::Error>;

    fn next_token_candidates(&mut self) -> Result<Vec<Token>, Self::Error>;
}

/// Replays prepared candidate lists.
///
/// Input text uses one whitespace-separated item per word, either a bare
/// category (`det`) or `lexeme/category|category...` (`saw/noun|verb`).
#[derive(Debug, Clone, Default)]
pub struct ScriptedTokenizer {
    positions: Vec<Vec<Token>>,
    cursor: usize,
}

impl ScriptedTokenizer {
    pub fn new(positions: Vec<Vec<Token>>) -> Self {
        Self { positions, cursor: 0 }
    }

    /// One unambiguous token per category, lexeme equal to the category.
    pub fn from_categories<'a>(categories: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(
            categories
                .into_iter()
                .map(|c| vec![Token::new(c, c)])
                .collect(),
        )
    }

    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut tokenizer = Self::default();
        tokenizer.set_input(text)?;
        Ok(tokenizer)
    }

    pub fn positions(&self) -> &[Vec<Token>] {
        &self.positions
    }

    fn parse_word(word: &str) -> Result<Vec<Token>, ScriptError> {
        let (lexeme, categories) = match word.split_once('/') {
            Some((lexeme, categories)) => (lexeme, categories),
            None => (word, word),
        };
        categories
            .split('|')
            .map(|category| {
                if category.is_empty() {
                    Err(ScriptError::EmptyCategory {
                        word: word.to_string(),
                    })
                } else {
                    Ok(Token::new(category, lexeme))
                }
            })
            .collect()
    }
}

impl Tokenizer for ScriptedTokenizer {
    type Error = ScriptError;

    fn set_input(&mut self, text: &str) -> Result<(), ScriptError> {
        self.positions = text
            .split_whitespace()
            .map(Self::parse_word)
            .collect::<Result<_, _>>()?;
        self.cursor = 0;
        Ok(())
    }

    fn has_more_tokens(&self) -> bool {
        self.cursor < self.positions.len()
    }

    fn next_token(&mut self) -> Result<Token, ScriptError> {
        let mut candidates = self.next_token_candidates()?;
        if candidates.is_empty() {
            return Err(ScriptError::Exhausted);
        }
        Ok(candidates.swap_remove(0))
    }

    fn next_token_candidates(&mut self) -> Result<Vec<Token>, ScriptError> {
        let candidates = self
            .positions
            .get(self.cursor)
            .cloned()
            .ok_or(ScriptError::Exhausted)?;
        self.cursor += 1;
        Ok(candidates)
    }
}
