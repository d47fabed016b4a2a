//! Word lexicon and the lexicon-backed tokenizer.
//!
//! A lexicon maps each word to its grammatical categories in preference
//! order, e.g. in YAML:
//!
//! ```yaml
//! the: [det]
//! saw: [verb, noun]
//! dog: noun
//! ```

use crate::error::LexiconError;
use crate::token::{Token, Tokenizer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lexicon {
    #[serde(deserialize_with = "deserialize_entries")]
    entries: HashMap<String, Vec<String>>,
}

fn deserialize_entries<'de, D>(deserializer: D) -> Result<HashMap<String, Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Categories {
        One(String),
        Many(Vec<String>),
    }

    let raw = HashMap::<String, Categories>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(word, categories)| {
            let categories = match categories {
                Categories::One(c) => vec![c],
                Categories::Many(cs) => cs,
            };
            (word, categories)
        })
        .collect())
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a lexicon from a `.json` file, or YAML for any other extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LexiconError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let lexicon = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&content)?,
            _ => Self::from_yaml_str(&content)?,
        };
        tracing::debug!(path = %path.display(), words = lexicon.len(), "loaded lexicon");
        Ok(lexicon)
    }

    pub fn from_json_str(s: &str) -> Result<Self, LexiconError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, LexiconError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Adds `category` to the word's readings unless already present.
    pub fn insert(&mut self, word: impl Into<String>, category: impl Into<String>) {
        let categories = self.entries.entry(word.into()).or_default();
        let category = category.into();
        if !categories.contains(&category) {
            categories.push(category);
        }
    }

    /// Categories of `word`, most preferred first.
    pub fn categories(&self, word: &str) -> Option<&[String]> {
        self.entries.get(word).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Splits text on whitespace and looks every word up in a [`Lexicon`].
#[derive(Debug, Clone)]
pub struct LexiconTokenizer {
    lexicon: Arc<Lexicon>,
    words: Vec<String>,
    cursor: usize,
    unknown_category: Option<String>,
    case_sensitive: bool,
}

impl LexiconTokenizer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self {
            lexicon,
            words: Vec::new(),
            cursor: 0,
            unknown_category: None,
            case_sensitive: false,
        }
    }

    /// Category given to words missing from the lexicon. Without one, an
    /// unknown word is an error.
    pub fn with_unknown_category(mut self, category: Option<String>) -> Self {
        self.unknown_category = category;
        self
    }

    /// Case-sensitive lookups. By default, a word missing from the lexicon is
    /// retried in lowercase.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    fn lookup(&self, word: &str) -> Result<Vec<Token>, LexiconError> {
        let mut categories = self.lexicon.categories(word);
        if categories.is_none() && !self.case_sensitive {
            categories = self.lexicon.categories(&word.to_lowercase());
        }
        match (categories, &self.unknown_category) {
            (Some([]), _) => Err(LexiconError::EmptyEntry {
                word: word.to_string(),
            }),
            (Some(categories), _) => Ok(categories
                .iter()
                .map(|c| Token::new(c.as_str(), word))
                .collect()),
            (None, Some(fallback)) => {
                tracing::debug!(word, category = %fallback, "unknown word");
                Ok(vec![Token::new(fallback.as_str(), word)])
            }
            (None, None) => Err(LexiconError::UnknownWord {
                word: word.to_string(),
            }),
        }
    }
}

impl Tokenizer for LexiconTokenizer {
    type Error = LexiconError;

    fn set_input(&mut self, text: &str) -> Result<(), LexiconError> {
        self.words = text.split_whitespace().map(str::to_string).collect();
        self.cursor = 0;
        Ok(())
    }

    fn has_more_tokens(&self) -> bool {
        self.cursor < self.words.len()
    }

    fn next_token(&mut self) -> Result<Token, LexiconError> {
        let mut candidates = self.next_token_candidates()?;
        if candidates.is_empty() {
            return Err(LexiconError::Exhausted);
        }
        Ok(candidates.swap_remove(0))
    }

    fn next_token_candidates(&mut self) -> Result<Vec<Token>, LexiconError> {
        let word = self.words.get(self.cursor).ok_or(LexiconError::Exhausted)?;
        let candidates = self.lookup(word)?;
        self.cursor += 1;
        Ok(candidates)
    }
}
