//! CLI configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via POLISIN_CONFIG or --config)
//! 3. Environment variables

use polisin_automata::StackLimits;
use polisin_syntax::{AnalyserConfig, AnalysisMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Analysis driver configuration.
    pub analysis: AnalysisConfig,
    /// Stack machine safety bounds.
    pub automata: AutomataConfig,
    /// Lexicon tokenizer configuration.
    pub lexicon: LexiconConfig,
}

impl Config {
    /// Loads configuration from the file named by POLISIN_CONFIG (or `path`,
    /// which takes precedence), then applies environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("POLISIN_CONFIG").map(PathBuf::from));
        if let Some(path) = path {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.analysis.apply_env_overrides();
        self.automata.apply_env_overrides();
        self.lexicon.apply_env_overrides();
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.automata.max_local_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "automata.max_local_attempts must be at least 1".to_string(),
            ));
        }
        if self.automata.max_settle_steps == 0 {
            return Err(ConfigError::ValidationError(
                "automata.max_settle_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings for a [`polisin_syntax::SyntacticAnalyser`].
    pub fn analyser_config(&self) -> AnalyserConfig {
        AnalyserConfig {
            max_restarts: self.analysis.max_restarts,
            limits: self.automata.limits(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Default analysis mode.
    pub mode: AnalysisMode,
    /// Full re-parses allowed per backtracking analysis.
    pub max_restarts: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::Single,
            max_restarts: AnalyserConfig::default().max_restarts,
        }
    }
}

impl AnalysisConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(mode) = std::env::var("POLISIN_MODE") {
            match mode.parse() {
                Ok(parsed) => self.mode = parsed,
                Err(e) => tracing::warn!("ignoring POLISIN_MODE: {}", e),
            }
        }

        if let Ok(max) = std::env::var("POLISIN_MAX_RESTARTS") {
            if let Ok(n) = max.parse() {
                self.max_restarts = n;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomataConfig {
    /// Local transition attempts per input symbol.
    pub max_local_attempts: usize,
    /// Maximum number of open machine calls.
    pub max_call_depth: usize,
    /// Maximum settle iterations after the last symbol.
    pub max_settle_steps: usize,
}

impl Default for AutomataConfig {
    fn default() -> Self {
        let limits = StackLimits::default();
        Self {
            max_local_attempts: limits.max_local_attempts,
            max_call_depth: limits.max_call_depth,
            max_settle_steps: limits.max_settle_steps,
        }
    }
}

impl AutomataConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(max) = std::env::var("POLISIN_MAX_LOCAL_ATTEMPTS") {
            if let Ok(n) = max.parse() {
                self.max_local_attempts = n;
            }
        }

        if let Ok(max) = std::env::var("POLISIN_MAX_CALL_DEPTH") {
            if let Ok(n) = max.parse() {
                self.max_call_depth = n;
            }
        }

        if let Ok(max) = std::env::var("POLISIN_MAX_SETTLE_STEPS") {
            if let Ok(n) = max.parse() {
                self.max_settle_steps = n;
            }
        }
    }

    pub fn limits(&self) -> StackLimits {
        StackLimits {
            max_local_attempts: self.max_local_attempts,
            max_call_depth: self.max_call_depth,
            max_settle_steps: self.max_settle_steps,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Category for words missing from the lexicon (none: unknown words fail).
    pub unknown_category: Option<String>,
    /// Match words exactly instead of retrying in lowercase.
    pub case_sensitive: bool,
}

impl LexiconConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(category) = std::env::var("POLISIN_UNKNOWN_CATEGORY") {
            self.unknown_category = if category.is_empty() {
                None
            } else {
                Some(category)
            };
        }
    }
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {1}", path = .0.display())]
    IoError(PathBuf, std::io::Error),

    #[error("failed to parse config file '{path}': {1}", path = .0.display())]
    ParseError(PathBuf, String),

    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analysis.mode, AnalysisMode::Single);
        assert_eq!(config.automata.max_local_attempts, 10);
        assert_eq!(config.automata.max_call_depth, 256);
        assert_eq!(config.automata.max_settle_steps, 1024);
        assert!(config.lexicon.unknown_category.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"analysis:\n  mode: backtracking\nautomata:\n  max_call_depth: 8\n")
            .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.analysis.mode, AnalysisMode::Backtracking);
        assert_eq!(config.automata.max_call_depth, 8);
        assert_eq!(config.automata.max_local_attempts, 10);

        let analyser = config.analyser_config();
        assert_eq!(analyser.limits.max_call_depth, 8);
        assert_eq!(analyser.max_restarts, config.analysis.max_restarts);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = Config::default();
        config.lexicon.unknown_category = Some("noun".to_string());
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.lexicon.unknown_category.as_deref(), Some("noun"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(dir.path().join("polisin.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(..)));
    }

    #[test]
    fn test_bad_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"analysis:\n  mode: sideways\n").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("failed to parse config file"));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.automata.max_local_attempts = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }
}
