//! Command execution.

use crate::config::Config;
use crate::Commands;
use colored::Colorize;
use polisin_grammar::{CompiledGrammar, GrammarCompiler, GrammarLoader};
use polisin_syntax::{
    AnalyserConfig, AnalysisMode, Lexicon, LexiconTokenizer, ScriptedTokenizer, SyntacticAnalyser,
    SyntaxError, SyntaxTree, Tokenizer,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// A compiled grammar plus everything needed to parse sentences with it.
pub struct Session {
    grammar: CompiledGrammar,
    lexicon: Option<Arc<Lexicon>>,
    mode: AnalysisMode,
    analyser_config: AnalyserConfig,
    unknown_category: Option<String>,
    case_sensitive: bool,
}

/// Result of parsing one sentence.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub accepted: bool,
    pub mode: AnalysisMode,
    pub tree: SyntaxTree,
}

impl Outcome {
    pub fn render(&self, json: bool) -> Result<String, serde_json::Error> {
        if json {
            return serde_json::to_string_pretty(self);
        }
        let verdict = if self.accepted {
            "ACCEPTED".green()
        } else {
            "REJECTED".red()
        };
        Ok(format!("{} {}", verdict, self.tree.polish_notation()))
    }
}

impl Session {
    pub fn open(
        grammar: &Path,
        lexicon: Option<&Path>,
        mode: Option<AnalysisMode>,
        config: &Config,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let grammar = compile(grammar)?;
        let lexicon = match lexicon {
            Some(path) => Some(Arc::new(Lexicon::load(path)?)),
            None => None,
        };
        Ok(Self {
            grammar,
            lexicon,
            mode: mode.unwrap_or(config.analysis.mode),
            analyser_config: config.analyser_config(),
            unknown_category: config.lexicon.unknown_category.clone(),
            case_sensitive: config.lexicon.case_sensitive,
        })
    }

    pub fn grammar(&self) -> &CompiledGrammar {
        &self.grammar
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AnalysisMode) {
        self.mode = mode;
    }

    pub fn parse(&self, sentence: &str) -> Result<Outcome, SyntaxError> {
        let mut analyser = SyntacticAnalyser::with_config(&self.grammar, self.analyser_config);
        let accepted = match &self.lexicon {
            Some(lexicon) => {
                let mut tokenizer = LexiconTokenizer::new(Arc::clone(lexicon))
                    .with_unknown_category(self.unknown_category.clone())
                    .with_case_sensitive(self.case_sensitive);
                tokenizer.set_input(sentence).map_err(SyntaxError::tokenizer)?;
                analyser.run(self.mode, &mut tokenizer)?
            }
            None => {
                let mut tokenizer =
                    ScriptedTokenizer::parse(sentence).map_err(SyntaxError::tokenizer)?;
                analyser.run(self.mode, &mut tokenizer)?
            }
        };
        tracing::debug!(accepted, mode = %self.mode, "parsed sentence");
        Ok(Outcome {
            accepted,
            mode: self.mode,
            tree: analyser.tree().clone(),
        })
    }
}

/// Loads and compiles a grammar file.
pub fn compile(path: &Path) -> Result<CompiledGrammar, polisin_grammar::GrammarError> {
    let grammar = GrammarLoader::load(path)?;
    GrammarCompiler::compile(&grammar)
}

/// Summary line for a compiled grammar.
pub fn describe(grammar: &CompiledGrammar) -> String {
    let set = grammar.machines();
    format!(
        "start: {}, machines: {}, states: {}, rules: {}, checksum: {}",
        grammar.start().cyan(),
        set.len(),
        set.state_count(),
        grammar.grammar().rules().len(),
        grammar.checksum()
    )
}

/// Renders the compiled automata, or only `machine` when given.
pub fn dump(grammar: &CompiledGrammar, machine: Option<&str>) -> Result<String, String> {
    let set = grammar.machines();
    match machine {
        Some(name) => set
            .get(name)
            .map(|m| m.to_string())
            .ok_or_else(|| format!("machine not found: {}", name)),
        None => Ok(set
            .machines()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Executes a command and returns the formatted output.
pub fn execute(cmd: Commands, config: &Config) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Repl { .. } => Err("the REPL is not a one-shot command".into()),

        Commands::Parse {
            grammar,
            lexicon,
            mode,
            json,
            sentence,
        } => {
            let session = Session::open(&grammar, lexicon.as_deref(), mode, config)?;
            let outcome = session.parse(&sentence.join(" "))?;
            Ok(outcome.render(json)?)
        }

        Commands::Check { grammar } => {
            let compiled = compile(&grammar)?;
            Ok(format!(
                "{} {} ({})",
                "OK".green(),
                grammar.display(),
                describe(&compiled)
            ))
        }

        Commands::Dump { grammar, machine } => {
            let compiled = compile(&grammar)?;
            Ok(dump(&compiled, machine.as_deref())?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn grammar_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"A -> s + B\nB -> s\nB -> v\n").unwrap();
        file
    }

    fn lexicon_file() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(b"the: s\nruns: [s, v]\n").unwrap();
        file
    }

    #[test]
    fn test_check() {
        let file = grammar_file();
        let output = execute(
            Commands::Check {
                grammar: file.path().to_path_buf(),
            },
            &Config::default(),
        )
        .unwrap();
        assert!(output.contains("machines: 2"));
        assert!(output.contains("states: 10"));
    }

    #[test]
    fn test_dump_single_machine() {
        let compiled = compile(grammar_file().path()).unwrap();
        let output = dump(&compiled, Some("B")).unwrap();
        assert!(output.starts_with("machine B"));
        assert!(output.contains("Conds: v"));
        assert!(dump(&compiled, Some("Z")).is_err());
        assert!(dump(&compiled, None).unwrap().contains("machine A"));
    }

    #[test]
    fn test_parse_scripted() {
        let file = grammar_file();
        let session = Session::open(file.path(), None, None, &Config::default()).unwrap();
        let outcome = session.parse("the/s runs/v").unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.tree.polish_notation(), "[A [s the][B [v runs]]]");
    }

    #[test]
    fn test_parse_with_lexicon() {
        let grammar = grammar_file();
        let lexicon = lexicon_file();
        let mut session =
            Session::open(grammar.path(), Some(lexicon.path()), None, &Config::default()).unwrap();

        // "runs" is read as `s` first, which the grammar accepts too.
        let outcome = session.parse("the runs").unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.tree.polish_notation(), "[A [s the][B [s runs]]]");

        session.set_mode(AnalysisMode::Backtracking);
        let outcome = session.parse("The runs").unwrap();
        assert!(outcome.accepted);
    }

    #[test]
    fn test_parse_unknown_word() {
        let grammar = grammar_file();
        let lexicon = lexicon_file();
        let session =
            Session::open(grammar.path(), Some(lexicon.path()), None, &Config::default()).unwrap();
        let err = session.parse("the dog").unwrap_err();
        assert_eq!(err.error_code(), "TOKENIZER_ERROR");
    }

    #[test]
    fn test_render_json() {
        let file = grammar_file();
        let session = Session::open(file.path(), None, None, &Config::default()).unwrap();
        let outcome = session.parse("s v").unwrap();
        let json: serde_json::Value = serde_json::from_str(&outcome.render(true).unwrap()).unwrap();
        assert_eq!(json["accepted"], true);
        assert_eq!(json["mode"], "single");
        assert_eq!(json["tree"]["label"], "A");
    }
}
