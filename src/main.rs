//! polisin - natural-language parser driven by compiled grammar automata
//!
//! Provides one-shot commands and an interactive REPL.

mod commands;
mod config;
mod repl;

use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Config;
use polisin_syntax::AnalysisMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polisin")]
#[command(about = "Parse sentences against a context-free grammar compiled into automata")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "POLISIN_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse one sentence
    Parse {
        /// Grammar file (.json, .yaml/.yml or line-based text)
        #[arg(short, long)]
        grammar: PathBuf,

        /// Lexicon file mapping words to categories (without one, words are
        /// written as lexeme/category|category)
        #[arg(short, long)]
        lexicon: Option<PathBuf>,

        /// Analysis mode (overrides the configuration)
        #[arg(short, long)]
        mode: Option<AnalysisMode>,

        /// Print the tree as JSON
        #[arg(long)]
        json: bool,

        /// Sentence words
        #[arg(required = true)]
        sentence: Vec<String>,
    },

    /// Compile a grammar and report its automata
    Check {
        /// Grammar file
        grammar: PathBuf,
    },

    /// Print the compiled automata
    Dump {
        /// Grammar file
        grammar: PathBuf,

        /// Only this machine
        #[arg(short, long)]
        machine: Option<String>,
    },

    /// Start interactive REPL
    Repl {
        /// Grammar file
        #[arg(short, long)]
        grammar: PathBuf,

        /// Lexicon file
        #[arg(short, long)]
        lexicon: Option<PathBuf>,

        /// Analysis mode (overrides the configuration)
        #[arg(short, long)]
        mode: Option<AnalysisMode>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(2);
        }
    };
    tracing::debug!(mode = %config.analysis.mode, "configuration loaded");

    match cli.command {
        Commands::Repl {
            grammar,
            lexicon,
            mode,
        } => {
            let session = commands::Session::open(&grammar, lexicon.as_deref(), mode, &config)?;
            repl::run(session)?;
        }
        cmd => match commands::execute(cmd, &config) {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
