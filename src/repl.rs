//! Interactive REPL.

use crate::commands::{self, Session};
use colored::Colorize;
use polisin_syntax::AnalysisMode;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};

const HELP_TEXT: &str = r#"
Type a sentence to parse it. Without a lexicon, write each word as
lexeme/category or lexeme/category|category.

Commands:
  :help                       Show this help
  :mode [single|backtracking] Show or set the analysis mode
  :json                       Toggle JSON tree output
  :grammar                    Summarize the loaded grammar
  :dump [machine]             Print compiled automata
  :quit, :exit                Exit the REPL
"#;

/// What the REPL should do after a line.
enum Reply {
    Print(String),
    Quit,
}

pub fn run(mut session: Session) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "polisin REPL".bold().cyan());
    println!("Grammar {}", commands::describe(session.grammar()));

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    // Load history
    let history_path = std::env::var("HOME")
        .map(|h| std::path::PathBuf::from(h).join(".polisin_history"))
        .unwrap_or_else(|_| ".polisin_history".into());
    let _ = rl.load_history(&history_path);

    println!("Type ':help' for available commands.\n");

    let mut json = false;
    loop {
        let prompt = format!("{} ", format!("polisin[{}]>", session.mode()).cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match execute_line(&mut session, &mut json, line) {
                    Ok(Reply::Print(output)) => println!("{}\n", output),
                    Ok(Reply::Quit) => break,
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    // Save history
    let _ = rl.save_history(&history_path);

    Ok(())
}

fn execute_line(
    session: &mut Session,
    json: &mut bool,
    line: &str,
) -> Result<Reply, Box<dyn std::error::Error>> {
    let Some(command) = line.strip_prefix(':') else {
        let outcome = session.parse(line)?;
        return Ok(Reply::Print(outcome.render(*json)?));
    };

    let parts: Vec<&str> = command.split_whitespace().collect();
    let Some(name) = parts.first() else {
        return Ok(Reply::Print(HELP_TEXT.to_string()));
    };
    let args = &parts[1..];

    match name.to_lowercase().as_str() {
        "help" | "?" => Ok(Reply::Print(HELP_TEXT.to_string())),

        "quit" | "exit" | "q" => Ok(Reply::Quit),

        "mode" => {
            if let Some(mode) = args.first() {
                let mode: AnalysisMode = mode.parse()?;
                session.set_mode(mode);
            }
            Ok(Reply::Print(format!("mode: {}", session.mode().to_string().yellow())))
        }

        "json" => {
            *json = !*json;
            Ok(Reply::Print(format!(
                "JSON output {}",
                if *json { "on" } else { "off" }
            )))
        }

        "grammar" => Ok(Reply::Print(commands::describe(session.grammar()))),

        "dump" => Ok(Reply::Print(commands::dump(
            session.grammar(),
            args.first().copied(),
        )?)),

        other => Ok(Reply::Print(format!(
            "Unknown command: {}. Type ':help' for available commands.",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config as AppConfig;
    use std::io::Write;

    fn session() -> (tempfile::NamedTempFile, Session) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"A -> v + s\n").unwrap();
        let session = Session::open(file.path(), None, None, &AppConfig::default()).unwrap();
        (file, session)
    }

    fn print(reply: Reply) -> String {
        match reply {
            Reply::Print(output) => output,
            Reply::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn test_sentence_and_mode_switch() {
        let (_file, mut session) = session();
        let mut json = false;

        let output = print(execute_line(&mut session, &mut json, "w/s|v x/s").unwrap());
        assert!(output.contains("REJECTED"));

        let output = print(execute_line(&mut session, &mut json, ":mode backtracking").unwrap());
        assert!(output.contains("backtracking"));
        assert_eq!(session.mode(), AnalysisMode::Backtracking);

        let output = print(execute_line(&mut session, &mut json, "w/s|v x/s").unwrap());
        assert!(output.contains("ACCEPTED"));
        assert!(output.contains("[A [v w][s x]]"));
    }

    #[test]
    fn test_commands() {
        let (_file, mut session) = session();
        let mut json = false;

        assert!(print(execute_line(&mut session, &mut json, ":help").unwrap()).contains(":dump"));
        let output = print(execute_line(&mut session, &mut json, ":dump A").unwrap());
        assert!(output.contains("machine A"));
        assert!(execute_line(&mut session, &mut json, ":dump Z").is_err());
        assert!(execute_line(&mut session, &mut json, ":mode fuzzy").is_err());

        execute_line(&mut session, &mut json, ":json").unwrap();
        assert!(json);
        let output = print(execute_line(&mut session, &mut json, "v s").unwrap());
        assert!(output.contains("\"accepted\": true"));

        assert!(matches!(
            execute_line(&mut session, &mut json, ":quit").unwrap(),
            Reply::Quit
        ));
    }
}
