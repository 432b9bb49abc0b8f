pub mod highlighter;
mod history;

use crate::engine::ast::{StatementKind, Tree};
use crate::engine::env::Environment;
use crate::engine::eval::{ErrorMode, RuntimeError};
use crate::engine::value::Value;
use highlighter::ReplHelper;
use history::ReplEditor;
use owo_colors::OwoColorize;
use rustyline::error::ReadlineError;
use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use tracing::{info, warn};

const PROMPT: &str = ">> ";

fn is_exit_command(input: &str) -> bool {
    matches!(input, ".keluar" | ".exit")
}

/// Values worth echoing back: non-Nil results of expression, `jika` and block
/// statements.
fn echoed_values<'a>(
    tree: &'a Tree,
    results: &'a [Result<Value, RuntimeError>],
) -> impl Iterator<Item = &'a Value> + 'a {
    tree.statements
        .iter()
        .zip(results)
        .filter_map(|(statement, result)| match (&statement.kind, result) {
            (
                StatementKind::Expression(_) | StatementKind::If { .. } | StatementKind::Block(_),
                Ok(value),
            ) if *value != Value::Nil => Some(value),
            _ => None,
        })
}

#[tracing::instrument(skip(env))]
pub fn start_repl(env: Rc<RefCell<Environment>>) -> anyhow::Result<()> {
    info!("Starting REPL session");
    let mut rl = ReplEditor::new()?;
    rl.set_helper(Some(ReplHelper::new()));

    let history_path = history::get_history_path();
    match &history_path {
        Some(path) => history::load_history_from_path(&mut rl, path),
        None => warn!("Could not determine history file path. History will not be saved."),
    }

    println!(
        "kusmala {}. Ketik .keluar untuk berhenti.",
        env!("CARGO_PKG_VERSION")
    );

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if let Err(err) = rl.add_history_entry(input) {
                    warn!("Failed to add line to history: {}", err);
                }
                if is_exit_command(input) {
                    info!("Exiting REPL session via user command");
                    break;
                }

                match crate::evaluate_source(
                    input,
                    Rc::clone(&env),
                    ErrorMode::FailFast,
                    io::stdout().lock(),
                ) {
                    Ok((tree, results)) => {
                        for value in echoed_values(&tree, &results) {
                            println!("{}", value);
                        }
                        for err in results.iter().filter_map(|result| result.as_ref().err()) {
                            eprintln!("{}", err.to_string().red());
                        }
                    }
                    Err(errors) => eprintln!("{}", errors.to_string().red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                info!("REPL interrupted (Ctrl-C)");
                println!("Ketik .keluar atau tekan Ctrl-D untuk berhenti.");
            }
            Err(ReadlineError::Eof) => {
                info!("REPL EOF detected (Ctrl-D)");
                break;
            }
            Err(err) => {
                if let Some(path) = &history_path {
                    history::save_history_to_path(&mut rl, path);
                }
                return Err(err.into());
            }
        }
    }

    if let Some(path) = &history_path {
        history::save_history_to_path(&mut rl, path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;

    #[test]
    fn recognises_exit_commands() {
        init_test_logging();
        assert!(is_exit_command(".keluar"));
        assert!(is_exit_command(".exit"));
        assert!(!is_exit_command("keluar"));
    }

    #[test]
    fn only_value_statements_are_echoed() {
        init_test_logging();
        let env = Environment::new();
        let (tree, results) = crate::evaluate_source(
            "buat x = 1; cetak(x); x + 1; jika (salah) { 1 } jika (benar) { 7 }",
            env,
            ErrorMode::FailFast,
            io::sink(),
        )
        .expect("parses");
        let echoed: Vec<&Value> = echoed_values(&tree, &results).collect();
        assert_eq!(echoed, vec![&Value::Integer(2), &Value::Integer(7)]);
    }
}
