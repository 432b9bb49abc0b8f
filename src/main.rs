mod cli;
mod engine;
mod logging;
mod repl;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Commands, RunArgs};
use engine::ast::Tree;
use engine::env::Environment;
use engine::eval::{ErrorMode, Evaluator, RuntimeError};
use engine::lexer::{Lexer, tokenize};
use engine::parser::{ParseErrors, parse};
use engine::value::Value;
use owo_colors::OwoColorize;
use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use std::rc::Rc;
use tracing::{debug, info, instrument};

const SOURCE_EXTENSION: &str = "km";

/// Parses `source`, refusing to hand back a tree when any diagnostic was raised.
pub(crate) fn parse_source(source: &str) -> Result<Tree, ParseErrors> {
    let (tree, errors) = parse(Lexer::new(source));
    if errors.is_empty() {
        Ok(tree)
    } else {
        debug!(count = errors.len(), "Parsing produced diagnostics");
        Err(ParseErrors(errors))
    }
}

/// Lexes, parses and evaluates `source` in `env`. The tree is returned with
/// one result per evaluated top-level statement.
#[instrument(skip(source, env, out), fields(len = source.len()))]
pub(crate) fn evaluate_source<W: Write>(
    source: &str,
    env: Rc<RefCell<Environment>>,
    mode: ErrorMode,
    out: W,
) -> Result<(Tree, Vec<Result<Value, RuntimeError>>), ParseErrors> {
    let tree = parse_source(source)?;
    let results = Evaluator::new(out).with_mode(mode).evaluate(&tree, env);
    Ok((tree, results))
}

fn read_program(args: &RunArgs) -> Result<String> {
    if let Some(expr) = &args.expr {
        return Ok(expr.clone());
    }
    let path = args.file.as_deref().context("no input given")?;
    if path.extension().and_then(|ext| ext.to_str()) != Some(SOURCE_EXTENSION) {
        bail!(
            "berkas harus berekstensi .{}: {}",
            SOURCE_EXTENSION,
            path.display()
        );
    }
    fs::read_to_string(path).with_context(|| format!("gagal membaca berkas {}", path.display()))
}

#[instrument(skip(args))]
fn run(args: RunArgs) -> Result<ExitCode> {
    let source = read_program(&args)?;

    if args.tokens {
        for token in tokenize(&source) {
            println!("{:>4}  {:<16} {}", token.line, token.kind.to_string(), token.literal);
        }
    }

    let tree = match parse_source(&source) {
        Ok(tree) => tree,
        Err(errors) => {
            eprintln!("{}", errors);
            return Ok(ExitCode::FAILURE);
        }
    };

    if args.tree {
        print!("{}", tree.dump());
    }

    let mode = if args.collect_errors {
        ErrorMode::Collect
    } else {
        ErrorMode::FailFast
    };
    let results = Evaluator::new(io::stdout().lock())
        .with_mode(mode)
        .evaluate(&tree, Environment::new());

    let mut failed = false;
    for err in results.iter().filter_map(|result| result.as_ref().err()) {
        eprintln!("{}", err.to_string().red());
        failed = true;
    }
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn main() -> Result<ExitCode> {
    logging::init_logging();
    info!("Starting kusmala");

    let cli = Cli::parse();
    debug!(?cli, "Parsed CLI arguments");

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Repl => {
            repl::start_repl(Environment::new())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;

    #[test]
    fn evaluate_source_returns_results_and_output() {
        init_test_logging();
        let mut out = Vec::new();
        let (tree, results) = evaluate_source(
            "buat x = 2; cetak(x * 3); x",
            Environment::new(),
            ErrorMode::FailFast,
            &mut out,
        )
        .expect("parses");
        assert_eq!(tree.statements.len(), 3);
        assert_eq!(results.last(), Some(&Ok(Value::Integer(2))));
        assert_eq!(String::from_utf8(out).expect("utf-8"), "6\n");
    }

    #[test]
    fn evaluate_source_refuses_to_run_malformed_programs() {
        init_test_logging();
        let mut out = Vec::new();
        let err = evaluate_source(
            "cetak(1); buat = 2;",
            Environment::new(),
            ErrorMode::FailFast,
            &mut out,
        )
        .expect_err("parse failure");
        assert_eq!(err.0.len(), 1);
        assert!(out.is_empty());
    }

    #[test]
    fn evaluate_source_shares_environment_between_calls() {
        init_test_logging();
        let env = Environment::new();
        evaluate_source("buat n = 1;", Rc::clone(&env), ErrorMode::FailFast, io::sink())
            .expect("parses");
        let (_, results) =
            evaluate_source("n + 1", env, ErrorMode::FailFast, io::sink()).expect("parses");
        assert_eq!(results, vec![Ok(Value::Integer(2))]);
    }
}
