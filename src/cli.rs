use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Interpreter for the kusmala scripting language.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(name = "kusmala", bin_name = "kusmala")]
#[clap(subcommand_required = true, arg_required_else_help = true)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs a `.km` file or a snippet given with --expr.
    Run(RunArgs),
    /// Starts an interactive session.
    Repl,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Source code to evaluate.
    #[clap(short, long, value_name = "CODE", conflicts_with = "file")]
    pub expr: Option<String>,

    /// Path to a `.km` file to execute.
    #[clap(value_name = "FILE", conflicts_with = "expr", required_unless_present = "expr")]
    pub file: Option<PathBuf>,

    /// Print the token stream before parsing.
    #[clap(long)]
    pub tokens: bool,

    /// Print the syntax tree outline before evaluating.
    #[clap(long)]
    pub tree: bool,

    /// Keep evaluating top-level statements after a runtime error and report all of them.
    #[clap(long)]
    pub collect_errors: bool,
}
