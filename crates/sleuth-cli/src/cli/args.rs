use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sleuth",
    version,
    about = "Detective-case simulation: an LLM investigator against an LLM referee"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,

    /// Debug-level logs, including full completion requests and responses
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Capture JSON logs into a fresh numbered run directory here
    #[arg(long, global = true, env = "SLEUTH_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run an investigation on a case bundle
    Run(RunArgs),
    /// Check that a case bundle loads and print its summary
    Validate(ValidateArgs),
    Version,
}

#[derive(clap::Args, Clone)]
pub struct RunArgs {
    /// Directory holding setup.json, clues.json, ... of the case
    pub case_dir: PathBuf,

    /// Where report.json and report.txt are written
    #[arg(long, short, default_value = "sleuth-output")]
    pub output: PathBuf,

    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Model identifier sent to the completion endpoint
    #[arg(long)]
    pub model: Option<String>,

    /// Swap the network for manual file drop-off in this directory
    #[arg(long)]
    pub exchange_dir: Option<PathBuf>,
}

#[derive(clap::Args, Clone)]
pub struct ValidateArgs {
    pub case_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = ValidateOutputFormat::Text)]
    pub format: ValidateOutputFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ValidateOutputFormat {
    Text,
    Json,
}
