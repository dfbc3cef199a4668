mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use output::OutputFormat;

/// mixbuild - delegate parts of a legacy build to a Bazel-style evaluator
#[derive(Parser)]
#[command(name = "mixbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the bridge configuration file
  #[arg(short, long, global = true, env = "MIXBUILD_CONFIG")]
  config: Option<PathBuf>,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run one evaluation round and print the resulting build statements
  Invoke {
    /// JSON file listing the requests to queue
    #[arg(short, long)]
    requests: Option<PathBuf>,
  },

  /// Check whether a module may be built by the evaluator
  Allowed {
    /// Module name
    name: String,

    /// The module is built within an apex
    #[arg(long)]
    within_apex: bool,
  },

  /// Print the coverage flags and derived evaluator paths
  Flags,
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  if let Err(e) = run(cli) {
    output::print_error(&format!("{:#}", e));
    std::process::exit(1);
  }
}

fn run(cli: Cli) -> Result<()> {
  let config = cmd::load_config(cli.config.as_deref())?;

  match cli.command {
    Commands::Invoke { requests } => cmd::cmd_invoke(config, requests.as_deref(), cli.verbose, cli.output),
    Commands::Allowed { name, within_apex } => cmd::cmd_allowed(&config, &name, within_apex, cli.output),
    Commands::Flags => cmd::cmd_flags(&config, cli.output),
  }
}
