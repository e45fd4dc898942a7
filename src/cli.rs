//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use action_synth::output::OutputConfig;

use crate::commands;

/// action-synth - Generate typed factories for reusable CI actions
#[derive(Parser, Debug)]
#[command(name = "action-synth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Registry document to use instead of searching upward from the
    /// current directory
    #[arg(long, global = true, value_name = "FILE", env = "ACTION_SYNTH_REGISTRY")]
    registry: Option<PathBuf>,

    /// Directory for cached repository checkouts
    ///
    /// Defaults to the system cache directory (`~/.cache/action-synth` on Linux).
    #[arg(long, global = true, value_name = "DIR", env = "ACTION_SYNTH_CACHE")]
    cache_root: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register an action repository and generate its modules
    Add(commands::add::AddArgs),

    /// Re-resolve registered repositories and regenerate their modules
    Update(commands::update::UpdateArgs),

    /// Remove a registered repository (or one of its actions)
    Remove(commands::remove::RemoveArgs),

    /// List registered actions
    #[command(alias = "ls")]
    List(commands::list::ListArgs),

    /// Rewrite workflow files into modules that call the generated factories
    Rewrite(commands::rewrite::RewriteArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub registry: Option<PathBuf>,
    pub cache_root: Option<PathBuf>,
    pub output: OutputConfig,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let global = GlobalArgs {
            registry: self.registry,
            cache_root: self.cache_root,
            output: OutputConfig::from_env_and_flag(&self.color),
        };

        match self.command {
            Commands::Add(args) => commands::add::execute(args, &global),
            Commands::Update(args) => commands::update::execute(args, &global),
            Commands::Remove(args) => commands::remove::execute(args, &global),
            Commands::List(args) => commands::list::execute(args, &global),
            Commands::Rewrite(args) => commands::rewrite::execute(args, &global),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level.to_lowercase());
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
