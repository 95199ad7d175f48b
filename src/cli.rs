//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use archive_hub::defaults::{default_config_path, CONFIG_ENV_VAR};

use crate::commands;

/// Archive Hub - Install, update and inspect interdependent content archives
#[derive(Parser, Debug)]
#[command(name = "archive-hub")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output
    #[arg(long, global = true, value_name = "WHEN", value_enum, default_value = "auto")]
    color: ColorChoice,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Path to the configuration file.
    ///
    /// Defaults to `archive-hub/config.toml` in the platform configuration
    /// directory. A missing file selects the built-in configuration.
    #[arg(long, global = true, value_name = "FILE", env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,
}

/// When to emit colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install archives and their dependencies
    Install(commands::install::InstallArgs),

    /// Fetch and merge upstream changes into installed archives
    Pull(commands::pull::PullArgs),

    /// Push local commits of installed archives
    Push(commands::push::PushArgs),

    /// List archives matching the given specifications
    Ls(commands::ls::LsArgs),

    /// Show the dependency tree of an archive
    Deps(commands::deps::DepsArgs),

    /// Add dependencies to an archive's manifest
    Depend(commands::depend::DependArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        apply_color(self.color);

        let config = self.config.unwrap_or_else(default_config_path);

        match self.command {
            Commands::Install(args) => commands::install::execute(args, &config),
            Commands::Pull(args) => commands::pull::execute(args, &config),
            Commands::Push(args) => commands::push::execute(args, &config),
            Commands::Ls(args) => commands::ls::execute(args, &config),
            Commands::Deps(args) => commands::deps::execute(args, &config),
            Commands::Depend(args) => commands::depend::execute(args, &config),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

fn apply_color(choice: ColorChoice) {
    match choice {
        ColorChoice::Auto => {}
        ColorChoice::Always => {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        }
        ColorChoice::Never => {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
    }
}
