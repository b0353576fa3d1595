pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;

/// Command-line arguments of the main binary. Project semantics live in the
/// TOML config; the CLI only locates it and toggles run behavior.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "bag-etl")]
#[command(about = "Convert recorded robot teaching bags into a training bundle")]
pub struct CliConfig {
    /// Path to the project TOML configuration file
    #[arg(short, long, default_value = "bag-etl.toml")]
    pub config: String,

    /// Base directory holding project data (defaults to the current dir)
    #[arg(long, default_value = ".")]
    pub base_dir: String,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Log CPU/memory usage per stage
    #[arg(long)]
    pub monitor: bool,

    /// List the bags that would be processed, then exit
    #[arg(long)]
    pub dry_run: bool,
}
