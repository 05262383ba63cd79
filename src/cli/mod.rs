//! Command-line interface for shelfmark

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shelfmark - find books in Korean public libraries
///
/// Describe the book you want in plain language; shelfmark turns it into a
/// catalogue query, lists matching books and shows which libraries hold
/// them. It can also check Python requirements manifests.
#[derive(Parser, Debug)]
#[command(name = "shelfmark")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SHELFMARK_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the catalogue for books matching a request
    Search(SearchArgs),

    /// Show the libraries holding a book
    Locate(LocateArgs),

    /// Search, pick a book, then show the libraries holding it
    Find(FindArgs),

    /// Inspect dependency manifests
    Deps(DepsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable pretty output
    Pretty,
    /// JSON output
    Json,
}

/// Arguments for the search command
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// What you are looking for, in plain language
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Send the request to the catalogue as-is, without query analysis
    #[arg(long)]
    pub no_ai: bool,

    /// Result page to fetch
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Results per page (default from configuration)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,
}

/// Arguments for the locate command
#[derive(Parser, Debug, Clone)]
pub struct LocateArgs {
    /// 13-digit ISBN of the book
    #[arg(required = true)]
    pub isbn13: String,

    /// Region code to search; repeat for several (default from configuration)
    #[arg(short, long = "region")]
    pub regions: Vec<String>,

    /// Write library locations as GeoJSON to this file
    #[arg(long)]
    pub geojson: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,
}

/// Arguments for the find command
#[derive(Parser, Debug, Clone)]
pub struct FindArgs {
    /// What you are looking for, in plain language
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Send the request to the catalogue as-is, without query analysis
    #[arg(long)]
    pub no_ai: bool,

    /// Pick the Nth result instead of choosing interactively
    #[arg(short, long)]
    pub pick: Option<usize>,

    /// Skip interactive prompts (pick the first result)
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Region code to search; repeat for several (default from configuration)
    #[arg(short, long = "region")]
    pub regions: Vec<String>,

    /// Write library locations as GeoJSON to this file
    #[arg(long)]
    pub geojson: Option<PathBuf>,
}

/// Arguments for the deps command
#[derive(Parser, Debug)]
pub struct DepsArgs {
    /// Manifest subcommand
    #[command(subcommand)]
    pub command: DepsCommands,
}

/// Manifest subcommands
#[derive(Subcommand, Debug)]
pub enum DepsCommands {
    /// Parse a requirements manifest and report every specifier
    Check {
        /// Manifest file
        #[arg(default_value = "requirements.txt")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Reset configuration to defaults
    Reset,
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
