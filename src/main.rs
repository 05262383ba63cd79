//! Shelfmark - find books in Korean public libraries
//!
//! Main entry point for the shelfmark CLI application.

use std::process::ExitCode;

use console::style;
use tracing_subscriber::EnvFilter;

use shelfmark::cli::{self, Cli, Commands};
use shelfmark::config::Config;
use shelfmark::error::Result;

#[tokio::main]
async fn main() -> ExitCode {
    // API keys may live in a .env file next to the working directory
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();

    let config_path = match Config::resolve_path(cli.config.as_deref()) {
        Ok(path) => path,
        Err(e) => return fail(&e),
    };
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            // Still allow `config reset` / `config init` to repair a broken file
            eprintln!("{} {}", style("Warning:").yellow().bold(), e);
            Config::default()
        }
    };

    setup_logging(&cli, &config);

    match run(cli, config, &config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn fail(e: &shelfmark::ShelfmarkError) -> ExitCode {
    eprintln!("{} {}", style("Error:").red().bold(), e);
    ExitCode::FAILURE
}

/// Set up logging based on CLI arguments and configuration
fn setup_logging(cli: &Cli, config: &Config) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        config.logging.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(config.logging.color)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Main application logic
async fn run(cli: Cli, config: Config, config_path: &std::path::Path) -> Result<()> {
    console::set_colors_enabled(config.logging.color);

    if !cli.quiet {
        tracing::debug!("{} v{}", shelfmark::NAME, shelfmark::VERSION);
    }

    match cli.command {
        Commands::Search(args) => cli::execute_search(&args, &config).await,
        Commands::Locate(args) => cli::execute_locate(&args, &config).await,
        Commands::Find(args) => cli::execute_find(&args, &config).await,
        Commands::Deps(args) => cli::execute_deps(&args).await,
        Commands::Config(args) => cli::execute_config(&args, config_path).await,
    }
}
