//! Command execution handlers

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{self, Config};
use crate::error::{Result, ShelfmarkError};
use crate::models::Book;
use crate::search::{self, BookFinder, LocateOutcome, ReqwestBackend, SearchOutcome};

fn spinner(message: impl Into<String>) -> Result<ProgressBar> {
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .map_err(|e| ShelfmarkError::Other(e.to_string()))?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn build_finder(config: &Config, use_ai: bool) -> Result<BookFinder> {
    let http = Arc::new(ReqwestBackend::new(&config.network.user_agent)?);
    Ok(BookFinder::from_config(
        config,
        http,
        config::api_key(config::NARU_API_KEY_ENV),
        config::api_key(config::OPENAI_API_KEY_ENV),
        use_ai,
    ))
}

/// Execute the search command
pub async fn execute_search(args: &super::SearchArgs, config: &Config) -> Result<()> {
    let mut finder = build_finder(config, !args.no_ai)?;
    if let Some(size) = args.page_size {
        finder = finder.with_page_size(size);
    }

    let query = args.query.join(" ");
    let outcome = run_search(&finder, &query, args.page).await?;

    match args.format {
        super::OutputFormat::Pretty => print_books(&outcome),
        super::OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}

async fn run_search(finder: &BookFinder, query: &str, page: u32) -> Result<SearchOutcome> {
    let pb = spinner(format!("Searching for books matching '{}'...", query))?;
    let outcome = finder.find(query, page).await;
    pb.finish_and_clear();
    outcome
}

fn print_books(outcome: &SearchOutcome) {
    if let Some(ref terms) = outcome.terms {
        if !terms.keywords.is_empty() {
            println!("{} {}", style("Keywords:").dim(), terms.keywords.join(", "));
        }
        if !terms.titles.is_empty() {
            println!("{} {}", style("Example titles:").dim(), terms.titles.join(" / "));
        }
    }
    println!("{} {}\n", style("Query:").dim(), style(&outcome.query).cyan());

    if outcome.books.is_empty() {
        println!("No search results. Try different keywords.");
        return;
    }

    println!("{}", style("Search Results").bold().underlined());
    for (i, book) in outcome.books.iter().enumerate() {
        println!("{:>3}. {}", i + 1, style(book.display_title()).bold());
        println!(
            "     {} · {}{}",
            book.authors.as_deref().unwrap_or("unknown author"),
            book.publisher.as_deref().unwrap_or("unknown publisher"),
            book.publication_year
                .as_deref()
                .map(|y| format!(" ({})", y))
                .unwrap_or_default()
        );
        if let Some(ref isbn) = book.isbn13 {
            println!("     ISBN {}", style(isbn).dim());
        }
    }
}

/// Execute the locate command
pub async fn execute_locate(args: &super::LocateArgs, config: &Config) -> Result<()> {
    let finder = build_finder(config, false)?.with_regions(args.regions.clone());
    let outcome = run_locate(&finder, &args.isbn13).await?;

    if let Some(ref path) = args.geojson {
        write_geojson(&outcome, path)?;
    }

    match args.format {
        super::OutputFormat::Pretty => print_locations(&outcome, None),
        super::OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}

async fn run_locate(finder: &BookFinder, isbn13: &str) -> Result<LocateOutcome> {
    let pb = spinner(format!("Looking up libraries holding ISBN {}...", isbn13))?;
    let outcome = finder.locate(isbn13).await;
    pb.finish_and_clear();
    outcome
}

fn write_geojson(outcome: &LocateOutcome, path: &Path) -> Result<()> {
    let geojson = search::to_geojson(&outcome.locations);
    std::fs::write(path, serde_json::to_string_pretty(&geojson)?)?;
    tracing::info!("Wrote {} locations to {}", outcome.locations.len(), path.display());
    Ok(())
}

fn print_locations(outcome: &LocateOutcome, title: Option<&str>) {
    if let Some(reason) = outcome.empty_reason() {
        println!("{} {}", style("⚠").yellow().bold(), reason);
        return;
    }

    let heading = match title {
        Some(title) => format!("Libraries holding '{}'", title),
        None => format!("Libraries holding ISBN {}", outcome.isbn13),
    };
    println!(
        "{} {}",
        style(heading).bold().underlined(),
        style(format!("(regions: {})", outcome.regions.join(", "))).dim()
    );

    for loc in &outcome.locations {
        println!(
            "  {} {}",
            style("•").green(),
            style(if loc.name.is_empty() { "unnamed library" } else { loc.name.as_str() }).bold()
        );
        if let Some(ref address) = loc.address {
            println!("    {}", address);
        }
        println!(
            "    {}",
            style(format!("{:.6}, {:.6}", loc.latitude, loc.longitude)).dim()
        );
    }
}

/// Execute the find command
pub async fn execute_find(args: &super::FindArgs, config: &Config) -> Result<()> {
    let finder = build_finder(config, !args.no_ai)?.with_regions(args.regions.clone());

    let query = args.query.join(" ");
    let outcome = run_search(&finder, &query, 1).await?;
    print_books(&outcome);

    if !outcome.books.iter().any(|b| b.isbn13.is_some()) {
        return Err(ShelfmarkError::Other("No result carries an ISBN to look up".into()));
    }

    let chosen = choose_book(&outcome.books, args)?;
    let Some(isbn13) = chosen.isbn13.as_deref() else {
        return Err(ShelfmarkError::Other("Selected book has no ISBN".into()));
    };
    println!();

    let located = run_locate(&finder, isbn13).await?;
    if let Some(ref path) = args.geojson {
        write_geojson(&located, path)?;
    }

    print_locations(&located, Some(search::title_for(&outcome.books, isbn13)));
    Ok(())
}

/// Pick the book to locate; `--pick` follows the numbering of `print_books`
fn choose_book<'a>(books: &'a [Book], args: &super::FindArgs) -> Result<&'a Book> {
    if let Some(n) = args.pick {
        let book = n
            .checked_sub(1)
            .and_then(|i| books.get(i))
            .ok_or_else(|| {
                ShelfmarkError::validation(format!("--pick must be between 1 and {}", books.len()))
            })?;
        if book.isbn13.is_none() {
            return Err(ShelfmarkError::validation(format!(
                "Result {} ({}) has no ISBN to look up",
                n,
                book.display_title()
            )));
        }
        return Ok(book);
    }

    let candidates: Vec<&Book> = books.iter().filter(|b| b.isbn13.is_some()).collect();
    let Some(first) = candidates.first().copied() else {
        return Err(ShelfmarkError::validation("No result carries an ISBN to look up"));
    };

    if args.yes || candidates.len() == 1 {
        return Ok(first);
    }

    let items: Vec<&str> = candidates.iter().map(|b| b.display_title()).collect();
    let index = dialoguer::Select::new()
        .with_prompt("Which book should be located?")
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| ShelfmarkError::Other(e.to_string()))?;

    Ok(candidates[index])
}

/// Execute the deps command
pub async fn execute_deps(args: &super::DepsArgs) -> Result<()> {
    use crate::analyzer::ManifestAnalyzer;
    use crate::parsers::RequirementsParser;

    match &args.command {
        super::DepsCommands::Check { path, format } => {
            let parser = RequirementsParser::from_path(path)?;
            let (manifest, errors) = parser.parse_lenient();
            let report = ManifestAnalyzer::new(&manifest, &errors).analyze();

            match format {
                super::OutputFormat::Pretty => {
                    println!(
                        "{}",
                        style(format!("Manifest {}", path.display())).bold().underlined()
                    );
                    println!();

                    for (req, rendered) in manifest.iter().zip(&report.requirements) {
                        println!("  {:>4}  {}", style(req.line).dim(), rendered);
                    }
                    if manifest.is_empty() {
                        println!("  (no requirements)");
                    }

                    if !report.options.is_empty() {
                        println!("\n{}", style("Options").bold());
                        for option in &report.options {
                            println!("  • {}", option);
                        }
                    }

                    if !report.warnings.is_empty() {
                        println!("\n{}", style("⚠ Warnings").yellow().bold());
                        for warning in &report.warnings {
                            println!("  • {}", warning);
                        }
                    }

                    if !report.errors.is_empty() {
                        println!("\n{}", style("✗ Errors").red().bold());
                        for error in &report.errors {
                            println!(
                                "  • line {}: {} ({})",
                                error.line, error.message, error.text
                            );
                        }
                    }

                    println!(
                        "\n  {} requirements, {} pinned, {} unpinned",
                        manifest.len(),
                        report.pinned_count,
                        report.unpinned.len()
                    );
                }
                super::OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }

            if !report.is_valid() {
                return Err(ShelfmarkError::validation(format!(
                    "{} invalid line(s) in {}",
                    report.errors.len(),
                    path.display()
                )));
            }
        }
    }

    Ok(())
}

/// Execute the config command
pub async fn execute_config(args: &super::ConfigArgs, path: &Path) -> Result<()> {
    match &args.command {
        super::ConfigCommands::Show => {
            let config = Config::load_from(path)?;
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| ShelfmarkError::Other(e.to_string()))?
            );
        }
        super::ConfigCommands::Reset => {
            Config::default().save_to(path)?;
            println!("Configuration reset to defaults");
        }
        super::ConfigCommands::Set { key, value } => {
            let mut config = Config::load_from(path)?;
            config.set(key, value)?;
            config.save_to(path)?;
            println!("Set {} = {}", key, value);
        }
        super::ConfigCommands::Get { key } => {
            let config = Config::load_from(path)?;
            if let Some(value) = config.get(key) {
                println!("{}", value);
            } else {
                println!("Key '{}' not found", key);
            }
        }
        super::ConfigCommands::Init { force } => {
            if path.exists() && !force {
                return Err(ShelfmarkError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            Config::default().save_to(path)?;
            println!("Configuration initialized at {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ConfigArgs, ConfigCommands, DepsArgs, DepsCommands, FindArgs, OutputFormat};
    use crate::models::Fields;

    fn book(title: &str, isbn: &str) -> Book {
        let mut fields = Fields::new();
        fields.insert("bookname".into(), title.into());
        fields.insert("isbn13".into(), isbn.into());
        Book::from_fields(fields)
    }

    fn find_args(pick: Option<usize>, yes: bool) -> FindArgs {
        FindArgs {
            query: vec!["파이썬".into()],
            no_ai: true,
            pick,
            yes,
            regions: Vec::new(),
            geojson: None,
        }
    }

    #[test]
    fn test_choose_book_by_pick() {
        let books = [book("a", "1"), book("b", "2")];

        let chosen = choose_book(&books, &find_args(Some(2), false)).unwrap();
        assert_eq!(chosen.display_title(), "b");

        assert!(choose_book(&books, &find_args(Some(0), false)).is_err());
        assert!(choose_book(&books, &find_args(Some(3), false)).is_err());

        let first = choose_book(&books, &find_args(None, true)).unwrap();
        assert_eq!(first.display_title(), "a");
    }

    #[test]
    fn test_pick_follows_printed_numbering() {
        let mut fields = Fields::new();
        fields.insert("bookname".into(), "no isbn".into());
        let books = [Book::from_fields(fields), book("second", "2")];

        let chosen = choose_book(&books, &find_args(Some(2), false)).unwrap();
        assert_eq!(chosen.display_title(), "second");

        assert!(matches!(
            choose_book(&books, &find_args(Some(1), false)),
            Err(ShelfmarkError::Validation(_))
        ));

        let first = choose_book(&books, &find_args(None, true)).unwrap();
        assert_eq!(first.display_title(), "second");
    }

    #[tokio::test]
    async fn test_deps_check_fails_on_invalid_lines() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        let bad = dir.path().join("bad.txt");
        std::fs::write(&good, "# requirements.txt\nopenai >= 1.0\nnumpy\n").unwrap();
        std::fs::write(&bad, "numpy\nopenai 1.0\n").unwrap();

        let check = |path: &Path| DepsArgs {
            command: DepsCommands::Check {
                path: path.to_path_buf(),
                format: OutputFormat::Json,
            },
        };

        assert!(execute_deps(&check(&good)).await.is_ok());
        assert!(matches!(
            execute_deps(&check(&bad)).await,
            Err(ShelfmarkError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_config_init_set_get() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let run = |command| ConfigArgs { command };

        execute_config(&run(ConfigCommands::Init { force: false }), &path).await.unwrap();
        assert!(execute_config(&run(ConfigCommands::Init { force: false }), &path).await.is_err());

        execute_config(
            &run(ConfigCommands::Set {
                key: "library.regions".into(),
                value: "21".into(),
            }),
            &path,
        )
        .await
        .unwrap();

        assert_eq!(Config::load_from(&path).unwrap().library.regions, vec!["21"]);

        execute_config(&run(ConfigCommands::Reset), &path).await.unwrap();
        assert_eq!(Config::load_from(&path).unwrap().library.regions, vec!["11", "31"]);
    }
}
