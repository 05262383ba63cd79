//! Book search pipeline
//!
//! A request flows through three stages: optional query analysis, a
//! catalogue search, and, for a chosen book, a per-region lookup of the
//! libraries that hold it.

pub mod http;
pub mod library;
pub mod locations;
pub mod openai;

pub use http::{HttpBackend, ReqwestBackend};
pub use library::{LibraryClient, Page};
pub use locations::{collect_locations, to_geojson, LibraryLocation};
pub use openai::OpenAiClient;

use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Result, ShelfmarkError};
use crate::models::{Book, Library, SearchTerms};

/// Title used when the selected book is not among the results
pub const SELECTED_BOOK: &str = "selected book";

/// Result of a book search
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Terms produced by query analysis, when it ran
    pub terms: Option<SearchTerms>,
    /// Query sent to the catalogue
    pub query: String,
    /// Books found
    pub books: Vec<Book>,
}

/// Result of locating a book
#[derive(Debug, Clone, Serialize)]
pub struct LocateOutcome {
    /// ISBN that was looked up
    pub isbn13: String,
    /// Regions searched, in order
    pub regions: Vec<String>,
    /// Libraries reported across all regions, before filtering
    pub libraries_found: usize,
    /// Libraries with usable coordinates, deduplicated
    pub locations: Vec<LibraryLocation>,
}

impl LocateOutcome {
    /// Explanation for an empty result, if any
    pub fn empty_reason(&self) -> Option<String> {
        if !self.locations.is_empty() {
            return None;
        }
        if self.libraries_found == 0 {
            Some(format!(
                "No library holding this book was found in regions {}",
                self.regions.join(", ")
            ))
        } else {
            Some("Libraries were found, but none has valid location data".to_string())
        }
    }
}

/// Orchestrates analysis, search and location lookup
pub struct BookFinder {
    library: LibraryClient,
    analyzer: Option<OpenAiClient>,
    regions: Vec<String>,
    search_page_size: u32,
    library_page_size: u32,
}

impl BookFinder {
    /// Create a finder from its parts
    pub fn new(library: LibraryClient, analyzer: Option<OpenAiClient>, config: &Config) -> Self {
        Self {
            library,
            analyzer,
            regions: config.library.regions.clone(),
            search_page_size: config.library.search_page_size,
            library_page_size: config.library.library_page_size,
        }
    }

    /// Create a finder talking to the configured services.
    ///
    /// Query analysis is enabled when `use_ai` is set.
    pub fn from_config(
        config: &Config,
        http: Arc<dyn HttpBackend>,
        library_key: Option<String>,
        openai_key: Option<String>,
        use_ai: bool,
    ) -> Self {
        let library = LibraryClient::new(
            http.clone(),
            &config.library,
            &config.network,
            library_key.unwrap_or_default(),
        );
        let analyzer = use_ai.then(|| {
            OpenAiClient::new(http, &config.openai, &config.network, openai_key.unwrap_or_default())
        });
        Self::new(library, analyzer, config)
    }

    /// Override the regions searched by [`BookFinder::locate`]
    pub fn with_regions(mut self, regions: Vec<String>) -> Self {
        if !regions.is_empty() {
            self.regions = regions;
        }
        self
    }

    /// Override the number of books requested per page
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.search_page_size = size.max(1);
        self
    }

    /// Search for books matching a plain-language request
    pub async fn find(&self, user_input: &str, page_no: u32) -> Result<SearchOutcome> {
        let user_input = user_input.trim();
        if user_input.is_empty() {
            return Err(ShelfmarkError::validation("Tell me what kind of book you are looking for"));
        }

        let terms = match self.analyzer {
            Some(ref analyzer) => Some(self.analyze(analyzer, user_input).await?),
            None => None,
        };

        let query = match terms {
            Some(ref terms) => {
                if terms.is_empty() {
                    tracing::warn!("No search terms extracted, using the input directly");
                }
                terms.effective_query(user_input)
            }
            None => user_input.to_string(),
        };
        tracing::info!("Searching the catalogue for '{}'", query);

        let page = Page {
            number: page_no.max(1),
            size: self.search_page_size,
        };
        let books = self.library.search_books(&query, page).await?;

        Ok(SearchOutcome { terms, query, books })
    }

    async fn analyze(&self, analyzer: &OpenAiClient, user_input: &str) -> Result<SearchTerms> {
        match analyzer.analyze(user_input).await {
            Ok(terms) => Ok(terms),
            // A missing key is a setup problem; anything else degrades to the raw input
            Err(e @ ShelfmarkError::Config(_)) => Err(e),
            Err(e) => {
                tracing::warn!("Query analysis failed: {}", e);
                Ok(SearchTerms::default())
            }
        }
    }

    /// Look up the libraries holding a book across the configured regions
    pub async fn locate(&self, isbn13: &str) -> Result<LocateOutcome> {
        let mut libraries: Vec<Library> = Vec::new();

        for region in &self.regions {
            let found = self
                .library
                .find_libraries(isbn13, region, Page::first(self.library_page_size))
                .await?;
            libraries.extend(found);
        }

        let locations = collect_locations(&libraries);
        tracing::info!(
            "{} libraries reported, {} with usable locations",
            libraries.len(),
            locations.len()
        );

        Ok(LocateOutcome {
            isbn13: isbn13.trim().to_string(),
            regions: self.regions.clone(),
            libraries_found: libraries.len(),
            locations,
        })
    }
}

/// Title of the book with the given ISBN among search results
pub fn title_for<'a>(books: &'a [Book], isbn13: &str) -> &'a str {
    books
        .iter()
        .find(|b| b.isbn13.as_deref() == Some(isbn13))
        .map(Book::display_title)
        .unwrap_or(SELECTED_BOOK)
}
