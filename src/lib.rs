//! Shelfmark - find books in Korean public libraries
//!
//! Shelfmark turns a plain-language request into a catalogue query, searches
//! the public-library information API and reports which libraries hold a
//! chosen book, with their coordinates. It also parses Python requirements
//! manifests.
//!
//! # Quick Start
//!
//! ```bash
//! # Search with query analysis
//! shelfmark search "인공지능이 세상을 바꾸는 방법에 대한 책"
//!
//! # Libraries holding a book in Seoul and Gyeonggi
//! shelfmark locate 9788966263370 --geojson libraries.json
//!
//! # Search, pick a result, locate it
//! shelfmark find "요즘 인기있는 판타지 소설"
//!
//! # Check a requirements manifest
//! shelfmark deps check requirements.txt
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod parsers;
pub mod search;

// Re-export commonly used types
pub use error::{Result, ShelfmarkError};
pub use models::{Book, Library, Manifest, Requirement, SearchTerms, VersionClause, VersionOp};
pub use search::BookFinder;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Parse a requirements manifest from disk
///
/// # Example
///
/// ```no_run
/// let manifest = shelfmark::check_manifest(std::path::Path::new("requirements.txt"))?;
/// for req in &manifest {
///     println!("{}", req);
/// }
/// # Ok::<(), shelfmark::ShelfmarkError>(())
/// ```
pub fn check_manifest(path: &std::path::Path) -> Result<Manifest> {
    Manifest::from_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "shelfmark");
    }
}
