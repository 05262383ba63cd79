//! Client for the library information ("Naru") open API

use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::http::HttpBackend;
use crate::config::{LibraryConfig, NetworkConfig};
use crate::error::{Result, ShelfmarkError};
use crate::models::{Book, Library};
use crate::parsers::naru::{self, BOOK_LIST, LIBRARY_LIST};

/// One page of a paginated request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number
    pub number: u32,
    /// Items per page
    pub size: u32,
}

impl Page {
    /// First page with the given size
    pub fn first(size: u32) -> Self {
        Self { number: 1, size }
    }
}

/// Client for book searches and library lookups
pub struct LibraryClient {
    http: Arc<dyn HttpBackend>,
    base_url: String,
    api_key: String,
    search_timeout: Duration,
    library_timeout: Duration,
}

impl LibraryClient {
    /// Create a client; the API key is checked on each call
    pub fn new(
        http: Arc<dyn HttpBackend>,
        library: &LibraryConfig,
        network: &NetworkConfig,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: library.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            search_timeout: Duration::from_secs(network.search_timeout),
            library_timeout: Duration::from_secs(network.library_timeout),
        }
    }

    fn ensure_key(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ShelfmarkError::Config(format!(
                "Library API key is not configured (set {})",
                crate::config::NARU_API_KEY_ENV
            )));
        }
        Ok(())
    }

    fn endpoint(&self, name: &str, params: &[(&str, &str)], page: Page) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, name))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("authKey", &self.api_key);
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("pageNo", &page.number.to_string());
            query.append_pair("pageSize", &page.size.to_string());
            query.append_pair("format", "json");
        }
        Ok(url)
    }

    /// Search books by keyword
    pub async fn search_books(&self, query: &str, page: Page) -> Result<Vec<Book>> {
        self.ensure_key()?;

        let query = query.trim();
        if query.is_empty() {
            return Err(ShelfmarkError::validation("Search query must not be empty"));
        }

        let url = self.endpoint("srchBooks", &[("keyword", query)], page)?;
        let body = self.http.get_json(&url, self.search_timeout).await?;

        let (list, item) = BOOK_LIST;
        let books: Vec<Book> = naru::parse_items(&body, list, item)?
            .into_iter()
            .map(Book::from_fields)
            .collect();

        tracing::info!(
            "Book search for '{}' returned {} of {} results",
            query,
            books.len(),
            naru::num_found(&body).unwrap_or(books.len() as u64)
        );
        Ok(books)
    }

    /// Find libraries in a region that hold the book with the given ISBN
    pub async fn find_libraries(
        &self,
        isbn13: &str,
        region: &str,
        page: Page,
    ) -> Result<Vec<Library>> {
        self.ensure_key()?;

        let isbn13 = isbn13.trim();
        if isbn13.is_empty() {
            return Err(ShelfmarkError::validation("ISBN13 must be provided to find libraries"));
        }
        let region = region.trim();
        if region.is_empty() {
            return Err(ShelfmarkError::validation(
                "Region code must be provided for library search",
            ));
        }

        let url = self.endpoint("libSrchByBook", &[("isbn", isbn13), ("region", region)], page)?;
        let body = self.http.get_json(&url, self.library_timeout).await?;

        let (list, item) = LIBRARY_LIST;
        let libraries: Vec<Library> = naru::parse_items(&body, list, item)?
            .into_iter()
            .map(Library::from_fields)
            .collect();

        tracing::debug!("Region {}: {} libraries hold {}", region, libraries.len(), isbn13);
        Ok(libraries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::http::testing::FakeBackend;

    fn client(fake: Arc<FakeBackend>, key: &str) -> LibraryClient {
        LibraryClient::new(fake, &LibraryConfig::default(), &NetworkConfig::default(), key)
    }

    fn query_value(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[tokio::test]
    async fn test_search_books_builds_request() {
        let fake = Arc::new(FakeBackend::new().respond(
            "/srchBooks",
            r#"{"response": {"docs": [{"doc": {"bookname": "파이썬", "isbn13": "9788966263370"}}]}}"#,
        ));
        let books = client(fake.clone(), "key-1")
            .search_books(" 파이썬 입문 ", Page::first(20))
            .await
            .unwrap();

        assert_eq!(books.len(), 1);
        assert_eq!(books[0].isbn13.as_deref(), Some("9788966263370"));

        let recorded = fake.recorded();
        let url = &recorded[0].url;
        assert_eq!(url.path(), "/api/srchBooks");
        assert_eq!(query_value(url, "authKey").as_deref(), Some("key-1"));
        assert_eq!(query_value(url, "keyword").as_deref(), Some("파이썬 입문"));
        assert_eq!(query_value(url, "pageNo").as_deref(), Some("1"));
        assert_eq!(query_value(url, "pageSize").as_deref(), Some("20"));
        assert_eq!(query_value(url, "format").as_deref(), Some("json"));
    }

    #[tokio::test]
    async fn test_find_libraries_builds_request() {
        let fake = Arc::new(FakeBackend::new().respond(
            "/libSrchByBook",
            r#"{"response": {"libs": [{"lib": {"libCode": "111017", "latitude": "37.57"}}]}}"#,
        ));
        let libraries = client(fake.clone(), "key-1")
            .find_libraries("9788966263370", "31", Page::first(50))
            .await
            .unwrap();

        assert_eq!(libraries[0].code.as_deref(), Some("111017"));

        let url = &fake.recorded()[0].url;
        assert_eq!(query_value(url, "isbn").as_deref(), Some("9788966263370"));
        assert_eq!(query_value(url, "region").as_deref(), Some("31"));
        assert_eq!(query_value(url, "pageSize").as_deref(), Some("50"));
    }

    #[tokio::test]
    async fn test_missing_inputs_are_rejected_before_any_request() {
        let fake = Arc::new(FakeBackend::new());

        let err = client(fake.clone(), "").search_books("a", Page::first(20)).await.unwrap_err();
        assert!(matches!(err, ShelfmarkError::Config(_)));

        let c = client(fake.clone(), "key");
        assert!(c.find_libraries("", "11", Page::first(50)).await.is_err());
        assert!(c.find_libraries("978", " ", Page::first(50)).await.is_err());
        assert!(c.search_books("   ", Page::first(20)).await.is_err());

        assert!(fake.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_network_errors_propagate() {
        let fake = Arc::new(
            FakeBackend::new().fail("/srchBooks", ShelfmarkError::network("connection refused")),
        );
        let err = client(fake, "key").search_books("a", Page::first(20)).await.unwrap_err();
        assert!(matches!(err, ShelfmarkError::Network(_)));
    }
}
