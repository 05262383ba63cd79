//! Catalogue records returned by the library information API

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat field map of a catalogue item, as returned by the API
pub type Fields = BTreeMap<String, String>;

fn field(fields: &Fields, key: &str) -> Option<String> {
    fields
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A book found by a catalogue search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Title
    pub title: Option<String>,
    /// Author line
    pub authors: Option<String>,
    /// Publisher
    pub publisher: Option<String>,
    /// Publication year
    pub publication_year: Option<String>,
    /// 13-digit ISBN
    pub isbn13: Option<String>,
    /// Cover image URL
    pub image_url: Option<String>,
    /// Detail page URL
    pub detail_url: Option<String>,
    /// All fields as returned by the API
    #[serde(default)]
    pub fields: Fields,
}

impl Book {
    /// Title shown when a book has none
    pub const UNTITLED: &'static str = "Untitled";

    /// Build a book from the raw catalogue fields
    pub fn from_fields(fields: Fields) -> Self {
        Self {
            title: field(&fields, "bookname"),
            authors: field(&fields, "authors"),
            publisher: field(&fields, "publisher"),
            publication_year: field(&fields, "publication_year"),
            isbn13: field(&fields, "isbn13"),
            image_url: field(&fields, "bookImageURL"),
            detail_url: field(&fields, "bookDtlUrl"),
            fields,
        }
    }

    /// Title, or a placeholder
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(Self::UNTITLED)
    }
}

/// A library reported to hold a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    /// Library code
    pub code: Option<String>,
    /// Library name
    pub name: Option<String>,
    /// Street address
    pub address: Option<String>,
    /// Telephone number
    pub tel: Option<String>,
    /// Homepage URL
    pub homepage: Option<String>,
    /// Latitude, as text
    pub latitude: Option<String>,
    /// Longitude, as text
    pub longitude: Option<String>,
    /// All fields as returned by the API
    #[serde(default)]
    pub fields: Fields,
}

impl Library {
    /// Build a library from the raw catalogue fields
    pub fn from_fields(fields: Fields) -> Self {
        Self {
            code: field(&fields, "libCode"),
            name: field(&fields, "libName"),
            address: field(&fields, "address"),
            tel: field(&fields, "tel"),
            homepage: field(&fields, "homepage"),
            latitude: field(&fields, "latitude"),
            longitude: field(&fields, "longitude"),
            fields,
        }
    }
}

/// Search terms extracted from a natural-language request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTerms {
    /// Topic keywords
    pub keywords: Vec<String>,
    /// Plausible example titles
    pub titles: Vec<String>,
    /// Query to send to the catalogue
    pub query: String,
}

impl SearchTerms {
    /// Whether nothing usable was extracted
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.keywords.is_empty() && self.titles.is_empty()
    }

    /// Pick the catalogue query: the extracted query, then the keywords,
    /// then the first title, then the raw input
    pub fn effective_query(&self, fallback: &str) -> String {
        let query = self.query.trim();
        if !query.is_empty() {
            return query.to_string();
        }

        let keywords: Vec<&str> = self
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();
        if !keywords.is_empty() {
            return keywords.join(" ");
        }

        if let Some(title) = self.titles.iter().map(|t| t.trim()).find(|t| !t.is_empty()) {
            return title.to_string();
        }

        fallback.trim().to_string()
    }
}
