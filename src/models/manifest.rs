//! Parsed requirements manifest

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::requirement::{normalize_name, Requirement};
use crate::error::Result;
use crate::parsers::requirements::{LineError, RequirementsParser};

/// Ordered list of requirements parsed from a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Requirements in file order
    pub requirements: Vec<Requirement>,
    /// Installer option lines (`-r`, `--index-url`, ...) in file order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl Manifest {
    /// Parse manifest content, failing on the first invalid line
    pub fn parse(content: &str) -> Result<Self> {
        RequirementsParser::new(content).parse()
    }

    /// Parse manifest content, collecting invalid lines
    pub fn parse_lenient(content: &str) -> (Self, Vec<LineError>) {
        RequirementsParser::new(content).parse_lenient()
    }

    /// Read and parse a manifest file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        RequirementsParser::from_path(path)?.parse()
    }

    /// Find a requirement by name, ignoring case and separator differences
    pub fn find(&self, name: &str) -> Option<&Requirement> {
        let wanted = normalize_name(name);
        self.requirements
            .iter()
            .find(|r| r.normalized_name() == wanted)
    }

    /// Iterate over requirements
    pub fn iter(&self) -> std::slice::Iter<'_, Requirement> {
        self.requirements.iter()
    }

    /// Number of requirements
    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// Whether the manifest lists no requirements
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a Requirement;
    type IntoIter = std::slice::Iter<'a, Requirement>;

    fn into_iter(self) -> Self::IntoIter {
        self.requirements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_normalizes_names() {
        let manifest = Manifest::parse("python-dotenv\nScikit_Learn>=1.3\n").unwrap();
        assert!(manifest.find("python_dotenv").is_some());
        assert_eq!(manifest.find("scikit-learn").unwrap().name, "Scikit_Learn");
        assert!(manifest.find("numpy").is_none());
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::parse("\n# nothing here\n\n").unwrap();
        assert!(manifest.is_empty());
        assert_eq!(manifest.iter().count(), 0);
    }
}
