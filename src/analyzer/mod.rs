//! Manifest checks

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::Manifest;
use crate::parsers::LineError;

/// Manifest check report
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Parsed requirements, rendered in canonical form
    pub requirements: Vec<String>,
    /// Lines that failed to parse
    pub errors: Vec<LineError>,
    /// Warning messages
    pub warnings: Vec<String>,
    /// Requirements carrying at least one version clause
    pub pinned_count: usize,
    /// Names of requirements without any version clause
    pub unpinned: Vec<String>,
    /// Installer option lines
    pub options: Vec<String>,
}

impl AnalysisReport {
    /// Whether the manifest is free of parse errors
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks a parsed manifest
pub struct ManifestAnalyzer<'a> {
    manifest: &'a Manifest,
    errors: &'a [LineError],
}

impl<'a> ManifestAnalyzer<'a> {
    /// Create a new analyzer over a leniently parsed manifest
    pub fn new(manifest: &'a Manifest, errors: &'a [LineError]) -> Self {
        Self { manifest, errors }
    }

    /// Build the report
    pub fn analyze(&self) -> AnalysisReport {
        let mut report = AnalysisReport {
            requirements: self.manifest.iter().map(ToString::to_string).collect(),
            errors: self.errors.to_vec(),
            options: self.manifest.options.clone(),
            ..Default::default()
        };

        for req in self.manifest {
            if req.is_pinned() {
                report.pinned_count += 1;
            } else {
                report.unpinned.push(req.name.clone());
            }
        }

        self.check_duplicates(&mut report);
        report
    }

    /// Same package listed more than once, compared by normalized name.
    /// Entries with different environment markers are not duplicates.
    fn check_duplicates(&self, report: &mut AnalysisReport) {
        let mut seen: BTreeMap<(String, Option<&str>), Vec<usize>> = BTreeMap::new();

        for req in self.manifest {
            seen.entry((req.normalized_name(), req.marker.as_deref()))
                .or_default()
                .push(req.line);
        }

        for ((name, _), lines) in seen {
            if lines.len() > 1 {
                let lines: Vec<String> = lines.iter().map(ToString::to_string).collect();
                report.warnings.push(format!(
                    "'{}' is listed more than once (lines {})",
                    name,
                    lines.join(", ")
                ));
            }
        }
    }
}
