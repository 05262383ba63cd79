//! Requirements manifest parser
//!
//! Handles the `requirements.txt` format consumed by pip: one specifier per
//! line, `#` comments, blank lines, `\` line continuations and option lines
//! such as `-r other.txt` or `--index-url`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ShelfmarkError};
use crate::models::{strip_comment, Manifest, Requirement};

/// A line that failed to parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineError {
    /// 1-based line number
    pub line: usize,
    /// Offending text, comments removed
    pub text: String,
    /// Why the line was rejected
    pub message: String,
}

/// A logical manifest line after joining continuations and removing comments
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogicalLine {
    number: usize,
    text: String,
}

/// Parser for requirements manifests
pub struct RequirementsParser {
    content: String,
    source: Option<PathBuf>,
}

impl RequirementsParser {
    /// Create a parser over in-memory content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: None,
        }
    }

    /// Create a parser over a file on disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ShelfmarkError::file_not_found(path));
        }

        let content = std::fs::read_to_string(path)?;
        tracing::debug!("Read {} bytes from {}", content.len(), path.display());

        Ok(Self {
            content,
            source: Some(path.to_path_buf()),
        })
    }

    /// Path the content was read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Parse the manifest, failing on the first invalid line
    pub fn parse(&self) -> Result<Manifest> {
        let mut manifest = Manifest::default();

        for line in self.logical_lines() {
            if Self::is_option(&line.text) {
                manifest.options.push(line.text);
                continue;
            }
            manifest
                .requirements
                .push(Requirement::parse_at(&line.text, line.number)?);
        }

        tracing::debug!("Parsed {} requirements", manifest.requirements.len());
        Ok(manifest)
    }

    /// Parse the manifest, collecting every invalid line instead of stopping
    pub fn parse_lenient(&self) -> (Manifest, Vec<LineError>) {
        let mut manifest = Manifest::default();
        let mut errors = Vec::new();

        for line in self.logical_lines() {
            if Self::is_option(&line.text) {
                manifest.options.push(line.text);
                continue;
            }

            match Requirement::parse_at(&line.text, line.number) {
                Ok(req) => manifest.requirements.push(req),
                Err(ShelfmarkError::Manifest { line: number, message }) => {
                    tracing::warn!("Line {}: {}", number, message);
                    errors.push(LineError {
                        line: number,
                        text: line.text,
                        message,
                    });
                }
                Err(e) => errors.push(LineError {
                    line: line.number,
                    text: line.text,
                    message: e.to_string(),
                }),
            }
        }

        (manifest, errors)
    }

    fn is_option(text: &str) -> bool {
        text.starts_with('-')
    }

    /// Split content into logical lines, skipping blanks and comments
    fn logical_lines(&self) -> Vec<LogicalLine> {
        let mut lines = Vec::new();
        let mut pending: Option<LogicalLine> = None;

        for (idx, raw) in self.content.lines().enumerate() {
            let raw = raw.strip_suffix('\r').unwrap_or(raw);

            // A full-line comment never continues, even with a trailing `\`
            if raw.trim_start().starts_with('#') {
                if let Some(line) = pending.take() {
                    lines.extend(Self::clean(line));
                }
                continue;
            }

            let (body, continues) = match raw.strip_suffix('\\') {
                Some(body) => (body, true),
                None => (raw, false),
            };

            let current = pending.get_or_insert_with(|| LogicalLine {
                number: idx + 1,
                text: String::new(),
            });
            current.text.push_str(body);

            if continues {
                continue;
            }

            if let Some(line) = pending.take() {
                lines.extend(Self::clean(line));
            }
        }

        // A trailing backslash on the last line
        if let Some(line) = pending.take() {
            lines.extend(Self::clean(line));
        }

        lines
    }

    fn clean(line: LogicalLine) -> Option<LogicalLine> {
        let text = strip_comment(&line.text);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(LogicalLine {
            number: line.number,
            text: text.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VersionOp;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "# requirements.txt\n\
streamlit\n\
pandas\n\
\n\
requests  # http client\n\
openai >= 1.0\n\
python-dotenv\n\
numpy\n";

    #[test]
    fn test_parse_sample_manifest() {
        let manifest = RequirementsParser::new(SAMPLE).parse().unwrap();
        let names: Vec<&str> = manifest.requirements.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["streamlit", "pandas", "requests", "openai", "python-dotenv", "numpy"]
        );

        let openai = manifest.find("openai").unwrap();
        assert_eq!(openai.constraints[0].op, VersionOp::Ge);
        assert_eq!(openai.constraints[0].version, "1.0");
        assert_eq!(openai.line, 6);

        assert!(manifest.find("numpy").unwrap().constraints.is_empty());
    }

    #[test]
    fn test_comment_lines_are_excluded() {
        let manifest = RequirementsParser::new("# requirements.txt\n   # indented\nnumpy\n")
            .parse()
            .unwrap();
        assert_eq!(manifest.len(), 1);
        assert!(manifest.find("requirements.txt").is_none());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = RequirementsParser::new(SAMPLE);
        assert_eq!(parser.parse().unwrap(), parser.parse().unwrap());
    }

    #[test]
    fn test_crlf_and_continuation() {
        let content = "numpy\r\ndjango >= 3.2, \\\r\n   < 4\r\nflask\r\n";
        let manifest = RequirementsParser::new(content).parse().unwrap();
        assert_eq!(manifest.len(), 3);

        let django = manifest.find("Django").unwrap();
        assert_eq!(django.line, 2);
        assert_eq!(django.constraint_string().as_deref(), Some(">= 3.2, < 4"));
        assert_eq!(manifest.find("flask").unwrap().line, 4);
    }

    #[test]
    fn test_comment_ending_in_backslash_does_not_continue() {
        let content = "# pinned below \\\nnumpy\nopenai >= 1.0\n";
        let manifest = RequirementsParser::new(content).parse().unwrap();
        let names: Vec<&str> = manifest.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["numpy", "openai"]);
        assert_eq!(manifest.find("numpy").unwrap().line, 2);

        let manifest = RequirementsParser::new("# note \\\nnumpy\n").parse().unwrap();
        assert_eq!(manifest.len(), 1);
        assert!(manifest.find("numpy").is_some());
    }

    #[test]
    fn test_hash_inside_token_is_not_a_comment() {
        let manifest = RequirementsParser::new("pkg==1.0#frag\n").parse();
        // `#` without preceding whitespace stays part of the version
        assert!(manifest.is_err());
    }

    #[test]
    fn test_option_lines_are_recorded() {
        let content = "-r base.txt\n--index-url https://example.org/simple\nnumpy\n";
        let manifest = RequirementsParser::new(content).parse().unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(
            manifest.options,
            vec!["-r base.txt", "--index-url https://example.org/simple"]
        );
    }

    #[test]
    fn test_strict_parse_reports_line() {
        let err = RequirementsParser::new("numpy\n\nopenai >=\n").parse().unwrap_err();
        match err {
            ShelfmarkError::Manifest { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lenient_parse_collects_errors() {
        let (manifest, errors) =
            RequirementsParser::new("numpy\nopenai 1.0\npandas\n!!!\n").parse_lenient();
        assert_eq!(manifest.len(), 2);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 2);
        assert_eq!(errors[0].text, "openai 1.0");
        assert_eq!(errors[1].line, 4);
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requirements.txt");
        std::fs::write(&path, SAMPLE).unwrap();

        let parser = RequirementsParser::from_path(&path).unwrap();
        assert_eq!(parser.source(), Some(path.as_path()));
        assert_eq!(parser.parse().unwrap().len(), 6);

        let missing = RequirementsParser::from_path(dir.path().join("nope.txt"));
        assert!(matches!(missing, Err(ShelfmarkError::FileNotFound { .. })));
    }
}
