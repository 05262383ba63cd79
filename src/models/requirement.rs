//! Requirement specifiers as written in a requirements manifest

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::error::{Result, ShelfmarkError};

lazy_static::lazy_static! {
    static ref NAME_RE: Regex = Regex::new(
        r"^([A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(?:\[([^\]]*)\])?\s*(.*)$"
    ).unwrap();
    static ref CLAUSE_RE: Regex = Regex::new(
        r"^(===|~=|==|!=|>=|<=|>|<)\s*(\S*)$"
    ).unwrap();
    static ref VERSION_RE: Regex = Regex::new(
        r"^[A-Za-z0-9*][A-Za-z0-9.*+!_-]*$"
    ).unwrap();
    static ref EXTRA_RE: Regex = Regex::new(
        r"^[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?$"
    ).unwrap();
    static ref SEPARATORS_RE: Regex = Regex::new(r"[-_.]+").unwrap();
    // `#` only starts a comment at line start or after whitespace
    static ref COMMENT_RE: Regex = Regex::new(r"(^|\s+)#.*$").unwrap();
}

/// Version comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionOp {
    /// Equal to (==)
    Eq,
    /// Not equal to (!=)
    Ne,
    /// Greater than or equal (>=)
    Ge,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Less than (<)
    Lt,
    /// Compatible release (~=)
    Compatible,
    /// Arbitrary string equality (===)
    Arbitrary,
}

impl VersionOp {
    /// Operator as it is written in a manifest
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Compatible => "~=",
            Self::Arbitrary => "===",
        }
    }

    /// Parse an operator token
    pub fn from_token(op: &str) -> Option<Self> {
        match op.trim() {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            ">=" => Some(Self::Ge),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            "~=" => Some(Self::Compatible),
            "===" => Some(Self::Arbitrary),
            _ => None,
        }
    }
}

impl fmt::Display for VersionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `op version` pair, e.g. `>= 1.0`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionClause {
    /// Comparison operator
    pub op: VersionOp,
    /// Version string, as written
    pub version: String,
}

impl VersionClause {
    /// Create a new clause
    pub fn new(op: VersionOp, version: impl Into<String>) -> Self {
        Self {
            op,
            version: version.into(),
        }
    }

    fn parse(s: &str) -> std::result::Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty version clause".into());
        }

        let caps = CLAUSE_RE
            .captures(s)
            .ok_or_else(|| format!("expected a version operator before '{}'", s))?;

        // The regex alternatives are all valid tokens
        let op = VersionOp::from_token(&caps[1])
            .ok_or_else(|| format!("unknown operator '{}'", &caps[1]))?;
        let version = &caps[2];

        if version.is_empty() {
            return Err(format!("operator '{}' is missing a version", op));
        }
        if !VERSION_RE.is_match(version) {
            return Err(format!("invalid version '{}'", version));
        }

        Ok(Self::new(op, version))
    }
}

impl fmt::Display for VersionClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.version)
    }
}

/// A package specifier from a requirements manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Package name as written
    pub name: String,
    /// Optional extras (`pkg[socks,security]`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    /// Version clauses, in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<VersionClause>,
    /// Environment marker following `;`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    /// 1-based source line (0 when not parsed from a file)
    #[serde(default)]
    pub line: usize,
}

impl Requirement {
    /// Create an unconstrained requirement
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extras: Vec::new(),
            constraints: Vec::new(),
            marker: None,
            line: 0,
        }
    }

    /// Parse a single specifier such as `openai >= 1.0`
    pub fn parse(s: &str) -> Result<Self> {
        Self::parse_at(s, 0)
    }

    /// Parse a specifier found on the given manifest line
    pub(crate) fn parse_at(s: &str, line: usize) -> Result<Self> {
        Self::parse_inner(s, line).map_err(|msg| ShelfmarkError::manifest(line, msg))
    }

    fn parse_inner(s: &str, line: usize) -> std::result::Result<Self, String> {
        let s = strip_comment(s);
        let s = s.trim();
        if s.is_empty() {
            return Err("empty requirement".into());
        }

        let (spec, marker) = match s.split_once(';') {
            Some((spec, marker)) => {
                let marker = marker.trim();
                if marker.is_empty() {
                    return Err("empty environment marker after ';'".into());
                }
                (spec.trim(), Some(marker.to_string()))
            }
            None => (s, None),
        };

        let caps = NAME_RE
            .captures(spec)
            .ok_or_else(|| format!("invalid package name in '{}'", spec))?;

        let name = caps[1].to_string();

        let extras = match caps.get(2) {
            Some(m) => Self::parse_extras(m.as_str())?,
            None => Vec::new(),
        };

        let rest = caps.get(3).map_or("", |m| m.as_str()).trim();
        let rest = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .unwrap_or(rest)
            .trim();

        let mut constraints = Vec::new();
        if !rest.is_empty() {
            for clause in rest.split(',') {
                constraints.push(VersionClause::parse(clause)?);
            }
        }

        Ok(Self {
            name,
            extras,
            constraints,
            marker,
            line,
        })
    }

    fn parse_extras(s: &str) -> std::result::Result<Vec<String>, String> {
        let mut extras = Vec::new();
        for extra in s.split(',') {
            let extra = extra.trim();
            if extra.is_empty() {
                continue;
            }
            if !EXTRA_RE.is_match(extra) {
                return Err(format!("invalid extra '{}'", extra));
            }
            extras.push(extra.to_string());
        }
        Ok(extras)
    }

    /// Normalized name for comparisons (`Foo_Bar.baz` -> `foo-bar-baz`)
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Whether the requirement carries any version clause
    pub fn is_pinned(&self) -> bool {
        !self.constraints.is_empty()
    }

    /// Version clauses rendered as text, e.g. `>= 1.0, < 2`
    pub fn constraint_string(&self) -> Option<String> {
        if self.constraints.is_empty() {
            return None;
        }
        Some(
            self.constraints
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;

        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }

        if let Some(constraints) = self.constraint_string() {
            write!(f, " {}", constraints)?;
        }

        if let Some(ref marker) = self.marker {
            write!(f, "; {}", marker)?;
        }

        Ok(())
    }
}

/// Remove a trailing `# comment` from a manifest line
pub(crate) fn strip_comment(s: &str) -> Cow<'_, str> {
    COMMENT_RE.replace(s, "")
}

/// Normalize a package name the way package indexes compare them
pub fn normalize_name(name: &str) -> String {
    SEPARATORS_RE.replace_all(name, "-").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_requirement() {
        let req = Requirement::parse("numpy").unwrap();
        assert_eq!(req.name, "numpy");
        assert!(req.constraints.is_empty());
        assert!(req.marker.is_none());
    }

    #[test]
    fn test_parse_versioned_requirement() {
        let req = Requirement::parse("openai >= 1.0").unwrap();
        assert_eq!(req.name, "openai");
        assert_eq!(req.constraints, vec![VersionClause::new(VersionOp::Ge, "1.0")]);
        assert_eq!(req.constraint_string().as_deref(), Some(">= 1.0"));
    }

    #[test]
    fn test_whitespace_around_operator_is_optional() {
        let tight = Requirement::parse("openai>=1.0").unwrap();
        let loose = Requirement::parse("openai   >=   1.0").unwrap();
        assert_eq!(tight, loose);
    }

    #[test]
    fn test_parse_multiple_clauses_and_extras() {
        let req = Requirement::parse("requests[socks, security]>=2.8.1,<3").unwrap();
        assert_eq!(req.name, "requests");
        assert_eq!(req.extras, vec!["socks", "security"]);
        assert_eq!(req.constraints.len(), 2);
        assert_eq!(req.constraints[1].op, VersionOp::Lt);
        assert_eq!(req.constraints[1].version, "3");
    }

    #[test]
    fn test_operator_precedence() {
        assert_eq!(Requirement::parse("a===1.0").unwrap().constraints[0].op, VersionOp::Arbitrary);
        assert_eq!(Requirement::parse("a~=1.4").unwrap().constraints[0].op, VersionOp::Compatible);
        assert_eq!(Requirement::parse("a!=1.4").unwrap().constraints[0].op, VersionOp::Ne);
        assert_eq!(Requirement::parse("a==1.*").unwrap().constraints[0].version, "1.*");
    }

    #[test]
    fn test_parse_marker() {
        let req = Requirement::parse("pandas>=2; python_version >= \"3.9\"").unwrap();
        assert_eq!(req.name, "pandas");
        assert_eq!(req.marker.as_deref(), Some("python_version >= \"3.9\""));
    }

    #[test]
    fn test_parenthesized_constraints() {
        let req = Requirement::parse("streamlit (>=1.30)").unwrap();
        assert_eq!(req.constraints, vec![VersionClause::new(VersionOp::Ge, "1.30")]);
    }

    #[test]
    fn test_rejects_malformed_specifiers() {
        assert!(Requirement::parse("openai >=").is_err());
        assert!(Requirement::parse("openai 1.0").is_err());
        assert!(Requirement::parse("-oops").is_err());
        assert!(Requirement::parse("pkg >= 1.0,").is_err());
        assert!(Requirement::parse("pkg; ").is_err());
        assert!(Requirement::parse("").is_err());
    }

    #[test]
    fn test_inline_comment_is_ignored() {
        let req = Requirement::parse("numpy  # array lib").unwrap();
        assert_eq!(req.name, "numpy");
        assert!(req.constraints.is_empty());

        let req = Requirement::parse("openai >= 1.0\t# client").unwrap();
        assert_eq!(req.constraint_string().as_deref(), Some(">= 1.0"));

        assert!(Requirement::parse("# only a comment").is_err());
        assert!(Requirement::parse("pkg==1.0#frag").is_err());
    }

    #[test]
    fn test_display_reparses_to_same_requirement() {
        let req = Requirement::parse("Requests[security]>=2.8,<3;python_version<'3.12'").unwrap();
        let rendered = req.to_string();
        assert_eq!(rendered, "Requests[security] >= 2.8, < 3; python_version<'3.12'");
        assert_eq!(Requirement::parse(&rendered).unwrap(), req);
    }

    #[test]
    fn test_normalized_name() {
        assert_eq!(normalize_name("Python_Dotenv"), "python-dotenv");
        assert_eq!(normalize_name("zope.interface"), "zope-interface");
        assert_eq!(normalize_name("a-_.b"), "a-b");
    }
}
