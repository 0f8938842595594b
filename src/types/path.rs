//! Parsed logical paths such as `/organizations/*/nodes/web-*`.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use regex::Regex;

use crate::error::AclError;
use crate::namespace::is_valid_name;

/// A `*` glob compiled to an anchored regex.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn new(source: &str) -> Result<Self, AclError> {
        let body = source.split('*').map(regex::escape).collect::<Vec<_>>().join(".*");
        Ok(GlobPattern {
            source: source.to_string(),
            regex: Regex::new(&format!("^{body}$"))?,
        })
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// True for a bare `*`.
    pub fn matches_everything(&self) -> bool {
        self.source.chars().all(|c| c == '*')
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl PartialEq for GlobPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for GlobPattern {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Pattern(GlobPattern),
}

impl Segment {
    pub fn is_literal(&self) -> bool {
        matches!(self, Segment::Literal(_))
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Segment::Literal(lit) => lit == name,
            Segment::Pattern(glob) => glob.is_match(name),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Segment::Literal(lit) => lit,
            Segment::Pattern(glob) => glob.as_str(),
        }
    }
}

impl FromStr for Segment {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('*') {
            let check = s.replace('*', "");
            if !check.is_empty() && !is_valid_name(&check) {
                return Err(AclError::PathError(format!("invalid path segment '{s}'")));
            }
            return Ok(Segment::Pattern(GlobPattern::new(s)?));
        }
        if !is_valid_name(s) {
            return Err(AclError::PathError(format!("invalid path segment '{s}'")));
        }
        Ok(Segment::Literal(s.to_string()))
    }
}

/// A logical path. Absolute paths start with `/`; relative paths are
/// interpreted against the current organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    absolute: bool,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(path: &str) -> Result<Self, AclError> {
        path.parse()
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn has_patterns(&self) -> bool {
        self.segments.iter().any(|s| !s.is_literal())
    }
}

impl FromStr for PathPattern {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let segments = trimmed
            .split('/')
            .filter(|seg| !seg.is_empty())
            .map(Segment::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PathPattern {
            absolute: trimmed.starts_with('/'),
            segments,
        })
    }
}

impl Display for PathPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let joined = self
            .segments
            .iter()
            .map(Segment::as_str)
            .collect::<Vec<_>>()
            .join("/");
        if self.absolute {
            write!(f, "/{joined}")
        } else {
            write!(f, "{joined}")
        }
    }
}
