//! Template parsing and matching.
//!
//! A template selects access points. It takes one of four forms:
//!
//! - `class:name`, e.g. `DS9:foo1` (either half may be a glob)
//! - bare `name`, e.g. `foo1` or `foo*` (class defaults to `*`)
//! - an inet id `hexip:port`, e.g. `7f000001:41235`
//! - a local-path id, anything containing `/`
//!
//! Globs understand `*` (any run of characters), `?` (one character) and
//! `[...]` character classes. Class and name comparisons ignore case.

use std::fmt;

use globset::{GlobBuilder, GlobMatcher};

use crate::TransportError;

/// Template that matches every viewer in the default namespace.
pub const MATCH_ALL: &str = "DS9:*";

/// Hex digits in the host half of an inet id.
const INET_HOST_DIGITS: usize = 8;

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    /// A `class:name` pattern.
    Pattern {
        class: NamePattern,
        name: NamePattern,
    },
    /// A unique access point id (`hexip:port` or a local path).
    Id(String),
}

impl Template {
    /// Parses a template string.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidTemplate`] for an empty template,
    /// one with an empty class or name half, or a malformed glob.
    pub fn parse(raw: &str) -> Result<Self, TransportError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TransportError::InvalidTemplate(raw.to_string()));
        }
        if raw.contains('/') || is_inet_id(raw) {
            return Ok(Self::Id(raw.to_string()));
        }
        let (class, name) = match raw.split_once(':') {
            Some((class, name)) if !class.is_empty() && !name.is_empty() => (class, name),
            Some(_) => return Err(TransportError::InvalidTemplate(raw.to_string())),
            None => ("*", raw),
        };
        Ok(Self::Pattern {
            class: NamePattern::new(class)?,
            name: NamePattern::new(name)?,
        })
    }

    /// Returns `true` if the template uses a glob metacharacter.
    pub fn is_wildcard(&self) -> bool {
        match self {
            Self::Pattern { class, name } => {
                has_glob(class.as_str()) || has_glob(name.as_str())
            }
            Self::Id(_) => false,
        }
    }

    /// Tests an access point against this template.
    pub fn matches(&self, class: &str, name: &str, id: &str) -> bool {
        match self {
            Self::Id(wanted) => wanted.eq_ignore_ascii_case(id),
            Self::Pattern {
                class: class_pat,
                name: name_pat,
            } => class_pat.is_match(class) && name_pat.is_match(name),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern { class, name } => write!(f, "{class}:{name}"),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// NamePattern
// ---------------------------------------------------------------------------

/// One half of a `class:name` template, compiled once at parse time.
#[derive(Debug, Clone)]
pub struct NamePattern {
    raw: String,
    matcher: GlobMatcher,
}

impl NamePattern {
    /// Compiles a case-insensitive glob.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidTemplate`] if the glob is malformed,
    /// e.g. an unclosed `[`.
    pub fn new(raw: &str) -> Result<Self, TransportError> {
        let glob = GlobBuilder::new(raw)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                tracing::debug!(pattern = raw, error = %e, "rejected template glob");
                TransportError::InvalidTemplate(raw.to_string())
            })?;
        Ok(Self {
            raw: raw.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

impl PartialEq for NamePattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for NamePattern {}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Returns `true` if `raw` contains a glob metacharacter.
pub fn has_glob(raw: &str) -> bool {
    raw.contains(['*', '?', '['])
}

/// `hexip:port`, e.g. `7f000001:41235`. The host is always eight hex
/// digits, so `FACE:1` stays a `class:name` pattern.
fn is_inet_id(raw: &str) -> bool {
    match raw.split_once(':') {
        Some((host, port)) => {
            host.len() == INET_HOST_DIGITS
                && !port.is_empty()
                && host.chars().all(|c| c.is_ascii_hexdigit())
                && port.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}
