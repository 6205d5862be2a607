//! Target descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One live access point: a human-assigned name and a unique runtime id.
///
/// Names are not unique (two viewers may share a title); ids
/// (`hexip:port` or a local socket path) are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// `class:name`, e.g. `"DS9:ds9"`.
    pub name: String,
    /// e.g. `"7f000001:41235"`.
    pub id: String,
}

impl Target {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// Parses one access listing line, `"class:name id"`.
    ///
    /// Returns `None` if the line doesn't have both fields.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some(name), Some(id)) => Some(Self::new(name, id)),
            _ => None,
        }
    }

    /// The name without its class prefix.
    pub fn short_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, name)| name)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.id)
    }
}
