//! Reply buffer sets: what a single primitive brings back.
//!
//! Every XPA primitive can reach several access points at once. The result
//! is one slot per responder, each carrying the responder's name, an
//! optional data buffer and an optional error message. The number of
//! populated slots ("got") never exceeds the capacity the caller asked for.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TransportError;

/// Default maximum number of targets a primitive may reach.
pub const DEFAULT_MAX_TARGETS: usize = 1024;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// The four XPA primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Set,
    Info,
    Access,
}

impl Method {
    /// The XPA client program that issues this primitive.
    pub fn program(self) -> &'static str {
        match self {
            Self::Get => "xpaget",
            Self::Set => "xpaset",
            Self::Info => "xpainfo",
            Self::Access => "xpaaccess",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Set => write!(f, "set"),
            Self::Info => write!(f, "info"),
            Self::Access => write!(f, "access"),
        }
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One primitive call, as handed to [`Transport::exchange`](crate::Transport::exchange).
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub method: Method,
    /// Template selecting the targets (name, id or glob).
    pub template: &'a str,
    /// Optional command string, e.g. `"fits width"`.
    pub params: Option<&'a str>,
    /// Bytes sent with a `Set`. Ignored by the other primitives.
    pub payload: Option<&'a [u8]>,
    /// Maximum number of targets to reach.
    pub max_targets: usize,
}

impl<'a> Request<'a> {
    /// Creates a request without params or payload.
    pub fn new(method: Method, template: &'a str, max_targets: usize) -> Self {
        Self {
            method,
            template,
            params: None,
            payload: None,
            max_targets,
        }
    }

    /// Sets the command string.
    pub fn params(mut self, params: Option<&'a str>) -> Self {
        self.params = params;
        self
    }

    /// Sets the outgoing payload.
    pub fn payload(mut self, payload: Option<&'a [u8]>) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// Reply / ReplySet
// ---------------------------------------------------------------------------

/// One responder's slot in a [`ReplySet`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Access point name as reported by the responder,
    /// e.g. `"DS9:ds9 7f000001:41235"`.
    pub name: String,
    /// Returned data. Zero-length data still counts as a match.
    pub data: Vec<u8>,
    /// Error message, if the responder reported one.
    pub error: Option<String>,
}

impl Reply {
    /// A successful slot.
    pub fn ok(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
            error: None,
        }
    }

    /// A slot carrying an error message instead of data.
    pub fn failed(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Fixed-capacity set of per-target replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplySet {
    capacity: usize,
    replies: Vec<Reply>,
}

impl ReplySet {
    /// Creates an empty set that accepts at most `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            replies: Vec::new(),
        }
    }

    /// Adds a slot. Returns `false` (and drops the reply) once the set is full.
    pub fn push(&mut self, reply: Reply) -> bool {
        if self.replies.len() >= self.capacity {
            return false;
        }
        self.replies.push(reply);
        true
    }

    /// Number of populated slots.
    pub fn got(&self) -> usize {
        self.replies.len()
    }

    /// Maximum number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.replies.len() >= self.capacity
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reply> {
        self.replies.iter()
    }

    pub fn first(&self) -> Option<&Reply> {
        self.replies.first()
    }

    /// Error messages of every failed slot, in slot order.
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.replies.iter().filter_map(|r| r.error.as_deref())
    }

    /// Fails with one composed [`TransportError::Remote`] if any slot
    /// carries an error, even when other slots succeeded.
    pub fn into_checked(self) -> Result<Self, TransportError> {
        let messages: Vec<&str> = self
            .errors()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .collect();
        if messages.is_empty() {
            Ok(self)
        } else {
            Err(TransportError::Remote(messages.join("\n")))
        }
    }

    pub fn into_replies(self) -> Vec<Reply> {
        self.replies
    }
}

impl IntoIterator for ReplySet {
    type Item = Reply;
    type IntoIter = std::vec::IntoIter<Reply>;

    fn into_iter(self) -> Self::IntoIter {
        self.replies.into_iter()
    }
}

impl<'a> IntoIterator for &'a ReplySet {
    type Item = &'a Reply;
    type IntoIter = std::slice::Iter<'a, Reply>;

    fn into_iter(self) -> Self::IntoIter {
        self.replies.iter()
    }
}
