//! Error types for the session layer.

use xpabridge_marshal::MarshalError;
use xpabridge_transport::TransportError;

use crate::Target;

/// Errors that can occur while resolving, binding or using a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The template matched no live target when one was required.
    ///
    /// Also returned when a launched viewer didn't register within the
    /// wait budget.
    #[error("no active target found for template: {0}")]
    NoTarget(String),

    /// The template matched more than one target.
    ///
    /// The message lists every match, name and id, so the caller can pick
    /// one. The id is always unique.
    #[error(
        "too many targets for template: {template}{}\nuse a specific name or id instead",
        listing(.matches)
    )]
    Ambiguous {
        template: String,
        matches: Vec<Target>,
    },

    /// A verified session's target stopped answering. Terminal for that
    /// session.
    #[error("target is no longer running ({0})")]
    Stale(String),

    /// An external program (viewer or name server) could not be located.
    /// Raised on first use, never at construction.
    #[error("can't locate {0} executable")]
    Configuration(String),

    /// The external program was found but failed to start.
    #[error("can't launch {program}: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    /// A configuration document couldn't be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    /// A text reply wasn't valid UTF-8.
    #[error("reply is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Marshal(#[from] MarshalError),
}

fn listing(matches: &[Target]) -> String {
    matches.iter().map(|t| format!("\n  {t}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_lists_every_match() {
        let err = SessionError::Ambiguous {
            template: "DS9:*".into(),
            matches: vec![
                Target::new("DS9:foo1", "838e29d4:42873"),
                Target::new("DS9:foo2", "838e29d4:35739"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("too many targets for template: DS9:*\n"));
        assert!(msg.contains("  DS9:foo1 838e29d4:42873\n"));
        assert!(msg.contains("  DS9:foo2 838e29d4:35739\n"));
    }

    #[test]
    fn test_transport_errors_pass_through() {
        let err: SessionError = TransportError::Remote("line one\nline two".into()).into();
        assert_eq!(err.to_string(), "line one\nline two");
    }
}
