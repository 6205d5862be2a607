/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// One or more targets answered with an error message.
    ///
    /// The message is every per-target error string joined by newlines,
    /// in slot order. Partial success is not reported separately.
    #[error("{0}")]
    Remote(String),

    /// An XPA client program could not be located.
    #[error("can't locate {0} executable")]
    ToolNotFound(String),

    /// Spawning an XPA client program failed.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing the payload to, or reading replies from, a client program failed.
    #[error("i/o failed: {0}")]
    Io(#[source] std::io::Error),

    /// The target did not answer within the configured timeout.
    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(std::time::Duration, String),

    /// An explicit payload length exceeds the payload buffer.
    #[error("payload length {len} exceeds buffer of {available} bytes")]
    InvalidLength { len: usize, available: usize },

    /// The template string cannot address any target.
    #[error("invalid template: {0:?}")]
    InvalidTemplate(String),
}
