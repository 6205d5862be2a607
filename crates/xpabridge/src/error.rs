//! Unified error type for xpabridge.

use xpabridge_marshal::MarshalError;
use xpabridge_session::SessionError;
use xpabridge_transport::TransportError;

/// Top-level error wrapping every layer's error.
///
/// `#[from]` on each variant lets `?` convert layer errors directly.
#[derive(Debug, thiserror::Error)]
pub enum XpaBridgeError {
    /// Primitive failures: remote errors, missing clients, timeouts.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Unsupported element kinds, bad array parameters, bad containers.
    #[error(transparent)]
    Marshal(#[from] MarshalError),

    /// Resolution, staleness and launch failures.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl XpaBridgeError {
    /// Returns `true` if no live target matched.
    pub fn is_no_target(&self) -> bool {
        matches!(self, Self::Session(SessionError::NoTarget(_)))
    }
}
