//! Byte order of array buffers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Byte order of the elements in a buffer.
///
/// `Native` means "whatever this host uses". It is always resolved to
/// `Little` or `Big` before anything is written on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    Little,
    Big,
    Native,
}

impl ByteOrder {
    /// The host's byte order.
    pub const fn host() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// Replaces `Native` with the host's concrete order.
    pub const fn resolve(self) -> Self {
        match self {
            Self::Native => Self::host(),
            other => other,
        }
    }

    /// Returns `true` if both orders lay bytes out the same way on this host.
    pub fn same_as(self, other: Self) -> bool {
        self.resolve() == other.resolve()
    }

    /// Wire spelling: `little` or `big`.
    pub fn wire_name(self) -> &'static str {
        match self.resolve() {
            Self::Big => "big",
            _ => "little",
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Little => write!(f, "little"),
            Self::Big => write!(f, "big"),
            Self::Native => write!(f, "native"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_resolves_to_host() {
        let host = ByteOrder::host();
        assert_eq!(ByteOrder::Native.resolve(), host);
        assert!(ByteOrder::Native.same_as(host));
        assert_ne!(host, ByteOrder::Native);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(ByteOrder::Little.wire_name(), "little");
        assert_eq!(ByteOrder::Big.wire_name(), "big");
        assert_eq!(ByteOrder::Native.wire_name(), ByteOrder::host().wire_name());
    }
}
