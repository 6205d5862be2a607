//! Wire transport binding for XPA.
//!
//! Provides the [`Transport`] trait that issues the four XPA primitives
//! (get, set, info, access) against a template and returns per-target
//! [`ReplySet`]s.
//!
//! Implementations only supply [`Transport::exchange`], the raw primitive.
//! The provided methods layer the common reply policy on top: slot errors
//! are folded into one [`TransportError::Remote`], payload lengths are
//! resolved, and counts or buffers are returned the way callers expect.
//!
//! # Feature Flags
//!
//! - `tools` (default): [`XpaTools`], driving the XPA command-line clients

#![allow(async_fn_in_trait)]

mod error;
mod locate;
mod memory;
mod reply;
mod template;
#[cfg(feature = "tools")]
mod tools;

pub use error::TransportError;
pub use locate::find_program;
pub use memory::{MemoryTransport, Responder};
pub use reply::{DEFAULT_MAX_TARGETS, Method, Reply, ReplySet, Request};
pub use template::{MATCH_ALL, NamePattern, Template, has_glob};
#[cfg(feature = "tools")]
pub use tools::{ToolsConfig, XpaTools};

/// Issues XPA primitives against the targets matching a template.
pub trait Transport: Send + Sync + 'static {
    /// Performs one primitive and returns the raw per-target slots.
    ///
    /// Slots may carry errors; callers normally go through the provided
    /// methods below, which check them.
    async fn exchange(
        &self,
        request: Request<'_>,
    ) -> Result<ReplySet, TransportError>;

    /// Requests data from every target matching `template`.
    ///
    /// Returns one slot per responder. Zero-length data still counts as a
    /// match. Fails if any responder reported an error.
    async fn get(
        &self,
        template: &str,
        params: Option<&str>,
        max_targets: usize,
    ) -> Result<ReplySet, TransportError> {
        tracing::debug!(template, ?params, "xpa get");
        let request =
            Request::new(Method::Get, template, max_targets).params(params);
        self.exchange(request).await?.into_checked()
    }

    /// Sends `payload` to every target matching `template`.
    ///
    /// `len` selects how many bytes of `payload` are sent; `None` sends the
    /// whole buffer (or nothing without a buffer). Returns the number of
    /// targets reached.
    async fn set(
        &self,
        template: &str,
        params: Option<&str>,
        payload: Option<&[u8]>,
        len: Option<usize>,
        max_targets: usize,
    ) -> Result<usize, TransportError> {
        let payload = clip_payload(payload, len)?;
        tracing::debug!(
            template,
            ?params,
            bytes = payload.map_or(0, <[u8]>::len),
            "xpa set"
        );
        let request = Request::new(Method::Set, template, max_targets)
            .params(params)
            .payload(payload);
        let replies = self.exchange(request).await?.into_checked()?;
        Ok(replies.got())
    }

    /// Sends an info message. Returns the number of targets reached.
    async fn info(
        &self,
        template: &str,
        params: Option<&str>,
        max_targets: usize,
    ) -> Result<usize, TransportError> {
        tracing::debug!(template, ?params, "xpa info");
        let request =
            Request::new(Method::Info, template, max_targets).params(params);
        let replies = self.exchange(request).await?.into_checked()?;
        Ok(replies.got())
    }

    /// Lists the access points matching `template`.
    ///
    /// Each slot's `name` holds `"class:name id"`. An empty set means no
    /// live target; that is not an error.
    async fn access(
        &self,
        template: &str,
        params: Option<&str>,
        max_targets: usize,
    ) -> Result<ReplySet, TransportError> {
        tracing::debug!(template, "xpa access");
        let request =
            Request::new(Method::Access, template, max_targets).params(params);
        self.exchange(request).await?.into_checked()
    }
}

/// Resolves the payload length rule: no explicit length means "the whole
/// buffer", an explicit length must fit inside it.
fn clip_payload(
    payload: Option<&[u8]>,
    len: Option<usize>,
) -> Result<Option<&[u8]>, TransportError> {
    match (payload, len) {
        (None, None) | (None, Some(0)) => Ok(None),
        (None, Some(len)) => {
            Err(TransportError::InvalidLength { len, available: 0 })
        }
        (Some(buf), None) => Ok(Some(buf)),
        (Some(buf), Some(len)) if len <= buf.len() => Ok(Some(&buf[..len])),
        (Some(buf), Some(len)) => Err(TransportError::InvalidLength {
            len,
            available: buf.len(),
        }),
    }
}
