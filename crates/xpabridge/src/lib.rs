//! # xpabridge
//!
//! Discover, address and exchange data with running XPA-enabled viewers
//! (SAOImage DS9 in particular).
//!
//! The layers, bottom up:
//!
//! - [`transport`]: the four XPA primitives (get, set, info, access) with
//!   per-target reply sets
//! - [`marshal`]: arrays and container files to and from raw bytes
//! - [`session`]: template resolution and handles bound to one target
//! - this crate: [`XpaClient`] and [`open_all`] over many targets
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xpabridge::prelude::*;
//!
//! # async fn demo() -> Result<(), XpaBridgeError> {
//! let client = XpaClient::builder().build();
//! for target in client.targets(MATCH_ALL).await? {
//!     println!("{target}");
//! }
//! let mut ds9 = client.open("ds9").await?;
//! let image = ds9.get_array().await?;
//! println!("{:?} {}", image.dims(), image.kind());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod orchestrator;

pub use client::{NAME_SERVER_TEMPLATE, XpaClient, XpaClientBuilder};
pub use error::XpaBridgeError;
pub use orchestrator::{open_all, targets};

pub use xpabridge_marshal as marshal;
pub use xpabridge_session as session;
pub use xpabridge_transport as transport;

/// The types most callers need.
pub mod prelude {
    pub use crate::{XpaBridgeError, XpaClient, XpaClientBuilder, open_all, targets};
    pub use xpabridge_marshal::{
        ArrayBuffer, ByteOrder, ContainerCodec, ElementKind, FitsBlocks, FitsFile,
    };
    pub use xpabridge_session::{
        Outbound, Programs, Response, Session, SessionConfig, StartPolicy, Target,
    };
    #[cfg(feature = "tools")]
    pub use xpabridge_transport::{ToolsConfig, XpaTools};
    pub use xpabridge_transport::{MATCH_ALL, MemoryTransport, Transport};
}
