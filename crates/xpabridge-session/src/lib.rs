//! Target resolution and bound sessions for XPA.
//!
//! This crate turns a template into a handle on exactly one running viewer:
//!
//! 1. **Resolution**: finding which targets match a template ([`Resolver`])
//! 2. **Binding**: opening a [`Session`] on the single match, optionally
//!    launching the viewer first ([`Launcher`], [`ProcessLauncher`])
//! 3. **Exchange**: get/set/info/access on the bound id, plus arrays and
//!    container files through the marshaller
//!
//! # How it fits in the stack
//!
//! ```text
//! Orchestrator (above)  ← opens one session per matching target
//!     ↕
//! Session layer (this crate)  ← one handle, one target id
//!     ↕
//! Transport + marshal (below)  ← primitives and byte conversion
//! ```

#![allow(async_fn_in_trait)]

mod config;
mod error;
mod exchange;
mod launch;
mod resolver;
mod session;
mod target;

pub use config::{CommandTable, Programs, SessionConfig, StartPolicy};
pub use error::SessionError;
pub use launch::{LaunchCommand, Launched, Launcher, ProcessLauncher};
pub use resolver::Resolver;
pub use session::{Outbound, Response, Session, SessionState};
pub use target::Target;
