//! Bound sessions: one handle, one target.
//!
//! A [`Session`] is created by resolving a template to exactly one live
//! target. From then on every call goes to that target's id, never back
//! through the template. The lifecycle is:
//!
//! ```text
//!   template ──(open: exactly one match)──→ Bound ──(verify fails)──→ Invalid
//! ```
//!
//! There is no "unbound" session value: opening either yields a bound
//! session or an error. `Invalid` is terminal; every call on an invalid
//! session fails with [`SessionError::Stale`].
//!
//! The template and target are fixed at construction and have no setters:
//!
//! ```compile_fail
//! # fn demo(session: &mut xpabridge_session::Session<xpabridge_transport::MemoryTransport>) {
//! session.target = xpabridge_session::Target::new("DS9:other", "7f000001:1");
//! # }
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use xpabridge_marshal::ArrayBuffer;
use xpabridge_transport::{Template, Transport, has_glob};

use crate::{Launched, Launcher, ProcessLauncher, Resolver, SessionConfig, SessionError, StartPolicy, Target};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Talking to its target.
    Bound,
    /// The target stopped answering a verify check. Terminal.
    Invalid,
}

// ---------------------------------------------------------------------------
// Response / Outbound
// ---------------------------------------------------------------------------

/// What a get brought back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Reply to a text command, decoded as UTF-8.
    Text(String),
    /// Reply to a binary command (image formats, raw arrays, FITS).
    Binary(Vec<u8>),
}

impl Response {
    /// The text, if this is a text reply.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(data) => data,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Binary(data) => data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// The data sent along with a set.
#[derive(Debug, Clone, Copy, Default)]
pub enum Outbound<'a> {
    /// Command only.
    #[default]
    Empty,
    Text(&'a str),
    Bytes(&'a [u8]),
    /// Sent as its raw element bytes in row-major order, nothing else.
    /// Use [`Session::set_array`] to also describe it to the viewer.
    Array(&'a ArrayBuffer),
}

impl<'a> Outbound<'a> {
    fn to_bytes(self) -> Option<Cow<'a, [u8]>> {
        match self {
            Self::Empty => None,
            Self::Text(text) => Some(Cow::Borrowed(text.as_bytes())),
            Self::Bytes(data) => Some(Cow::Borrowed(data)),
            Self::Array(array) if array.is_contiguous() => {
                Some(Cow::Borrowed(array.as_bytes()))
            }
            Self::Array(array) => Some(Cow::Owned(array.to_contiguous().as_bytes().to_vec())),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A handle bound to exactly one target.
///
/// Sessions share no mutable state with each other, so fanning out means
/// one session per task. A single session is used from one place at a
/// time; calls take `&mut self`.
pub struct Session<T> {
    transport: Arc<T>,
    template: String,
    target: Target,
    config: SessionConfig,
    state: SessionState,
    launched: Option<Launched>,
}

impl<T: Transport> Session<T> {
    /// Resolves `template` and binds to the single match.
    ///
    /// When nothing matches and `config.start` is [`StartPolicy::Launch`],
    /// the viewer is started through a [`ProcessLauncher`] built from
    /// `config.programs`, then polled for.
    ///
    /// # Errors
    /// - [`SessionError::NoTarget`] if nothing matched (after launching,
    ///   if the policy allows it)
    /// - [`SessionError::Ambiguous`] if more than one target matched
    /// - [`SessionError::Configuration`] if the viewer must be launched but
    ///   can't be located
    pub async fn open(
        transport: Arc<T>,
        template: &str,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let launcher = ProcessLauncher::new(config.programs.clone());
        Self::open_with(transport, template, config, &launcher).await
    }

    /// Like [`open`](Self::open), with a caller-supplied launcher.
    ///
    /// ## Glob templates and launching
    ///
    /// A launched viewer can't be titled after a glob. It gets
    /// `config.default_title` instead, and that title (not the glob) is
    /// what gets polled and bound. The new viewer may then not match the
    /// requested glob at all; passing a plain name when
    /// launching is the caller's job.
    pub async fn open_with<L: Launcher>(
        transport: Arc<T>,
        template: &str,
        config: SessionConfig,
        launcher: &L,
    ) -> Result<Self, SessionError> {
        let resolver =
            Resolver::new(Arc::clone(&transport)).with_max_targets(config.max_targets);
        let mut template = template.to_string();
        let mut matches = resolver.resolve(&template).await?;
        let mut launched = None;

        if matches.is_empty() {
            if let StartPolicy::Launch { extra_args } = &config.start {
                let title = launch_title(&template, &config);
                launched = Some(launcher.launch(&title, extra_args).await?);
                template = title;
                matches = resolver
                    .wait_for(&template, config.poll_attempts(), config.poll_interval)
                    .await?;
            }
        }

        let mut matches = matches.into_iter();
        match (matches.next(), matches.next()) {
            (None, _) => Err(SessionError::NoTarget(template)),
            (Some(target), None) => {
                tracing::info!(
                    %template,
                    name = %target.name,
                    id = %target.id,
                    pid = ?launched.as_ref().and_then(|l| l.pid),
                    "bound session"
                );
                let mut session = Self::bound(transport, template, target, config);
                session.launched = launched;
                Ok(session)
            }
            (Some(first), Some(second)) => {
                let mut all = vec![first, second];
                all.extend(matches);
                tracing::warn!(%template, matches = all.len(), "template is ambiguous");
                Err(SessionError::Ambiguous {
                    template,
                    matches: all,
                })
            }
        }
    }

    /// Binds to an already resolved target without resolving again.
    ///
    /// The session's template is the target's id.
    pub fn attach(transport: Arc<T>, target: Target, config: SessionConfig) -> Self {
        let template = target.id.clone();
        tracing::debug!(name = %target.name, id = %target.id, "attached session");
        Self::bound(transport, template, target, config)
    }

    fn bound(transport: Arc<T>, template: String, target: Target, config: SessionConfig) -> Self {
        Self {
            transport,
            template,
            target,
            config,
            state: SessionState::Bound,
            launched: None,
        }
    }

    /// Returns a copy of this session with the verify check switched
    /// on or off.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.config.verify = verify;
        self
    }

    // -- read-only identity -------------------------------------------------

    /// The template this session was opened with.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The bound target's unique id.
    pub fn id(&self) -> &str {
        &self.target.id
    }

    /// The bound target's `class:name`.
    pub fn name(&self) -> &str {
        &self.target.name
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn verify(&self) -> bool {
        self.config.verify
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The viewer process this session started, if opening it had to
    /// launch one.
    pub fn launched(&self) -> Option<&Launched> {
        self.launched.as_ref()
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    // -- primitives ---------------------------------------------------------

    /// Fails if the session is invalid, or if verifying and the target
    /// has gone (which invalidates the session).
    pub(crate) async fn self_test(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Invalid {
            return Err(SessionError::Stale(self.target.id.clone()));
        }
        if !self.config.verify {
            return Ok(());
        }
        let replies = self.transport.access(&self.target.id, None, 1).await?;
        if replies.is_empty() {
            tracing::warn!(id = %self.target.id, "target is gone, invalidating session");
            self.state = SessionState::Invalid;
            return Err(SessionError::Stale(self.target.id.clone()));
        }
        Ok(())
    }

    /// Fetches the reply to `params`.
    ///
    /// Binary commands (per the config's command table) come back as
    /// [`Response::Binary`], everything else as UTF-8 text. Trailing
    /// whitespace is removed unless the command is in the no-strip list.
    /// No reply at all gives an empty response.
    pub async fn get(&mut self, params: Option<&str>) -> Result<Response, SessionError> {
        let data = self.fetch(params).await?;
        if self.config.commands.is_binary(params) {
            Ok(Response::Binary(data))
        } else {
            Ok(Response::Text(String::from_utf8(data)?))
        }
    }

    /// Fetches the reply to `params` as text, whatever the command.
    pub async fn get_text(&mut self, params: &str) -> Result<String, SessionError> {
        Ok(String::from_utf8(self.fetch(Some(params)).await?)?)
    }

    /// Fetches the reply to `params` as bytes, whatever the command.
    pub async fn get_bytes(&mut self, params: &str) -> Result<Vec<u8>, SessionError> {
        self.fetch(Some(params)).await
    }

    async fn fetch(&mut self, params: Option<&str>) -> Result<Vec<u8>, SessionError> {
        self.self_test().await?;
        let replies = self.transport.get(&self.target.id, params, 1).await?;
        let mut data = replies.into_iter().next().map(|r| r.data).unwrap_or_default();
        if self.config.commands.strips(params) {
            let keep = data
                .iter()
                .rposition(|b| !b.is_ascii_whitespace())
                .map_or(0, |i| i + 1);
            data.truncate(keep);
        }
        Ok(data)
    }

    /// Sends `params` with an optional payload.
    ///
    /// `len` limits how many payload bytes go out; `None` sends all of
    /// them. Returns 1 if the target was reached and 0 if it wasn't. A
    /// 0 is a signal, not an error, so `set` doubles as a health probe
    /// when verify is off.
    pub async fn set(
        &mut self,
        params: &str,
        payload: Outbound<'_>,
        len: Option<usize>,
    ) -> Result<usize, SessionError> {
        self.self_test().await?;
        let bytes = payload.to_bytes();
        let reached = self
            .transport
            .set(&self.target.id, Some(params), bytes.as_deref(), len, 1)
            .await?;
        Ok(reached)
    }

    /// Sends a command with no payload.
    pub async fn command(&mut self, params: &str) -> Result<usize, SessionError> {
        self.set(params, Outbound::Empty, None).await
    }

    /// Sends an info message. Returns 1 if the target was reached.
    pub async fn info(&mut self, params: &str) -> Result<usize, SessionError> {
        self.self_test().await?;
        Ok(self.transport.info(&self.target.id, Some(params), 1).await?)
    }

    /// Asks the name server for the bound target's current entry.
    ///
    /// `None` means the id no longer resolves.
    pub async fn access(&mut self) -> Result<Option<Target>, SessionError> {
        self.self_test().await?;
        let replies = self.transport.access(&self.target.id, None, 1).await?;
        Ok(replies.first().and_then(|r| Target::parse(&r.name)))
    }
}

/// Title for a launched viewer: the template's name part, or the default
/// title if the template is a glob.
fn launch_title(template: &str, config: &SessionConfig) -> String {
    if has_glob(template) {
        tracing::warn!(
            template,
            title = %config.default_title,
            "cannot title a viewer after a glob, using the default title"
        );
        return config.default_title.clone();
    }
    match Template::parse(template) {
        Ok(Template::Pattern { name, .. }) => name.as_str().to_string(),
        _ => template.to_string(),
    }
}
