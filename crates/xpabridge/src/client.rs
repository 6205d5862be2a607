//! `XpaClient`: the entry point tying the layers together.
//!
//! A client owns a transport, the session configuration and a launcher,
//! and hands out sessions. It holds no connections; every call resolves
//! through the transport afresh.

use std::sync::Arc;

use xpabridge_session::{
    Launcher, ProcessLauncher, Programs, Resolver, Session, SessionConfig, Target,
};
#[cfg(feature = "tools")]
use xpabridge_transport::{ToolsConfig, XpaTools};
use xpabridge_transport::Transport;

use crate::{XpaBridgeError, orchestrator};

/// Access point name the XPA name server registers under.
pub const NAME_SERVER_TEMPLATE: &str = "xpans";

/// Builder for an [`XpaClient`].
///
/// # Example
///
/// ```rust,no_run
/// use xpabridge::prelude::*;
///
/// # async fn demo() -> Result<(), XpaBridgeError> {
/// let client = XpaClient::builder()
///     .session_config(SessionConfig {
///         start: StartPolicy::launch(),
///         ..SessionConfig::default()
///     })
///     .build();
/// client.ensure_name_server().await?;
/// let mut ds9 = client.open("pytest").await?;
/// ds9.command("zoom to fit").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct XpaClientBuilder {
    #[cfg(feature = "tools")]
    tools: ToolsConfig,
    session: SessionConfig,
}

impl XpaClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets where the XPA command-line clients live and their timeout.
    #[cfg(feature = "tools")]
    pub fn tools(mut self, tools: ToolsConfig) -> Self {
        self.tools = tools;
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session = config;
        self
    }

    /// Sets the external program table used for launching.
    pub fn programs(mut self, programs: Programs) -> Self {
        self.session.programs = programs;
        self
    }

    /// Builds a client over the XPA command-line clients.
    ///
    /// Nothing is located or started here; that happens on first use.
    #[cfg(feature = "tools")]
    pub fn build(self) -> XpaClient<XpaTools> {
        let transport = Arc::new(XpaTools::new(self.tools));
        XpaClient::with_transport(transport, self.session)
    }

    /// Builds a client over a caller-supplied transport.
    pub fn build_with<T: Transport>(self, transport: Arc<T>) -> XpaClient<T> {
        XpaClient::with_transport(transport, self.session)
    }
}

/// Hands out sessions on the targets reachable through `T`.
pub struct XpaClient<T, L = ProcessLauncher> {
    transport: Arc<T>,
    config: SessionConfig,
    launcher: L,
}

#[cfg(feature = "tools")]
impl XpaClient<XpaTools> {
    /// Creates a builder.
    pub fn builder() -> XpaClientBuilder {
        XpaClientBuilder::new()
    }
}

impl<T: Transport> XpaClient<T> {
    /// Creates a client launching through a [`ProcessLauncher`] built from
    /// `config.programs`.
    pub fn with_transport(transport: Arc<T>, config: SessionConfig) -> Self {
        let launcher = ProcessLauncher::new(config.programs.clone());
        Self {
            transport,
            config,
            launcher,
        }
    }

    /// Starts the XPA name server if none answers.
    ///
    /// Returns `true` if it had to be started. Viewers started before the
    /// name server don't register with it by themselves.
    ///
    /// # Errors
    /// [`SessionError::Configuration`](xpabridge_session::SessionError::Configuration)
    /// if the name server executable can't be located.
    pub async fn ensure_name_server(&self) -> Result<bool, XpaBridgeError> {
        let resolver = Resolver::new(Arc::clone(&self.transport)).with_max_targets(1);
        if !resolver.resolve(NAME_SERVER_TEMPLATE).await?.is_empty() {
            return Ok(false);
        }
        tracing::info!("no name server answering, starting one");
        self.launcher.start_name_server().await?;
        Ok(true)
    }
}

impl<T: Transport, L: Launcher> XpaClient<T, L> {
    /// Replaces the launcher used by [`open`](Self::open).
    pub fn launcher<L2: Launcher>(self, launcher: L2) -> XpaClient<T, L2> {
        XpaClient {
            transport: self.transport,
            config: self.config,
            launcher,
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Lists the live targets matching `template`. Empty if none.
    pub async fn targets(&self, template: &str) -> Result<Vec<Target>, XpaBridgeError> {
        orchestrator::targets(
            Arc::clone(&self.transport),
            template,
            self.config.max_targets,
        )
        .await
    }

    /// Opens a session on the single target matching `template`,
    /// launching the viewer if the start policy says so.
    pub async fn open(&self, template: &str) -> Result<Session<T>, XpaBridgeError> {
        Ok(Session::open_with(
            Arc::clone(&self.transport),
            template,
            self.config.clone(),
            &self.launcher,
        )
        .await?)
    }

    /// Opens one session per target matching `template`.
    ///
    /// Fails if nothing matches.
    pub async fn open_all(&self, template: &str) -> Result<Vec<Session<T>>, XpaBridgeError> {
        orchestrator::open_all(
            Arc::clone(&self.transport),
            template,
            self.config.max_targets,
            &self.config,
        )
        .await
    }
}
