//! Opening sessions on every target a template matches.

use std::sync::Arc;

use xpabridge_session::{Resolver, Session, SessionConfig, SessionError, Target};
use xpabridge_transport::Transport;

use crate::XpaBridgeError;

/// Lists the live targets matching `template`. Empty if none.
pub async fn targets<T: Transport>(
    transport: Arc<T>,
    template: &str,
    max_targets: usize,
) -> Result<Vec<Target>, XpaBridgeError> {
    let resolver = Resolver::new(transport).with_max_targets(max_targets);
    Ok(resolver.resolve(template).await?)
}

/// Opens one session per target matching `template`, in resolution order.
///
/// Each session is attached to its target's id, so targets sharing a
/// name don't trip the ambiguity check.
///
/// # Errors
/// [`SessionError::NoTarget`] (wrapped) if nothing matches.
pub async fn open_all<T: Transport>(
    transport: Arc<T>,
    template: &str,
    max_targets: usize,
    config: &SessionConfig,
) -> Result<Vec<Session<T>>, XpaBridgeError> {
    let found = targets(Arc::clone(&transport), template, max_targets).await?;
    if found.is_empty() {
        return Err(SessionError::NoTarget(template.to_string()).into());
    }
    tracing::info!(template, count = found.len(), "opening sessions");
    Ok(found
        .into_iter()
        .map(|target| Session::attach(Arc::clone(&transport), target, config.clone()))
        .collect())
}
