//! Target discovery.
//!
//! A thin layer over the access primitive: a template goes in, the live
//! targets matching it come out. Finding nothing is a normal answer here;
//! whether it is fatal is up to the caller.

use std::sync::Arc;
use std::time::Duration;

use xpabridge_transport::{DEFAULT_MAX_TARGETS, Transport};

use crate::{SessionError, Target};

/// Resolves templates to live targets.
pub struct Resolver<T> {
    transport: Arc<T>,
    max_targets: usize,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            max_targets: self.max_targets,
        }
    }
}

impl<T: Transport> Resolver<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            max_targets: DEFAULT_MAX_TARGETS,
        }
    }

    /// Caps how many targets one resolution may return.
    pub fn with_max_targets(mut self, max_targets: usize) -> Self {
        self.max_targets = max_targets;
        self
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn max_targets(&self) -> usize {
        self.max_targets
    }

    /// Every live target matching `template`, in name server order.
    ///
    /// Returns an empty list, not an error, when nothing matches.
    pub async fn resolve(&self, template: &str) -> Result<Vec<Target>, SessionError> {
        let replies = self
            .transport
            .access(template, None, self.max_targets)
            .await?;
        let targets: Vec<Target> = replies
            .iter()
            .filter_map(|reply| Target::parse(&reply.name))
            .collect();
        tracing::debug!(template, found = targets.len(), "resolved template");
        Ok(targets)
    }

    /// Returns `true` if the target with `id` still answers.
    pub async fn is_alive(&self, id: &str) -> Result<bool, SessionError> {
        let replies = self.transport.access(id, None, 1).await?;
        Ok(!replies.is_empty())
    }

    /// Polls `template` every `interval` until something matches or
    /// `attempts` intervals have passed.
    ///
    /// Checks once more after the last interval, so the full wait is
    /// covered. Returns whatever the last check found.
    pub async fn wait_for(
        &self,
        template: &str,
        attempts: u32,
        interval: Duration,
    ) -> Result<Vec<Target>, SessionError> {
        for attempt in 0..attempts {
            let found = self.resolve(template).await?;
            if !found.is_empty() {
                return Ok(found);
            }
            tracing::debug!(template, attempt, "target not registered yet");
            tokio::time::sleep(interval).await;
        }
        self.resolve(template).await
    }
}
