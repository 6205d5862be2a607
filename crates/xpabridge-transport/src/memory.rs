//! In-process transport.
//!
//! [`MemoryTransport`] keeps its own registry of access points and answers
//! every primitive locally, playing both name server and targets. Each
//! access point is backed by a [`Responder`]. Useful for tests and for
//! embedding a viewer stand-in inside the same process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::{Method, Reply, ReplySet, Request, Template, Transport, TransportError};

/// Counter for generating unique in-process ids.
static NEXT_PORT: AtomicU64 = AtomicU64::new(40000);

/// Answers the primitives addressed to one in-process access point.
///
/// Returning `Err(message)` puts `message` in the responder's reply slot.
pub trait Responder: Send + Sync + 'static {
    /// Handles a get.
    fn get(&self, params: Option<&str>) -> Result<Vec<u8>, String>;

    /// Handles a set. Rejects everything by default.
    fn set(&self, params: Option<&str>, payload: &[u8]) -> Result<(), String> {
        let _ = payload;
        Err(format!("set not supported: {}", params.unwrap_or("")))
    }

    /// Handles an info message. Accepts everything by default.
    fn info(&self, _params: Option<&str>) -> Result<(), String> {
        Ok(())
    }
}

struct Entry {
    class: String,
    name: String,
    id: String,
    responder: Arc<dyn Responder>,
}

/// A [`Transport`] whose access points live in this process.
#[derive(Default)]
pub struct MemoryTransport {
    entries: Mutex<Vec<Entry>>,
    log: Mutex<Vec<(Method, String)>>,
}

impl MemoryTransport {
    /// Creates a transport with no access points.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an access point under a fresh `7f000001:<port>` id and
    /// returns the id.
    pub fn register(
        &self,
        class: &str,
        name: &str,
        responder: impl Responder,
    ) -> String {
        let id = format!(
            "7f000001:{}",
            NEXT_PORT.fetch_add(1, Ordering::Relaxed)
        );
        self.register_with_id(class, name, &id, responder);
        id
    }

    /// Registers an access point under a caller-chosen id.
    pub fn register_with_id(
        &self,
        class: &str,
        name: &str,
        id: &str,
        responder: impl Responder,
    ) {
        tracing::debug!(class, name, id, "registered in-memory access point");
        self.entries().push(Entry {
            class: class.to_string(),
            name: name.to_string(),
            id: id.to_string(),
            responder: Arc::new(responder),
        });
    }

    /// Removes the access point with `id`. Returns `false` if none existed.
    pub fn unregister(&self, id: &str) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        before != entries.len()
    }

    /// Number of registered access points.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Every primitive issued so far, with its template.
    pub fn requests(&self) -> Vec<(Method, String)> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// How many times `method` has been issued.
    pub fn count(&self, method: Method) -> usize {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(m, _)| *m == method)
            .count()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the access points matching `template`, in registration
    /// order, so no lock is held while responders run.
    fn matching(
        &self,
        template: &Template,
        max: usize,
    ) -> Vec<(String, Arc<dyn Responder>)> {
        self.entries()
            .iter()
            .filter(|e| template.matches(&e.class, &e.name, &e.id))
            .take(max)
            .map(|e| {
                (
                    format!("{}:{} {}", e.class, e.name, e.id),
                    Arc::clone(&e.responder),
                )
            })
            .collect()
    }
}

impl Transport for MemoryTransport {
    async fn exchange(
        &self,
        request: Request<'_>,
    ) -> Result<ReplySet, TransportError> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((request.method, request.template.to_string()));

        let template = Template::parse(request.template)?;
        let mut replies = ReplySet::with_capacity(request.max_targets);

        for (name, responder) in self.matching(&template, request.max_targets)
        {
            let reply = match request.method {
                Method::Access => Reply::ok(name, Vec::new()),
                Method::Get => match responder.get(request.params) {
                    Ok(data) => Reply::ok(name, data),
                    Err(e) => Reply::failed(name, e),
                },
                Method::Set => {
                    let payload = request.payload.unwrap_or(&[]);
                    match responder.set(request.params, payload) {
                        Ok(()) => Reply::ok(name, Vec::new()),
                        Err(e) => Reply::failed(name, e),
                    }
                }
                Method::Info => match responder.info(request.params) {
                    Ok(()) => Reply::ok(name, Vec::new()),
                    Err(e) => Reply::failed(name, e),
                },
            };
            replies.push(reply);
        }
        Ok(replies)
    }
}
