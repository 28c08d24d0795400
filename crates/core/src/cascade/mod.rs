//! Offline-first file source.
//!
//! [`CascadeFileSource`] answers from a packaged MBTiles database when it
//! can and forwards everything else to an upstream [`FileSource`] (normally
//! the network):
//!
//! - A hit is delivered on the cascade task before the request is tracked,
//!   so it has no cancellation window.
//! - A miss (including tombstones and failed lookups) is delegated and kept
//!   in the in-flight table until it completes or is cancelled.
//! - Dropping the returned [`CascadeRequest`] cancels a delegated request;
//!   its callback is then never invoked.
//!
//! All calls are non-blocking: they post a message to the cascade task and
//! return. Messages from one caller are handled in the order sent.

mod actor;
mod request;

pub use actor::RequestId;
pub use request::CascadeRequest;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::source::{AsyncRequest, Callback, FileSource};
use crate::storage::DEFAULT_STATEMENT_CACHE_CAPACITY;
use crate::Resource;
use actor::{Actor, Message};

/// Offline-first [`FileSource`] backed by a cascade task.
///
/// Cheap to clone; all clones talk to the same task. The task exits once
/// every clone and every outstanding [`CascadeRequest`] has been dropped.
#[derive(Clone, Debug)]
pub struct CascadeFileSource {
    mailbox: UnboundedSender<Message>,
    next_id: Arc<AtomicU64>,
}

impl CascadeFileSource {
    /// Spawn the cascade task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn new(upstream: Arc<dyn FileSource>) -> Self {
        Self::with_handle(upstream, &Handle::current(), DEFAULT_STATEMENT_CACHE_CAPACITY)
    }

    /// Spawn the cascade task on `handle`.
    pub fn with_handle(upstream: Arc<dyn FileSource>, handle: &Handle, statement_cache_capacity: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = Actor::new(upstream, tx.downgrade(), statement_cache_capacity);
        handle.spawn(actor.run(rx));

        Self { mailbox: tx, next_id: Arc::new(AtomicU64::new(1)) }
    }

    /// Use the package at `path` as the primary store, replacing any
    /// previous one.
    ///
    /// Fire-and-forget: if the package cannot be opened the failure is
    /// logged and every request goes to the upstream source.
    pub fn set_primary_path(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        if self.mailbox.send(Message::SetPrimaryPath { path }).is_err() {
            tracing::warn!("cascade task is gone, ignoring primary path");
        }
    }

    /// Like [`FileSource::request`], but returns the concrete handle.
    pub fn request_cascade(&self, resource: Resource, callback: Callback) -> CascadeRequest {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if self.mailbox.send(Message::Request { id, resource, callback }).is_err() {
            tracing::warn!(id, "cascade task is gone, request dropped");
        }
        CascadeRequest::new(id, self.mailbox.clone())
    }
}

impl FileSource for CascadeFileSource {
    fn request(&self, resource: Resource, callback: Callback) -> Box<dyn AsyncRequest> {
        Box::new(self.request_cascade(resource, callback))
    }

    fn supports_optional_requests(&self) -> bool {
        true
    }
}
