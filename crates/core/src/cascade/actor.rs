//! The task that owns the offline package and the delegated request table.
//!
//! All state lives on one tokio task and is only touched while handling a
//! [`Message`], so no locks are needed. Completion of a delegated request is
//! itself a message: whichever of `Complete` and `Cancel` the task sees first
//! removes the table entry, and the other finds nothing to do.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, WeakUnboundedSender};

use crate::source::{AsyncRequest, Callback, FileSource};
use crate::storage::LocalStore;
use crate::{Resource, Response};

/// Identifies one call to [`CascadeFileSource::request`](super::CascadeFileSource).
pub type RequestId = u64;

pub(crate) enum Message {
    Request { id: RequestId, resource: Resource, callback: Callback },
    Cancel { id: RequestId },
    Complete { id: RequestId, response: Response },
    SetPrimaryPath { path: PathBuf },
}

struct Delegated {
    _request: Box<dyn AsyncRequest>,
    callback: Callback,
}

pub(crate) struct Actor {
    upstream: Arc<dyn FileSource>,
    primary: Option<LocalStore>,
    inflight: HashMap<RequestId, Delegated>,
    mailbox: WeakUnboundedSender<Message>,
    statement_cache_capacity: usize,
}

impl Actor {
    pub(crate) fn new(
        upstream: Arc<dyn FileSource>, mailbox: WeakUnboundedSender<Message>, statement_cache_capacity: usize,
    ) -> Self {
        Self { upstream, primary: None, inflight: HashMap::new(), mailbox, statement_cache_capacity }
    }

    /// Process messages until every sender is gone, then tear down.
    pub(crate) async fn run(mut self, mut rx: UnboundedReceiver<Message>) {
        while let Some(message) = rx.recv().await {
            match message {
                Message::Request { id, resource, callback } => self.request(id, resource, callback).await,
                Message::Cancel { id } => self.cancel(id),
                Message::Complete { id, response } => self.complete(id, response),
                Message::SetPrimaryPath { path } => self.set_primary_path(path).await,
            }
        }

        tracing::debug!(inflight = self.inflight.len(), "cascade shutting down");
        self.inflight.clear();
        if let Some(primary) = self.primary.take() {
            primary.close().await;
        }
    }

    async fn request(&mut self, id: RequestId, resource: Resource, callback: Callback) {
        if let Some(primary) = &self.primary {
            let response = primary.get(&resource).await;
            if response.is_hit() {
                callback(response);
                return;
            }
            tracing::debug!(id, url = %resource.url, "offline miss, delegating");
        }

        let mailbox = self.mailbox.clone();
        let request = self.upstream.request(
            resource,
            Box::new(move |response| {
                if let Some(tx) = mailbox.upgrade() {
                    let _ = tx.send(Message::Complete { id, response });
                }
            }),
        );
        self.inflight.insert(id, Delegated { _request: request, callback });
    }

    fn cancel(&mut self, id: RequestId) {
        if self.inflight.remove(&id).is_some() {
            tracing::debug!(id, "cancelled delegated request");
        }
    }

    fn complete(&mut self, id: RequestId, response: Response) {
        match self.inflight.remove(&id) {
            Some(delegated) => (delegated.callback)(response),
            None => tracing::debug!(id, "dropping response for cancelled request"),
        }
    }

    async fn set_primary_path(&mut self, path: PathBuf) {
        if let Some(previous) = self.primary.take() {
            previous.close().await;
        }

        match LocalStore::open_with_capacity(&path, self.statement_cache_capacity).await {
            Ok(store) => self.primary = Some(store),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "offline package unavailable, using network only")
            }
        }
    }
}
