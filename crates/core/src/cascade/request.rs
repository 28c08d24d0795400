//! Caller-side handle for a cascade request.

use tokio::sync::mpsc::UnboundedSender;

use super::actor::{Message, RequestId};
use crate::source::AsyncRequest;

/// Returned by [`CascadeFileSource::request`](super::CascadeFileSource).
///
/// Dropping it posts a cancellation. If the callback already ran, the
/// cancellation is a no-op.
#[derive(Debug)]
pub struct CascadeRequest {
    id: RequestId,
    mailbox: UnboundedSender<Message>,
}

impl CascadeRequest {
    pub(crate) fn new(id: RequestId, mailbox: UnboundedSender<Message>) -> Self {
        Self { id, mailbox }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Cancel explicitly. Equivalent to dropping the handle.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for CascadeRequest {
    fn drop(&mut self) {
        let _ = self.mailbox.send(Message::Cancel { id: self.id });
    }
}

impl AsyncRequest for CascadeRequest {}
