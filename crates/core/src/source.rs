//! The file source contract shared by the cascade and its network delegate.

use crate::{Resource, Response};

/// Completion callback for a request. Invoked at most once.
pub type Callback = Box<dyn FnOnce(Response) + Send + 'static>;

/// A cancellable in-flight request.
///
/// Dropping the value cancels the request; once dropped, the callback
/// passed to [`FileSource::request`] will not be invoked.
pub trait AsyncRequest: Send {}

/// Anything that can resolve a [`Resource`] into a [`Response`].
pub trait FileSource: Send + Sync {
    /// Start resolving `resource`. `callback` fires once unless the returned
    /// handle is dropped first.
    fn request(&self, resource: Resource, callback: Callback) -> Box<dyn AsyncRequest>;

    /// Whether resources marked [`Necessity::Optional`](crate::Necessity)
    /// may be dispatched to this source.
    fn supports_optional_requests(&self) -> bool {
        false
    }
}
