//! Result of resolving a [`Resource`](crate::Resource).

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message attached to every miss reported by the offline package.
pub const NOT_FOUND_IN_OFFLINE_DATABASE: &str = "Not found in offline database";

/// Why a response carries no usable payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    NotFound,
    Server,
    Connection,
    RateLimit,
    Other,
}

/// Error detail carried inside a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    pub reason: ErrorReason,
    pub message: String,
}

impl ResponseError {
    pub fn new(reason: ErrorReason, message: impl Into<String>) -> Self {
        Self { reason, message: message.into() }
    }
}

/// A resolved resource: payload plus cache metadata, or a miss marker.
///
/// `data` and `no_content` are never both set. An `error` implies
/// `no_content`, but a clean miss (tombstone) has `no_content` with no error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub data: Option<Bytes>,
    pub etag: Option<String>,
    pub modified: Option<DateTime<Utc>>,
    pub expires: Option<DateTime<Utc>>,
    pub no_content: bool,
    pub error: Option<ResponseError>,
}

impl Response {
    /// A hit carrying `data`.
    pub fn with_data(data: impl Into<Bytes>) -> Self {
        Self { data: Some(data.into()), ..Default::default() }
    }

    /// A known-absent item with no error attached.
    pub fn no_content() -> Self {
        Self { no_content: true, ..Default::default() }
    }

    /// A miss tagged with [`ErrorReason::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::failed(ResponseError::new(ErrorReason::NotFound, message))
    }

    /// A failed lookup; always `no_content` with no payload.
    pub fn failed(error: ResponseError) -> Self {
        Self { no_content: true, error: Some(error), ..Default::default() }
    }

    /// True when the response can be handed to the caller as-is.
    pub fn is_hit(&self) -> bool {
        !self.no_content
    }

    /// Reason of the attached error, if any.
    pub fn error_reason(&self) -> Option<ErrorReason> {
        self.error.as_ref().map(|e| e.reason)
    }
}
