//! Network side of tilecache.
//!
//! This crate provides the HTTP file source that the cascade delegates to
//! when the offline package cannot answer.

pub mod fetch;

pub use fetch::{FetchConfig, HttpFileSource, HttpRequest};
