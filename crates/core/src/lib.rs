//! Core types and the offline-first lookup engine for tilecache.
//!
//! This crate provides:
//! - Resource and Response value types
//! - Read-only access to packaged MBTiles databases
//! - The cascading file source that tries the package before the network
//! - Unified error types
//! - Configuration structures

pub mod cascade;
pub mod config;
pub mod error;
pub mod resource;
pub mod response;
pub mod source;
pub mod storage;

pub use cascade::{CascadeFileSource, CascadeRequest, RequestId};
pub use error::Error;
pub use resource::{Necessity, Resource, ResourceKind, Scheme, TileData};
pub use response::{ErrorReason, Response, ResponseError};
pub use source::{AsyncRequest, Callback, FileSource};
pub use storage::{BundleTiles, LocalStore};
