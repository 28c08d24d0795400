//! Read-only access to packaged MBTiles databases.
//!
//! The package is produced elsewhere and never written here. It holds two
//! tables:
//!
//! - `tiles(zoom_level, tile_column, tile_row, tile_data)` with TMS rows
//! - `resources(url, etag, expires, modified, data, compressed)`

pub mod bundle;
pub mod compression;
pub mod connection;
pub mod mbtiles;

#[cfg(test)]
pub(crate) mod fixtures;

pub use bundle::BundleTiles;
pub use mbtiles::{DEFAULT_STATEMENT_CACHE_CAPACITY, LocalStore};
