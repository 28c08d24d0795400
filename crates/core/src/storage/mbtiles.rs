//! Lookups against a read-only MBTiles package.
//!
//! Tiles are addressed by `(zoom_level, tile_column, tile_row)` with rows in
//! TMS order; every other resource is addressed by exact URL in the
//! `resources` table. A missing row is a miss. A row whose payload is NULL is
//! a tombstone, reported as `no_content` without an error.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio_rusqlite::rusqlite::types::{Type, ValueRef};
use tokio_rusqlite::rusqlite::{self, OptionalExtension, Row};
use tokio_rusqlite::{Connection, params};

use super::compression::decompress;
use super::connection::open_read_only;
use crate::response::NOT_FOUND_IN_OFFLINE_DATABASE;
use crate::{Error, Resource, Response, ResponseError, TileData};

/// Default number of prepared statements kept per connection.
pub const DEFAULT_STATEMENT_CACHE_CAPACITY: usize = 16;

const TILE_SQL: &str = "SELECT tile_data FROM tiles WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3";

const RESOURCE_SQL: &str = "SELECT etag, expires, modified, data, compressed FROM resources WHERE url = ?1";

/// A row of the `resources` table before decompression.
struct ResourceRow {
    etag: Option<String>,
    expires: Option<i64>,
    modified: Option<i64>,
    data: Option<Vec<u8>>,
    compressed: bool,
}

/// The offline package consulted before the network.
///
/// Owns its connection exclusively; callers go through [`LocalStore::get`].
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    conn: Connection,
}

impl LocalStore {
    /// Open the package at `path` read-only.
    ///
    /// Fails with [`Error::StoreOpenFailure`] if the file is missing,
    /// unreadable or not an SQLite database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::open_with_capacity(path, DEFAULT_STATEMENT_CACHE_CAPACITY).await
    }

    /// Open with an explicit prepared statement cache size.
    pub async fn open_with_capacity(path: impl AsRef<Path>, statement_cache_capacity: usize) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let conn = open_read_only(&path, statement_cache_capacity).await?;
        Ok(Self { path, conn })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve `resource` against the package.
    ///
    /// Never fails: a missing row yields a `NotFound` miss, and query or
    /// decompression failures are logged and returned as an errored miss so
    /// the caller can fall through to the network.
    pub async fn get(&self, resource: &Resource) -> Response {
        match self.get_internal(resource).await {
            Ok(Some(response)) => response,
            Ok(None) => Response::not_found(NOT_FOUND_IN_OFFLINE_DATABASE),
            Err(err) => {
                tracing::warn!(url = %resource.url, error = %err, "offline lookup failed, treating as miss");
                Response::failed(ResponseError::from(err))
            }
        }
    }

    async fn get_internal(&self, resource: &Resource) -> Result<Option<Response>, Error> {
        match resource.tile_data() {
            Some(tile) => self.get_tile(*tile).await,
            None => self.get_resource(&resource.url).await,
        }
    }

    async fn get_tile(&self, tile: TileData) -> Result<Option<Response>, Error> {
        let Some(tile_row) = tile.flipped_row() else {
            tracing::debug!(z = tile.z, x = tile.x, y = tile.y, "tile outside zoom level bounds");
            return Ok(None);
        };

        tracing::debug!(z = tile.z, x = tile.x, y = tile.y, tile_row, "finding tile");

        let data = self
            .conn
            .call(move |conn| -> Result<Option<Option<Vec<u8>>>, Error> {
                let mut stmt = conn.prepare_cached(TILE_SQL)?;
                let data = stmt
                    .query_row(params![tile.z, tile.x, tile_row], |row| payload(row, 0))
                    .optional()?;
                Ok(data)
            })
            .await
            .map_err(Error::from)?;

        Ok(data.map(|payload| match payload {
            Some(bytes) => {
                tracing::debug!(z = tile.z, x = tile.x, y = tile.y, tile_row, size = bytes.len(), "tile hit");
                Response::with_data(bytes)
            }
            None => Response::no_content(),
        }))
    }

    async fn get_resource(&self, url: &str) -> Result<Option<Response>, Error> {
        let url = url.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<ResourceRow>, Error> {
                let mut stmt = conn.prepare_cached(RESOURCE_SQL)?;
                let row = stmt
                    .query_row(params![url], |row| {
                        Ok(ResourceRow {
                            etag: row.get(0)?,
                            expires: row.get(1)?,
                            modified: row.get(2)?,
                            data: payload(row, 3)?,
                            compressed: row.get::<_, Option<i64>>(4)?.unwrap_or(0) != 0,
                        })
                    })
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut response = match row.data {
            None => Response::no_content(),
            Some(data) if row.compressed => Response::with_data(decompress(&data)?),
            Some(data) => Response::with_data(data),
        };
        response.etag = row.etag;
        response.expires = row.expires.and_then(timestamp);
        response.modified = row.modified.and_then(timestamp);

        Ok(Some(response))
    }

    /// Release cached statements and the connection.
    ///
    /// Failures are logged, never returned: this only runs at teardown.
    pub async fn close(self) {
        let path = self.path;
        let flushed = self
            .conn
            .call(|conn| {
                conn.flush_prepared_statement_cache();
                Ok::<_, rusqlite::Error>(())
            })
            .await;
        if let Err(e) = flushed {
            tracing::error!(path = %path.display(), error = %e, "failed to flush statement cache");
        }

        match self.conn.close().await {
            Ok(()) => tracing::info!(path = %path.display(), "closed offline package"),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "failed to close offline package"),
        }
    }
}

/// Read a payload column, accepting BLOB or TEXT storage.
pub(super) fn payload(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Vec<u8>>> {
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        ValueRef::Blob(b) | ValueRef::Text(b) => Ok(Some(b.to_vec())),
        ValueRef::Integer(_) => Err(rusqlite::Error::InvalidColumnType(idx, "payload".into(), Type::Integer)),
        ValueRef::Real(_) => Err(rusqlite::Error::InvalidColumnType(idx, "payload".into(), Type::Real)),
    }
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fixtures::{PackageBuilder, gzip};
    use crate::{ErrorReason, Scheme};

    fn tile(z: u32, x: u32, y: u32) -> Resource {
        Resource::tile(format!("https://tiles.example.com/{z}/{x}/{y}.pbf"), x, y, z, Scheme::Xyz)
    }

    #[tokio::test]
    async fn test_tile_hit_uses_flipped_row() {
        let package = PackageBuilder::new().tile(2, 1, 2, Some(b"ABC")).build();
        let store = LocalStore::open(package.path()).await.unwrap();

        let res = Resource::tile("https://tiles.example.com/2/1/1.pbf", 1, 1, 2, Scheme::Tms);
        let response = store.get(&res).await;

        assert_eq!(response.data.as_deref(), Some(&b"ABC"[..]));
        assert!(!response.no_content);
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_tile_xyz_round_trip() {
        let mut builder = PackageBuilder::new();
        for z in 0..4u32 {
            for y in 0..(1u32 << z) {
                let row = (1i64 << z) - i64::from(y) - 1;
                builder = builder.tile(z, 0, row, Some(format!("{z}/{y}").as_bytes()));
            }
        }
        let package = builder.build();
        let store = LocalStore::open(package.path()).await.unwrap();

        for z in 0..4u32 {
            for y in 0..(1u32 << z) {
                let response = store.get(&tile(z, 0, y)).await;
                assert_eq!(response.data.as_deref(), Some(format!("{z}/{y}").as_bytes()));
            }
        }
    }

    #[tokio::test]
    async fn test_tile_tombstone() {
        let package = PackageBuilder::new().tile(3, 2, 5, None).build();
        let store = LocalStore::open(package.path()).await.unwrap();

        let response = store.get(&tile(3, 2, 2)).await;
        assert!(response.no_content);
        assert!(response.data.is_none());
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_tile_missing() {
        let package = PackageBuilder::new().tile(2, 1, 2, Some(b"ABC")).build();
        let store = LocalStore::open(package.path()).await.unwrap();

        let response = store.get(&tile(2, 1, 2)).await;
        assert!(response.no_content);
        assert!(response.data.is_none());
        assert_eq!(response.error_reason(), Some(ErrorReason::NotFound));
        assert_eq!(response.error.unwrap().message, NOT_FOUND_IN_OFFLINE_DATABASE);
    }

    #[tokio::test]
    async fn test_tile_out_of_bounds_is_miss() {
        let package = PackageBuilder::new().build();
        let store = LocalStore::open(package.path()).await.unwrap();

        let response = store.get(&tile(1, 0, 7)).await;
        assert_eq!(response.error_reason(), Some(ErrorReason::NotFound));
    }

    #[tokio::test]
    async fn test_resource_compressed() {
        let package = PackageBuilder::new()
            .resource("X", Some(&gzip(b"hello")), true)
            .build();
        let store = LocalStore::open(package.path()).await.unwrap();

        let response = store.get(&Resource::style("X")).await;
        assert_eq!(response.data.as_deref(), Some(&b"hello"[..]));
        assert!(!response.no_content);
    }

    #[tokio::test]
    async fn test_resource_uncompressed_with_metadata() {
        let package = PackageBuilder::new()
            .resource_with_meta(
                "https://example.com/style.json",
                Some("\"v1\""),
                Some(1_700_000_000),
                Some(1_600_000_000),
                Some(b"{}"),
                false,
            )
            .build();
        let store = LocalStore::open(package.path()).await.unwrap();

        let response = store.get(&Resource::style("https://example.com/style.json")).await;
        assert_eq!(response.data.as_deref(), Some(&b"{}"[..]));
        assert_eq!(response.etag.as_deref(), Some("\"v1\""));
        assert_eq!(response.expires.map(|t| t.timestamp()), Some(1_700_000_000));
        assert_eq!(response.modified.map(|t| t.timestamp()), Some(1_600_000_000));
    }

    #[tokio::test]
    async fn test_resource_missing() {
        let package = PackageBuilder::new().resource("X", Some(b"x"), false).build();
        let store = LocalStore::open(package.path()).await.unwrap();

        let response = store.get(&Resource::style("Y")).await;
        assert!(response.no_content);
        assert_eq!(response.error_reason(), Some(ErrorReason::NotFound));
    }

    #[tokio::test]
    async fn test_resource_tombstone_keeps_metadata() {
        let package = PackageBuilder::new()
            .resource_with_meta("gone", Some("etag"), None, None, None, false)
            .build();
        let store = LocalStore::open(package.path()).await.unwrap();

        let response = store.get(&Resource::source("gone")).await;
        assert!(response.no_content);
        assert!(response.error.is_none());
        assert_eq!(response.etag.as_deref(), Some("etag"));
    }

    #[tokio::test]
    async fn test_corrupt_compressed_payload_is_miss() {
        let package = PackageBuilder::new()
            .resource("broken", Some(b"definitely not gzip"), true)
            .build();
        let store = LocalStore::open(package.path()).await.unwrap();

        let response = store.get(&Resource::style("broken")).await;
        assert!(response.no_content);
        assert!(response.data.is_none());
        assert_eq!(response.error_reason(), Some(ErrorReason::Other));
    }

    #[tokio::test]
    async fn test_get_is_idempotent() {
        let package = PackageBuilder::new()
            .tile(2, 1, 2, Some(b"ABC"))
            .resource("X", Some(&gzip(b"hello")), true)
            .build();
        let store = LocalStore::open(package.path()).await.unwrap();

        for res in [tile(2, 1, 1), Resource::style("X"), Resource::style("missing")] {
            let first = store.get(&res).await;
            let second = store.get(&res).await;
            assert_eq!(first, second);
            assert!(!(first.data.is_some() && first.no_content));
        }
    }

    #[tokio::test]
    async fn test_missing_tables_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.mbtiles");
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE metadata (name TEXT, value TEXT);").unwrap();
        drop(conn);

        let store = LocalStore::open(&path).await.unwrap();
        let response = store.get(&tile(0, 0, 0)).await;
        assert!(response.no_content);
        assert_eq!(response.error_reason(), Some(ErrorReason::Other));
    }

    #[tokio::test]
    async fn test_close() {
        let package = PackageBuilder::new().build();
        let store = LocalStore::open(package.path()).await.unwrap();
        assert_eq!(store.path(), package.path());
        store.close().await;
    }
}
