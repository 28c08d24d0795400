//! One-shot scan of every tile in a package.
//!
//! Used to seed another cache from a bundled package. Rows are converted to
//! XYZ numbering, so each yielded resource resolves back to the same row
//! through [`LocalStore::get`](super::LocalStore::get).

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use tokio_rusqlite::Connection;

use super::connection::open_read_only;
use super::mbtiles::payload;
use crate::resource::tile_url;
use crate::{Error, Resource, Response, Scheme, TileData};

/// How long scanned tiles are considered fresh, in days.
pub const BUNDLE_TILE_TTL_DAYS: i64 = 5;

/// Read-only scanner over the `tiles` table.
#[derive(Debug)]
pub struct BundleTiles {
    path: PathBuf,
    conn: Connection,
}

impl BundleTiles {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let conn = open_read_only(&path, 1).await?;
        Ok(Self { path, conn })
    }

    /// Number of tile rows, tombstones included.
    pub async fn count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM tiles", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Every stored tile as a `(Resource, Response)` pair.
    ///
    /// URLs are built from `url_template` by substituting `{z}`, `{x}` and
    /// `{y}`. Rows whose coordinates cannot exist at their zoom level are
    /// skipped.
    pub async fn collect(&self, url_template: &str) -> Result<Vec<(Resource, Response)>, Error> {
        let rows = self
            .conn
            .call(|conn| -> Result<Vec<(i64, i64, i64, Option<Vec<u8>>)>, Error> {
                let mut stmt = conn.prepare("SELECT zoom_level, tile_column, tile_row, tile_data FROM tiles")?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, payload(row, 3)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        let expires = Utc::now() + Duration::days(BUNDLE_TILE_TTL_DAYS);
        let mut tiles = Vec::with_capacity(rows.len());
        for (z, x, row, data) in rows {
            let Some((z, x, y)) = to_xyz(z, x, row) else {
                tracing::warn!(path = %self.path.display(), z, x, row, "skipping tile with invalid coordinates");
                continue;
            };

            let resource = Resource::tile(tile_url(url_template, z, x, y), x, y, z, Scheme::Xyz);
            let response = match data {
                Some(data) => Response { expires: Some(expires), ..Response::with_data(data) },
                None => Response::no_content(),
            };
            tiles.push((resource, response));
        }

        tracing::info!(path = %self.path.display(), count = tiles.len(), "scanned bundled tiles");

        Ok(tiles)
    }

    pub async fn close(self) {
        if let Err(e) = self.conn.close().await {
            tracing::error!(path = %self.path.display(), error = %e, "failed to close package");
        }
    }
}

fn to_xyz(z: i64, x: i64, row: i64) -> Option<(u32, u32, u32)> {
    let z = u32::try_from(z).ok()?;
    let x = u32::try_from(x).ok()?;
    let row = u32::try_from(row).ok()?;
    let y = TileData { x, y: row, z, scheme: Scheme::Tms }.flipped_row()?;
    if z < 32 && x >= (1u32 << z) {
        return None;
    }
    Some((z, x, y as u32))
}
