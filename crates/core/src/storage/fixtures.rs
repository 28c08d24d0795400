//! Test-only MBTiles package builder.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::Connection;

const SCHEMA: &str = "
    CREATE TABLE metadata (name TEXT, value TEXT);
    CREATE TABLE tiles (zoom_level INTEGER, tile_column INTEGER, tile_row INTEGER, tile_data BLOB);
    CREATE UNIQUE INDEX tile_index ON tiles (zoom_level, tile_column, tile_row);
    CREATE TABLE resources (
        url TEXT PRIMARY KEY,
        etag TEXT,
        expires INTEGER,
        modified INTEGER,
        data BLOB,
        compressed INTEGER
    );
";

struct ResourceRow {
    url: String,
    etag: Option<String>,
    expires: Option<i64>,
    modified: Option<i64>,
    data: Option<Vec<u8>>,
    compressed: bool,
}

/// Builds a package file in a temporary directory.
#[derive(Default)]
pub struct PackageBuilder {
    tiles: Vec<(u32, u32, i64, Option<Vec<u8>>)>,
    resources: Vec<ResourceRow>,
}

/// A built package; the file lives as long as this value.
pub struct Package {
    _dir: TempDir,
    path: PathBuf,
}

impl Package {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tile at a stored (TMS) row. `None` stores a tombstone.
    pub fn tile(mut self, z: u32, x: u32, row: i64, data: Option<&[u8]>) -> Self {
        self.tiles.push((z, x, row, data.map(<[u8]>::to_vec)));
        self
    }

    pub fn resource(self, url: &str, data: Option<&[u8]>, compressed: bool) -> Self {
        self.resource_with_meta(url, None, None, None, data, compressed)
    }

    pub fn resource_with_meta(
        mut self, url: &str, etag: Option<&str>, expires: Option<i64>, modified: Option<i64>, data: Option<&[u8]>,
        compressed: bool,
    ) -> Self {
        self.resources.push(ResourceRow {
            url: url.to_string(),
            etag: etag.map(str::to_string),
            expires,
            modified,
            data: data.map(<[u8]>::to_vec),
            compressed,
        });
        self
    }

    pub fn build(self) -> Package {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.mbtiles");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        for (z, x, row, data) in &self.tiles {
            conn.execute(
                "INSERT INTO tiles (zoom_level, tile_column, tile_row, tile_data) VALUES (?1, ?2, ?3, ?4)",
                params![z, x, row, data],
            )
            .unwrap();
        }

        for r in &self.resources {
            conn.execute(
                "INSERT INTO resources (url, etag, expires, modified, data, compressed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![r.url, r.etag, r.expires, r.modified, r.data, r.compressed as i32],
            )
            .unwrap();
        }

        drop(conn);
        Package { _dir: dir, path }
    }
}

/// Gzip `data` the way packaging tools store compressed resources.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}
