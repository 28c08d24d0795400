//! Read-only connection setup for MBTiles packages.
//!
//! Packages are produced elsewhere and never written here, so the connection
//! is opened read-only and probed once so that a corrupt or non-SQLite file
//! fails at open time rather than on the first lookup.

use std::path::Path;
use std::time::Duration;

use crate::Error;
use tokio_rusqlite::Connection;
use tokio_rusqlite::rusqlite::{self, OpenFlags};

/// Largest busy timeout SQLite accepts (milliseconds held in a C int).
pub const MAX_BUSY_TIMEOUT: Duration = Duration::from_millis(i32::MAX as u64);

/// Open `path` read-only and verify it is a readable SQLite database.
///
/// `statement_cache_capacity` bounds rusqlite's per-connection cache of
/// prepared statements, which is keyed by SQL text.
pub async fn open_read_only(path: &Path, statement_cache_capacity: usize) -> Result<Connection, Error> {
    let open_failure = |reason: String| Error::StoreOpenFailure { path: path.to_path_buf(), reason };

    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI;
    let conn = Connection::open_with_flags(path, flags)
        .await
        .map_err(|e| open_failure(e.to_string()))?;

    conn.call(move |conn| -> Result<(), rusqlite::Error> {
        conn.busy_timeout(MAX_BUSY_TIMEOUT)?;
        conn.set_prepared_statement_cache_capacity(statement_cache_capacity);
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    })
    .await
    .map_err(|e: tokio_rusqlite::Error| open_failure(e.to_string()))?;

    tracing::info!(path = %path.display(), "opened offline package");

    Ok(conn)
}
