//! A small pool of SQLite connections to one database file.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use command_manual_db::DatabaseConfig;
use command_manual_dispatch::{ConnectionSource, StoreError};
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::{Result, SqliteError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Hands out connections to one SQLite file.
///
/// Up to `max_idle` released connections are kept open for reuse. When
/// none is idle a new one is opened, so acquisition never waits on other
/// callers; SQLite's own locking serializes writers.
#[derive(Debug)]
pub struct SqlitePool {
    path: PathBuf,
    max_idle: usize,
    idle: Mutex<Vec<Connection>>,
}

impl SqlitePool {
    /// Opens a pool on `path`, checking that the file can be opened.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::PoolError`] if the database cannot be opened,
    /// or if `max_idle` is zero.
    pub fn open(path: impl AsRef<Path>, max_idle: usize) -> Result<Self> {
        if max_idle == 0 {
            return Err(SqliteError::PoolError(
                "pool size must be at least 1".to_string(),
            ));
        }
        let path = path.as_ref().to_path_buf();
        let first = open_connection(&path)?;
        Ok(Self {
            path,
            max_idle,
            idle: Mutex::new(vec![first]),
        })
    }

    /// Opens the pool described by the `database` config section.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::open(&config.path, config.pool_size)
    }

    /// The database file this pool connects to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Takes an idle connection, or opens a new one.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::PoolError`] if a new connection cannot be
    /// opened or the pool lock is poisoned.
    pub fn get(&self) -> Result<PooledConnection<'_>> {
        let reused = self
            .idle
            .lock()
            .map_err(|_| SqliteError::PoolError("pool lock poisoned".to_string()))?
            .pop();
        let conn = match reused {
            Some(conn) => conn,
            None => open_connection(&self.path)?,
        };
        Ok(PooledConnection {
            pool: self,
            conn: Some(conn),
        })
    }

    /// Number of connections currently waiting for reuse.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    fn release(&self, conn: Connection) {
        match self.idle.lock() {
            Ok(mut idle) if idle.len() < self.max_idle => idle.push(conn),
            Ok(_) => debug!("pool full, closing connection"),
            Err(_) => warn!("pool lock poisoned, closing connection"),
        }
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).map_err(|e| {
        SqliteError::PoolError(format!("cannot open {}: {e}", path.display()))
    })?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    debug!(path = %path.display(), "opened sqlite connection");
    Ok(conn)
}

impl ConnectionSource for SqlitePool {
    type Connection = Connection;
    type Guard<'a> = PooledConnection<'a>;

    fn acquire(&self, tag: &str) -> std::result::Result<PooledConnection<'_>, StoreError> {
        debug!(tag, "acquiring connection");
        self.get().map_err(|err| {
            warn!(tag, error = %err, "no connection available");
            StoreError::from(err)
        })
    }
}

/// A connection on loan from a [`SqlitePool`]. Dropping it gives the
/// connection back.
///
/// `conn` is `Some` until `drop` hands it back to the pool.
pub struct PooledConnection<'a> {
    pool: &'a SqlitePool,
    conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        match self.conn.as_ref() {
            Some(conn) => conn,
            None => unreachable!("pooled connection used after release"),
        }
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        match self.conn.as_mut() {
            Some(conn) => conn,
            None => unreachable!("pooled connection used after release"),
        }
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
