//! Migration lifecycle operations for the prefix table.
//!
//! # Example
//!
//! ```no_run
//! use command_manual_sqlite::PrefixMigration;
//! use rusqlite::Connection;
//!
//! let mut conn = Connection::open("bot.db").unwrap();
//! let mut migration = PrefixMigration::new(&mut conn, "bot_").unwrap();
//!
//! migration.up().unwrap();
//! let status = migration.status().unwrap();
//! println!("{} guilds have a local prefix", status.prefix_count);
//! ```

use rusqlite::Connection;
use tracing::info;

use crate::error::{Result, SqliteError};
use crate::schema::{generate_drop_sql, generate_schema_sql, prefixes_table, validate_prefix};

/// Creates and drops the tables the bot stores guild data in.
///
/// Mutations run inside a transaction, so a failed migration leaves the
/// database as it was.
pub struct PrefixMigration<'c> {
    conn: &'c mut Connection,
    prefix: String,
}

impl<'c> PrefixMigration<'c> {
    /// Creates a migration manager for the given connection and table prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`] if the prefix contains invalid characters.
    pub fn new(conn: &'c mut Connection, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self { conn, prefix })
    }

    /// Creates the tables. Safe to call on an already migrated database.
    pub fn up(&mut self) -> Result<()> {
        let sql = generate_schema_sql(&self.prefix)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| SqliteError::MigrationError(format!("failed to create tables: {e}")))?;
        tx.commit()?;
        info!(prefix = %self.prefix, "prefix tables ready");
        Ok(())
    }

    /// Drops the tables, discarding every stored prefix.
    pub fn down(&mut self) -> Result<()> {
        let sql = generate_drop_sql(&self.prefix)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| SqliteError::MigrationError(format!("failed to drop tables: {e}")))?;
        tx.commit()?;
        info!(prefix = %self.prefix, "prefix tables dropped");
        Ok(())
    }

    /// Reports whether the tables exist and how many prefixes they hold.
    pub fn status(&self) -> Result<MigrationStatus> {
        let table = prefixes_table(&self.prefix);
        let exists: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [&table],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Ok(MigrationStatus {
                tables_exist: false,
                prefix_count: 0,
            });
        }

        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(MigrationStatus {
            tables_exist: true,
            prefix_count: usize::try_from(count).unwrap_or_default(),
        })
    }
}

/// Snapshot returned by [`PrefixMigration::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub tables_exist: bool,
    /// Guilds with a stored prefix.
    pub prefix_count: usize,
}
