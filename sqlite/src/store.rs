//! Guild prefixes kept in SQLite.

use std::sync::Arc;

use command_manual_dispatch::{PrefixStore, StoreError, validate_guild_prefix};
use rusqlite::{OptionalExtension, params};
use tracing::debug;

use crate::error::{Result, SqliteError};
use crate::migration::PrefixMigration;
use crate::pool::SqlitePool;
use crate::schema::{prefixes_table, validate_prefix};

/// A [`PrefixStore`] over the `{prefix}prefixes` table.
///
/// Cloning is cheap: clones share the pool.
#[derive(Debug, Clone)]
pub struct SqlitePrefixStore {
    pool: Arc<SqlitePool>,
    table_prefix: String,
    table: String,
}

impl SqlitePrefixStore {
    /// Creates a store using tables named with `table_prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`] for an unusable table prefix.
    pub fn new(pool: Arc<SqlitePool>, table_prefix: impl Into<String>) -> Result<Self> {
        let table_prefix = table_prefix.into();
        validate_prefix(&table_prefix)?;
        let table = prefixes_table(&table_prefix);
        Ok(Self {
            pool,
            table_prefix,
            table,
        })
    }

    /// Creates the prefix table if it does not exist yet.
    pub fn migrate(&self) -> Result<()> {
        let mut conn = self.pool.get()?;
        let mut migration = PrefixMigration::new(&mut conn, self.table_prefix.as_str())?;
        migration.up()
    }

    /// Every stored `(guild, prefix)` pair, ordered by guild.
    pub fn list(&self) -> Result<Vec<(u64, String)>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT guild_id, prefix FROM {} ORDER BY guild_id",
            self.table
        ))?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get(1)?)))?;
        let mut prefixes = Vec::new();
        for row in rows {
            let (guild, prefix) = row?;
            prefixes.push((guild as u64, prefix));
        }
        Ok(prefixes)
    }

    fn lookup(&self, guild_id: u64) -> Result<Option<String>> {
        let guild = guild_key(guild_id)?;
        let conn = self.pool.get()?;
        let prefix = conn
            .query_row(
                &format!("SELECT prefix FROM {} WHERE guild_id = ?1", self.table),
                [guild],
                |row| row.get(0),
            )
            .optional()?;
        Ok(prefix)
    }

    fn store(&self, guild_id: u64, prefix: &str) -> Result<()> {
        let guild = guild_key(guild_id)?;
        let conn = self.pool.get()?;
        conn.execute(
            &format!(
                "INSERT INTO {} (guild_id, prefix) VALUES (?1, ?2)
                 ON CONFLICT(guild_id) DO UPDATE SET prefix = excluded.prefix, updated_at = datetime('now')",
                self.table
            ),
            params![guild, prefix],
        )?;
        debug!(guild_id, prefix, "stored guild prefix");
        Ok(())
    }

    fn remove(&self, guild_id: u64) -> Result<bool> {
        let guild = guild_key(guild_id)?;
        let conn = self.pool.get()?;
        let removed = conn.execute(
            &format!("DELETE FROM {} WHERE guild_id = ?1", self.table),
            [guild],
        )?;
        Ok(removed > 0)
    }
}

fn guild_key(guild_id: u64) -> Result<i64> {
    i64::try_from(guild_id).map_err(|_| SqliteError::GuildOutOfRange(guild_id))
}

impl PrefixStore for SqlitePrefixStore {
    fn get_prefix(&self, guild_id: u64) -> std::result::Result<Option<String>, StoreError> {
        Ok(self.lookup(guild_id)?)
    }

    fn set_prefix(&self, guild_id: u64, prefix: &str) -> std::result::Result<(), StoreError> {
        validate_guild_prefix(prefix)?;
        Ok(self.store(guild_id, prefix)?)
    }

    fn clear_prefix(&self, guild_id: u64) -> std::result::Result<bool, StoreError> {
        Ok(self.remove(guild_id)?)
    }
}
