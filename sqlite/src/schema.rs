//! SQL generation with customizable table prefixes.
//!
//! The bot keeps one table, `{prefix}prefixes`, mapping a guild ID to the
//! command prefix that guild chose. Prefixes must contain only
//! alphanumeric characters and underscores, so several bots can share one
//! database file.

use crate::error::{Result, SqliteError};

/// Validates that a table prefix contains only alphanumeric characters and underscores.
pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(SqliteError::InvalidPrefix(prefix.to_string()));
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SqliteError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// Name of the guild prefix table for a table prefix.
pub(crate) fn prefixes_table(prefix: &str) -> String {
    format!("{prefix}prefixes")
}

/// Generates the `CREATE` statements for every table with the given prefix.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] if the prefix is empty or
/// contains characters other than alphanumerics and underscores.
pub fn generate_schema_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;

    let sql = format!(
        r#"
CREATE TABLE IF NOT EXISTS {prefix}prefixes (
    guild_id INTEGER PRIMARY KEY,
    prefix TEXT NOT NULL CHECK (length(prefix) > 0),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#
    );
    Ok(sql)
}

/// Generates the `DROP` statements matching [`generate_schema_sql`].
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] for an unusable prefix.
pub fn generate_drop_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;
    Ok(format!("DROP TABLE IF EXISTS {prefix}prefixes;\n"))
}
