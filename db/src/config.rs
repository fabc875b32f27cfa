//! Bot configuration.
//!
//! Defines the YAML-serializable configuration shared by the dispatcher,
//! the SQLite store, and the `manual-tool` binary.
//!
//! # Example YAML
//!
//! ```yaml
//! global_prefix: "%"
//! bot_name: Dyno
//! maintainer_tag: "@maintainer"
//! manuals:
//!   - manuals/
//! debug:
//!   - syntax
//!   - dispatch
//! database:
//!   path: bot.db
//!   table_prefix: bot_
//!   pool_size: 4
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogueError, Result};

/// Areas whose debug logging can be switched on from the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugCategory {
    /// Template expansion and call matching.
    Syntax,
    /// Catalogue loading and manual review.
    Catalogue,
    /// Message dispatch and handler timing.
    Dispatch,
    /// Connection pool and prefix storage.
    Database,
}

impl DebugCategory {
    /// The tracing target (crate name) the category covers.
    pub fn target(self) -> &'static str {
        match self {
            Self::Syntax => "command_manual_syntax",
            Self::Catalogue => "command_manual_db",
            Self::Dispatch => "command_manual_dispatch",
            Self::Database => "command_manual_sqlite",
        }
    }
}

/// Settings for the SQLite datastore.
///
/// # Examples
///
/// ```
/// # use command_manual_db::DatabaseConfig;
/// let db = DatabaseConfig::default();
/// assert_eq!(db.table_prefix, "bot_");
/// assert_eq!(db.pool_size, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: PathBuf,
    /// Prefix for every table the bot creates.
    pub table_prefix: String,
    /// Maximum number of idle connections kept open.
    pub pool_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("bot.db"),
            table_prefix: "bot_".to_string(),
            pool_size: 4,
        }
    }
}

/// Top-level bot configuration.
///
/// Every field has a default, so an empty file is a valid configuration.
///
/// # Examples
///
/// ```no_run
/// use command_manual_db::BotConfig;
///
/// let config = BotConfig::load("bot.yml").unwrap();
/// config.validate().unwrap();
/// println!("prefix: {}", config.global_prefix);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Prefix used in guilds that have not set their own.
    pub global_prefix: String,
    /// Name shown in the manual document header.
    pub bot_name: String,
    /// Who to contact about bot problems, mentioned in error replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainer_tag: Option<String>,
    /// Declaration directories or files, tried in order.
    pub manuals: Vec<PathBuf>,
    /// Categories logged at debug level.
    pub debug: Vec<DebugCategory>,
    pub database: DatabaseConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            global_prefix: "%".to_string(),
            bot_name: "Bot".to_string(),
            maintainer_tag: None,
            manuals: Vec::new(),
            debug: Vec::new(),
            database: DatabaseConfig::default(),
        }
    }
}

impl BotConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::CatalogueError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::CatalogueError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::CatalogueError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::CatalogueError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Checks values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfig`](crate::CatalogueError::InvalidConfig) for an
    /// empty or whitespace-containing prefix, or a pool size of zero.
    pub fn validate(&self) -> Result<()> {
        if self.global_prefix.is_empty() {
            return Err(CatalogueError::InvalidConfig(
                "global_prefix cannot be empty".to_string(),
            ));
        }
        if self.global_prefix.chars().any(char::is_whitespace) {
            return Err(CatalogueError::InvalidConfig(format!(
                "global_prefix '{}' cannot contain whitespace",
                self.global_prefix
            )));
        }
        if self.database.pool_size == 0 {
            return Err(CatalogueError::InvalidConfig(
                "database.pool_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Tracing filter directives: `warn` plus one `target=debug` per enabled
    /// debug category.
    ///
    /// ```
    /// # use command_manual_db::{BotConfig, DebugCategory};
    /// let config = BotConfig {
    ///     debug: vec![DebugCategory::Syntax],
    ///     ..BotConfig::default()
    /// };
    /// assert_eq!(config.log_directives(), "warn,command_manual_syntax=debug");
    /// ```
    pub fn log_directives(&self) -> String {
        let mut directives = vec!["warn".to_string()];
        for category in &self.debug {
            let directive = format!("{}=debug", category.target());
            if !directives.contains(&directive) {
                directives.push(directive);
            }
        }
        directives.join(",")
    }
}
