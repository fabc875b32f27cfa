//! SQLite storage for the command dispatcher.
//!
//! - **`pool`**: [`SqlitePool`], a [`ConnectionSource`](command_manual_dispatch::ConnectionSource)
//!   whose guards return their connection when dropped
//! - **`migration`**: creating and dropping the bot's tables
//! - **`store`**: [`SqlitePrefixStore`], per-guild prefixes
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use command_manual_dispatch::{Dispatcher, stock_commands};
//! use command_manual_sqlite::{SqlitePool, SqlitePrefixStore};
//!
//! let pool = Arc::new(SqlitePool::open("bot.db", 4).unwrap());
//! let prefixes = SqlitePrefixStore::new(Arc::clone(&pool), "bot_").unwrap();
//! prefixes.migrate().unwrap();
//!
//! let dispatcher = Dispatcher::builder(pool)
//!     .prefix_store(prefixes)
//!     .stock_commands(stock_commands())
//!     .build();
//! ```
//!
//! # Table prefix customization
//!
//! All table names are prefixed with a configurable string. Prefixes must
//! contain only ASCII alphanumeric characters and underscores.

mod error;
mod migration;
mod pool;
mod schema;
mod store;

pub use error::{Result, SqliteError};
pub use migration::{MigrationStatus, PrefixMigration};
pub use pool::{PooledConnection, SqlitePool};
pub use schema::{generate_drop_sql, generate_schema_sql};
pub use store::SqlitePrefixStore;
