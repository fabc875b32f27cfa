//! Manual catalogue loading and bot configuration.
//!
//! This crate turns declaration files into the immutable set of manuals a
//! bot serves, and loads the bot's YAML configuration.
//!
//! # Quick start
//!
//! ```no_run
//! use command_manual_db::{BotConfig, ManualCatalogue};
//!
//! let config = BotConfig::load("bot.yml").unwrap();
//! config.validate().unwrap();
//!
//! let mut builder = ManualCatalogue::builder();
//! for source in &config.manuals {
//!     builder = if source.is_dir() {
//!         builder.from_dir(source)
//!     } else {
//!         builder.from_file(source)
//!     };
//! }
//! let catalogue = builder.build().unwrap();
//! println!("{} commands, {} rejected", catalogue.len(), catalogue.rejected().len());
//! ```

mod catalogue;
mod config;
mod error;

pub use catalogue::{
    CatalogueBuilder, CatalogueEntry, CatalogueSource, ManualCatalogue, Rejection,
    manual_problems, review_declaration,
};
pub use config::{BotConfig, DatabaseConfig, DebugCategory};
pub use error::{CatalogueError, Result};
