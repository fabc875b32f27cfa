//! Datastore collaborators.

use std::collections::HashMap;
use std::ops::DerefMut;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;

/// Hands out datastore connections for the duration of one handler call.
///
/// The guard returns its connection when dropped, so a connection is
/// released on every exit path of the handler, including unwinding.
pub trait ConnectionSource: Send + Sync + 'static {
    type Connection;
    type Guard<'a>: DerefMut<Target = Self::Connection>
    where
        Self: 'a;

    /// Acquires a connection. `tag` names the command using it, for logs.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when no connection can be opened.
    fn acquire(&self, tag: &str) -> Result<Self::Guard<'_>, StoreError>;
}

impl<S: ConnectionSource> ConnectionSource for Arc<S> {
    type Connection = S::Connection;
    type Guard<'a>
        = S::Guard<'a>
    where
        Self: 'a;

    fn acquire(&self, tag: &str) -> Result<Self::Guard<'_>, StoreError> {
        (**self).acquire(tag)
    }
}

/// Per-guild prefix overrides.
pub trait PrefixStore: Send + Sync {
    /// The guild's own prefix, if it set one.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the lookup fails.
    fn get_prefix(&self, guild_id: u64) -> Result<Option<String>, StoreError>;

    /// Replaces the guild's prefix.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPrefix`] for an empty or
    /// whitespace-containing prefix.
    fn set_prefix(&self, guild_id: u64, prefix: &str) -> Result<(), StoreError>;

    /// Removes the guild's prefix. Returns whether one was set.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the update fails.
    fn clear_prefix(&self, guild_id: u64) -> Result<bool, StoreError>;
}

/// Rejects prefixes the command matcher cannot use.
///
/// # Errors
///
/// Returns [`StoreError::InvalidPrefix`].
pub fn validate_guild_prefix(prefix: &str) -> Result<(), StoreError> {
    if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
        return Err(StoreError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// A [`PrefixStore`] held in memory, for tests and single-process bots.
#[derive(Debug, Default)]
pub struct MemoryPrefixStore {
    prefixes: Mutex<HashMap<u64, String>>,
}

impl MemoryPrefixStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<u64, String>>, StoreError> {
        self.prefixes
            .lock()
            .map_err(|_| StoreError::Unavailable("prefix map lock poisoned".to_string()))
    }
}

impl PrefixStore for MemoryPrefixStore {
    fn get_prefix(&self, guild_id: u64) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(&guild_id).cloned())
    }

    fn set_prefix(&self, guild_id: u64, prefix: &str) -> Result<(), StoreError> {
        validate_guild_prefix(prefix)?;
        self.lock()?.insert(guild_id, prefix.to_string());
        Ok(())
    }

    fn clear_prefix(&self, guild_id: u64) -> Result<bool, StoreError> {
        Ok(self.lock()?.remove(&guild_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryPrefixStore::new();
        assert_eq!(store.get_prefix(1).unwrap(), None);

        store.set_prefix(1, "!!").unwrap();
        assert_eq!(store.get_prefix(1).unwrap().as_deref(), Some("!!"));
        assert_eq!(store.get_prefix(2).unwrap(), None);

        assert!(store.clear_prefix(1).unwrap());
        assert!(!store.clear_prefix(1).unwrap());
    }

    #[test]
    fn test_unusable_prefixes_are_rejected() {
        let store = MemoryPrefixStore::new();
        assert!(matches!(
            store.set_prefix(1, "a b"),
            Err(StoreError::InvalidPrefix(_))
        ));
        assert!(store.set_prefix(1, "").is_err());
    }
}
