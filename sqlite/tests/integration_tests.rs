//! Integration tests for the command-manual-sqlite crate.

use std::cell::RefCell;
use std::sync::Arc;

use command_manual_core::{CommandArgument, SubcommandManual};
use command_manual_dispatch::{
    BotCommand, CommandOutcome, DispatchError, Dispatcher, Interaction, PrefixStore, StoreError, stock_commands,
};
use command_manual_sqlite::{PrefixMigration, SqlitePool, SqlitePrefixStore};
use tempfile::TempDir;

fn setup() -> (TempDir, Arc<SqlitePool>, SqlitePrefixStore) {
    let dir = TempDir::new().unwrap();
    let pool = Arc::new(SqlitePool::open(dir.path().join("bot.db"), 2).unwrap());
    let store = SqlitePrefixStore::new(Arc::clone(&pool), "bot_").unwrap();
    store.migrate().unwrap();
    (dir, pool, store)
}

struct Message {
    content: String,
    admin: bool,
    replies: RefCell<Vec<String>>,
}

impl Message {
    fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            admin: false,
            replies: RefCell::new(Vec::new()),
        }
    }

    fn admin(mut self) -> Self {
        self.admin = true;
        self
    }

    fn replies(&self) -> Vec<String> {
        self.replies.borrow().clone()
    }
}

impl Interaction for Message {
    fn author_id(&self) -> u64 {
        10
    }

    fn guild_id(&self) -> Option<u64> {
        Some(864326626111913995)
    }

    fn is_guild_admin(&self) -> bool {
        self.admin
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn reply(&self, text: &str) -> command_manual_dispatch::Result<()> {
        self.replies.borrow_mut().push(text.to_string());
        Ok(())
    }

    fn give_check(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Prefix store
// ---------------------------------------------------------------------------

#[test]
fn test_prefix_store_lifecycle() {
    let (_dir, _pool, store) = setup();

    assert_eq!(store.get_prefix(1).unwrap(), None);
    store.set_prefix(1, "!!").unwrap();
    store.set_prefix(2, "?").unwrap();
    assert_eq!(store.get_prefix(1).unwrap().as_deref(), Some("!!"));

    store.set_prefix(1, "$").unwrap();
    assert_eq!(store.get_prefix(1).unwrap().as_deref(), Some("$"));
    assert_eq!(
        store.list().unwrap(),
        vec![(1, "$".to_string()), (2, "?".to_string())]
    );

    assert!(store.clear_prefix(1).unwrap());
    assert!(!store.clear_prefix(1).unwrap());
    assert_eq!(store.get_prefix(1).unwrap(), None);
}

#[test]
fn test_prefix_store_rejects_unusable_prefixes() {
    let (_dir, _pool, store) = setup();
    assert!(matches!(
        store.set_prefix(1, "two words"),
        Err(StoreError::InvalidPrefix(_))
    ));
    assert!(matches!(store.set_prefix(1, ""), Err(StoreError::InvalidPrefix(_))));
}

#[test]
fn test_guild_ids_beyond_sqlite_range() {
    let (_dir, _pool, store) = setup();
    assert!(matches!(
        store.set_prefix(u64::MAX, "!"),
        Err(StoreError::Query(_))
    ));
}

#[test]
fn test_unmigrated_store_reports_query_errors() {
    let dir = TempDir::new().unwrap();
    let pool = Arc::new(SqlitePool::open(dir.path().join("bot.db"), 1).unwrap());
    let store = SqlitePrefixStore::new(pool, "bot_").unwrap();
    assert!(matches!(store.get_prefix(1), Err(StoreError::Query(_))));
}

#[test]
fn test_invalid_table_prefix() {
    let dir = TempDir::new().unwrap();
    let pool = Arc::new(SqlitePool::open(dir.path().join("bot.db"), 1).unwrap());
    assert!(SqlitePrefixStore::new(pool, "bot-").is_err());
}

#[test]
fn test_prefixes_survive_reopening() {
    let (dir, pool, store) = setup();
    store.set_prefix(7, "&").unwrap();
    drop(store);
    drop(pool);

    let pool = Arc::new(SqlitePool::open(dir.path().join("bot.db"), 1).unwrap());
    let store = SqlitePrefixStore::new(Arc::clone(&pool), "bot_").unwrap();
    assert_eq!(store.get_prefix(7).unwrap().as_deref(), Some("&"));

    let mut conn = pool.get().unwrap();
    let migration = PrefixMigration::new(&mut conn, "bot_").unwrap();
    assert_eq!(migration.status().unwrap().prefix_count, 1);
}

// ---------------------------------------------------------------------------
// Dispatcher over SQLite
// ---------------------------------------------------------------------------

fn sql_failure(err: rusqlite::Error) -> DispatchError {
    DispatchError::Handler(err.to_string())
}

fn sqlite_dispatcher(pool: Arc<SqlitePool>, store: SqlitePrefixStore) -> Dispatcher<Arc<SqlitePool>> {
    let tally = SubcommandManual::new("tally", "::<prefix>tally:: $1", "Counts a word.")
        .with_argument(CommandArgument::required("word", "word"));

    Dispatcher::builder(pool)
        .prefix_store(store)
        .stock_commands(stock_commands())
        .stock(BotCommand::<Arc<SqlitePool>>::simple(tally, |invocation| {
            let word = invocation.arguments.text("word").unwrap_or_default().to_string();
            let conn = &mut *invocation.connection;
            conn.execute_batch("CREATE TABLE IF NOT EXISTS tally (word TEXT NOT NULL)")
                .map_err(sql_failure)?;
            conn.execute("INSERT INTO tally (word) VALUES (?1)", [&word])
                .map_err(sql_failure)?;
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM tally WHERE word = ?1", [&word], |row| row.get(0))
                .map_err(sql_failure)?;
            invocation.reply(&format!("{word} x{count}"))?;
            Ok(CommandOutcome::Succeeded)
        }))
        .build()
}

#[test]
fn test_handler_uses_pooled_connection() {
    let (_dir, pool, store) = setup();
    let dispatcher = sqlite_dispatcher(Arc::clone(&pool), store);

    let first = Message::new("%tally moon");
    assert!(dispatcher.process_message(&first).command_worked());
    let second = Message::new("%tally moon");
    assert!(dispatcher.process_message(&second).command_worked());

    assert_eq!(second.replies(), ["%tally: moon x2"]);
    assert_eq!(pool.idle_count(), 1);
}

#[test]
fn test_guild_prefix_change_through_stock_command() {
    let (_dir, pool, store) = setup();
    let dispatcher = sqlite_dispatcher(pool, store.clone());

    let set = Message::new("%prefix set NEW !!").admin();
    assert!(dispatcher.process_message(&set).command_worked());
    assert_eq!(
        store.get_prefix(864326626111913995).unwrap().as_deref(),
        Some("!!")
    );

    let old = Message::new("%tally sun");
    assert!(!dispatcher.process_message(&old).did_find_command);

    let new = Message::new("!!tally sun");
    assert!(dispatcher.process_message(&new).command_worked());
    assert_eq!(new.replies(), ["!!tally: sun x1"]);

    let reset = Message::new("!!prefix reset").admin();
    assert!(dispatcher.process_message(&reset).command_worked());
    assert_eq!(store.get_prefix(864326626111913995).unwrap(), None);
}
