//! Database connection management.
//!
//! The [`Database`] struct owns a single [`rusqlite::Connection`] behind a
//! mutex and guarantees that migrations are run before any other operation.
//! It is shared (`Arc<Database>`) by the four entity adapters.
//!
//! Every statement runs through [`Database::run`], which honours the
//! caller's [`Context`]: the context is checked before and after waiting for
//! the connection, and a SQLite progress handler interrupts a statement that
//! is still running when the deadline passes or the context is cancelled.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use rusqlite::Connection;
use simactive_shared::constants::DATABASE_FILE_NAME;
use simactive_shared::Context;

use crate::error::{Result, StoreError};
use crate::migrations;

/// Number of SQLite VM instructions between two context checks.
const PROGRESS_CHECK_OPS: i32 = 1_000;

/// Wrapper around a mutex-guarded [`rusqlite::Connection`].
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/simactive/simactive.db`
    /// - macOS:   `~/Library/Application Support/com.simactive.simactive/simactive.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\simactive\simactive\data\simactive.db`
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "simactive", "simactive").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Self::open_at(&data_dir.join(DATABASE_FILE_NAME))
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "opening database");

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database. Used by tests and tooling.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Run schema migrations.
        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` against the connection on behalf of `ctx`.
    pub fn run<T, F>(&self, ctx: &Context, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        ctx.check()?;
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        // waiting for the lock may have used up the deadline
        ctx.check()?;

        let watched = ctx.clone();
        conn.progress_handler(PROGRESS_CHECK_OPS, Some(move || watched.is_done()));
        let result = f(&conn);
        conn.progress_handler(0, None::<fn() -> bool>);

        result.map_err(|e| match ctx.check() {
            Err(aborted) => StoreError::Context(aborted),
            Ok(()) => StoreError::Sqlite(e),
        })
    }
}
