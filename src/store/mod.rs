//! SQLite-backed context storage with an FTS5 index over `content`.
//!
//! The index is an external-content FTS5 table fed by an `AFTER INSERT`
//! trigger, so a row is searchable as soon as its insert commits. Records are
//! append-only: there is no update or delete path.

pub mod model;
pub mod tags;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

pub use model::{ContextItem, SearchQuery, SearchResult, DEFAULT_IMPORTANCE};
pub use tags::TagCodecError;

/// Fallback when a caller hands the store a zero `top_k`.
const DEFAULT_TOP_K: usize = 5;

const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA temp_store = MEMORY;
";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS context_items (
    id          TEXT PRIMARY KEY,
    created_at  INTEGER NOT NULL,
    source      TEXT,
    thread_id   TEXT,
    role        TEXT,
    title       TEXT,
    content     TEXT NOT NULL CHECK (length(content) > 0),
    tags        TEXT,
    importance  INTEGER NOT NULL DEFAULT 3
);

CREATE INDEX IF NOT EXISTS idx_context_items_thread ON context_items(thread_id);
CREATE INDEX IF NOT EXISTS idx_context_items_importance ON context_items(importance);

CREATE VIRTUAL TABLE IF NOT EXISTS context_items_fts USING fts5(
    content,
    content='context_items',
    content_rowid='rowid'
);

CREATE TRIGGER IF NOT EXISTS context_items_ai AFTER INSERT ON context_items BEGIN
    INSERT INTO context_items_fts(rowid, content) VALUES (new.rowid, new.content);
END;
";

const SELECT_ITEM: &str = "
SELECT id, created_at, source, thread_id, role, title, content, tags, importance
FROM context_items WHERE id = ?1
";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("context item not found")]
    NotFound,
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Tags(#[from] TagCodecError),
    #[error("create database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("store connection poisoned")]
    Poisoned,
}

/// Durable record set plus its full-text index.
///
/// Holds exactly one connection: SQLite allows a single writer, and callers
/// serialize through the mutex.
pub struct ContextStore {
    conn: Mutex<Connection>,
}

impl ContextStore {
    /// Open (creating if absent) the database at `path` and ensure the schema.
    ///
    /// Safe to call repeatedly against the same file; existing rows are kept.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened context database");
        Self::init(conn)
    }

    /// Private in-memory database. WAL does not apply; everything else does.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(PRAGMAS)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Write one new record. The FTS row is written by trigger in the same
    /// statement, so both land or neither does.
    pub fn insert(&self, item: &ContextItem) -> Result<(), StoreError> {
        let tags = tags::encode(item.tags.as_deref());
        self.conn()?.execute(
            "INSERT INTO context_items (
                id, created_at, source, thread_id, role, title, content, tags, importance
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                item.id,
                item.created_at,
                item.source,
                item.thread_id,
                item.role,
                item.title,
                item.content,
                tags,
                item.importance,
            ],
        )?;
        debug!(id = %item.id, "inserted context item");
        Ok(())
    }

    /// Fetch one record by id, or [`StoreError::NotFound`].
    pub fn get(&self, id: &str) -> Result<ContextItem, StoreError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(SELECT_ITEM, params![id], read_item_row)
            .optional()?;
        let (mut item, raw_tags) = row.ok_or(StoreError::NotFound)?;
        item.tags = tags::decode(raw_tags.as_deref())?;
        Ok(item)
    }

    /// Ranked full-text search over `content`, best match first.
    ///
    /// Returns at most `top_k` hits with `importance >= min_importance`,
    /// restricted to `thread_id` when given. Invalid FTS5 syntax in `query`
    /// surfaces as [`StoreError::Sqlite`].
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, StoreError> {
        let top_k = if query.top_k == 0 { DEFAULT_TOP_K } else { query.top_k };

        let mut sql = String::from(
            "SELECT ci.id, ci.title, ci.source, ci.thread_id, ci.created_at, ci.importance,
                    snippet(context_items_fts, 0, '', '', '...', 10) AS snippet
             FROM context_items_fts
             JOIN context_items ci ON ci.rowid = context_items_fts.rowid
             WHERE context_items_fts MATCH ?1 AND ci.importance >= ?2",
        );
        let mut bind: Vec<Box<dyn rusqlite::ToSql>> =
            vec![Box::new(query.query.clone()), Box::new(query.min_importance)];

        if let Some(thread_id) = &query.thread_id {
            bind.push(Box::new(thread_id.clone()));
            sql.push_str(&format!(" AND ci.thread_id = ?{}", bind.len()));
        }

        bind.push(Box::new(top_k as i64));
        sql.push_str(&format!(
            " ORDER BY bm25(context_items_fts) LIMIT ?{}",
            bind.len()
        ));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let bind_refs: Vec<&dyn rusqlite::ToSql> = bind.iter().map(|b| b.as_ref()).collect();

        let rows = stmt.query_map(bind_refs.as_slice(), |row| {
            Ok(SearchResult {
                id: row.get(0)?,
                title: row.get(1)?,
                source: row.get(2)?,
                thread_id: row.get(3)?,
                created_at: row.get(4)?,
                importance: row.get(5)?,
                snippet: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            })
        })?;

        let results = rows.collect::<Result<Vec<_>, _>>()?;
        debug!(hits = results.len(), "search complete");
        Ok(results)
    }
}

/// Row -> item with tags still in persisted form; decoding happens outside
/// the rusqlite closure so codec failures keep their own error type.
fn read_item_row(row: &Row<'_>) -> rusqlite::Result<(ContextItem, Option<String>)> {
    Ok((
        ContextItem {
            id: row.get(0)?,
            created_at: row.get(1)?,
            source: row.get(2)?,
            thread_id: row.get(3)?,
            role: row.get(4)?,
            title: row.get(5)?,
            content: row.get(6)?,
            tags: None,
            importance: row.get(8)?,
        },
        row.get(7)?,
    ))
}
