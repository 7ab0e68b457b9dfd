use async_trait::async_trait;
use lotsearch_core::{CatalogItem, LotsearchError, LotsearchResult, ScoredItem};
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::Mutex;

/// Trait for the catalog document store.
///
/// The search core reads the catalog through exactly two operations:
/// ranked full-text search and bulk id lookup. Nothing here mutates the
/// catalog; loaders write through their own channel.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Items matching `query`, ranked by the store's native text relevance,
    /// descending. Returns exactly the declared projection (id, title,
    /// description, the two price fields, score) — never undeclared fields.
    /// Relevance ties keep the backend's own order.
    async fn text_search(&self, query: &str, limit: usize) -> LotsearchResult<Vec<ScoredItem>>;

    /// Bulk lookup by id. Identifiers with no corresponding document are
    /// simply absent from the result; the output order is unspecified.
    async fn get_many(&self, ids: &[String]) -> LotsearchResult<Vec<CatalogItem>>;
}

/// SQLite-backed document store with an FTS5 full-text index over item
/// titles and descriptions.
///
/// The connection is serialized behind an async mutex; each call holds it
/// only for the duration of its statement.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS items (
    id            TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    description   TEXT NOT NULL,
    start_price   REAL NOT NULL,
    reserve_price REAL NOT NULL
);
CREATE VIRTUAL TABLE IF NOT EXISTS items_fts USING fts5(id UNINDEXED, title, description);
";

impl SqliteDocumentStore {
    /// Open (or create) the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> LotsearchResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(store_err)?;
        conn.execute_batch(SCHEMA).map_err(store_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory store, used by tests and throwaway setups.
    pub fn open_in_memory() -> LotsearchResult<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        conn.execute_batch(SCHEMA).map_err(store_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert or replace a catalog item, keeping the FTS index in step.
    /// This is the loader/test entry point; the search paths never write.
    pub async fn insert_item(&self, item: &CatalogItem) -> LotsearchResult<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM items_fts WHERE id = ?1", [&item.id])
            .map_err(store_err)?;
        conn.execute(
            "INSERT OR REPLACE INTO items (id, title, description, start_price, reserve_price)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                item.id,
                item.title,
                item.description,
                item.start_price,
                item.reserve_price
            ],
        )
        .map_err(store_err)?;
        conn.execute(
            "INSERT INTO items_fts (id, title, description) VALUES (?1, ?2, ?3)",
            rusqlite::params![item.id, item.title, item.description],
        )
        .map_err(store_err)?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn text_search(&self, query: &str, limit: usize) -> LotsearchResult<Vec<ScoredItem>> {
        // A query that sanitizes down to no terms cannot match anything.
        let Some(match_expr) = fts_match_query(query) else {
            return Ok(Vec::new());
        };

        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT items.id, items.title, items.description,
                        items.start_price, items.reserve_price,
                        -bm25(items_fts) AS score
                 FROM items_fts
                 JOIN items ON items.id = items_fts.id
                 WHERE items_fts MATCH ?1
                 ORDER BY score DESC
                 LIMIT ?2",
            )
            .map_err(store_err)?;

        let rows = stmt
            .query_map(rusqlite::params![match_expr, limit as i64], |row| {
                Ok(ScoredItem {
                    item: CatalogItem {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        description: row.get(2)?,
                        start_price: row.get(3)?,
                        reserve_price: row.get(4)?,
                    },
                    score: row.get::<_, f64>(5)? as f32,
                })
            })
            .map_err(store_err)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(store_err)
    }

    async fn get_many(&self, ids: &[String]) -> LotsearchResult<Vec<CatalogItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, title, description, start_price, reserve_price
             FROM items WHERE id IN ({placeholders})"
        );

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql).map_err(store_err)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(ids), |row| {
                Ok(CatalogItem {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    start_price: row.get(3)?,
                    reserve_price: row.get(4)?,
                })
            })
            .map_err(store_err)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(store_err)
    }
}

/// Build an FTS5 MATCH expression from free-form query text.
///
/// Each term is double-quoted so user punctuation cannot act as FTS5
/// operator syntax, and terms are OR-joined to match the relevance-ranked
/// any-term semantics of document-store text search. Returns `None` when
/// the text contains no indexable terms.
fn fts_match_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{t}\""))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

fn store_err(e: rusqlite::Error) -> LotsearchError {
    LotsearchError::Store(e.to_string())
}
