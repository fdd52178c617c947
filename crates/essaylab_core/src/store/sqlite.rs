//! SQLite-backed key-value store client.
//!
//! # Responsibility
//! - Materialize the `(owner, id)` keyed essay table family on SQLite.
//! - Decode rows into typed [`Essay`] records with named columns.
//!
//! # Invariants
//! - One process-wide connection handle, serialized through a mutex.
//! - Missing-table failures surface as [`StoreError::TableNotFound`].
//! - `put_item_new` surfaces key collisions as [`StoreError::ConditionFailed`].

use super::{
    KeySchema, KeyValueStore, ScanOrder, StoreError, StoreResult, TableDescription, TableStatus,
    PARTITION_ATTR, SORT_ATTR,
};
use crate::model::essay::{Essay, EssayId};
use log::{error, info};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const ACTIVE_POLL_INTERVAL: Duration = Duration::from_millis(50);

const ESSAY_COLUMNS: &str = "owner,
    id,
    updated_at,
    deleted_at,
    title,
    original_content,
    polished_content,
    parent_id";

/// Process-wide SQLite store handle.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens a file-backed store and configures the connection.
    ///
    /// # Side effects
    /// - Emits `store_open` logging events with status.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        info!("event=store_open module=store status=start mode=file");
        let conn = match Connection::open(path) {
            Ok(conn) => conn,
            Err(err) => {
                error!("event=store_open module=store status=error mode=file error={err}");
                return Err(err.into());
            }
        };
        Self::from_connection(conn)
    }

    /// Opens an in-memory store. Used by tests and the smoke binary.
    pub fn open_in_memory() -> StoreResult<Self> {
        info!("event=store_open module=store status=start mode=memory");
        let conn = match Connection::open_in_memory() {
            Ok(conn) => conn,
            Err(err) => {
                error!("event=store_open module=store status=error mode=memory error={err}");
                return Err(err.into());
            }
        };
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        info!("event=store_open module=store status=ok");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock only means another thread panicked mid-operation;
        // the connection itself stays usable.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for SqliteStore {
    fn get_item(&self, table: &str, owner: &str, id: EssayId) -> StoreResult<Option<Essay>> {
        let quoted = quote_table(table)?;
        let conn = self.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ESSAY_COLUMNS} FROM {quoted} WHERE owner = ?1 AND id = ?2;"
            ))
            .map_err(|err| classify(table, err))?;

        let mut rows = stmt
            .query(params![owner, id])
            .map_err(|err| classify(table, err))?;
        if let Some(row) = rows.next().map_err(|err| classify(table, err))? {
            return Ok(Some(parse_essay_row(row)?));
        }
        Ok(None)
    }

    fn query(
        &self,
        table: &str,
        owner: &str,
        limit: Option<u32>,
        order: ScanOrder,
    ) -> StoreResult<Vec<Essay>> {
        let quoted = quote_table(table)?;
        let direction = match order {
            ScanOrder::Ascending => "ASC",
            ScanOrder::Descending => "DESC",
        };
        let mut sql = format!(
            "SELECT {ESSAY_COLUMNS} FROM {quoted} WHERE owner = ?1 ORDER BY id {direction}"
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql.push(';');

        let conn = self.lock();
        let mut stmt = conn.prepare(&sql).map_err(|err| classify(table, err))?;
        let mut rows = stmt.query([owner]).map_err(|err| classify(table, err))?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().map_err(|err| classify(table, err))? {
            items.push(parse_essay_row(row)?);
        }
        Ok(items)
    }

    fn put_item(&self, table: &str, item: &Essay) -> StoreResult<()> {
        let quoted = quote_table(table)?;
        let conn = self.lock();
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {quoted} ({ESSAY_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);"
            ),
            params![
                item.owner,
                item.id,
                item.updated_at,
                item.deleted_at,
                item.title,
                item.original_content,
                item.polished_content,
                item.parent_id,
            ],
        )
        .map_err(|err| classify(table, err))?;
        Ok(())
    }

    fn put_item_new(&self, table: &str, item: &Essay) -> StoreResult<()> {
        let quoted = quote_table(table)?;
        let conn = self.lock();
        let result = conn.execute(
            &format!(
                "INSERT INTO {quoted} ({ESSAY_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);"
            ),
            params![
                item.owner,
                item.id,
                item.updated_at,
                item.deleted_at,
                item.title,
                item.original_content,
                item.polished_content,
                item.parent_id,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(err) if is_key_conflict(&err) => Err(StoreError::ConditionFailed {
                owner: item.owner.clone(),
                id: item.id,
            }),
            Err(err) => Err(classify(table, err)),
        }
    }

    fn create_table(&self, table: &str, schema: &KeySchema) -> StoreResult<()> {
        if schema.partition_key != PARTITION_ATTR || schema.sort_key != SORT_ATTR {
            return Err(StoreError::UnsupportedKeySchema(format!(
                "this store materializes keys ({PARTITION_ATTR}, {SORT_ATTR}), \
                 got ({}, {})",
                schema.partition_key, schema.sort_key
            )));
        }

        let quoted = quote_table(table)?;
        let conn = self.lock();
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {quoted} (
                owner TEXT NOT NULL,
                id INTEGER NOT NULL,
                updated_at TEXT NOT NULL DEFAULT '',
                deleted_at TEXT NOT NULL DEFAULT '',
                title TEXT NOT NULL DEFAULT '',
                original_content TEXT NOT NULL DEFAULT '',
                polished_content TEXT NOT NULL DEFAULT '',
                parent_id INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (owner, id)
            );"
        ))?;
        Ok(())
    }

    fn delete_table(&self, table: &str) -> StoreResult<()> {
        let quoted = quote_table(table)?;
        let conn = self.lock();
        conn.execute_batch(&format!("DROP TABLE {quoted};"))
            .map_err(|err| classify(table, err))?;
        Ok(())
    }

    fn describe_table(&self, table: &str) -> StoreResult<Option<TableDescription>> {
        quote_table(table)?;
        let conn = self.lock();
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;

        if exists == 1 {
            Ok(Some(TableDescription {
                name: table.to_string(),
                status: TableStatus::Active,
            }))
        } else {
            Ok(None)
        }
    }

    fn wait_until_active(&self, table: &str, ceiling: Duration) -> StoreResult<()> {
        let deadline = Instant::now() + ceiling;
        loop {
            if self.describe_table(table)?.is_some() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(StoreError::Timeout {
                    table: table.to_string(),
                    waited: ceiling,
                });
            }
            std::thread::sleep(ACTIVE_POLL_INTERVAL.min(ceiling));
        }
    }
}

fn parse_essay_row(row: &Row<'_>) -> StoreResult<Essay> {
    Ok(Essay {
        owner: row.get("owner")?,
        id: row.get("id")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
        title: row.get("title")?,
        original_content: row.get("original_content")?,
        polished_content: row.get("polished_content")?,
        parent_id: row.get("parent_id")?,
    })
}

/// Validates and quotes a table identifier for safe SQL interpolation.
fn quote_table(table: &str) -> StoreResult<String> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(StoreError::InvalidTableName(table.to_string()));
    }
    Ok(format!("\"{table}\""))
}

fn is_missing_table(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(_, Some(message)) if message.contains("no such table")
    )
}

fn is_key_conflict(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _) if code.code == ErrorCode::ConstraintViolation
    )
}

fn classify(table: &str, err: rusqlite::Error) -> StoreError {
    if is_missing_table(&err) {
        StoreError::TableNotFound(table.to_string())
    } else {
        StoreError::Sqlite(err)
    }
}
