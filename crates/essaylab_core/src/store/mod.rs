//! Key-value store capability consumed by repositories.
//!
//! # Responsibility
//! - Define typed CRUD and table-administration contracts over a partitioned
//!   `(owner: string, id: integer)` key-value table.
//! - Distinguish "table missing" and "key already occupied" from transport
//!   failures so callers can self-heal or retry allocation.
//!
//! # Invariants
//! - `put_item` is a full-record overwrite; writes are atomic per item.
//! - `put_item_new` never overwrites an existing `(owner, id)`.
//! - Implementations are safe for concurrent use through a shared handle.

use crate::model::essay::{Essay, EssayId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub mod lifecycle;
pub mod sqlite;

pub use lifecycle::TableLifecycle;
pub use sqlite::SqliteStore;

/// Partition-key attribute name materialized by store implementations.
pub const PARTITION_ATTR: &str = "owner";
/// Sort-key attribute name materialized by store implementations.
pub const SORT_ATTR: &str = "id";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error taxonomy.
#[derive(Debug)]
pub enum StoreError {
    /// The backing table does not exist. Callers may provision and retry.
    TableNotFound(String),
    /// A conditional put hit an existing `(owner, id)` key.
    ConditionFailed { owner: String, id: EssayId },
    /// The requested key schema cannot be materialized by this store.
    UnsupportedKeySchema(String),
    /// Table name fails identifier rules for this store.
    InvalidTableName(String),
    /// A bounded wait elapsed before the table became active.
    Timeout { table: String, waited: Duration },
    /// Underlying SQLite transport/constraint failure.
    Sqlite(rusqlite::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TableNotFound(table) => write!(f, "table not found: {table}"),
            Self::ConditionFailed { owner, id } => {
                write!(f, "item already exists for owner `{owner}` id {id}")
            }
            Self::UnsupportedKeySchema(details) => {
                write!(f, "unsupported key schema: {details}")
            }
            Self::InvalidTableName(name) => write!(f, "invalid table name: `{name}`"),
            Self::Timeout { table, waited } => write!(
                f,
                "table `{table}` did not become active within {}ms",
                waited.as_millis()
            ),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

/// Key schema requested for a table: partition attribute (string-typed) and
/// sort attribute (integer-typed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    pub partition_key: String,
    pub sort_key: String,
}

impl Default for KeySchema {
    fn default() -> Self {
        Self {
            partition_key: PARTITION_ATTR.to_string(),
            sort_key: SORT_ATTR.to_string(),
        }
    }
}

/// Table activation state reported by `describe_table`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
}

/// Administrative view of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    pub name: String,
    pub status: TableStatus,
}

/// Scan direction for partition queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    /// Smallest sort key first.
    Ascending,
    /// Greatest sort key first. Used for newest-first listings and for
    /// observing the current per-partition maximum id.
    Descending,
}

/// Typed store capability over one essay table family.
///
/// The handle is process-wide: constructed once at startup and shared by
/// reference with every repository instance.
pub trait KeyValueStore: Send + Sync {
    /// Point lookup by full primary key.
    fn get_item(&self, table: &str, owner: &str, id: EssayId) -> StoreResult<Option<Essay>>;

    /// Partition query ordered by sort key. `limit` bounds the result count.
    fn query(
        &self,
        table: &str,
        owner: &str,
        limit: Option<u32>,
        order: ScanOrder,
    ) -> StoreResult<Vec<Essay>>;

    /// Unconditional full-record write. Last writer wins.
    fn put_item(&self, table: &str, item: &Essay) -> StoreResult<()>;

    /// Conditional write that fails with [`StoreError::ConditionFailed`] when
    /// the `(owner, id)` key is already occupied.
    fn put_item_new(&self, table: &str, item: &Essay) -> StoreResult<()>;

    /// Creates the table with the given key schema. Succeeds when the table
    /// already exists with a compatible shape.
    fn create_table(&self, table: &str, schema: &KeySchema) -> StoreResult<()>;

    /// Drops the table and all of its data. Missing table is an error so the
    /// lifecycle layer can decide how to treat "already absent".
    fn delete_table(&self, table: &str) -> StoreResult<()>;

    /// Returns the table description, or `None` when the table is absent.
    fn describe_table(&self, table: &str) -> StoreResult<Option<TableDescription>>;

    /// Blocks until the table reports active, bounded by `ceiling`.
    fn wait_until_active(&self, table: &str, ceiling: Duration) -> StoreResult<()>;
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
