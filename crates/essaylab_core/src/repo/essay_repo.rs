//! Essay repository contracts and store-backed implementation.
//!
//! # Responsibility
//! - Provide the public save/list-active/soft-delete operations.
//! - Allocate identities for new records and close the allocation race with
//!   conditional puts.
//! - Self-heal a missing backing table on the list path with exactly one
//!   bounded retry.
//!
//! # Invariants
//! - `owner` is validated non-empty before any store call.
//! - Saves are full-record overwrites; no partial write is ever left behind.
//! - Soft delete only stamps `deleted_at`; every other field round-trips.

use crate::clock::Clock;
use crate::model::essay::{Essay, EssayId, EssayValidationError, UNASSIGNED_ID};
use crate::repo::id_alloc;
use crate::store::{KeySchema, KeyValueStore, ScanOrder, StoreError, TableLifecycle};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Bounded number of allocate-then-insert attempts under contention.
const ALLOCATION_ATTEMPTS: u32 = 3;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error taxonomy surfaced to calling layers.
#[derive(Debug)]
pub enum RepoError {
    /// Rejected before any store call; never retried.
    Validation(EssayValidationError),
    /// No record at `(owner, id)` on a point lookup.
    NotFound { owner: String, id: EssayId },
    /// Concurrent writers exhausted the bounded allocation retries.
    AllocationContended { owner: String, attempts: u32 },
    /// Store transport or administration failure, surfaced as-is.
    Store(StoreError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { owner, id } => {
                write!(f, "essay not found for owner `{owner}` id {id}")
            }
            Self::AllocationContended { owner, attempts } => write!(
                f,
                "id allocation for owner `{owner}` lost {attempts} consecutive races"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EssayValidationError> for RepoError {
    fn from(value: EssayValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Public persistence contract consumed by service and transport layers.
pub trait EssayRepository {
    /// Persists `essay`, allocating an id when `essay.id == 0`. The assigned
    /// id is written back into the record.
    fn save(&self, essay: &mut Essay) -> RepoResult<()>;

    /// Lists non-deleted records for `owner`, newest id first. An owner with
    /// no records yields an empty vec, not an error.
    fn list_active(&self, owner: &str) -> RepoResult<Vec<Essay>>;

    /// Stamps the soft-delete tombstone on `(owner, id)`. Idempotent on
    /// already-deleted records; `NotFound` when the key never existed.
    fn soft_delete(&self, owner: &str, id: EssayId) -> RepoResult<()>;
}

/// Store-backed essay repository.
pub struct StoreEssayRepository<'a> {
    store: &'a dyn KeyValueStore,
    lifecycle: &'a TableLifecycle,
    clock: &'a dyn Clock,
    table: String,
    schema: KeySchema,
}

impl<'a> StoreEssayRepository<'a> {
    pub fn new(
        store: &'a dyn KeyValueStore,
        lifecycle: &'a TableLifecycle,
        clock: &'a dyn Clock,
        table: impl Into<String>,
    ) -> Self {
        Self {
            store,
            lifecycle,
            clock,
            table: table.into(),
            schema: KeySchema::default(),
        }
    }

    fn save_with_allocation(&self, essay: &mut Essay) -> RepoResult<()> {
        for attempt in 1..=ALLOCATION_ATTEMPTS {
            essay.id = id_alloc::next_id(self.store, &self.table, &essay.owner)?;
            match self.store.put_item_new(&self.table, essay) {
                Ok(()) => {
                    info!(
                        "event=essay_save module=repo status=ok owner={} id={} attempt={attempt}",
                        essay.owner, essay.id
                    );
                    return Ok(());
                }
                Err(StoreError::ConditionFailed { .. }) => {
                    // A concurrent writer claimed this id between our read
                    // and write. Re-observe the maximum and try again.
                    warn!(
                        "event=essay_save module=repo status=retry owner={} id={} attempt={attempt}",
                        essay.owner, essay.id
                    );
                    essay.id = UNASSIGNED_ID;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(RepoError::AllocationContended {
            owner: essay.owner.clone(),
            attempts: ALLOCATION_ATTEMPTS,
        })
    }

    fn query_newest_first(&self, owner: &str) -> Result<Vec<Essay>, StoreError> {
        self.store
            .query(&self.table, owner, None, ScanOrder::Descending)
    }
}

impl EssayRepository for StoreEssayRepository<'_> {
    fn save(&self, essay: &mut Essay) -> RepoResult<()> {
        essay.validate()?;

        if essay.updated_at.is_empty() {
            essay.updated_at = self.clock.now_rfc3339();
        }

        if essay.id == UNASSIGNED_ID {
            return self.save_with_allocation(essay);
        }

        // Caller-supplied id: overwrite of that exact key, last writer wins.
        self.store.put_item(&self.table, essay)?;
        info!(
            "event=essay_save module=repo status=ok owner={} id={} mode=overwrite",
            essay.owner, essay.id
        );
        Ok(())
    }

    fn list_active(&self, owner: &str) -> RepoResult<Vec<Essay>> {
        let items = match self.query_newest_first(owner) {
            Ok(items) => items,
            Err(StoreError::TableNotFound(table)) => {
                // Self-heal: provision the table and retry exactly once. A
                // persistently missing table surfaces the second error.
                warn!(
                    "event=essay_list module=repo status=heal owner={owner} table={table}"
                );
                self.lifecycle.provision(self.store, &self.table, &self.schema)?;
                std::thread::sleep(self.lifecycle.heal_grace());
                self.query_newest_first(owner)?
            }
            Err(err) => return Err(err.into()),
        };

        Ok(items.into_iter().filter(Essay::is_active).collect())
    }

    fn soft_delete(&self, owner: &str, id: EssayId) -> RepoResult<()> {
        let mut essay = self
            .store
            .get_item(&self.table, owner, id)?
            .ok_or_else(|| RepoError::NotFound {
                owner: owner.to_string(),
                id,
            })?;

        essay.mark_deleted(self.clock.now_rfc3339());
        self.store.put_item(&self.table, &essay)?;
        info!("event=essay_delete module=repo status=ok owner={owner} id={id}");
        Ok(())
    }
}
