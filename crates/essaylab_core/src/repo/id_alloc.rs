//! Per-partition identity allocation.
//!
//! # Responsibility
//! - Compute the next sort-key id for a new record within one owner
//!   partition by observing the current maximum.
//!
//! # Invariants
//! - The returned id is strictly greater than every id visible at the
//!   instant of the read. Exclusivity against concurrent allocators is NOT
//!   guaranteed here; the repository closes that race with a conditional put.

use crate::model::essay::EssayId;
use crate::store::{KeyValueStore, ScanOrder, StoreResult};

/// Id assigned to the first record of an empty partition.
const FIRST_ID: EssayId = 1;

/// Returns the next id for `owner`: one plus the greatest id currently in
/// the partition, or [`FIRST_ID`] when the partition is empty.
///
/// Read errors abort allocation; no id is assigned and no write occurs.
pub fn next_id(store: &dyn KeyValueStore, table: &str, owner: &str) -> StoreResult<EssayId> {
    let newest = store.query(table, owner, Some(1), ScanOrder::Descending)?;
    Ok(match newest.first() {
        Some(item) => item.id + 1,
        None => FIRST_ID,
    })
}
