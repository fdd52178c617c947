//! Core domain logic for EssayLab: versioned per-user essay persistence over
//! a partitioned key-value table, with identity allocation, soft deletion and
//! self-healing table lifecycle management.
//! This crate is the single source of truth for persistence invariants.

pub mod clock;
pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use logging::init_logging;
pub use model::essay::{Essay, EssayId, EssayValidationError, UNASSIGNED_ID};
pub use repo::essay_repo::{EssayRepository, RepoError, RepoResult, StoreEssayRepository};
pub use repo::id_alloc::next_id;
pub use service::essay_service::{EssayService, EssayServiceError};
pub use service::polish::{
    polish_prompt, split_into_chunks, OfflinePolisher, PolishError, Polisher,
};
pub use store::{
    KeySchema, KeyValueStore, ScanOrder, SqliteStore, StoreError, StoreResult, TableDescription,
    TableLifecycle, TableStatus,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
