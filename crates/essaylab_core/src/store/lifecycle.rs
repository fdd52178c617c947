//! Table lifecycle management.
//!
//! # Responsibility
//! - Guarantee the backing table exists with the expected key schema before
//!   any repository call runs.
//! - Track completed provisioning through an out-of-band marker file.
//!
//! # Invariants
//! - `ensure_ready` is idempotent and safe to run at every process start.
//! - Dropping an existing table only happens when the caller passes
//!   `reset = true`; a reset destroys all persisted data.
//! - Every wait on table activation is bounded by a fixed ceiling.

use super::{KeySchema, KeyValueStore, StoreError, StoreResult};
use crate::clock::Clock;
use log::{info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTLE_GRACE: Duration = Duration::from_secs(2);
const HEAL_GRACE: Duration = Duration::from_secs(5);
const ACTIVE_WAIT_CEILING: Duration = Duration::from_secs(120);

/// Startup/repair manager for one table family.
pub struct TableLifecycle {
    data_dir: PathBuf,
    settle_grace: Duration,
    heal_grace: Duration,
    active_ceiling: Duration,
}

impl TableLifecycle {
    /// Creates a lifecycle manager with production timings.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            settle_grace: SETTLE_GRACE,
            heal_grace: HEAL_GRACE,
            active_ceiling: ACTIVE_WAIT_CEILING,
        }
    }

    /// Overrides fixed sleeps and the activation ceiling. Test support and
    /// embedded stores that settle instantly.
    pub fn with_timings(
        data_dir: impl Into<PathBuf>,
        settle_grace: Duration,
        heal_grace: Duration,
        active_ceiling: Duration,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            settle_grace,
            heal_grace,
            active_ceiling,
        }
    }

    /// Grace period a self-healing caller should wait before retrying a
    /// query after provisioning.
    pub fn heal_grace(&self) -> Duration {
        self.heal_grace
    }

    /// Path of the persisted "already provisioned" marker for `table`.
    pub fn marker_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{table}.initialized"))
    }

    /// Returns whether a provisioning marker is present for `table`.
    pub fn is_initialized(&self, table: &str) -> bool {
        self.marker_path(table).exists()
    }

    /// Ensures the table exists and is active, then persists the marker.
    ///
    /// # Side effects
    /// - Always clears the marker first, so a crash between steps never
    ///   leaves a stale "ready" claim behind.
    /// - With `reset = true`, drops the table and everything in it before
    ///   re-provisioning.
    ///
    /// Failures are returned so callers can decide; process startup treats
    /// them as non-fatal and serves requests that will fail downstream until
    /// the table becomes available.
    pub fn ensure_ready(
        &self,
        store: &dyn KeyValueStore,
        table: &str,
        schema: &KeySchema,
        reset: bool,
        clock: &dyn Clock,
    ) -> StoreResult<()> {
        self.clear_marker(table);

        if reset {
            match store.delete_table(table) {
                Ok(()) => {
                    info!("event=table_reset module=lifecycle status=ok table={table}");
                }
                Err(StoreError::TableNotFound(_)) => {
                    info!(
                        "event=table_reset module=lifecycle status=ok table={table} detail=already_absent"
                    );
                }
                Err(err) => {
                    // Non-fatal: provisioning below may still succeed.
                    warn!(
                        "event=table_reset module=lifecycle status=error table={table} error={err}"
                    );
                }
            }
            // No delete-completion acknowledgement exists; give the store a
            // fixed window to settle the drop.
            std::thread::sleep(self.settle_grace);
        }

        self.provision(store, table, schema)?;
        self.write_marker(table, &clock.now_rfc3339());
        Ok(())
    }

    /// Non-destructive create/verify path.
    ///
    /// Probes for the table and creates it with the key schema when absent,
    /// then blocks until the store reports it active, bounded by the
    /// activation ceiling. Used both at startup and by the missing-table
    /// self-heal in `list_active`.
    pub fn provision(
        &self,
        store: &dyn KeyValueStore,
        table: &str,
        schema: &KeySchema,
    ) -> StoreResult<()> {
        if store.describe_table(table)?.is_some() {
            info!("event=table_probe module=lifecycle status=ok table={table} detail=exists");
            return Ok(());
        }

        info!("event=table_create module=lifecycle status=start table={table}");
        if let Err(err) = store.create_table(table, schema) {
            warn!("event=table_create module=lifecycle status=error table={table} error={err}");
            return Err(err);
        }

        if let Err(err) = store.wait_until_active(table, self.active_ceiling) {
            warn!(
                "event=table_activate module=lifecycle status=error table={table} error={err}"
            );
            return Err(err);
        }

        info!("event=table_create module=lifecycle status=ok table={table}");
        Ok(())
    }

    fn clear_marker(&self, table: &str) {
        let path = self.marker_path(table);
        if let Err(err) = std::fs::remove_file(&path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "event=marker_clear module=lifecycle status=error path={} error={err}",
                    path.display()
                );
            }
        }
    }

    fn write_marker(&self, table: &str, now: &str) {
        // Best effort: a missing marker only means the next start re-verifies.
        if let Err(err) = self.try_write_marker(&self.marker_path(table), table, now) {
            warn!(
                "event=marker_write module=lifecycle status=error table={table} error={err}"
            );
        }
    }

    fn try_write_marker(&self, path: &Path, table: &str, now: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let mut file = std::fs::File::create(path)?;
        writeln!(file, "table {table} provisioned at {now}")
    }
}
