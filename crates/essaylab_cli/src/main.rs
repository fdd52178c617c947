//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable that wires the core end to end against an
//!   in-memory store: provision, polish, save, list, delete.
//! - Keep output deterministic for quick local sanity checks.

use essaylab_core::{
    init_logging, Config, EssayService, OfflinePolisher, SqliteStore, StoreEssayRepository,
    SystemClock, TableLifecycle,
};
use std::error::Error;
use std::time::Duration;

fn main() -> Result<(), Box<dyn Error>> {
    let cfg = Config::load();
    println!("essaylab_core version={}", essaylab_core::core_version());

    let smoke_dir = std::env::temp_dir().join("essaylab-smoke");
    init_logging(&cfg.log_level, smoke_dir.join("logs"))?;

    let store = SqliteStore::open_in_memory()?;
    let lifecycle = TableLifecycle::with_timings(
        smoke_dir,
        Duration::ZERO,
        Duration::ZERO,
        Duration::from_secs(5),
    );
    let clock = SystemClock;
    // Lifecycle failures are non-fatal at startup; later persistence calls
    // surface their own errors until the table becomes available.
    if let Err(err) = lifecycle.ensure_ready(
        &store,
        &cfg.table_name,
        &Default::default(),
        cfg.reset_tables_on_start,
        &clock,
    ) {
        eprintln!("table lifecycle failed: {err}");
    }

    let repo = StoreEssayRepository::new(&store, &lifecycle, &clock, cfg.table_name.clone());
    let service = EssayService::new(repo, OfflinePolisher);

    let saved = service.polish_and_save("smoke", "示例作文", "今天天气很好。")?;
    println!("saved id={} parent={}", saved.id, saved.parent_id);

    let listed = service.list_essays("smoke")?;
    println!("active={}", listed.len());

    service.delete_essay("smoke", saved.id)?;
    println!("active_after_delete={}", service.list_essays("smoke")?.len());

    Ok(())
}
