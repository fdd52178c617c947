//! Environment-driven application configuration.
//!
//! # Responsibility
//! - Read deployment settings from the process environment with defaults
//!   suitable for local development.
//! - Surface the explicit opt-in for destructive table resets.
//!
//! # Invariants
//! - Loading never fails; missing variables fall back to defaults.
//! - `reset_tables_on_start` defaults to `false`: a restart never destroys
//!   data unless an operator asked for it.

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP listen port consumed by the transport layer.
    pub port: String,
    /// Release-mode toggle for the hosting process.
    pub production: bool,
    /// Name of the backing essay table.
    pub table_name: String,
    /// Directory for provisioning markers and other local state.
    pub data_dir: String,
    /// Master switch for the persistence subsystem.
    pub persistence_enabled: bool,
    /// Drop-and-recreate the table at startup. Destroys all data; intended
    /// for development environments only.
    pub reset_tables_on_start: bool,
    /// Log level passed to the logging bootstrap.
    pub log_level: String,
    /// Polishing model identifier for the outer model client.
    pub model_name: String,
    /// Polishing model API key; empty selects the offline polisher.
    pub model_api_key: String,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an injectable lookup. Test support.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| -> String {
            match lookup(key) {
                Some(value) if !value.is_empty() => value,
                _ => default.to_string(),
            }
        };

        Self {
            port: get("ESSAYLAB_PORT", "8080"),
            production: get("ESSAYLAB_MODE", "debug") == "release",
            table_name: get("ESSAYLAB_TABLE", "essays"),
            data_dir: get("ESSAYLAB_DATA_DIR", "data"),
            persistence_enabled: get("ESSAYLAB_ENABLE_STORE", "true") == "true",
            reset_tables_on_start: get("ESSAYLAB_RESET_TABLES", "false") == "true",
            log_level: get("ESSAYLAB_LOG_LEVEL", "info"),
            model_name: get("ESSAYLAB_MODEL", "deepseek-chat"),
            model_api_key: get("ESSAYLAB_API_KEY", ""),
        }
    }

    /// Returns whether the offline polisher should be used instead of a
    /// remote model client.
    pub fn use_offline_polish(&self) -> bool {
        self.model_api_key.is_empty()
    }
}
