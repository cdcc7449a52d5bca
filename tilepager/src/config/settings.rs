//! Settings structs, one per INI section.

use std::path::PathBuf;

/// Contents of `config.ini`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub pager: PagerSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

/// `[pager]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerSettings {
    /// Stale tiles evicted per cycle at most
    pub max_evictions_per_cycle: usize,
    /// Cycles an evicted resource is held before it is dropped
    pub disposal_generations: usize,
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Memoized fetch results kept per cache
    pub max_entries: u64,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Directory for the log file
    pub directory: PathBuf,
    /// Log file name
    pub file: String,
    /// Level used when `RUST_LOG` is not set
    pub level: String,
}
