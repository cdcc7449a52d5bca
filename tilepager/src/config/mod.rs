//! Configuration file for tile pagers.
//!
//! Settings are read from `~/.tilepager/config.ini`. Every key is optional;
//! anything missing takes its default.
//!
//! ```ini
//! [pager]
//! max_evictions_per_cycle = 256
//! disposal_generations = 8
//!
//! [cache]
//! max_entries = 128
//!
//! [logging]
//! directory = ~/.tilepager/logs
//! file = tilepager.log
//! level = info
//! ```
//!
//! The file maps onto [`ConfigFile`]; [`PagerConfig`](crate::pager::PagerConfig)
//! converts from it with `PagerConfig::from(&config_file)`.

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    DEFAULT_LOG_FILE, DEFAULT_LOG_LEVEL, MAX_DISPOSAL_GENERATIONS, MIN_DISPOSAL_GENERATIONS,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{CacheSettings, ConfigFile, LoggingSettings, PagerSettings};
