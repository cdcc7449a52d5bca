//! Default values and clamping for configuration settings.

use super::file::config_directory;
use super::settings::*;
use crate::cache::DEFAULT_RESULT_CACHE_CAPACITY;
use crate::disposal::DEFAULT_DISPOSAL_GENERATIONS;
use crate::pager::DEFAULT_MAX_EVICTIONS_PER_CYCLE;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "tilepager.log";

/// Default log level when `RUST_LOG` is not set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Accepted values for `logging.level`.
pub(super) const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Fewest disposal generations allowed.
pub const MIN_DISPOSAL_GENERATIONS: usize = 1;

/// Most disposal generations allowed. Beyond this, evicted resources pile up
/// for seconds at interactive frame rates.
pub const MAX_DISPOSAL_GENERATIONS: usize = 64;

/// Clamps the disposal generation count and logs a warning if clamped.
pub(super) fn clamp_disposal_generations(value: usize) -> usize {
    if value < MIN_DISPOSAL_GENERATIONS {
        tracing::warn!(
            requested = value,
            min = MIN_DISPOSAL_GENERATIONS,
            max = MAX_DISPOSAL_GENERATIONS,
            "disposal_generations below minimum, clamping to {}",
            MIN_DISPOSAL_GENERATIONS
        );
        MIN_DISPOSAL_GENERATIONS
    } else if value > MAX_DISPOSAL_GENERATIONS {
        tracing::warn!(
            requested = value,
            min = MIN_DISPOSAL_GENERATIONS,
            max = MAX_DISPOSAL_GENERATIONS,
            "disposal_generations above maximum, clamping to {}",
            MAX_DISPOSAL_GENERATIONS
        );
        MAX_DISPOSAL_GENERATIONS
    } else {
        value
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            pager: PagerSettings::default(),
            cache: CacheSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for PagerSettings {
    fn default() -> Self {
        Self {
            max_evictions_per_cycle: DEFAULT_MAX_EVICTIONS_PER_CYCLE,
            disposal_generations: DEFAULT_DISPOSAL_GENERATIONS,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_RESULT_CACHE_CAPACITY,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: config_directory().join("logs"),
            file: DEFAULT_LOG_FILE.to_string(),
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_disposal_generations() {
        assert_eq!(clamp_disposal_generations(0), MIN_DISPOSAL_GENERATIONS);
        assert_eq!(clamp_disposal_generations(1000), MAX_DISPOSAL_GENERATIONS);
        assert_eq!(clamp_disposal_generations(8), 8);
    }

    #[test]
    fn test_default_logging_lives_under_config_directory() {
        let logging = LoggingSettings::default();
        assert!(logging.directory.starts_with(config_directory()));
        assert_eq!(logging.file, DEFAULT_LOG_FILE);
        assert!(LOG_LEVELS.contains(&logging.level.as_str()));
    }
}
