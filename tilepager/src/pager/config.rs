//! Runtime configuration for a tile pager.

use crate::cache::ResultCacheConfig;
use crate::config::ConfigFile;
use crate::disposal::DEFAULT_DISPOSAL_GENERATIONS;

use super::error::PagerError;

/// Default cap on tiles evicted in one cycle.
pub const DEFAULT_MAX_EVICTIONS_PER_CYCLE: usize = 256;

/// Configuration for a [`TilePager`](super::TilePager).
///
/// # Example
///
/// ```
/// use tilepager::pager::PagerConfig;
///
/// let config = PagerConfig::default()
///     .with_disposal_generations(3)
///     .with_cache_entries(64);
///
/// assert_eq!(config.disposal_generations, 3);
/// assert_eq!(config.cache.max_entries, 64);
/// ```
#[derive(Debug, Clone)]
pub struct PagerConfig {
    /// Maximum number of stale tiles evicted per cycle (default: 256)
    pub max_evictions_per_cycle: usize,
    /// Cycles an evicted resource is held before it is dropped (default: 8).
    /// Must exceed the number of frames the render backend keeps in flight.
    pub disposal_generations: usize,
    /// Result cache sizing
    pub cache: ResultCacheConfig,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            max_evictions_per_cycle: DEFAULT_MAX_EVICTIONS_PER_CYCLE,
            disposal_generations: DEFAULT_DISPOSAL_GENERATIONS,
            cache: ResultCacheConfig::default(),
        }
    }
}

impl PagerConfig {
    pub fn with_max_evictions_per_cycle(mut self, max: usize) -> Self {
        self.max_evictions_per_cycle = max;
        self
    }

    pub fn with_disposal_generations(mut self, generations: usize) -> Self {
        self.disposal_generations = generations;
        self
    }

    pub fn with_cache_entries(mut self, max_entries: u64) -> Self {
        self.cache.max_entries = max_entries;
        self
    }

    /// Checks the values a pager cannot run with.
    pub fn validate(&self) -> Result<(), PagerError> {
        self.validate_pager()?;
        if self.cache.max_entries == 0 {
            return Err(PagerError::InvalidConfig {
                field: "cache.max_entries",
                reason: "must be at least 1 or failures are never memoized".to_string(),
            });
        }
        Ok(())
    }

    /// Checks only the pager's own fields, not `cache`.
    pub(crate) fn validate_pager(&self) -> Result<(), PagerError> {
        if self.max_evictions_per_cycle == 0 {
            return Err(PagerError::InvalidConfig {
                field: "max_evictions_per_cycle",
                reason: "must be at least 1 or stale tiles are never evicted".to_string(),
            });
        }
        if self.disposal_generations == 0 {
            return Err(PagerError::InvalidConfig {
                field: "disposal_generations",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl From<&ConfigFile> for PagerConfig {
    fn from(file: &ConfigFile) -> Self {
        Self {
            max_evictions_per_cycle: file.pager.max_evictions_per_cycle,
            disposal_generations: file.pager.disposal_generations,
            cache: ResultCacheConfig::new(file.cache.max_entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PagerConfig::default();
        assert_eq!(config.max_evictions_per_cycle, 256);
        assert_eq!(config.disposal_generations, 8);
        assert_eq!(config.cache.max_entries, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        let err = PagerConfig::default()
            .with_max_evictions_per_cycle(0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("max_evictions_per_cycle"));

        assert!(PagerConfig::default()
            .with_disposal_generations(0)
            .validate()
            .is_err());
        assert!(PagerConfig::default()
            .with_cache_entries(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_config_file() {
        let mut file = ConfigFile::default();
        file.pager.max_evictions_per_cycle = 10;
        file.pager.disposal_generations = 3;
        file.cache.max_entries = 512;

        let config = PagerConfig::from(&file);
        assert_eq!(config.max_evictions_per_cycle, 10);
        assert_eq!(config.disposal_generations, 3);
        assert_eq!(config.cache.max_entries, 512);
    }
}
