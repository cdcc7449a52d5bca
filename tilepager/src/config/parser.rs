//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::defaults::{clamp_disposal_generations, LOG_LEVELS};
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parses an `Ini` into a `ConfigFile`, starting from defaults.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [pager] section
    if let Some(section) = ini.section(Some("pager")) {
        if let Some(v) = parse_positive::<usize>(section, "pager", "max_evictions_per_cycle")? {
            config.pager.max_evictions_per_cycle = v;
        }
        if let Some(v) = section.get("disposal_generations") {
            let generations: usize =
                v.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "pager".to_string(),
                    key: "disposal_generations".to_string(),
                    value: v.to_string(),
                    reason: "must be a positive integer (cycles)".to_string(),
                })?;
            config.pager.disposal_generations = clamp_disposal_generations(generations);
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = parse_positive::<u64>(section, "cache", "max_entries")? {
            config.cache.max_entries = v;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
        if let Some(v) = section.get("level") {
            let level = v.trim().to_lowercase();
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(ConfigFileError::InvalidValue {
                    section: "logging".to_string(),
                    key: "level".to_string(),
                    value: v.to_string(),
                    reason: format!("must be one of: {}", LOG_LEVELS.join(", ")),
                });
            }
            config.logging.level = level;
        }
    }

    Ok(config)
}

/// Reads an integer key that must be at least 1.
fn parse_positive<T>(
    section: &Properties,
    section_name: &str,
    key: &str,
) -> Result<Option<T>, ConfigFileError>
where
    T: FromStr + PartialOrd + From<u8>,
{
    let Some(v) = section.get(key) else {
        return Ok(None);
    };
    match v.trim().parse::<T>() {
        Ok(parsed) if parsed >= T::from(1) => Ok(Some(parsed)),
        _ => Err(ConfigFileError::InvalidValue {
            section: section_name.to_string(),
            key: key.to_string(),
            value: v.to_string(),
            reason: "must be a positive integer".to_string(),
        }),
    }
}

/// Expands a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
