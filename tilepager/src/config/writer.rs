//! INI serialization: `ConfigFile` → commented INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Converts a `ConfigFile` to the commented INI text written to disk.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[pager]
; Maximum number of stale tiles evicted per update cycle (default: 256)
; Tiles beyond this limit are evicted on following cycles
max_evictions_per_cycle = {}
; Cycles an evicted resource is kept alive before it is dropped (default: 8)
; Must exceed the number of frames the renderer keeps in flight (1-64)
disposal_generations = {}

[cache]
; Memoized fetch results, successes and failures, kept per cache (default: 128)
; Least recently used results are forgotten first
max_entries = {}

[logging]
; Directory for the log file (default: ~/.tilepager/logs)
directory = {}
; Log file name, cleared at every start (default: tilepager.log)
file = {}
; Level used when RUST_LOG is not set: trace, debug, info, warn, error
level = {}
"#,
        config.pager.max_evictions_per_cycle,
        config.pager.disposal_generations,
        config.cache.max_entries,
        path_to_string(&config.logging.directory),
        config.logging.file,
        config.logging.level,
    )
}

/// Renders a path for the config file, abbreviating the home directory.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(relative) = path.strip_prefix(&home) {
            return format!("~/{}", relative.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::super::settings::ConfigFile;
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.pager.max_evictions_per_cycle = 12;
        config.pager.disposal_generations = 4;
        config.cache.max_entries = 1000;
        config.logging.directory = PathBuf::from("/tmp/tilepager-logs");
        config.logging.level = "warn".to_string();

        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_default_config_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        ConfigFile::default().save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded, ConfigFile::default());
    }

    #[test]
    fn test_output_is_commented() {
        let text = to_config_string(&ConfigFile::default());
        assert!(text.contains("[pager]"));
        assert!(text.contains("[cache]"));
        assert!(text.contains("[logging]"));
        assert!(text.contains("; Memoized fetch results"));
        assert!(text.contains("max_entries = 128"));
    }

    #[test]
    fn test_home_directory_abbreviated() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path_to_string(&home.join("logs")), "~/logs");
        }
        assert_eq!(path_to_string(Path::new("/opt/logs")), "/opt/logs");
    }
}
