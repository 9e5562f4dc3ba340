use std::path::PathBuf;

/// Values the CLI falls back to when neither the command line nor a configuration
/// file provides them. Matching thresholds and header rules default in the library.
pub struct DefaultsConfig {
    pub registry_root: PathBuf,
    pub config_file: PathBuf,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            registry_root: PathBuf::from("database"),
            config_file: PathBuf::from("geodedup.toml"),
        }
    }
}
