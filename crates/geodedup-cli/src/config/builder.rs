use super::defaults::DefaultsConfig;
use super::file;
use crate::error::{CliError, Result};
use geodedup::engine::config::RegistryConfig;
use std::path::{Path, PathBuf};
use toml::Table;

/// Command-line values that take precedence over every other configuration source.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub registry_root: Option<PathBuf>,
    pub duplicate_threshold: Option<f64>,
    pub set_values: Vec<String>,
}

/// Layers defaults, the configuration file, `-S` values and explicit flags, in
/// increasing order of precedence, into a validated registry configuration.
pub fn build_config(overrides: &Overrides) -> Result<RegistryConfig> {
    let defaults = DefaultsConfig::default();

    let table = match file::locate(overrides.config_path.as_deref(), &defaults) {
        Some(path) => file::load_table(&path)?,
        None => Table::new(),
    };
    let table = apply_set_values(table, &overrides.set_values)?;
    let file_config = file::into_file_config(table)?;

    let registry_root = overrides
        .registry_root
        .clone()
        .or_else(|| file_config.registry_root.clone())
        .unwrap_or(defaults.registry_root);

    let mut builder = file_config.into_builder().registry_root(registry_root);
    if let Some(threshold) = overrides.duplicate_threshold {
        builder = builder.duplicate_threshold(threshold);
    }
    Ok(builder.build()?)
}

fn apply_set_values(mut table: Table, set_values: &[String]) -> Result<Table> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        file::set_dotted(&mut table, key.trim(), value.trim())?;
    }
    Ok(table)
}

/// Resolves `path` against the working directory for display purposes.
pub fn display_path(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
