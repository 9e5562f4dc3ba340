use super::defaults::DefaultsConfig;
use crate::error::{CliError, Result};
use geodedup::engine::config::RegistryFileConfig;
use std::fs;
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::debug;

/// Picks the configuration file to read: an explicit path always, otherwise the
/// default file name when it exists in the working directory.
pub fn locate(explicit: Option<&Path>, defaults: &DefaultsConfig) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None if defaults.config_file.is_file() => Some(defaults.config_file.clone()),
        None => None,
    }
}

pub fn load_table(path: &Path) -> Result<Table> {
    debug!("Reading configuration from {}", path.display());
    let content = fs::read_to_string(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    toml::from_str(&content).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

/// Writes `raw` at the dotted `key`, creating intermediate tables. `raw` is read as a
/// TOML value when it parses as one (`0.01`, `[".out", ".inp"]`) and as a bare string
/// otherwise (`sorted`).
pub fn set_dotted(table: &mut Table, key: &str, raw: &str) -> Result<()> {
    let mut segments: Vec<&str> = key.split('.').map(str::trim).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(CliError::Config(format!("Invalid configuration key: '{key}'")));
    }
    let Some(leaf) = segments.pop() else {
        return Err(CliError::Config(format!("Invalid configuration key: '{key}'")));
    };

    let mut current = table;
    for segment in segments {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        current = match slot {
            Value::Table(inner) => inner,
            _ => {
                return Err(CliError::Config(format!(
                    "Cannot set '{key}': '{segment}' is not a table"
                )));
            }
        };
    }
    current.insert(leaf.to_string(), parse_value(raw));
    Ok(())
}

fn parse_value(raw: &str) -> Value {
    toml::from_str::<Table>(&format!("value = {raw}"))
        .ok()
        .and_then(|mut parsed| parsed.remove("value"))
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

pub fn into_file_config(table: Table) -> Result<RegistryFileConfig> {
    Value::Table(table)
        .try_into()
        .map_err(|e| CliError::Config(e.to_string()))
}
