use super::layout::DEFAULT_ARTIFACT_SUFFIXES;
use crate::core::io::header::HeaderRules;
use crate::core::matching::matcher::ProfileMode;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Distance below which a candidate is declared a duplicate of an entry.
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.001;

/// Content written to every artifact slot of a freshly created entry.
pub const DEFAULT_PLACEHOLDER: &str = "test";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Failed to read configuration file '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file '{path}': {source}", path = path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    pub registry_root: PathBuf,
    pub duplicate_threshold: f64,
    pub header_rules: HeaderRules,
    pub profile_mode: ProfileMode,
    pub artifact_suffixes: Vec<String>,
    pub placeholder_content: String,
}

impl RegistryConfig {
    /// Loads a configuration from a TOML file. Keys absent from the file take their
    /// defaults; `registry-root` is required.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        RegistryFileConfig::from_file(path)?.into_builder().build()
    }

    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::new()
    }
}

#[derive(Default)]
pub struct RegistryConfigBuilder {
    registry_root: Option<PathBuf>,
    duplicate_threshold: Option<f64>,
    header_rules: Option<HeaderRules>,
    header_prefix_length: Option<usize>,
    profile_mode: Option<ProfileMode>,
    artifact_suffixes: Option<Vec<String>>,
    placeholder_content: Option<String>,
}

impl RegistryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_root = Some(path.into());
        self
    }
    pub fn duplicate_threshold(mut self, threshold: f64) -> Self {
        self.duplicate_threshold = Some(threshold);
        self
    }
    pub fn header_rules(mut self, rules: HeaderRules) -> Self {
        self.header_rules = Some(rules);
        self
    }
    /// Overrides only the prefix length of whatever header rules end up in effect.
    pub fn header_prefix_length(mut self, length: usize) -> Self {
        self.header_prefix_length = Some(length);
        self
    }
    pub fn profile_mode(mut self, mode: ProfileMode) -> Self {
        self.profile_mode = Some(mode);
        self
    }
    pub fn artifact_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artifact_suffixes = Some(suffixes.into_iter().map(Into::into).collect());
        self
    }
    pub fn placeholder_content(mut self, content: impl Into<String>) -> Self {
        self.placeholder_content = Some(content.into());
        self
    }

    pub fn build(self) -> Result<RegistryConfig, ConfigError> {
        let registry_root = self
            .registry_root
            .ok_or(ConfigError::MissingParameter("registry_root"))?;

        let duplicate_threshold = self
            .duplicate_threshold
            .unwrap_or(DEFAULT_DUPLICATE_THRESHOLD);
        if !duplicate_threshold.is_finite() || duplicate_threshold <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "duplicate_threshold",
                reason: format!("expected a positive finite number, got {duplicate_threshold}"),
            });
        }

        let mut header_rules = self.header_rules.unwrap_or_default();
        if let Some(length) = self.header_prefix_length {
            header_rules.prefix_length = length;
        }
        if header_rules.prefix_length == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "header_prefix_length",
                reason: "must be at least 1".to_string(),
            });
        }

        let artifact_suffixes = self.artifact_suffixes.unwrap_or_else(|| {
            DEFAULT_ARTIFACT_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect()
        });
        if artifact_suffixes.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "artifact_suffixes",
                reason: "at least one suffix is required".to_string(),
            });
        }
        if let Some(bad) = artifact_suffixes
            .iter()
            .find(|s| s.is_empty() || s.contains(['/', '\\']))
        {
            return Err(ConfigError::InvalidParameter {
                name: "artifact_suffixes",
                reason: format!("'{bad}' is not a valid file-name suffix"),
            });
        }

        Ok(RegistryConfig {
            registry_root,
            duplicate_threshold,
            header_rules,
            profile_mode: self.profile_mode.unwrap_or_default(),
            artifact_suffixes,
            placeholder_content: self
                .placeholder_content
                .unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string()),
        })
    }
}

/// The on-disk form of a [`RegistryConfig`]. Every key is optional so that files can
/// be layered over defaults and command-line values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RegistryFileConfig {
    pub registry_root: Option<PathBuf>,
    pub duplicate_threshold: Option<f64>,
    pub profile_mode: Option<ProfileMode>,
    pub artifact_suffixes: Option<Vec<String>>,
    pub placeholder_content: Option<String>,
    pub header: Option<HeaderRules>,
}

impl RegistryFileConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn into_builder(self) -> RegistryConfigBuilder {
        let mut builder = RegistryConfigBuilder::new();
        if let Some(root) = self.registry_root {
            builder = builder.registry_root(root);
        }
        if let Some(threshold) = self.duplicate_threshold {
            builder = builder.duplicate_threshold(threshold);
        }
        if let Some(mode) = self.profile_mode {
            builder = builder.profile_mode(mode);
        }
        if let Some(suffixes) = self.artifact_suffixes {
            builder = builder.artifact_suffixes(suffixes);
        }
        if let Some(content) = self.placeholder_content {
            builder = builder.placeholder_content(content);
        }
        if let Some(rules) = self.header {
            builder = builder.header_rules(rules);
        }
        builder
    }
}
