//! Configuration management for SlideForge.
//!
//! Loads configuration from ${SLIDEFORGE_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::client::{BASE_URL_ENV, DEFAULT_BASE_URL, resolve_base_url};
use crate::session::ConversationPolicy;

/// Default config template, embedded from default_config.toml.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Recursively overlays `source` onto `target`, keeping target's comments.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for SlideForge configuration.
    //!
    //! SLIDEFORGE_HOME resolution order:
    //! 1. SLIDEFORGE_HOME environment variable (if set)
    //! 2. ~/.config/slideforge
    //! 3. ./.slideforge when no home directory is known

    use std::path::PathBuf;

    pub const HOME_ENV: &str = "SLIDEFORGE_HOME";

    pub fn slideforge_home() -> PathBuf {
        if let Ok(home) = std::env::var(HOME_ENV)
            && !home.trim().is_empty()
        {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".slideforge"),
            |h| h.join(".config").join("slideforge"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        slideforge_home().join("config.toml")
    }
}

/// Logging settings (`[log]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive used when SLIDEFORGE_LOG is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Log file; stderr when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub conversation_policy: ConversationPolicy,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            conversation_policy: ConversationPolicy::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Service address with precedence: SLIDEFORGE_BASE_URL > config > default.
    ///
    /// # Errors
    /// Returns an error if the chosen value is not a valid URL.
    pub fn effective_base_url(&self) -> Result<String> {
        resolve_base_url(self.base_url.as_deref(), BASE_URL_ENV, DEFAULT_BASE_URL)
    }

    /// Per-request timeout. Zero falls back to the default.
    pub fn request_timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Renders `Config::default()` into the commented template.
    ///
    /// # Errors
    /// Returns an error if the template or the serialized defaults fail to parse.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let generated_toml = toml::to_string(&Config::default())
            .context("Failed to serialize default config to TOML")?;

        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;
        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    /// Writes config content atomically (temp file + rename), creating parent
    /// directories as needed.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}
