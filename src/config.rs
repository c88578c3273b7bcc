//! Configuration file handling.
//!
//! This module provides loading and saving of extaudit configuration
//! from a TOML file, plus the [`RuntimeConfig`] view the checkers
//! consult during a scan.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/extaudit/config.toml`
//! - macOS: `~/Library/Application Support/extaudit/config.toml`
//! - Windows: `%APPDATA%\extaudit\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! hide_needless = false
//! whitelist = ["acme/*", "vendor/legacy-helper"]
//! default_format = "table"
//! scan_parallel = true
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration.
///
/// This struct represents all configurable options for extaudit.
/// It can be loaded from a TOML file or created with default values.
///
/// # Example
///
/// ```no_run
/// use extaudit::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Hide needless: {}", config.hide_needless);
/// println!("Whitelist entries: {}", config.whitelist.len());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether to suppress "unnecessary dependency" findings by default.
    ///
    /// Default: false
    pub hide_needless: bool,

    /// Requirement names that are always considered legitimately declared.
    ///
    /// Entries support glob patterns (e.g., "acme/*").
    pub whitelist: Vec<String>,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    /// Default: "table"
    pub default_format: String,

    /// PHP version to audit against instead of detecting the local
    /// interpreter (e.g., "8.1.0").
    ///
    /// Default: none (detect via `php -r`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub php_version: Option<String>,

    /// Whether to scan modules on parallel tasks by default.
    ///
    /// Default: true
    pub scan_parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hide_needless: false,
            whitelist: Vec::new(),
            default_format: "table".to_string(),
            php_version: None,
            scan_parallel: true,
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extaudit::Config;
    ///
    /// let config = Config::load()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use extaudit::Config;
    ///
    /// let path = Config::config_path();
    /// println!("Config file: {}", path.display());
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("extaudit")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    ///
    /// This is useful for showing users what the default config looks like.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    /// Merges the file configuration with command-line overrides into the
    /// view handed to the checkers.
    pub fn runtime_config(&self, hide_needless: bool, extra_whitelist: &[String]) -> RuntimeConfig {
        let mut whitelist = self.whitelist.clone();
        whitelist.extend(extra_whitelist.iter().cloned());
        RuntimeConfig::new(self.hide_needless || hide_needless, whitelist)
    }
}

/// Options consulted by the checkers during a scan.
///
/// Built once per run and shared read-only across modules.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    hide_needless: bool,
    whitelist: Vec<String>,
}

impl RuntimeConfig {
    pub fn new(hide_needless: bool, whitelist: Vec<String>) -> Self {
        Self {
            hide_needless,
            whitelist,
        }
    }

    /// Whether "unnecessary dependency" findings are suppressed entirely.
    pub fn hide_needless(&self) -> bool {
        self.hide_needless
    }

    /// Whether the user whitelisted this requirement name.
    ///
    /// Entries support glob patterns (e.g., "acme/*").
    pub fn is_whitelisted(&self, requirement: &str) -> bool {
        self.whitelist.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, requirement)
            } else {
                pattern == requirement
            }
        })
    }
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;

    // Check prefix (before first *)
    if !parts[0].is_empty() {
        if !remaining.starts_with(parts[0]) {
            return false;
        }
        remaining = &remaining[parts[0].len()..];
    }

    // Check suffix (after last *)
    let last_part = parts[parts.len() - 1];
    if !last_part.is_empty() {
        if !remaining.ends_with(last_part) {
            return false;
        }
        remaining = &remaining[..remaining.len() - last_part.len()];
    }

    // Check middle parts
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        if let Some(pos) = remaining.find(part) {
            remaining = &remaining[pos + part.len()..];
        } else {
            return false;
        }
    }

    true
}
