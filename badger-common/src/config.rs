//! Configuration loading and config file resolution
//!
//! Badger reads a single TOML file. Resolution priority:
//! 1. Command-line argument / `BADGER_CONFIG` (highest priority)
//! 2. User config file (`~/.config/badger/config.toml` on Linux)
//! 3. System config file (`/etc/badger/config.toml`, Linux only)
//! 4. Compiled defaults (fallback)
//!
//! Without any file the service starts on compiled defaults. A file that was
//! named explicitly but does not exist, or that cannot be parsed, is a
//! configuration error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete badger configuration
///
/// Every section is optional in the file; missing sections and fields fall
/// back to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub net: NetConfig,

    /// Upstream service locations
    #[serde(default)]
    pub ext: ExternalServices,

    /// Per-service request timeouts
    #[serde(default)]
    pub timeout: TimeoutConfig,

    /// Badge renderer and local asset settings
    #[serde(default)]
    pub badge: BadgeConfig,

    #[serde(default)]
    pub executable: FamilyConfig,

    #[serde(default)]
    pub spatial: FamilyConfig,

    #[serde(default)]
    pub peerreview: FamilyConfig,

    #[serde(default)]
    pub licence: LicenceConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Default: 8089
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Outbound network settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetConfig {
    /// Proxy URL applied to every upstream request
    #[serde(default)]
    pub proxy: Option<String>,
}

/// Base URLs of the upstream research-infrastructure APIs
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalServices {
    /// o2r platform (jobs and compendia)
    #[serde(default = "default_o2r")]
    pub o2r: String,

    /// DOAJ article search, the query is appended verbatim
    #[serde(default = "default_doaj_articles")]
    pub doaj_articles: String,

    /// DOAJ journal search, the query is appended verbatim
    #[serde(default = "default_doaj_journals")]
    pub doaj_journals: String,

    /// GeoNames country subdivision (reverse geocoding) endpoint
    #[serde(default = "default_geonames")]
    pub geonames: String,

    /// GeoNames ocean name endpoint
    #[serde(default = "default_geonames_ocean")]
    pub geonames_ocean: String,

    #[serde(default = "default_geonames_username")]
    pub geonames_username: String,
}

impl Default for ExternalServices {
    fn default() -> Self {
        Self {
            o2r: default_o2r(),
            doaj_articles: default_doaj_articles(),
            doaj_journals: default_doaj_journals(),
            geonames: default_geonames(),
            geonames_ocean: default_geonames_ocean(),
            geonames_username: default_geonames_username(),
        }
    }
}

/// Request timeouts in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_o2r_timeout_ms")]
    pub o2r_ms: u64,

    #[serde(default = "default_doaj_timeout_ms")]
    pub doaj_ms: u64,

    #[serde(default = "default_geonames_timeout_ms")]
    pub geonames_ms: u64,
}

impl TimeoutConfig {
    pub fn o2r(&self) -> Duration {
        Duration::from_millis(self.o2r_ms)
    }

    pub fn doaj(&self) -> Duration {
        Duration::from_millis(self.doaj_ms)
    }

    pub fn geonames(&self) -> Duration {
        Duration::from_millis(self.geonames_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            o2r_ms: default_o2r_timeout_ms(),
            doaj_ms: default_doaj_timeout_ms(),
            geonames_ms: default_geonames_timeout_ms(),
        }
    }
}

/// External badge renderer and local badge assets
#[derive(Debug, Clone, Deserialize)]
pub struct BadgeConfig {
    /// Prefix of every compact badge URL
    #[serde(default = "default_badge_base_url")]
    pub base_url: String,

    /// Suffix appended to every compact badge URL (e.g. `?style=flat`)
    #[serde(default)]
    pub options: String,

    /// Directory holding the large badge SVGs. Unset means the assets
    /// shipped with the service crate.
    #[serde(default)]
    pub assets_dir: Option<PathBuf>,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_badge_base_url(),
            options: String::new(),
            assets_dir: None,
        }
    }
}

/// Settings for one badge family
///
/// Unset fields are filled in by the service with the family's own defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FamilyConfig {
    /// Upstream services backing this family; an empty list disables it
    #[serde(default)]
    pub services: Option<Vec<String>>,

    /// Full URL of the small "not available" badge
    #[serde(default)]
    pub badge_na_small: Option<String>,

    /// File name (inside the assets dir) of the large "not available" badge
    #[serde(default)]
    pub badge_na_big: Option<String>,
}

/// Licence family settings: family settings plus the open-licence lists
#[derive(Debug, Clone, Deserialize)]
pub struct LicenceConfig {
    #[serde(flatten)]
    pub family: FamilyConfig,

    /// Licence identifiers counted as open for code
    #[serde(default = "default_open_code")]
    pub open_code: Vec<String>,

    /// Licence identifiers counted as open for data
    #[serde(default = "default_open_data")]
    pub open_data: Vec<String>,

    /// Licence identifiers counted as open for text
    #[serde(default = "default_open_text")]
    pub open_text: Vec<String>,
}

impl Default for LicenceConfig {
    fn default() -> Self {
        Self {
            family: FamilyConfig::default(),
            open_code: default_open_code(),
            open_data: default_open_data(),
            open_text: default_open_text(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8089
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_o2r() -> String {
    "https://o2r.uni-muenster.de".to_string()
}

fn default_doaj_articles() -> String {
    "https://doaj.org/api/v1/search/articles/".to_string()
}

fn default_doaj_journals() -> String {
    "https://doaj.org/api/v1/search/journals/".to_string()
}

fn default_geonames() -> String {
    "http://api.geonames.org/countrySubdivisionJSON".to_string()
}

fn default_geonames_ocean() -> String {
    "http://api.geonames.org/oceanJSON".to_string()
}

fn default_geonames_username() -> String {
    "badges".to_string()
}

fn default_o2r_timeout_ms() -> u64 {
    5000
}

fn default_doaj_timeout_ms() -> u64 {
    3000
}

fn default_geonames_timeout_ms() -> u64 {
    3000
}

fn default_badge_base_url() -> String {
    "https://img.shields.io/badge/".to_string()
}

fn default_open_code() -> Vec<String> {
    [
        "Apache-2.0",
        "BSD-2-Clause",
        "BSD-3-Clause",
        "GPL-2.0",
        "GPL-3.0",
        "LGPL-3.0",
        "MIT",
        "MPL-2.0",
        "AGPL-3.0",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_open_data() -> Vec<String> {
    [
        "CC0-1.0",
        "CC-BY-4.0",
        "CC-BY-SA-4.0",
        "ODC-By-1.0",
        "ODbL-1.0",
        "PDDL-1.0",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_open_text() -> Vec<String> {
    ["CC0-1.0", "CC-BY-4.0", "CC-BY-SA-4.0"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl TomlConfig {
    /// Reject values the service cannot start with
    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("ext.o2r", &self.ext.o2r),
            ("ext.doaj_articles", &self.ext.doaj_articles),
            ("ext.doaj_journals", &self.ext.doaj_journals),
            ("ext.geonames", &self.ext.geonames),
            ("ext.geonames_ocean", &self.ext.geonames_ocean),
            ("badge.base_url", &self.badge.base_url),
        ];
        for (key, value) in urls {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    key, value
                )));
            }
        }

        let timeouts = [
            ("timeout.o2r_ms", self.timeout.o2r_ms),
            ("timeout.doaj_ms", self.timeout.doaj_ms),
            ("timeout.geonames_ms", self.timeout.geonames_ms),
        ];
        for (key, value) in timeouts {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than zero", key)));
            }
        }

        Ok(())
    }
}

/// Resolve the configuration file to read
///
/// Returns `None` when no CLI path was given and no default file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument (clap also maps BADGER_CONFIG here)
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: User config directory
    let user_config = dirs::config_dir().map(|d| d.join("badger").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    // Priority 3: System-wide config
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/badger/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Load and validate a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;
    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Load the configuration following the resolution priority
///
/// An explicitly requested file that does not exist is an error. Without
/// any file the compiled defaults are returned along with `None`.
pub fn load_config(cli_arg: Option<&Path>) -> Result<(TomlConfig, Option<PathBuf>)> {
    match resolve_config_path(cli_arg) {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            let config = load_toml_config(&path)?;
            Ok((config, Some(path)))
        }
        None => Ok((TomlConfig::default(), None)),
    }
}
