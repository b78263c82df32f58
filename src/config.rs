//! Server configuration: documentation sites and search settings.
//!
//! Sites come from three sources, later ones overriding earlier ones by key:
//!
//! 1. A TOML file (`--config`, else `<config dir>/lunr-docs/config.toml` when
//!    it exists)
//! 2. The `LUNR_SITES` environment variable
//! 3. Repeated `--site` command-line flags
//!
//! A site is written `key=url` on the command line and in `LUNR_SITES`
//! (comma separated); a dual-index site lists both URLs as `key=url|url2`.
//!
//! ```toml
//! [[sites]]
//! key = "strands"
//! index_urls = ["https://strandsagents.com/latest/search/search_index.json"]
//!
//! [search]
//! load_wait_ms = 1500
//! max_results = 10
//! ```

use std::path::{Path, PathBuf};

use lunr_search::{SearchConfig, SiteConfig};
use serde::{Deserialize, Serialize};

use crate::error::{DocsError, Result};

/// Environment variable holding `key=url[|url2]` site entries.
pub const SITES_ENV: &str = "LUNR_SITES";

/// One documentation site as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteEntry {
    /// Short identifier used in tool names (`search_<key>`).
    pub key: String,
    /// One index URL, or two for dual-index sites.
    pub index_urls: Vec<String>,
    /// Page base URL when it differs from the index directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl SiteEntry {
    /// Validate and convert into the search core's site configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::Config`] for an invalid key or URL.
    pub fn to_site_config(&self) -> Result<SiteConfig> {
        let urls: Vec<&str> = self.index_urls.iter().map(String::as_str).collect();
        SiteConfig::new(&self.key, &urls, self.base_url.as_deref())
            .map_err(|e| DocsError::Config(format!("site {:?}: {e}", self.key)))
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Configured documentation sites, in tool registration order.
    pub sites: Vec<SiteEntry>,
    /// Fetch, wait and ranking settings.
    pub search: SearchConfig,
}

impl DocsConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DocsError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| DocsError::Config(format!("invalid {}: {e}", path.display())))
    }

    /// Default config file path: `<config dir>/lunr-docs/config.toml`.
    ///
    /// `None` when the platform has no config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lunr-docs").join("config.toml"))
    }

    /// Add `entries`, replacing any existing site with the same key in place.
    pub fn merge_sites(&mut self, entries: Vec<SiteEntry>) {
        for entry in entries {
            match self.sites.iter_mut().find(|site| site.key == entry.key) {
                Some(existing) => *existing = entry,
                None => self.sites.push(entry),
            }
        }
    }

    /// Validate everything and produce the core's site configurations.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::Config`] if no site is configured, any entry is
    /// invalid, or the search settings are invalid.
    pub fn site_configs(&self) -> Result<Vec<SiteConfig>> {
        self.search
            .validate()
            .map_err(|e| DocsError::Config(e.to_string()))?;
        if self.sites.is_empty() {
            return Err(DocsError::Config(format!(
                "no documentation sites configured; set {SITES_ENV}=key=url, pass --site, or add [[sites]] to the config file"
            )));
        }
        self.sites.iter().map(SiteEntry::to_site_config).collect()
    }
}

/// Parse one `key=url[|url2]` entry.
///
/// # Errors
///
/// Returns [`DocsError::Config`] when the `=` separator, the key or the URL
/// is missing.
pub fn parse_site_entry(raw: &str) -> Result<SiteEntry> {
    let (key, urls) = raw
        .split_once('=')
        .ok_or_else(|| DocsError::Config(format!("site entry {raw:?} must look like key=url")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(DocsError::Config(format!("site entry {raw:?} has an empty key")));
    }
    let index_urls: Vec<String> = urls
        .split('|')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_owned)
        .collect();
    if index_urls.is_empty() {
        return Err(DocsError::Config(format!("site entry {raw:?} has no index URL")));
    }
    Ok(SiteEntry {
        key: key.to_owned(),
        index_urls,
        base_url: None,
    })
}

/// Parse a comma-separated list of `key=url[|url2]` entries, as found in
/// `LUNR_SITES`. Blank entries are skipped.
///
/// # Errors
///
/// Returns [`DocsError::Config`] for the first malformed entry.
pub fn parse_site_list(raw: &str) -> Result<Vec<SiteEntry>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_site_entry)
        .collect()
}

/// Where configuration may come from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Explicit config file; it must exist.
    pub file: Option<PathBuf>,
    /// Fallback config file, used only if it exists.
    pub default_file: Option<PathBuf>,
    /// Raw value of `LUNR_SITES`, if set.
    pub env_sites: Option<String>,
    /// Raw `--site` flag values.
    pub cli_sites: Vec<String>,
}

impl ConfigSources {
    /// Sources for this process: `LUNR_SITES` and the default file location.
    pub fn from_env(file: Option<PathBuf>, cli_sites: Vec<String>) -> Self {
        Self {
            file,
            default_file: DocsConfig::default_config_path(),
            env_sites: std::env::var(SITES_ENV).ok(),
            cli_sites,
        }
    }

    /// Layer every source into one configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::Config`] if an explicit file is missing or any
    /// source is malformed. Completeness is checked by
    /// [`DocsConfig::site_configs`].
    pub fn load(&self) -> Result<DocsConfig> {
        let mut config = match (&self.file, &self.default_file) {
            (Some(path), _) => DocsConfig::from_file(path)?,
            (None, Some(path)) if path.is_file() => {
                tracing::debug!(path = %path.display(), "using default config file");
                DocsConfig::from_file(path)?
            }
            _ => DocsConfig::default(),
        };

        if let Some(raw) = &self.env_sites {
            config.merge_sites(parse_site_list(raw)?);
        }
        let cli = self
            .cli_sites
            .iter()
            .map(|raw| parse_site_entry(raw))
            .collect::<Result<Vec<_>>>()?;
        config.merge_sites(cli);

        Ok(config)
    }
}
