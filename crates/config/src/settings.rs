use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub(crate) const DEFAULT_CACHE_PATH: &str = "wp-content/cache/wp-rocket";
pub(crate) const DEFAULT_STATUS_FILE: &str = "statusfile.txt";
pub(crate) const DEFAULT_FOOTPRINT: &str = "Optimised by cachepress";

/// Raw, unvalidated settings as they come out of the merged configuration
/// sources.
///
/// Every key is optional here; [`Config::try_from`](crate::Config) applies
/// defaults and rejects anything unusable. The aliases accept the variable
/// names used by older deployments of the cache optimiser, so an existing
/// environment file can be loaded as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub domain: Option<String>,
    pub host: Option<String>,
    #[serde(alias = "mount")]
    pub mount_path: Option<PathBuf>,
    #[serde(alias = "rocket_cache_path")]
    pub cache_path: Option<PathBuf>,
    #[serde(alias = "wordpress_path")]
    pub site_path: Option<PathBuf>,
    #[serde(alias = "enable_log")]
    pub write_log: bool,
    pub status_file: Option<PathBuf>,
    pub lock_file: Option<PathBuf>,
    #[serde(alias = "footer_comment")]
    pub footprint: Option<String>,
    #[serde(alias = "img_dataimg")]
    pub img_placeholder: Option<String>,
    pub logo_dark_selector: Option<String>,
    #[serde(alias = "logo_dark_dataimg")]
    pub logo_dark_image: Option<String>,
    pub logo_light_selector: Option<String>,
    #[serde(alias = "logo_light_dataimg")]
    pub logo_light_image: Option<String>,
    /// Milliseconds.
    pub preload_delay: Option<u64>,
    #[serde(alias = "force_css")]
    pub supplemental_css: Option<PathBuf>,
    pub render: CommandSettings,
    pub purge: CommandSettings,
    /// Defaults to `true` when unset.
    pub gzip: Option<bool>,
}

/// An external command: the argv prefix and a timeout in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CommandSettings {
    pub command: Vec<String>,
    pub timeout: Option<u64>,
}
