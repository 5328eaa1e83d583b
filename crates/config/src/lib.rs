//! Configuration for a cachepress run.
//!
//! Settings are merged with `figment` from (lowest to highest precedence):
//!
//! 1. Built-in defaults
//! 2. A configuration file: the one given on the command line, otherwise
//!    `config.toml` in the platform configuration directory (if it exists).
//!    TOML, YAML and JSON are accepted, chosen by file extension.
//! 3. Environment variables prefixed with `CACHEPRESS_`; nested keys use a
//!    double underscore (`CACHEPRESS_RENDER__TIMEOUT=60`).
//!
//! The result is validated once into an immutable [`Config`] that the rest of
//! the run borrows.

pub mod error;
mod settings;

use crate::error::{ErrorKind, Result};
use crate::settings::{DEFAULT_CACHE_PATH, DEFAULT_FOOTPRINT, DEFAULT_STATUS_FILE};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use crate::settings::{CommandSettings, Settings};

pub const ENV_PREFIX: &str = "CACHEPRESS_";
const APPLICATION: &str = "cachepress";
const DEFAULT_RENDER_COMMAND: [&str; 2] = ["node", "page-local.js"];
const DEFAULT_RENDER_TIMEOUT: u64 = 30;
const DEFAULT_PURGE_COMMAND: [&str; 1] = ["purgecss"];
const DEFAULT_PURGE_TIMEOUT: u64 = 120;

/// Validated, immutable configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Target domain, lowercase, without scheme or path.
    pub domain: String,
    /// Host handed to the render command.
    pub host: String,
    pub cache_root: PathBuf,
    pub site_root: PathBuf,
    pub write_log: bool,
    /// Absolute path of the run log / last-run marker.
    pub status_file: PathBuf,
    pub lock_file: PathBuf,
    pub footprint: String,
    pub img_placeholder: Option<String>,
    pub logo_dark: Option<LogoSubstitution>,
    pub logo_light: Option<LogoSubstitution>,
    pub preload_delay: Option<u64>,
    pub supplemental_css: Option<PathBuf>,
    pub render: CommandConfig,
    pub purge: CommandConfig,
    pub gzip: bool,
}

/// Replace the `src` of images matching `selector` with `image`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoSubstitution {
    pub selector: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandConfig {
    pub command: Vec<String>,
    pub timeout: Duration,
}

impl Config {
    /// Load and validate configuration from every source.
    ///
    /// An explicitly named file must exist; the default location is optional.
    #[tracing::instrument]
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        match explicit {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => figment = merge_file(figment, path),
            None => {
                if let Some(path) = default_config_path().filter(|path| path.is_file()) {
                    tracing::debug!(path = %path.display(), "Using default configuration file");
                    figment = merge_file(figment, &path);
                }
            },
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(&figment)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let settings: Settings = figment.extract().or_raise(|| ErrorKind::Load)?;
        Self::try_from(settings)
    }
}

impl TryFrom<Settings> for Config {
    type Error = error::Error;

    fn try_from(settings: Settings) -> Result<Self> {
        let domain = settings
            .domain
            .map(|domain| domain.trim().to_lowercase())
            .filter(|domain| !domain.is_empty())
            .ok_or_raise(|| ErrorKind::Missing("domain"))?;
        if domain.contains(['/', ':', '?', '#']) || domain.contains(char::is_whitespace) {
            exn::bail!(ErrorKind::invalid("domain", "expected a bare host name, without scheme or path"));
        }
        let host = settings.host.filter(|host| !host.trim().is_empty()).unwrap_or_else(|| domain.clone());

        let mount = settings.mount_path.unwrap_or_else(|| PathBuf::from("/"));
        let cache_root = under_mount(&mount, settings.cache_path.as_deref().unwrap_or(Path::new(DEFAULT_CACHE_PATH)));
        let site_root = settings.site_path.map_or_else(|| mount.clone(), |path| under_mount(&mount, &path));
        let status_file = cache_root.join(settings.status_file.as_deref().unwrap_or(Path::new(DEFAULT_STATUS_FILE)));
        let lock_file = settings.lock_file.unwrap_or_else(|| std::env::temp_dir().join(format!("{APPLICATION}.lock")));

        let footprint = settings.footprint.unwrap_or_else(|| DEFAULT_FOOTPRINT.to_string());
        if footprint.trim().is_empty() {
            exn::bail!(ErrorKind::invalid("footprint", "must not be empty"));
        }
        if footprint.contains("--") {
            exn::bail!(ErrorKind::invalid("footprint", "must not contain \"--\""));
        }

        Ok(Self {
            logo_dark: logo("logo_dark", settings.logo_dark_selector, settings.logo_dark_image)?,
            logo_light: logo("logo_light", settings.logo_light_selector, settings.logo_light_image)?,
            render: command("render", settings.render, &DEFAULT_RENDER_COMMAND, DEFAULT_RENDER_TIMEOUT)?,
            purge: command("purge", settings.purge, &DEFAULT_PURGE_COMMAND, DEFAULT_PURGE_TIMEOUT)?,
            img_placeholder: settings.img_placeholder.filter(|image| !image.trim().is_empty()),
            preload_delay: settings.preload_delay,
            supplemental_css: settings.supplemental_css,
            write_log: settings.write_log,
            gzip: settings.gzip.unwrap_or(true),
            domain,
            host,
            cache_root,
            site_root,
            status_file,
            lock_file,
            footprint,
        })
    }
}

/// `config.toml` inside the platform configuration directory.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APPLICATION).map(|dirs| dirs.config_dir().join("config.toml"))
}

fn merge_file(figment: Figment, path: &Path) -> Figment {
    match path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase).as_deref() {
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => figment.merge(Toml::file(path)),
    }
}

fn under_mount(mount: &Path, path: &Path) -> PathBuf {
    mount.join(path.strip_prefix("/").unwrap_or(path))
}

fn logo(
    field: &'static str,
    selector: Option<String>,
    image: Option<String>,
) -> Result<Option<LogoSubstitution>> {
    let selector = selector.filter(|s| !s.trim().is_empty());
    let image = image.filter(|s| !s.trim().is_empty());
    match (selector, image) {
        (Some(selector), Some(image)) => Ok(Some(LogoSubstitution { selector, image })),
        (None, None) => Ok(None),
        _ => exn::bail!(ErrorKind::invalid(field, "selector and image must be set together")),
    }
}

fn command(
    field: &'static str,
    settings: CommandSettings,
    default_command: &[&str],
    default_timeout: u64,
) -> Result<CommandConfig> {
    let command = if settings.command.is_empty() {
        default_command.iter().map(|arg| (*arg).to_string()).collect()
    } else {
        settings.command
    };
    if command[0].trim().is_empty() {
        exn::bail!(ErrorKind::invalid(field, "command program must not be empty"));
    }
    let timeout = settings.timeout.unwrap_or(default_timeout);
    if timeout == 0 {
        exn::bail!(ErrorKind::invalid(field, "timeout must be greater than zero"));
    }
    Ok(CommandConfig { command, timeout: Duration::from_secs(timeout) })
}
