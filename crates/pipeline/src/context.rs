use crate::error::{ErrorKind, Result};
use cachepress_compress::Compression;
use cachepress_config::Config;
use cachepress_html::Substitutions;
use cachepress_render::{Purger, Renderer, load_supplemental};
use cachepress_storage::CacheProbe;
use exn::ResultExt;
use std::path::PathBuf;

/// Everything a run needs, prepared once: configuration, the resolved
/// external tools and the compiled image substitutions.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub probe: CacheProbe,
    pub substitutions: Substitutions,
    pub renderer: Renderer,
    pub purger: Purger,
    /// Curated stylesheet appended to every page, read once per run.
    pub supplemental_css: Option<String>,
    /// Do everything except replace or delete cache files.
    pub dry_run: bool,
    /// Where per-page scratch directories are created (and stale ones swept).
    pub scratch_root: PathBuf,
}

impl Context {
    #[tracing::instrument(skip_all, fields(domain = %config.domain, dry_run))]
    pub fn new(config: Config, dry_run: bool) -> Result<Self> {
        let renderer = Renderer::try_from(&config.render).or_raise(|| ErrorKind::Setup)?;
        let purger = Purger::try_from(&config.purge).or_raise(|| ErrorKind::Setup)?;
        let mut substitutions = Substitutions::new(config.img_placeholder.clone());
        for logo in [&config.logo_dark, &config.logo_light].into_iter().flatten() {
            substitutions = substitutions.with_selector(&logo.selector, &logo.image).or_raise(|| ErrorKind::Setup)?;
        }
        let supplemental_css = config.supplemental_css.as_deref().and_then(load_supplemental);
        Ok(Self {
            probe: CacheProbe::new(&config.cache_root, &config.domain),
            substitutions,
            renderer,
            purger,
            supplemental_css,
            dry_run,
            scratch_root: std::env::temp_dir(),
            config,
        })
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    /// Format of the sibling written next to every replaced page.
    pub fn variant(&self) -> Compression {
        match self.config.gzip {
            true => Compression::Gzip,
            false => Compression::None,
        }
    }

    pub(crate) fn is_cached(&self, url: &str) -> bool {
        self.probe.is_cached(url)
    }
}
