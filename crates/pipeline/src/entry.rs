use crate::context::Context;
use crate::error::{ErrorKind, Result};
use crate::scratch::Scratch;
use cachepress_html::sources::collect;
use cachepress_html::{Document, Rewrite, annotate_anchors, collect_fonts, is_not_found, validate};
use cachepress_render::CombinedCss;
use cachepress_storage::write_with_variant;
use exn::ResultExt;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use tracing::instrument;

/// Why a valid page was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// Carries the footprint and has no new links to annotate.
    AlreadyOptimised,
    /// No stylesheet link resolved and no inline style to purge.
    NoCssFound,
    /// The cache's copy of the "not found" page.
    NotFoundPage,
}

impl Display for Reason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Reason::AlreadyOptimised => "already optimised",
            Reason::NoCssFound => "no CSS found",
            Reason::NotFoundPage => "404 page",
        })
    }
}

/// The outcome of (successfully) handling a single cached page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Critical CSS inlined and scripts deferred. Sizes are in bytes.
    Optimised { original_css: usize, inlined_css: usize },
    /// An already optimised page gained cache-status annotations.
    Annotated { links: usize },
    Unchanged(Reason),
}

impl Action {
    /// Percentage by which the page's CSS shrank.
    pub fn reduction(&self) -> Option<f64> {
        match self {
            Action::Optimised { original_css, inlined_css } if *original_css > 0 => {
                Some(100.0 * (1.0 - *inlined_css as f64 / *original_css as f64))
            },
            _ => None,
        }
    }
}

/// Optimise one cached page in place.
///
/// The file is only replaced when the page was a complete UTF-8 document
/// before and is still one after rewriting; on any error it is left exactly
/// as it was. Pages that already carry the footprint only get new links annotated.
#[instrument(skip(ctx, path), fields(path = %path.display()))]
pub fn process_entry(ctx: &Context, path: &Path) -> Result<Action> {
    let bytes = std::fs::read(path).or_raise(|| ErrorKind::Read)?;
    // Rewriting a page in another encoding would corrupt every non-ASCII byte.
    let original = String::from_utf8(bytes).or_raise(|| ErrorKind::MalformedHtml)?;
    if is_not_found(&original) {
        return Ok(Action::Unchanged(Reason::NotFoundPage));
    }
    validate(&original).or_raise(|| ErrorKind::MalformedHtml)?;

    let mut document = Document::parse(&original);
    let state = document.state(&ctx.config.footprint);
    if state.is_processed() {
        tracing::debug!(?state, "Page already optimised");
        return annotate(ctx, path, document);
    }

    let mut scratch = Scratch::new_in(&ctx.scratch_root).or_raise(|| ErrorKind::Scratch)?;
    let sources = collect(&mut document, &ctx.config.domain, &ctx.config.site_root, |content| {
        scratch.write("inline.css", content)
    })
    .or_raise(|| ErrorKind::Scratch)?;
    if sources.is_empty() {
        return Ok(Action::Unchanged(Reason::NoCssFound));
    }
    let original_css: String = sources.iter().map(|source| source.content.as_str()).collect();

    let rendered = ctx.renderer.render(path, &ctx.config.host).or_raise(|| ErrorKind::RenderUnavailable)?;
    let content_path = scratch
        .write("content.html", format!("{}{original}", rendered.html))
        .or_raise(|| ErrorKind::Scratch)?;
    let css_path = scratch.write("original.css", &original_css).or_raise(|| ErrorKind::Scratch)?;
    let fragments = ctx.purger.purge(&css_path, &content_path).or_raise(|| ErrorKind::PurgeUnavailable)?;

    let css = CombinedCss::new()
        .with_fragments(fragments)
        .with_intrinsic(rendered.intrinsic_css)
        .with_supplemental(ctx.supplemental_css.as_deref())
        .finish(&rendered.font_imports);
    let fonts = collect_fonts(&rendered.fonts);
    let lookup = |url: &str| ctx.is_cached(url);
    Rewrite::new(&ctx.config.footprint)
        .with_css(&css)
        .with_fonts(&fonts)
        .with_font_imports(&rendered.font_imports)
        .with_substitutions(&ctx.substitutions)
        .with_cache(&lookup)
        .with_preload_delay(ctx.config.preload_delay)
        .apply(&mut document)
        .or_raise(|| ErrorKind::MalformedHtml)?;

    let optimised = document.html();
    validate(&optimised).or_raise(|| ErrorKind::MalformedHtml)?;
    write(ctx, path, &optimised)?;
    Ok(Action::Optimised { original_css: original_css.len(), inlined_css: css.len() })
}

/// Annotate links on a page that has already been optimised. Never touches
/// its CSS, scripts or footprint.
fn annotate(ctx: &Context, path: &Path, mut document: Document) -> Result<Action> {
    let lookup = |url: &str| ctx.is_cached(url);
    let links = annotate_anchors(&mut document, &lookup);
    if links == 0 {
        return Ok(Action::Unchanged(Reason::AlreadyOptimised));
    }
    let annotated = document.html();
    validate(&annotated).or_raise(|| ErrorKind::MalformedHtml)?;
    write(ctx, path, &annotated)?;
    Ok(Action::Annotated { links })
}

fn write(ctx: &Context, path: &Path, html: &str) -> Result<()> {
    if ctx.dry_run {
        tracing::info!(path = %path.display(), size = html.len(), "Dry run; not writing");
        return Ok(());
    }
    write_with_variant(path, html.as_bytes(), ctx.variant()).or_raise(|| ErrorKind::WriteFailure)
}
