use crate::css::minify_css;
use crate::error::{ErrorKind, Result};
use crate::process::ExternalCommand;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use cachepress_config::CommandConfig;
use cachepress_html::FontImport;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::instrument;

static INTRINSIC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<style data-intrinsic-lc[^>]*>(.*?)</style>").unwrap());
static FONTS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!-- FONTS(.*?)-->").unwrap());
static FONT_IMPORTS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!-- GOOGLEFONTS(.*?)-->").unwrap());

/// What the render collaborator reported about a page, with its markers
/// removed from `html`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderResult {
    /// The rendered DOM, used as purge content.
    pub html: String,
    /// Every font file the page requested.
    pub fonts: Vec<String>,
    /// External font stylesheets the page imported, already minified.
    pub font_imports: Vec<FontImport>,
    /// Sizing hints for below-the-fold sections.
    pub intrinsic_css: Option<String>,
}

impl RenderResult {
    /// Split the collaborator's stdout into the rendered page and its
    /// metadata markers. A marker whose payload can't be decoded is dropped.
    pub fn parse(stdout: &str) -> Self {
        let intrinsic_css = INTRINSIC_REGEX
            .captures(stdout)
            .and_then(|captures| captures.get(1))
            .map(|css| css.as_str().to_string())
            .filter(|css| !css.trim().is_empty());
        let fonts = FONTS_REGEX
            .captures(stdout)
            .and_then(|captures| captures.get(1))
            .and_then(|json| match serde_json::from_str::<Vec<String>>(json.as_str()) {
                Ok(fonts) => Some(fonts),
                Err(err) => {
                    tracing::warn!(error = %err, "Ignoring malformed font list");
                    None
                },
            })
            .unwrap_or_default();
        let font_imports = FONT_IMPORTS_REGEX
            .captures(stdout)
            .and_then(|captures| captures.get(1))
            .map(|json| decode_font_imports(json.as_str()))
            .unwrap_or_default();

        let html = INTRINSIC_REGEX.replace_all(stdout, "");
        let html = FONTS_REGEX.replace_all(&html, "");
        let html = FONT_IMPORTS_REGEX.replace_all(&html, "").into_owned();
        Self { html, fonts, font_imports, intrinsic_css }
    }
}

fn decode_font_imports(json: &str) -> Vec<FontImport> {
    let encoded: BTreeMap<String, String> = match serde_json::from_str(json) {
        Ok(map) => map,
        Err(err) => {
            tracing::warn!(error = %err, "Ignoring malformed font import map");
            return Vec::new();
        },
    };
    encoded
        .into_iter()
        .filter_map(|(source, css)| {
            let decoded = BASE64.decode(css.trim()).ok().and_then(|bytes| String::from_utf8(bytes).ok());
            let Some(css) = decoded else {
                tracing::debug!(source, "Ignoring undecodable font stylesheet");
                return None;
            };
            let css = minify_css(&css).unwrap_or(css);
            Some(FontImport { source, css })
        })
        .collect()
}

/// Drives the headless-browser script that renders a cached page.
#[derive(Debug, Clone)]
pub struct Renderer {
    command: ExternalCommand,
}

impl Renderer {
    pub fn new(command: &[String], timeout: Duration) -> Result<Self> {
        Ok(Self { command: ExternalCommand::resolve(command, timeout)? })
    }

    /// Render `page` (a file on disk) as if it were served from `host`.
    #[instrument(skip(self), fields(page = %page.display(), html_size))]
    pub fn render(&self, page: &Path, host: &str) -> Result<RenderResult> {
        let url = format!("file://{}", page.display());
        let stdout = self.command.run([url.as_str(), host])?;
        let stdout = String::from_utf8_lossy(&stdout);
        if stdout.trim().is_empty() {
            exn::bail!(ErrorKind::EmptyOutput);
        }
        let result = RenderResult::parse(&stdout);
        tracing::Span::current().record("html_size", result.html.len());
        Ok(result)
    }
}

impl TryFrom<&CommandConfig> for Renderer {
    type Error = crate::error::Error;
    fn try_from(config: &CommandConfig) -> std::result::Result<Self, Self::Error> {
        Ok(Self { command: ExternalCommand::try_from(config)? })
    }
}
