//! End-to-end runs against a throwaway cache store, with `sh` one-liners
//! standing in for the render collaborator and the purge tool.

use crate::error::ErrorKind;
use crate::{Action, Context, Reason, RunEvent, Summary, process_entry, run};
use cachepress_config::{CommandSettings, Config, Settings};
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prints the page it was given.
const RENDER: &[&str] = &["sh", "-c", "cat \"${1#file://}\"", "render"];
/// Keeps one rule, whatever it was given.
const PURGE: &[&str] = &["sh", "-c", r#"echo '[{"css":"body { color: #ff0000 }","file":"all.css"}]'"#, "purge"];
const FAILING: &[&str] = &["sh", "-c", "exit 1", "fail"];

fn page(head: &str, body: &str) -> String {
    let filler = "<p>Lorem ipsum dolor sit amet.</p>\n".repeat(400);
    format!("<!DOCTYPE html>\n<html><head><title>Test</title>{head}</head><body>{body}\n{filler}</body></html>")
}

fn styled_page(body: &str) -> String {
    page(
        concat!(
            r#"<link rel="stylesheet" href="https://example.com/wp-content/themes/t/style.css?ver=1">"#,
            "<style>h1{margin:0}</style>",
            r#"<script src="/wp-content/themes/t/app.js"></script>"#,
        ),
        body,
    )
}

struct Site {
    mount: TempDir,
    scratch: TempDir,
}

impl Site {
    fn new() -> Self {
        let site = Self { mount: tempfile::tempdir().unwrap(), scratch: tempfile::tempdir().unwrap() };
        let theme = site.mount.path().join("wp-content/themes/t");
        fs::create_dir_all(&theme).unwrap();
        fs::write(theme.join("style.css"), "body { color: red } .unused { color: blue }").unwrap();
        site
    }

    fn cache_root(&self) -> PathBuf {
        self.mount.path().join("wp-content/cache/wp-rocket")
    }

    fn add_page(&self, url_path: &str, html: &str) -> PathBuf {
        let dir = self.cache_root().join("example.com").join(url_path.trim_matches('/'));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("index-https.html");
        fs::write(&path, html).unwrap();
        path
    }

    fn settings(&self, render: &[&str], purge: &[&str]) -> Settings {
        let strings = |command: &[&str]| -> Vec<String> { command.iter().map(ToString::to_string).collect() };
        Settings {
            domain: Some("example.com".to_string()),
            mount_path: Some(self.mount.path().to_path_buf()),
            lock_file: Some(self.mount.path().join("cachepress.lock")),
            render: CommandSettings { command: strings(render), timeout: Some(5) },
            purge: CommandSettings { command: strings(purge), timeout: Some(5) },
            ..Settings::default()
        }
    }

    fn context_from(&self, settings: Settings, dry_run: bool) -> Context {
        let config = Config::try_from(settings).unwrap();
        Context::new(config, dry_run).unwrap().with_scratch_root(self.scratch.path())
    }

    fn context_with(&self, render: &[&str], purge: &[&str], dry_run: bool) -> Context {
        self.context_from(self.settings(render, purge), dry_run)
    }

    fn context(&self) -> Context {
        self.context_with(RENDER, PURGE, false)
    }
}

fn gzip_sibling(path: &Path) -> PathBuf {
    let mut sibling = path.as_os_str().to_owned();
    sibling.push("_gzip");
    PathBuf::from(sibling)
}

fn gunzip(path: &Path) -> String {
    let mut decoded = String::new();
    GzDecoder::new(fs::File::open(path).unwrap()).read_to_string(&mut decoded).unwrap();
    decoded
}

#[test]
fn page_is_optimised_once() {
    let site = Site::new();
    let path = site.add_page("/", &styled_page(r#"<a href="/">Home</a><a href="/missing/">Gone</a>"#));
    let ctx = site.context();

    let action = process_entry(&ctx, &path).unwrap();
    assert!(matches!(action, Action::Optimised { inlined_css, .. } if inlined_css > 0), "{action:?}");
    let optimised = fs::read_to_string(&path).unwrap();
    assert!(optimised.contains("<title>Test</title><style>body{color:red}</style>"), "{optimised}");
    assert!(!optimised.contains("style.css"));
    assert!(optimised.contains(r#"<a data-is-rocket-cached="1" href="/">Home</a>"#));
    assert!(optimised.contains(r#"<a href="/missing/">Gone</a>"#));
    assert!(optimised.contains(r#"data-rocket-src="/wp-content/themes/t/app.js""#));
    assert!(optimised.contains("<!-- Optimised by cachepress @"));
    assert_eq!(gunzip(&gzip_sibling(&path)), optimised);

    assert_eq!(process_entry(&ctx, &path).unwrap(), Action::Unchanged(Reason::AlreadyOptimised));
    assert_eq!(fs::read_to_string(&path).unwrap(), optimised);
    // Scratch directories never outlive their page.
    assert_eq!(fs::read_dir(site.scratch.path()).unwrap().count(), 0);
}

#[test]
fn optimised_pages_only_gain_annotations() {
    let site = Site::new();
    let path = site.add_page("/", &styled_page(r#"<a href="https://example.com/later/">Later</a>"#));
    let ctx = site.context();
    process_entry(&ctx, &path).unwrap();
    let before = fs::read_to_string(&path).unwrap();
    assert!(!before.contains("data-is-rocket-cached"));

    site.add_page("/later/", &styled_page(""));
    assert_eq!(process_entry(&ctx, &path).unwrap(), Action::Annotated { links: 1 });
    let after = fs::read_to_string(&path).unwrap();
    assert_eq!(after.matches("<!-- Optimised by cachepress @").count(), 1);
    assert_eq!(after.replace(r#" data-is-rocket-cached="1""#, ""), before);

    assert_eq!(process_entry(&ctx, &path).unwrap(), Action::Unchanged(Reason::AlreadyOptimised));
    assert_eq!(fs::read_to_string(&path).unwrap(), after);
}

#[test]
fn noscript_fallbacks_survive_verbatim() {
    let site = Site::new();
    let noscript = concat!(
        r#"<noscript><style id="rocket-lazyload-nojs-css">"#,
        ".rll-youtube-player, [data-lazy-src]{display:none !important;}",
        "</style></noscript>",
    );
    let path = site.add_page("/", &styled_page(noscript));

    let action = process_entry(&site.context(), &path).unwrap();
    assert!(matches!(action, Action::Optimised { .. }), "{action:?}");
    let optimised = fs::read_to_string(&path).unwrap();
    assert!(optimised.contains(noscript), "{optimised}");
    assert!(!optimised.contains("&lt;style"));
}

#[test]
fn partial_purge_output_is_combined_with_render_hints() {
    let site = Site::new();
    fs::write(site.mount.path().join("extra.css"), ".extra { padding: 0 }").unwrap();
    let render: &[&str] = &[
        "sh",
        "-c",
        r##"cat "${1#file://}"; echo '<!-- FONTS["/f/a.woff","/f/a.woff2"]--><style data-intrinsic-lc>.lc{width:1px}</style>'"##,
        "render",
    ];
    let purge: &[&str] = &[
        "sh",
        "-c",
        concat!(
            "printf '%s\\n' ",
            r#"'[{"css":"body { color: red }","file":"all.css"}]' "#,
            "'not json' ",
            r#"'{"file":"inline.css"}' "#,
            r#"'{"css":"h1 { margin: 0 }","file":"inline.css"}'"#,
        ),
        "purge",
    ];
    let mut settings = site.settings(render, purge);
    settings.supplemental_css = Some(site.mount.path().join("extra.css"));
    let ctx = site.context_from(settings, false);
    let path = site.add_page("/", &styled_page(""));

    let action = process_entry(&ctx, &path).unwrap();
    assert!(matches!(action, Action::Optimised { .. }), "{action:?}");
    let optimised = fs::read_to_string(&path).unwrap();
    assert!(
        optimised.contains(r#"<title>Test</title><link as="font" crossorigin="" href="/f/a.woff2" rel="preload">"#),
        "{optimised}"
    );
    assert!(optimised.contains("<style>body{color:red}h1{margin:0}.lc{width:1px}.extra{padding:0}</style>"), "{optimised}");
    assert!(!optimised.contains("/f/a.woff\""));
    assert!(!optimised.contains("data-intrinsic-lc"));
}

#[test]
fn pages_without_css_are_left_alone() {
    let site = Site::new();
    let html = page(r#"<style rel="noscript">.lazy{display:none}</style>"#, "");
    let path = site.add_page("/plain/", &html);
    assert_eq!(process_entry(&site.context(), &path).unwrap(), Action::Unchanged(Reason::NoCssFound));
    assert_eq!(fs::read_to_string(&path).unwrap(), html);
}

#[test]
fn not_found_pages_are_left_alone() {
    let site = Site::new();
    let html = styled_page("<h1>Error 404</h1>");
    let path = site.add_page("/404/", &html);
    assert_eq!(process_entry(&site.context(), &path).unwrap(), Action::Unchanged(Reason::NotFoundPage));
    assert_eq!(fs::read_to_string(&path).unwrap(), html);
}

#[test]
fn short_not_found_pages_are_left_alone() {
    let site = Site::new();
    let html = "<html><body><h1>Error 404</h1></body></html>";
    let path = site.add_page("/gone/", html);
    assert_eq!(process_entry(&site.context(), &path).unwrap(), Action::Unchanged(Reason::NotFoundPage));
    assert_eq!(fs::read_to_string(&path).unwrap(), html);
}

#[test]
fn pages_that_are_not_utf8_are_left_alone() {
    let site = Site::new();
    let path = site.add_page("/latin1/", "");
    let mut bytes = styled_page("<h1>Caf\u{0}</h1>").into_bytes();
    let nul = bytes.iter().position(|&byte| byte == 0).unwrap();
    bytes[nul] = 0xE9;
    fs::write(&path, &bytes).unwrap();

    let err = process_entry(&site.context(), &path).unwrap_err();
    assert_eq!(*err, ErrorKind::MalformedHtml);
    assert_eq!(fs::read(&path).unwrap(), bytes);
    assert!(!gzip_sibling(&path).exists());
}

#[test]
fn rewrites_that_fail_validation_are_not_written() {
    let site = Site::new();
    // All the page's weight is in a stylesheet the purge tool throws away.
    let rules: String = (0..600).map(|i| format!(".unused-{i}{{color:blue}}\n")).collect();
    let html = format!(
        "<!DOCTYPE html>\n<html><head><title>Big</title><style>{rules}</style></head><body><h1>Hi</h1></body></html>"
    );
    assert!(html.len() > cachepress_html::MIN_DOCUMENT_SIZE);
    let path = site.add_page("/big/", &html);

    let err = process_entry(&site.context(), &path).unwrap_err();
    assert_eq!(*err, ErrorKind::MalformedHtml);
    assert_eq!(fs::read_to_string(&path).unwrap(), html);
    assert!(!gzip_sibling(&path).exists());
}

#[test]
fn failures_leave_the_file_untouched() {
    let site = Site::new();
    let truncated = "<!DOCTYPE html><html><head><style></style></head><body>cut off";
    let short = site.add_page("/short/", truncated);
    let html = styled_page("");
    let path = site.add_page("/", &html);

    let err = process_entry(&site.context(), &short).unwrap_err();
    assert_eq!(*err, ErrorKind::MalformedHtml);
    assert_eq!(fs::read_to_string(&short).unwrap(), truncated);

    let err = process_entry(&site.context_with(FAILING, PURGE, false), &path).unwrap_err();
    assert_eq!(*err, ErrorKind::RenderUnavailable);
    let err = process_entry(&site.context_with(RENDER, FAILING, false), &path).unwrap_err();
    assert_eq!(*err, ErrorKind::PurgeUnavailable);
    assert_eq!(fs::read_to_string(&path).unwrap(), html);
    assert!(!gzip_sibling(&path).exists());
}

#[test]
fn dry_run_writes_nothing() {
    let site = Site::new();
    let html = styled_page("");
    let path = site.add_page("/", &html);
    let empty = site.add_page("/empty/", "");
    let ctx = site.context_with(RENDER, PURGE, true);

    let mut summary = Summary::default();
    run(&ctx, &mut summary).unwrap();
    assert_eq!(summary.optimised, 1);
    assert_eq!(summary.evicted, 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), html);
    assert!(empty.exists());
}

#[test]
fn run_reports_every_page_in_order() {
    let site = Site::new();
    let home = site.add_page("/", &styled_page(""));
    let deep = site.add_page("/blog/a-long-post-name/", &styled_page(""));
    let empty = site.add_page("/empty/", "");
    fs::write(gzip_sibling(&empty), "").unwrap();
    let short = site.add_page("/short/", "<html>");
    // Stale artifacts of a crashed run.
    fs::create_dir(site.scratch.path().join("cachepress-stale")).unwrap();

    let mut events = Vec::new();
    run(&site.context(), &mut |event: RunEvent| events.push(event)).unwrap();

    assert!(matches!(events.first(), Some(RunEvent::Started)));
    assert!(matches!(events.get(1), Some(RunEvent::DiscoveryComplete(3))));
    assert!(matches!(events.last(), Some(RunEvent::Complete)));
    let processed: Vec<(PathBuf, Option<ErrorKind>)> = events
        .iter()
        .filter_map(|event| match event {
            RunEvent::Processed { path, outcome } => Some((path.clone(), outcome.as_ref().err().map(|err| **err))),
            _ => None,
        })
        .collect();
    assert_eq!(processed, vec![(home, None), (short, Some(ErrorKind::MalformedHtml)), (deep, None)]);
    assert!(events.iter().any(|event| matches!(event, RunEvent::Evicted(path) if *path == empty)));
    assert!(!empty.exists());
    assert!(!gzip_sibling(&empty).exists());
    assert_eq!(fs::read_dir(site.scratch.path()).unwrap().count(), 0);
}

#[test]
fn missing_tools_fail_setup() {
    let site = Site::new();
    let settings = Settings {
        domain: Some("example.com".to_string()),
        mount_path: Some(site.mount.path().to_path_buf()),
        render: CommandSettings { command: vec!["cachepress-no-such-renderer".to_string()], timeout: None },
        ..Settings::default()
    };
    let err = Context::new(Config::try_from(settings).unwrap(), false).unwrap_err();
    assert_eq!(*err, ErrorKind::Setup);
}
