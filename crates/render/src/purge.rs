use crate::error::Result;
use crate::process::ExternalCommand;
use cachepress_config::CommandConfig;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

/// The rules the purge tool kept from one stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PurgeFragment {
    pub file: String,
    pub css: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PurgeLine {
    Many(Vec<serde_json::Value>),
    One(serde_json::Value),
}

/// Parse the purge tool's stdout: one JSON document per line, either an
/// array of fragments or a single fragment.
///
/// Lines and records that don't parse, or lack `file` or `css`, are dropped.
pub fn parse_purge_output(stdout: &str) -> Vec<PurgeFragment> {
    let mut fragments = Vec::new();
    for line in stdout.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let records = match serde_json::from_str::<PurgeLine>(line) {
            Ok(PurgeLine::Many(records)) => records,
            Ok(PurgeLine::One(record)) => vec![record],
            Err(err) => {
                tracing::debug!(error = %err, "Dropping unparseable purge output line");
                continue;
            },
        };
        for record in records {
            match serde_json::from_value::<PurgeFragment>(record) {
                Ok(fragment) => fragments.push(fragment),
                Err(err) => tracing::debug!(error = %err, "Dropping incomplete purge record"),
            }
        }
    }
    fragments
}

/// Drives the external purge tool.
#[derive(Debug, Clone)]
pub struct Purger {
    command: ExternalCommand,
}

impl Purger {
    pub fn new(command: &[String], timeout: Duration) -> Result<Self> {
        Ok(Self { command: ExternalCommand::resolve(command, timeout)? })
    }

    /// Reduce the stylesheet at `css` to the rules used by the markup at
    /// `content`.
    #[instrument(skip(self), fields(css = %css.display(), content = %content.display(), fragments))]
    pub fn purge(&self, css: &Path, content: &Path) -> Result<Vec<PurgeFragment>> {
        let args = [OsStr::new("--css"), css.as_os_str(), OsStr::new("--content"), content.as_os_str()];
        let stdout = self.command.run(args)?;
        let fragments = parse_purge_output(&String::from_utf8_lossy(&stdout));
        tracing::Span::current().record("fragments", fragments.len());
        Ok(fragments)
    }
}

impl TryFrom<&CommandConfig> for Purger {
    type Error = crate::error::Error;
    fn try_from(config: &CommandConfig) -> std::result::Result<Self, Self::Error> {
        Ok(Self { command: ExternalCommand::try_from(config)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn fragment(file: &str, css: &str) -> PurgeFragment {
        PurgeFragment { file: file.to_string(), css: css.to_string() }
    }

    #[test]
    fn one_malformed_record_of_three() {
        let stdout = r#"[{"css":"a{}","file":"/tmp/x.css"},{"file":"/tmp/x.css"},{"css":"b{}","file":"/tmp/x.css"}]"#;
        assert_eq!(parse_purge_output(stdout), vec![fragment("/tmp/x.css", "a{}"), fragment("/tmp/x.css", "b{}")]);
    }

    #[rstest]
    #[case("", vec![])]
    #[case("not json\n", vec![])]
    #[case("{\"css\":\"a{}\",\"file\":\"f\"}", vec![fragment("f", "a{}")])]
    #[case("[{\"css\":\"a{}\",\"file\":\"f\"}]\n\n[{\"css\":\"b{}\",\"file\":\"g\"}]", vec![fragment("f", "a{}"), fragment("g", "b{}")])]
    #[case("[{\"css\":\"a{}\",\"file\":\"f\"}]\n[broken", vec![fragment("f", "a{}")])]
    #[case("[1, \"x\", null]", vec![])]
    fn test_parse_purge_output(#[case] stdout: &str, #[case] expected: Vec<PurgeFragment>) {
        assert_eq!(parse_purge_output(stdout), expected);
    }

    #[cfg(unix)]
    #[test]
    fn purges_through_the_command() {
        let script = r#"[ "$1" = --css ] && [ "$3" = --content ] && printf '[{"css":"%s","file":"%s"}]\n' "$(cat "$2")" "$2""#;
        let command: Vec<String> = ["sh", "-c", script, "purge"].iter().map(ToString::to_string).collect();
        let purger = Purger::new(&command, Duration::from_secs(5)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let css = dir.path().join("combined.css");
        let content = dir.path().join("content.html");
        std::fs::write(&css, "p{color:red}").unwrap();
        std::fs::write(&content, "<p>x</p>").unwrap();
        let fragments = purger.purge(&css, &content).unwrap();
        assert_eq!(fragments, vec![fragment(&css.display().to_string(), "p{color:red}")]);
    }
}
