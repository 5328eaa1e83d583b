use crate::error::{ErrorKind, Result};
use cachepress_config::CommandConfig;
use exn::{OptionExt, ResultExt};
use std::ffi::OsStr;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const STDERR_SNIPPET: usize = 500;

/// A configured external program: resolved executable, fixed leading
/// arguments and how long it may run.
#[derive(Debug, Clone)]
pub(crate) struct ExternalCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ExternalCommand {
    /// Resolve `command[0]` on `PATH` now, so a missing tool fails the run up
    /// front instead of every page.
    pub(crate) fn resolve(command: &[String], timeout: Duration) -> Result<Self> {
        let (name, args) = command.split_first().ok_or_raise(|| ErrorKind::CommandNotFound(String::new()))?;
        let program = which::which(name).or_raise(|| ErrorKind::CommandNotFound(name.clone()))?;
        tracing::debug!(program = %program.display(), "Resolved external command");
        Ok(Self { program, args: args.to_vec(), timeout })
    }

    /// Run with `extra` appended to the configured arguments and return stdout.
    ///
    /// Output is read on separate threads while the child runs, so a chatty
    /// command can't fill its pipe and stall. A command still running at the
    /// timeout is killed.
    pub(crate) fn run<I, S>(&self, extra: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .args(extra)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .or_raise(|| ErrorKind::Io)?;
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait().or_raise(|| ErrorKind::Io)? {
                break status;
            }
            if start.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!(program = %self.program.display(), pid = child.id(), "Killed command after timeout");
                // Reader threads are left to finish on their own: a grandchild
                // may still hold the pipes open.
                exn::bail!(ErrorKind::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = collect(stdout);
        let stderr = collect(stderr);
        if !status.success() {
            let stderr: String = String::from_utf8_lossy(&stderr).trim().chars().take(STDERR_SNIPPET).collect();
            tracing::debug!(program = %self.program.display(), %stderr, "Command failed");
            exn::bail!(ErrorKind::Failed(status.code().unwrap_or(-1)));
        }
        Ok(stdout)
    }
}

impl TryFrom<&CommandConfig> for ExternalCommand {
    type Error = crate::error::Error;
    fn try_from(config: &CommandConfig) -> std::result::Result<Self, Self::Error> {
        ExternalCommand::resolve(&config.command, config.timeout)
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = reader.read_to_end(&mut buffer);
        buffer
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|handle| handle.join().ok()).unwrap_or_default()
}
