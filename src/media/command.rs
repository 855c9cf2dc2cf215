//! Spawning external tools.

use crate::error::{CorteError, Result};
use std::ffi::OsStr;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Longest stderr excerpt carried into error messages.
const STDERR_TAIL_CHARS: usize = 600;

/// Run a tool to completion, capturing stdout and stderr.
///
/// The child is killed when the returned future is dropped, so a stage
/// timeout or a cancelled sibling branch never leaves the process running.
/// A non-zero exit is not an error here; callers map it to their own kind.
pub async fn run_tool<I, S>(program: &str, args: I) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Running {:?}", cmd.as_std());

    match cmd.output().await {
        Ok(output) => Ok(output),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CorteError::ToolNotFound(program.to_string()))
        }
        Err(e) => Err(CorteError::Io(e)),
    }
}

/// Last part of a process's stderr, trimmed for error messages.
pub fn stderr_tail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    let char_count = trimmed.chars().count();
    if char_count <= STDERR_TAIL_CHARS {
        trimmed.to_string()
    } else {
        let tail: String = trimmed.chars().skip(char_count - STDERR_TAIL_CHARS).collect();
        format!("...{}", tail)
    }
}
