//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and credentials are available
//! before starting a run that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{CorteError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// A full run needs the API key, the downloader and ffmpeg.
    Run,
    /// Re-extracting clips only needs ffmpeg.
    Clips,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings, api_key: Option<&str>) -> Result<()> {
    match operation {
        Operation::Run => {
            check_api_key(api_key)?;
            check_tool(&settings.tools.yt_dlp)?;
            check_tool(&settings.tools.ffmpeg)?;
            check_tool(&settings.tools.ffprobe)?;
        }
        Operation::Clips => {
            check_tool(&settings.tools.ffmpeg)?;
            check_tool(&settings.tools.ffprobe)?;
        }
    }
    Ok(())
}

fn check_api_key(api_key: Option<&str>) -> Result<()> {
    match api_key {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(CorteError::Config(
            "No OpenAI API key. Pass --api-key or set OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check if an external tool is available.
pub fn check_tool(program: &str) -> Result<()> {
    match Command::new(program).arg(version_arg(program)).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(CorteError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            program
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CorteError::ToolNotFound(program.to_string()))
        }
        Err(e) => Err(CorteError::ToolNotFound(format!("{}: {}", program, e))),
    }
}

/// ffmpeg and ffprobe use `-version`, everything else `--version`.
pub fn version_arg(program: &str) -> &'static str {
    let name = std::path::Path::new(program)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.as_str() {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    }
}
