//! Doctor command - verify system requirements and configuration.

use crate::acquisition::ProxyPool;
use crate::cli::preflight::version_arg;
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: Option<&Path>) -> anyhow::Result<()> {
    Output::header("Corte Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    let sections: [(&str, Vec<CheckResult>); 4] = [
        (
            "External Tools",
            vec![
                check_tool("yt-dlp", &settings.tools.yt_dlp, install_hint_ytdlp()),
                check_tool("ffmpeg", &settings.tools.ffmpeg, install_hint_ffmpeg()),
                check_tool("ffprobe", &settings.tools.ffprobe, install_hint_ffmpeg()),
            ],
        ),
        (
            "API Configuration",
            vec![check_openai_api_key(std::env::var("OPENAI_API_KEY").ok().as_deref())],
        ),
        ("Download Access", check_acquisition(settings)),
        ("Files", vec![check_output_dir(&settings.output_dir()), check_config_file(config_path)]),
    ];

    for (title, results) in sections {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    }

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Corte.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Corte is ready to use.");
    }

    Ok(())
}

fn check_tool(name: &str, program: &str, hint: &str) -> CheckResult {
    match Command::new(program).arg(version_arg(program)).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            let version_display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, &format!("{} not found", program), hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

fn check_openai_api_key(key: Option<&str>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", masked))
        }
        Some(key) if key.trim().is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::warning(
            "OPENAI_API_KEY",
            "not set",
            "Set it or pass --api-key to 'corte run'",
        ),
    }
}

/// Cookie source and proxy pool.
fn check_acquisition(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let cookies = settings.cookies_file();
    if cookies.is_file() {
        results.push(CheckResult::ok("Cookies", &cookies.display().to_string()));
    } else {
        results.push(CheckResult::warning(
            "Cookies",
            &format!("no cookie file, using {} browser cookies", settings.acquisition.browser),
            &format!("Export cookies to {} if downloads are refused", cookies.display()),
        ));
    }

    match settings.proxies_file() {
        Some(path) if path.is_file() => {
            let count = std::fs::read_to_string(&path)
                .map(|c| ProxyPool::parse(&c).len())
                .unwrap_or(0);
            results.push(CheckResult::ok(
                "Proxies",
                &format!("{} proxies in {}", count, path.display()),
            ));
        }
        Some(path) => results.push(CheckResult::ok(
            "Proxies",
            &format!("direct connection ({} not found)", path.display()),
        )),
        None => results.push(CheckResult::ok("Proxies", "direct connection")),
    }

    results
}

fn check_output_dir(dir: &Path) -> CheckResult {
    if dir.is_dir() {
        CheckResult::ok("Output directory", &dir.display().to_string())
    } else if dir.exists() {
        CheckResult::error(
            "Output directory",
            &format!("{} is not a directory", dir.display()),
            "Set general.output_dir to a directory",
        )
    } else {
        CheckResult::warning(
            "Output directory",
            &format!("{} (will be created)", dir.display()),
            "Directory will be created on first run",
        )
    }
}

fn check_config_file(config_path: Option<&Path>) -> CheckResult {
    let default_path = Settings::default_config_path();
    let config_path = config_path.unwrap_or(&default_path);
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: corte config init",
        )
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}
