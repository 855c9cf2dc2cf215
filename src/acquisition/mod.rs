//! Video acquisition: remote identifier to one local media file.
//!
//! The default resolver drives `yt-dlp` with either a stored cookie file or
//! browser cookies, and optionally routes through a proxy drawn from a pool.

mod credentials;
mod proxy;

pub use credentials::CredentialSource;
pub use proxy::ProxyPool;

use crate::config::{AcquisitionSettings, Settings};
use crate::error::{CorteError, Result};
use crate::media::{run_tool, stderr_tail};
use crate::retry::{with_backoff, RetryPolicy};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Trait for anything that can fetch a source video into a work directory.
#[async_trait]
pub trait VideoAcquirer: Send + Sync {
    /// Download `source` into `work_dir` and return the local file.
    async fn acquire(&self, source: &str, work_dir: &Path) -> Result<PathBuf>;
}

/// `yt-dlp` backed acquirer.
pub struct YtDlpResolver {
    program: String,
    format: String,
    credentials: CredentialSource,
    proxies: ProxyPool,
    retry: RetryPolicy,
    rotate_proxy_on_retry: bool,
}

impl YtDlpResolver {
    /// Build a resolver from settings, reading the proxy list once.
    pub fn new(settings: &Settings) -> Result<Self> {
        let acquisition = &settings.acquisition;
        let credentials = CredentialSource::resolve(&settings.cookies_file(), &acquisition.browser);
        let proxies = ProxyPool::load(settings.proxies_file().as_deref(), acquisition.seed)?;

        Ok(Self::with_parts(&settings.tools.yt_dlp, credentials, proxies, acquisition))
    }

    pub fn with_parts(
        program: &str,
        credentials: CredentialSource,
        proxies: ProxyPool,
        settings: &AcquisitionSettings,
    ) -> Self {
        Self {
            program: program.to_string(),
            format: settings.format.clone(),
            credentials,
            proxies,
            retry: settings.retry_policy(),
            rotate_proxy_on_retry: settings.rotate_proxy_on_retry,
        }
    }

    /// Full `yt-dlp` argument list for one attempt.
    pub fn build_args(&self, source: &str, work_dir: &Path, proxy: Option<&str>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-f".into(),
            self.format.as_str().into(),
            "--merge-output-format".into(),
            "mp4".into(),
            "--no-playlist".into(),
            "-o".into(),
            work_dir.join("video.%(ext)s").into(),
        ];
        args.extend(self.credentials.args());
        if let Some(proxy) = proxy {
            args.push("--proxy".into());
            args.push(proxy.into());
        }
        args.push(source.into());
        args
    }

    async fn attempt(&self, source: &str, work_dir: &Path, proxy: Option<&str>) -> Result<PathBuf> {
        match proxy {
            Some(p) => info!("Downloading {} via proxy {}", source, p),
            None => info!("Downloading {}", source),
        }

        let output = run_tool(&self.program, self.build_args(source, work_dir, proxy)).await?;
        if !output.status.success() {
            return Err(CorteError::AcquisitionFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr_tail(&output)
            )));
        }

        find_downloaded_video(work_dir)
    }
}

#[async_trait]
impl VideoAcquirer for YtDlpResolver {
    #[instrument(skip(self, work_dir), fields(work_dir = %work_dir.display()))]
    async fn acquire(&self, source: &str, work_dir: &Path) -> Result<PathBuf> {
        let source = source.trim();
        if source.is_empty() {
            return Err(CorteError::InvalidInput("Video identifier is empty".to_string()));
        }

        let this = self;
        let mut failed: Vec<String> = Vec::new();
        let mut current = self.proxies.choose(&[]);

        with_backoff(&self.retry, "Video download", move |attempt| {
            if attempt > 1 && this.rotate_proxy_on_retry {
                if let Some(previous) = current.take() {
                    failed.push(previous);
                }
                current = this.proxies.choose(&failed);
                debug!("Rotated proxy after failed attempt");
            }
            let proxy = current.clone();
            async move { this.attempt(source, work_dir, proxy.as_deref()).await }
        })
        .await
    }
}

/// The single `video.<ext>` a finished download leaves behind.
///
/// Partial (`.part`) and bookkeeping (`.ytdl`) files are ignored; zero or
/// several candidates mean the download did not complete cleanly.
pub fn find_downloaded_video(work_dir: &Path) -> Result<PathBuf> {
    let mut found: Vec<PathBuf> = std::fs::read_dir(work_dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            name.starts_with("video.") && !name.ends_with(".part") && !name.ends_with(".ytdl")
        })
        .collect();
    found.sort();

    match found.len() {
        1 => Ok(found.remove(0)),
        0 => Err(CorteError::AcquisitionIncomplete(format!(
            "no video file in {}",
            work_dir.display()
        ))),
        n => {
            warn!("Download left {} candidate files", n);
            Err(CorteError::AcquisitionIncomplete(format!(
                "{} video files in {}: {:?}",
                n,
                work_dir.display(),
                found
            )))
        }
    }
}
