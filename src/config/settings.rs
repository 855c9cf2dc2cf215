//! Configuration settings for Corte.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub tools: ToolSettings,
    pub acquisition: AcquisitionSettings,
    pub transcription: TranscriptionSettings,
    pub highlights: HighlightSettings,
    pub captions: CaptionSettings,
    pub clips: ClipSettings,
    pub pipeline: PipelineSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory under which one working directory per run is created.
    pub output_dir: String,
    /// Log level (trace, debug, info, warn, error) when no `-v` is given.
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            output_dir: "./corte-runs".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Paths to the external tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub yt_dlp: String,
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            yt_dlp: "yt-dlp".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

/// Video download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionSettings {
    /// Netscape cookie file; used when it exists.
    pub cookies_file: String,
    /// Browser to read cookies from when no cookie file exists.
    pub browser: String,
    /// File with one proxy URL per line (`#` comments allowed).
    pub proxies_file: Option<String>,
    /// Draw a different proxy from the pool when a download is retried.
    pub rotate_proxy_on_retry: bool,
    /// Seed for the proxy draw. Unset means a fresh seed per process.
    pub seed: Option<u64>,
    /// Download attempts before giving up.
    pub max_attempts: u32,
    /// Seconds to wait before the first retry (doubled afterwards).
    pub backoff_seconds: u64,
    /// yt-dlp format selection expression.
    pub format: String,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            cookies_file: "~/.config/corte/cookies.txt".to_string(),
            browser: "chrome".to_string(),
            proxies_file: Some("~/.config/corte/proxies.txt".to_string()),
            rotate_proxy_on_retry: false,
            seed: None,
            max_attempts: 2,
            backoff_seconds: 5,
            format: "bv*+ba/b".to_string(),
        }
    }
}

impl AcquisitionSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.backoff_seconds))
    }
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Optional ISO-639-1 language hint.
    pub language: Option<String>,
    /// Audio bitrate for the extracted track (keeps uploads under the API limit).
    pub audio_bitrate: String,
    /// Attempts before giving up.
    pub max_attempts: u32,
    /// Seconds to wait before the first retry (doubled afterwards).
    pub backoff_seconds: u64,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            language: None,
            audio_bitrate: "64k".to_string(),
            max_attempts: 3,
            backoff_seconds: 2,
            request_timeout_seconds: 600,
        }
    }
}

impl TranscriptionSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.backoff_seconds))
    }
}

/// What to do with a scored window that extends past the video.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutOfRangePolicy {
    /// Drop the window (default).
    #[default]
    Reject,
    /// Clip the window into the video bounds.
    Clamp,
}

impl std::str::FromStr for OutOfRangePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(OutOfRangePolicy::Reject),
            "clamp" => Ok(OutOfRangePolicy::Clamp),
            _ => Err(format!("Unknown out-of-range policy: {}", s)),
        }
    }
}

impl std::fmt::Display for OutOfRangePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutOfRangePolicy::Reject => write!(f, "reject"),
            OutOfRangePolicy::Clamp => write!(f, "clamp"),
        }
    }
}

/// Highlight scoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightSettings {
    /// Chat model used to score the transcript.
    pub model: String,
    pub temperature: f32,
    pub out_of_range: OutOfRangePolicy,
    /// Attempts before giving up.
    pub max_attempts: u32,
    /// Seconds to wait before the first retry (doubled afterwards).
    pub backoff_seconds: u64,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.4,
            out_of_range: OutOfRangePolicy::Reject,
            max_attempts: 3,
            backoff_seconds: 2,
            request_timeout_seconds: 300,
        }
    }
}

impl HighlightSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.backoff_seconds))
    }
}

/// Granularity of on-screen caption reveal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RevealUnit {
    /// One cue per word.
    #[default]
    Word,
    /// Fixed-size groups of `words_per_cue` words.
    Phrase,
}

impl std::str::FromStr for RevealUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "word" => Ok(RevealUnit::Word),
            "phrase" | "chunk" => Ok(RevealUnit::Phrase),
            _ => Err(format!("Unknown reveal unit: {}", s)),
        }
    }
}

/// How the source frame is fitted into the vertical target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReframeMode {
    /// Centre crop to the target aspect ratio, then scale.
    #[default]
    Crop,
    /// Scale to fit and pad with black bars.
    Pad,
}

impl std::str::FromStr for ReframeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "crop" => Ok(ReframeMode::Crop),
            "pad" => Ok(ReframeMode::Pad),
            _ => Err(format!("Unknown reframe mode: {}", s)),
        }
    }
}

/// Caption rendering and reframing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    pub reveal: RevealUnit,
    /// Words per cue when `reveal = "phrase"`.
    pub words_per_cue: usize,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    pub reframe: ReframeMode,
    pub font: String,
    pub font_size: u32,
    pub outline: u32,
    /// Distance of the caption baseline from the bottom edge.
    pub margin_bottom: u32,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            reveal: RevealUnit::Word,
            words_per_cue: 3,
            width: 1080,
            height: 1920,
            reframe: ReframeMode::Crop,
            font: "Arial".to_string(),
            font_size: 72,
            outline: 3,
            margin_bottom: 320,
        }
    }
}

/// How clips are cut from the captioned master.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClipEncoding {
    /// Re-encode for frame-exact boundaries (default).
    #[default]
    Reencode,
    /// Stream copy; boundaries snap to keyframes.
    Copy,
}

impl std::str::FromStr for ClipEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reencode" | "re-encode" => Ok(ClipEncoding::Reencode),
            "copy" => Ok(ClipEncoding::Copy),
            _ => Err(format!("Unknown clip encoding: {}", s)),
        }
    }
}

/// Clip extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipSettings {
    pub encoding: ClipEncoding,
    /// How far past the real media end a window may reach and still be cut.
    pub duration_tolerance_seconds: f64,
}

impl Default for ClipSettings {
    fn default() -> Self {
        Self {
            encoding: ClipEncoding::Reencode,
            duration_tolerance_seconds: 0.25,
        }
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Wall-clock limit for each stage.
    pub stage_timeout_seconds: u64,
    /// Run highlight selection and caption compositing concurrently.
    pub parallel: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            stage_timeout_seconds: 1200, // 20 minutes
            parallel: true,
        }
    }
}

impl PipelineSettings {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_seconds)
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::CorteError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("corte")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded run output directory.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Get the expanded cookie file path.
    pub fn cookies_file(&self) -> PathBuf {
        Self::expand_path(&self.acquisition.cookies_file)
    }

    /// Get the expanded proxy list path, if configured.
    pub fn proxies_file(&self) -> Option<PathBuf> {
        self.acquisition
            .proxies_file
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(Self::expand_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [highlights]
            out_of_range = "clamp"

            [pipeline]
            stage_timeout_seconds = 60
            "#,
        )
        .unwrap();

        assert_eq!(settings.highlights.out_of_range, OutOfRangePolicy::Clamp);
        assert_eq!(settings.highlights.model, "gpt-4o-mini");
        assert_eq!(settings.pipeline.stage_timeout(), Duration::from_secs(60));
        assert!(settings.pipeline.parallel);
        assert_eq!(settings.acquisition.browser, "chrome");
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.captions.reframe = ReframeMode::Pad;
        settings.acquisition.seed = Some(42);
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.captions.reframe, ReframeMode::Pad);
        assert_eq!(loaded.acquisition.seed, Some(42));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(settings.pipeline.stage_timeout_seconds, 1200);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("CLAMP".parse::<OutOfRangePolicy>().unwrap(), OutOfRangePolicy::Clamp);
        assert_eq!("chunk".parse::<RevealUnit>().unwrap(), RevealUnit::Phrase);
        assert_eq!("copy".parse::<ClipEncoding>().unwrap(), ClipEncoding::Copy);
        assert!("zoom".parse::<ReframeMode>().is_err());
    }

    #[test]
    fn test_blank_proxy_path_disables_pool() {
        let mut settings = Settings::default();
        settings.acquisition.proxies_file = Some("  ".to_string());
        assert!(settings.proxies_file().is_none());
    }
}
