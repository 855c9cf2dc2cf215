//! Corte - long videos in, captioned vertical highlight clips out
//!
//! "Corte" is Spanish and Portuguese for "cut."
//!
//! # Overview
//!
//! Corte takes one video identifier and:
//! - Downloads the video with yt-dlp, using stored or browser cookies and an optional proxy pool
//! - Transcribes the audio track with Whisper
//! - Asks a chat model for 3 to 6 standalone highlight windows of 30 to 120 seconds
//! - Renders a 9:16 master with burned-in word-by-word captions
//! - Cuts one clip per highlight from that master
//!
//! Every run gets its own working directory holding every intermediate artifact.
//!
//! # Architecture
//!
//! - `config` - Configuration management and prompt templates
//! - `acquisition` - Video download (credentials, proxies, retry)
//! - `media` - ffmpeg/ffprobe invocation
//! - `transcription` - Speech-to-text transcription
//! - `subtitles` - Timed cues, SRT and ASS output
//! - `highlights` - Highlight scoring and validation
//! - `captions` - Reframing and caption burn-in
//! - `clips` - Clip extraction
//! - `session` - Per-run working directory layout
//! - `orchestrator` - Stage sequencing, timeouts and reporting
//!
//! # Example
//!
//! ```rust,no_run
//! use corte::config::Settings;
//! use corte::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let api_key = std::env::var("OPENAI_API_KEY")?;
//!     let orchestrator = Orchestrator::new(settings, &api_key)?;
//!
//!     let report = orchestrator.run("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await?;
//!     println!("Wrote {} clips to {}", report.clips.len(), report.session.work_dir.display());
//!
//!     Ok(())
//! }
//! ```

pub mod acquisition;
pub mod captions;
pub mod cli;
pub mod clips;
pub mod config;
pub mod error;
pub mod highlights;
pub mod media;
pub mod openai;
pub mod orchestrator;
pub mod retry;
pub mod session;
pub mod subtitles;
pub mod transcription;

pub use error::{CorteError, Result};
