//! CLI module for Corte.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::{ClipEncoding, OutOfRangePolicy, ReframeMode, RevealUnit, Settings};
use clap::{Args, Parser, Subcommand};

/// Corte - long videos in, captioned vertical highlight clips out
///
/// Downloads a video, transcribes it, asks a language model for the moments
/// most likely to work as standalone shorts, and cuts them from a 9:16
/// captioned master.
#[derive(Parser, Debug)]
#[command(name = "corte")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline on a video URL or ID
    Run {
        /// Video URL or identifier understood by yt-dlp
        url: String,

        /// OpenAI API key
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        #[command(flatten)]
        overrides: RunOverrides,
    },

    /// Re-extract clips in an existing session directory
    Clips {
        /// Session directory from an earlier run
        session_dir: String,

        /// Clip encoding (reencode, copy)
        #[arg(long)]
        clip_encoding: Option<ClipEncoding>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Per-run overrides of the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct RunOverrides {
    /// Caption reveal unit (word, phrase)
    #[arg(long)]
    pub reveal: Option<RevealUnit>,

    /// How the frame is fitted to 9:16 (crop, pad)
    #[arg(long)]
    pub reframe: Option<ReframeMode>,

    /// What to do with highlights past the video end (reject, clamp)
    #[arg(long)]
    pub out_of_range: Option<OutOfRangePolicy>,

    /// Clip encoding (reencode, copy)
    #[arg(long)]
    pub clip_encoding: Option<ClipEncoding>,
}

impl RunOverrides {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(reveal) = self.reveal {
            settings.captions.reveal = reveal;
        }
        if let Some(reframe) = self.reframe {
            settings.captions.reframe = reframe;
        }
        if let Some(policy) = self.out_of_range {
            settings.highlights.out_of_range = policy;
        }
        if let Some(encoding) = self.clip_encoding {
            settings.clips.encoding = encoding;
        }
    }
}

/// `EnvFilter` directive: `-v` flags win over the configured level.
pub fn log_directive(verbose: u8, configured: &str) -> String {
    let level = match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("corte={}", level)
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
