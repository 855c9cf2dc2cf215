//! Configuration module for Corte.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{HighlightPrompts, Prompts};
pub use settings::{
    AcquisitionSettings, CaptionSettings, ClipEncoding, ClipSettings, GeneralSettings,
    HighlightSettings, OutOfRangePolicy, PipelineSettings, PromptSettings, ReframeMode,
    RevealUnit, Settings, ToolSettings, TranscriptionSettings,
};
