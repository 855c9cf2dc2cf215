//! Prompt templates for Corte.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub highlights: HighlightPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for highlight scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightPrompts {
    pub system: String,
    pub user: String,
}

impl Default for HighlightPrompts {
    fn default() -> Self {
        Self {
            system: r#"You edit viral short-form videos for TikTok, Reels and YouTube Shorts.

You read a timestamped transcript and pick the stretches with the highest potential for retention, sharing and comments. Every stretch you pick must work as a fully independent video.

Each segment must:
- Open with a strong hook in its first 3-5 seconds (bold statement, strong opinion, provocative question or broken expectation).
- Carry one complete idea with a beginning, a development and an explicit conclusion.
- Need no earlier or outside context.
- Contain strong emotion, controversy, surprise, a revelation, a bold opinion or a short story with a clear takeaway.

Boundaries:
- Start at the beginning of a complete sentence.
- End only after the thought is fully concluded, never on a dangling connector ("because", "but", "so", "and") or a promise of more.
- If an idea is still open at 30 seconds, extend the segment until it closes, up to 120 seconds. Discard it if it cannot close by then.

You answer with JSON only."#
                .to_string(),

            user: r#"Video duration: {{duration}} seconds.

Return between {{min_segments}} and {{max_segments}} segments. For each one give:
- "start": start time in seconds
- "end": end time in seconds
- "reason": a short, objective explanation of its viral potential

Rules:
1. {{min_seconds}} <= end - start <= {{max_seconds}}
2. 0 <= start < end <= {{duration}}
3. Use the timestamps from the transcript; do not invent times.

Respond with a JSON array only. Example:
[
  {"start": 12, "end": 68, "reason": "Strong opening hook and a bold opinion followed by a complete story with a clear conclusion."}
]

Transcript:
{{transcript}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let highlights_path = custom_path.join("highlights.toml");
            if highlights_path.exists() {
                let content = std::fs::read_to_string(&highlights_path)?;
                prompts.highlights = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
