//! Pipeline stages and the events emitted as they run.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// One named step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Init,
    Acquiring,
    Transcribing,
    Selecting,
    Compositing,
    Extracting,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "Init",
            Stage::Acquiring => "Acquiring",
            Stage::Transcribing => "Transcribing",
            Stage::Selecting => "Selecting",
            Stage::Compositing => "Compositing",
            Stage::Extracting => "Extracting",
            Stage::Done => "Done",
            Stage::Failed => "Failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress notifications delivered to a [`StageObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    Started(Stage),
    Completed { stage: Stage, elapsed: Duration },
    Failed { stage: Stage, kind: &'static str },
    /// The run reached `Done`.
    Finished,
}

impl StageEvent {
    pub fn stage(&self) -> Stage {
        match self {
            StageEvent::Started(stage) => *stage,
            StageEvent::Completed { stage, .. } | StageEvent::Failed { stage, .. } => *stage,
            StageEvent::Finished => Stage::Done,
        }
    }
}

/// Callback invoked from the pipeline for every [`StageEvent`].
///
/// Selecting and Compositing may report concurrently.
pub type StageObserver = Arc<dyn Fn(&StageEvent) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Stage::Transcribing.to_string(), "Transcribing");
        assert_eq!(format!("{}", Stage::Done), "Done");
    }

    #[test]
    fn test_event_stage() {
        let event = StageEvent::Failed { stage: Stage::Compositing, kind: "TranscodeFailed" };
        assert_eq!(event.stage(), Stage::Compositing);
        assert_eq!(StageEvent::Finished.stage(), Stage::Done);
    }
}
