//! Session state and the events workflows push to the presentation surface.

use crate::catalog::{Language, SourceSelection};
use crate::error::Stage;

// ── State ────────────────────────────────────────────────────────

/// The mutable session: selector values plus the two text buffers.
///
/// Owned by the session controller behind a mutex. The UI edits `input`
/// and the selectors directly; `output` is written only by workflows
/// (one-shot replacement, real-time append).
#[derive(Debug, Clone)]
pub struct SessionState {
    pub source: SourceSelection,
    pub target: Language,
    pub input: String,
    pub output: String,
}

impl SessionState {
    pub fn new(target: Language) -> Self {
        Self {
            source: SourceSelection::Auto,
            target,
            input: String::new(),
            output: String::new(),
        }
    }
}

// ── Workflow stage ───────────────────────────────────────────────

/// Where the currently running workflow is, for the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowStage {
    #[default]
    Idle,
    Capturing,
    Detecting,
    Translating,
    Synthesizing,
}

impl WorkflowStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Capturing => "listening",
            Self::Detecting => "detecting language",
            Self::Translating => "translating",
            Self::Synthesizing => "synthesizing speech",
        }
    }
}

// ── Events ───────────────────────────────────────────────────────

/// Pushed from workflows to the presentation surface.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The running workflow entered a new stage (or returned to idle).
    StageChanged(WorkflowStage),
    /// Informational notice (recognized speech, copied, warnings).
    Notice(String),
    /// A workflow aborted: which stage failed and the provider message.
    Failure { stage: Stage, message: String },
    /// The background real-time loop started.
    RealtimeStarted,
    /// The background real-time loop exited.
    RealtimeStopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_defaults_to_auto_source() {
        let state = SessionState::new(Language::French);
        assert_eq!(state.source, SourceSelection::Auto);
        assert_eq!(state.target, Language::French);
        assert!(state.input.is_empty());
        assert!(state.output.is_empty());
    }

    #[test]
    fn stage_labels() {
        assert_eq!(WorkflowStage::Idle.as_str(), "idle");
        assert_eq!(WorkflowStage::Capturing.as_str(), "listening");
    }
}
