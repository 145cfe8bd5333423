//! Error taxonomy for workflow execution.
//!
//! Every adapter failure maps onto one of these variants so a workflow can
//! surface a single notice naming the stage that failed. Detection has no
//! error variant: an unresolvable language is a valid result
//! ([`crate::providers::Detection::Unresolved`]), not a failure.

use thiserror::Error;

// ── Stages ───────────────────────────────────────────────────────

/// The workflow stage a failure is attributed to in user-visible notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Capturing,
    Detecting,
    Translating,
    Synthesizing,
    Logging,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Capturing => "speech capture",
            Self::Detecting => "language detection",
            Self::Translating => "translation",
            Self::Synthesizing => "speech synthesis",
            Self::Logging => "history log",
        }
    }
}

// ── Errors ───────────────────────────────────────────────────────

/// Failures a workflow instance can abort with.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The buffer the workflow operates on is empty.
    #[error("nothing to work with")]
    EmptyInput,

    /// A display name outside the catalog.
    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    /// The capture window closed without hearing any speech.
    #[error("no speech detected")]
    NoSpeechDetected,

    /// The recognition engine or the audio device failed.
    #[error("speech recognition failed: {0}")]
    Recognition(String),

    /// The translation provider failed or rejected the request.
    #[error("translation failed: {0}")]
    Translation(String),

    /// The synthesis provider failed or rejected the request.
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    /// The history log could not be written.
    #[error("history write failed: {0}")]
    LogWrite(String),
}

impl WorkflowError {
    /// Stage this failure is reported under, if it belongs to one.
    ///
    /// `EmptyInput` and `UnknownLanguage` happen before any stage runs and
    /// get a plain notice instead.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::EmptyInput | Self::UnknownLanguage(_) => None,
            Self::NoSpeechDetected | Self::Recognition(_) => Some(Stage::Capturing),
            Self::Translation(_) => Some(Stage::Translating),
            Self::Synthesis(_) => Some(Stage::Synthesizing),
            Self::LogWrite(_) => Some(Stage::Logging),
        }
    }

    /// Whether the real-time loop swallows this failure without a notice.
    ///
    /// Transient microphone noise (nothing heard, recognition hiccup) must
    /// not flood the user; anything else is still non-fatal but gets logged.
    pub fn is_capture_noise(&self) -> bool {
        matches!(self, Self::NoSpeechDetected | Self::Recognition(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_attribution() {
        assert_eq!(WorkflowError::EmptyInput.stage(), None);
        assert_eq!(
            WorkflowError::NoSpeechDetected.stage(),
            Some(Stage::Capturing)
        );
        assert_eq!(
            WorkflowError::Translation("boom".into()).stage(),
            Some(Stage::Translating)
        );
        assert_eq!(
            WorkflowError::Synthesis("boom".into()).stage(),
            Some(Stage::Synthesizing)
        );
        assert_eq!(
            WorkflowError::LogWrite("disk full".into()).stage(),
            Some(Stage::Logging)
        );
    }

    #[test]
    fn capture_noise_set() {
        assert!(WorkflowError::NoSpeechDetected.is_capture_noise());
        assert!(WorkflowError::Recognition("timeout".into()).is_capture_noise());
        assert!(!WorkflowError::Translation("503".into()).is_capture_noise());
        assert!(!WorkflowError::LogWrite("denied".into()).is_capture_noise());
    }

    #[test]
    fn messages_carry_provider_detail() {
        let err = WorkflowError::Translation("status 429".into());
        assert!(err.to_string().contains("429"));
    }
}
