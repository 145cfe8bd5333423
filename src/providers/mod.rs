//! Service adapter seams.
//!
//! The session controller only ever talks to these traits; the concrete
//! adapters in the submodules wrap the external services (translation
//! endpoint, language identification, speech recognition, speech
//! synthesis). Tests substitute the traits with scripted doubles.

pub mod detect;
pub mod speech;
pub mod synth;
pub mod translate;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{Language, SourceSelection, UNKNOWN_CODE};
use crate::config::AppConfig;
use crate::error::WorkflowError;

// ── Detection result ─────────────────────────────────────────────

/// Outcome of language identification.
///
/// `Unresolved` is a valid branch, not an error: the translation provider
/// auto-detects server-side and history records the `unknown` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    Resolved(Language),
    Unresolved,
}

impl Detection {
    /// Code written to the history row for this outcome.
    pub fn logged_code(self) -> &'static str {
        match self {
            Self::Resolved(lang) => lang.code(),
            Self::Unresolved => UNKNOWN_CODE,
        }
    }

    /// Source the translation provider is asked to use.
    pub fn provider_source(self) -> SourceSelection {
        match self {
            Self::Resolved(lang) => SourceSelection::Fixed(lang),
            Self::Unresolved => SourceSelection::Auto,
        }
    }
}

// ── Adapter traits ───────────────────────────────────────────────

/// Machine translation.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target`. `source` may be the auto sentinel.
    async fn translate(
        &self,
        text: &str,
        source: SourceSelection,
        target: Language,
    ) -> Result<String, WorkflowError>;
}

/// Language identification. Infallible at this boundary.
pub trait Detector: Send + Sync {
    fn detect(&self, text: &str) -> Detection;
}

/// One-utterance microphone capture plus recognition. Blocking.
pub trait SpeechCapture: Send + Sync {
    /// Record until end-of-utterance (or `max_utterance`, if bounded) and
    /// return the recognized transcript.
    fn capture(&self, max_utterance: Option<Duration>) -> Result<String, WorkflowError>;
}

/// Synthesized speech, ready for playback.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Encoded audio (MP3 from the default synthesizer).
    pub data: Vec<u8>,
}

/// Text-to-speech rendering.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, language: Language)
        -> Result<AudioClip, WorkflowError>;
}

/// Audio playback. Fire-and-forget: failures never reach the caller.
pub trait Playback: Send + Sync {
    fn play(&self, clip: AudioClip);
}

// ── Bundle ───────────────────────────────────────────────────────

/// The adapter set a session controller runs against.
#[derive(Clone)]
pub struct Providers {
    pub translator: Arc<dyn Translator>,
    pub detector: Arc<dyn Detector>,
    pub capture: Arc<dyn SpeechCapture>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub playback: Arc<dyn Playback>,
}

impl Providers {
    /// Production wiring from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let transcriber = Arc::new(speech::CloudTranscriber::new(
            &config.transcription.endpoint,
            config.transcription.resolved_api_key(),
            &config.transcription.model,
        ));
        Self {
            translator: Arc::new(translate::GtxTranslator::new(&config.translation.base_url)),
            detector: Arc::new(detect::WhatlangDetector),
            capture: Arc::new(speech::MicrophoneCapture::new(
                &config.capture,
                transcriber,
            )),
            synthesizer: Arc::new(synth::GoogleTts::new(&config.synthesis.base_url)),
            playback: Arc::new(synth::DetachedPlayback),
        }
    }
}
