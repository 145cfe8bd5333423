//! Session controller: sequences adapter calls per workflow.
//!
//! Each user intent drives one workflow through the stage machine
//! `Idle → Capturing? → Detecting? → Translating? → Synthesizing? → Idle`:
//!
//! | Workflow         | Path                                                  |
//! |------------------|-------------------------------------------------------|
//! | Text translation | Detecting (iff source = auto) → Translating           |
//! | Text-to-speech   | Synthesizing                                          |
//! | Speech-to-text   | Capturing                                             |
//! | Speech-to-speech | Capturing → Detecting → Translating → Synthesizing    |
//! | Real-time        | loop { Capturing → Detecting → Translating } until cancelled |
//!
//! One-shot workflows run as tracked tokio tasks off the UI-redraw path; at
//! most one is in flight at a time. The real-time loop is the single
//! deliberate background path, owned via [`realtime::RealtimeHandle`].
//! A history row is appended only after a workflow's full chain succeeds.

pub mod realtime;
pub mod state;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;

use crate::catalog::{Language, SourceSelection};
use crate::config::AppConfig;
use crate::error::WorkflowError;
use crate::history::{HistoryLog, Mode, TranslationEvent};
use crate::providers::Providers;

pub use state::{SessionEvent, SessionState, WorkflowStage};

// ── Intents ──────────────────────────────────────────────────────

/// The actions the presentation surface can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    TranslateText,
    CopyTranslation,
    TextToSpeech,
    SpeechToText,
    SpeechToSpeech,
    ToggleRealtime,
}

/// One-shot workflow kinds (everything except copy and the real-time toggle).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OneShot {
    TranslateText,
    TextToSpeech,
    SpeechToText,
    SpeechToSpeech,
}

// ── Controller ───────────────────────────────────────────────────

pub struct SessionController {
    providers: Providers,
    history: Arc<HistoryLog>,
    state: Arc<Mutex<SessionState>>,
    events: mpsc::UnboundedSender<SessionEvent>,
    tracker: TaskTracker,
    one_shot_busy: AtomicBool,
    realtime: Mutex<Option<realtime::RealtimeHandle>>,
    phrase_limit: Duration,
}

impl SessionController {
    pub fn new(
        providers: Providers,
        history: Arc<HistoryLog>,
        config: &AppConfig,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<Arc<Self>, WorkflowError> {
        let target = config.default_target()?;
        Ok(Arc::new(Self {
            providers,
            history,
            state: Arc::new(Mutex::new(SessionState::new(target))),
            events,
            tracker: TaskTracker::new(),
            one_shot_busy: AtomicBool::new(false),
            realtime: Mutex::new(None),
            phrase_limit: Duration::from_secs(config.capture.phrase_time_limit_secs),
        }))
    }

    /// Shared handle to the session state (the UI edits input/selectors
    /// through it).
    pub fn state(&self) -> Arc<Mutex<SessionState>> {
        Arc::clone(&self.state)
    }

    /// Route a user intent. Never blocks the caller.
    pub fn dispatch(self: &Arc<Self>, intent: Intent) {
        match intent {
            Intent::TranslateText => self.spawn_one_shot(OneShot::TranslateText),
            Intent::TextToSpeech => self.spawn_one_shot(OneShot::TextToSpeech),
            Intent::SpeechToText => self.spawn_one_shot(OneShot::SpeechToText),
            Intent::SpeechToSpeech => self.spawn_one_shot(OneShot::SpeechToSpeech),
            Intent::CopyTranslation => self.copy_translation(),
            Intent::ToggleRealtime => {
                if self.realtime_active() {
                    let this = Arc::clone(self);
                    self.tracker.spawn(async move { this.stop_realtime().await });
                } else if !self.start_realtime() {
                    self.notice("Real-time translation is already running.");
                }
            }
        }
    }

    /// Stop background work and wait for tracked tasks to finish.
    pub async fn shutdown(&self) {
        self.stop_realtime().await;
        self.tracker.close();
        self.tracker.wait().await;
    }

    // ── One-shot dispatch ────────────────────────────────────────

    fn spawn_one_shot(self: &Arc<Self>, kind: OneShot) {
        if self.one_shot_busy.swap(true, Ordering::SeqCst) {
            self.notice("Another action is still running.");
            return;
        }
        let this = Arc::clone(self);
        self.tracker.spawn(async move {
            let result = this.run_one_shot(kind).await;
            this.one_shot_busy.store(false, Ordering::SeqCst);
            this.set_stage(WorkflowStage::Idle);
            if let Err(err) = result {
                this.report_failure(kind, err);
            }
        });
    }

    async fn run_one_shot(&self, kind: OneShot) -> Result<(), WorkflowError> {
        match kind {
            OneShot::TranslateText => self.run_text_translation().await,
            OneShot::TextToSpeech => self.run_text_to_speech().await,
            OneShot::SpeechToText => self.run_speech_to_text().await,
            OneShot::SpeechToSpeech => self.run_speech_to_speech().await,
        }
    }

    fn report_failure(&self, kind: OneShot, err: WorkflowError) {
        match err.stage() {
            Some(stage) => {
                tracing::warn!(stage = stage.as_str(), error = %err, "workflow aborted");
                let _ = self.events.send(SessionEvent::Failure {
                    stage,
                    message: err.to_string(),
                });
            }
            None => {
                let message = match (kind, &err) {
                    (OneShot::TranslateText, WorkflowError::EmptyInput) => {
                        "Enter some text to translate first.".to_string()
                    }
                    (OneShot::TextToSpeech, WorkflowError::EmptyInput) => {
                        "No translation available to speak.".to_string()
                    }
                    _ => err.to_string(),
                };
                self.notice(message);
            }
        }
    }

    // ── Workflows ────────────────────────────────────────────────

    /// Text translation: Detecting (iff source = auto) → Translating.
    pub async fn run_text_translation(&self) -> Result<(), WorkflowError> {
        let (text, source, target) = {
            let s = self.state.lock();
            (s.input.trim().to_string(), s.source, s.target)
        };
        if text.is_empty() {
            return Err(WorkflowError::EmptyInput);
        }

        if matches!(source, SourceSelection::Auto) {
            self.set_stage(WorkflowStage::Detecting);
        }
        let (provider_source, logged_source) = self.resolve_source(&text, source);

        self.set_stage(WorkflowStage::Translating);
        let translated = self
            .providers
            .translator
            .translate(&text, provider_source, target)
            .await?;

        self.state.lock().output = translated.clone();
        self.append_history(Mode::Text, &logged_source, target, &text, &translated)?;
        tracing::info!(
            mode = "text",
            source = %logged_source,
            target = target.code(),
            "workflow completed"
        );
        Ok(())
    }

    /// Text-to-speech playback of the output buffer.
    pub async fn run_text_to_speech(&self) -> Result<(), WorkflowError> {
        let (text, target) = {
            let s = self.state.lock();
            (s.output.trim().to_string(), s.target)
        };
        if text.is_empty() {
            return Err(WorkflowError::EmptyInput);
        }

        self.set_stage(WorkflowStage::Synthesizing);
        let clip = self.providers.synthesizer.synthesize(&text, target).await?;
        self.providers.playback.play(clip);
        Ok(())
    }

    /// Speech-to-text: one utterance into the input buffer. No translation,
    /// no history row.
    pub async fn run_speech_to_text(&self) -> Result<(), WorkflowError> {
        let transcript = self.capture_utterance(None).await?;
        self.state.lock().input = transcript.clone();
        self.notice(format!("Recognized: {transcript}"));
        Ok(())
    }

    /// Speech-to-speech: full chain, history row only on full success.
    pub async fn run_speech_to_speech(&self) -> Result<(), WorkflowError> {
        let transcript = self.capture_utterance(None).await?;

        let (source, target) = {
            let s = self.state.lock();
            (s.source, s.target)
        };
        if matches!(source, SourceSelection::Auto) {
            self.set_stage(WorkflowStage::Detecting);
        }
        let (provider_source, logged_source) = self.resolve_source(&transcript, source);

        self.set_stage(WorkflowStage::Translating);
        let translated = self
            .providers
            .translator
            .translate(&transcript, provider_source, target)
            .await?;
        self.state.lock().output = translated.clone();

        self.set_stage(WorkflowStage::Synthesizing);
        let clip = self
            .providers
            .synthesizer
            .synthesize(&translated, target)
            .await?;
        self.providers.playback.play(clip);

        self.append_history(Mode::Speech, &logged_source, target, &transcript, &translated)?;
        tracing::info!(
            mode = "speech",
            source = %logged_source,
            target = target.code(),
            "workflow completed"
        );
        Ok(())
    }

    // ── Shared pieces ────────────────────────────────────────────

    /// Capture one utterance off the async context.
    async fn capture_utterance(
        &self,
        max_utterance: Option<Duration>,
    ) -> Result<String, WorkflowError> {
        self.set_stage(WorkflowStage::Capturing);
        let capture = Arc::clone(&self.providers.capture);
        tokio::task::spawn_blocking(move || capture.capture(max_utterance))
            .await
            .map_err(|e| WorkflowError::Recognition(format!("capture task failed: {e}")))?
    }

    /// What the provider is told and what history records for the source.
    fn resolve_source(&self, text: &str, selection: SourceSelection) -> (SourceSelection, String) {
        match selection {
            SourceSelection::Fixed(lang) => (selection, lang.code().to_string()),
            SourceSelection::Auto => {
                let detection = self.providers.detector.detect(text);
                (
                    detection.provider_source(),
                    detection.logged_code().to_string(),
                )
            }
        }
    }

    fn append_history(
        &self,
        mode: Mode,
        source_lang: &str,
        target: Language,
        source_text: &str,
        translated: &str,
    ) -> Result<(), WorkflowError> {
        self.history.append(&TranslationEvent::now(
            mode,
            source_lang,
            target,
            source_text,
            translated,
        ))
    }

    fn copy_translation(&self) {
        let output = self.state.lock().output.trim().to_string();
        if output.is_empty() {
            self.notice("Nothing to copy yet.");
            return;
        }
        if crate::clipboard::copy(&output) {
            self.notice("Translation copied to clipboard.");
        } else {
            self.notice("Clipboard is unavailable.");
        }
    }

    fn set_stage(&self, stage: WorkflowStage) {
        let _ = self.events.send(SessionEvent::StageChanged(stage));
    }

    fn notice(&self, message: impl Into<String>) {
        let _ = self.events.send(SessionEvent::Notice(message.into()));
    }
}
