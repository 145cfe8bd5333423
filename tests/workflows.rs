//! End-to-end workflow properties, driven with scripted adapter doubles.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

use voicebridge::catalog::{Language, SourceSelection};
use voicebridge::config::AppConfig;
use voicebridge::error::WorkflowError;
use voicebridge::history::HistoryLog;
use voicebridge::providers::{
    AudioClip, Detection, Detector, Playback, Providers, SpeechCapture, Synthesizer, Translator,
};
use voicebridge::session::{SessionController, SessionEvent};

// ── Adapter doubles ──────────────────────────────────────────────

/// Echoes the input tagged with the target code; counts invocations.
struct TaggingTranslator {
    calls: AtomicUsize,
}

impl TaggingTranslator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Translator for TaggingTranslator {
    async fn translate(
        &self,
        text: &str,
        _source: SourceSelection,
        target: Language,
    ) -> Result<String, WorkflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("[{}] {text}", target.code()))
    }
}

struct FailingTranslator;

#[async_trait]
impl Translator for FailingTranslator {
    async fn translate(
        &self,
        _text: &str,
        _source: SourceSelection,
        _target: Language,
    ) -> Result<String, WorkflowError> {
        Err(WorkflowError::Translation("upstream down".into()))
    }
}

struct FixedDetector(Detection);

impl Detector for FixedDetector {
    fn detect(&self, _text: &str) -> Detection {
        self.0
    }
}

/// Returns queued results, then slow `NoSpeechDetected` forever.
struct ScriptedCapture {
    script: Mutex<VecDeque<Result<String, WorkflowError>>>,
    calls: AtomicUsize,
}

impl ScriptedCapture {
    fn new(script: Vec<Result<String, WorkflowError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }
}

impl SpeechCapture for ScriptedCapture {
    fn capture(&self, _max_utterance: Option<Duration>) -> Result<String, WorkflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().pop_front() {
            Some(result) => result,
            None => {
                std::thread::sleep(Duration::from_millis(20));
                Err(WorkflowError::NoSpeechDetected)
            }
        }
    }
}

struct CountingSynthesizer {
    calls: AtomicUsize,
}

impl CountingSynthesizer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Synthesizer for CountingSynthesizer {
    async fn synthesize(
        &self,
        _text: &str,
        _language: Language,
    ) -> Result<AudioClip, WorkflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AudioClip {
            data: vec![0xFF, 0xFB],
        })
    }
}

struct NullPlayback;

impl Playback for NullPlayback {
    fn play(&self, _clip: AudioClip) {}
}

// ── Harness ──────────────────────────────────────────────────────

struct Harness {
    controller: Arc<SessionController>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    history_path: PathBuf,
    _dir: TempDir,
}

fn harness(providers: Providers) -> Harness {
    let dir = TempDir::new().unwrap();
    let history_path = dir.path().join("history.csv");
    let history = Arc::new(HistoryLog::open(&history_path).unwrap());
    let (events_tx, events) = mpsc::unbounded_channel();
    let controller =
        SessionController::new(providers, history, &AppConfig::default(), events_tx).unwrap();
    Harness {
        controller,
        events,
        history_path,
        _dir: dir,
    }
}

fn default_providers() -> (Arc<TaggingTranslator>, Arc<CountingSynthesizer>, Providers) {
    let translator = TaggingTranslator::new();
    let synthesizer = CountingSynthesizer::new();
    let providers = Providers {
        translator: translator.clone(),
        detector: Arc::new(FixedDetector(Detection::Resolved(Language::English))),
        capture: ScriptedCapture::new(Vec::new()),
        synthesizer: synthesizer.clone(),
        playback: Arc::new(NullPlayback),
    };
    (translator, synthesizer, providers)
}

fn rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

async fn wait_for_rows(path: &Path, n: usize) {
    for _ in 0..150 {
        if path.exists() && rows(path).len() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {n} history rows");
}

fn drain(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

// ── Text translation ─────────────────────────────────────────────

#[tokio::test]
async fn text_translation_appends_one_row_with_requested_target() {
    let (_, _, providers) = default_providers();
    let h = harness(providers);

    {
        let state = h.controller.state();
        let mut state = state.lock();
        state.source = SourceSelection::Fixed(Language::English);
        state.target = Language::Korean;
        state.input = "good morning".to_string();
    }

    h.controller.run_text_translation().await.unwrap();

    assert_eq!(h.controller.state().lock().output, "[ko] good morning");
    let rows = rows(&h.history_path);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], "text");
    assert_eq!(rows[0][2], "en");
    assert_eq!(rows[0][3], "ko");
    assert_eq!(rows[0][4], "good morning");
}

#[tokio::test]
async fn unresolved_detection_logs_unknown_and_still_succeeds() {
    let (translator, synthesizer, mut providers) = default_providers();
    providers.detector = Arc::new(FixedDetector(Detection::Unresolved));
    let h = harness(providers);

    {
        let state = h.controller.state();
        let mut state = state.lock();
        state.input = "szia vilag".to_string();
    }

    h.controller.run_text_translation().await.unwrap();

    let rows = rows(&h.history_path);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][2], "unknown");
    assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_input_aborts_without_logging() {
    let (_, _, providers) = default_providers();
    let h = harness(providers);

    let err = h.controller.run_text_translation().await.unwrap_err();
    assert!(matches!(err, WorkflowError::EmptyInput));
    assert_eq!(rows(&h.history_path).len(), 0);
}

#[tokio::test]
async fn translation_failure_logs_nothing_and_keeps_output() {
    let (_, _, mut providers) = default_providers();
    providers.translator = Arc::new(FailingTranslator);
    let h = harness(providers);

    {
        let state = h.controller.state();
        let mut state = state.lock();
        state.input = "hello".to_string();
        state.output = "previous translation".to_string();
    }

    let err = h.controller.run_text_translation().await.unwrap_err();
    assert!(matches!(err, WorkflowError::Translation(_)));
    assert_eq!(rows(&h.history_path).len(), 0);
    assert_eq!(h.controller.state().lock().output, "previous translation");
}

// ── Speech workflows ─────────────────────────────────────────────

#[tokio::test]
async fn speech_to_text_fills_input_without_logging() {
    let (_, _, mut providers) = default_providers();
    providers.capture = ScriptedCapture::new(vec![Ok("hello there".to_string())]);
    let mut h = harness(providers);

    h.controller.run_speech_to_text().await.unwrap();

    assert_eq!(h.controller.state().lock().input, "hello there");
    assert_eq!(rows(&h.history_path).len(), 0);
    let events = drain(&mut h.events);
    assert!(events.iter().any(
        |e| matches!(e, SessionEvent::Notice(msg) if msg.contains("Recognized: hello there"))
    ));
}

#[tokio::test]
async fn speech_to_speech_logs_speech_mode_on_full_success() {
    let (translator, synthesizer, mut providers) = default_providers();
    providers.capture = ScriptedCapture::new(vec![Ok("hello".to_string())]);
    let h = harness(providers);

    h.controller.run_speech_to_speech().await.unwrap();

    let rows = rows(&h.history_path);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], "speech");
    assert_eq!(rows[0][2], "en");
    assert_eq!(rows[0][3], "fr");
    assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.controller.state().lock().output, "[fr] hello");
}

#[tokio::test]
async fn capture_failure_short_circuits_speech_to_speech() {
    let (translator, synthesizer, mut providers) = default_providers();
    let capture = ScriptedCapture::new(vec![Err(WorkflowError::NoSpeechDetected)]);
    providers.capture = capture.clone();
    let h = harness(providers);

    let err = h.controller.run_speech_to_speech().await.unwrap_err();
    assert!(matches!(err, WorkflowError::NoSpeechDetected));

    // First failure stops the chain: nothing downstream runs, nothing logs.
    assert_eq!(capture.calls.load(Ordering::SeqCst), 1);
    assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(rows(&h.history_path).len(), 0);
}

// ── Real-time loop ───────────────────────────────────────────────

#[tokio::test]
async fn realtime_appends_rows_in_iteration_order() {
    let (_, _, mut providers) = default_providers();
    providers.capture = ScriptedCapture::new(vec![
        Ok("phrase one".to_string()),
        Err(WorkflowError::NoSpeechDetected),
        Ok("phrase two".to_string()),
        Ok("phrase three".to_string()),
    ]);
    let mut h = harness(providers);

    assert!(h.controller.start_realtime());
    wait_for_rows(&h.history_path, 3).await;
    h.controller.stop_realtime().await;
    assert!(!h.controller.realtime_active());

    let rows = rows(&h.history_path);
    assert_eq!(rows.len(), 3);
    let sources: Vec<&str> = rows.iter().map(|r| r[4].as_str()).collect();
    assert_eq!(sources, vec!["phrase one", "phrase two", "phrase three"]);
    for row in &rows {
        assert_eq!(row[1], "real-time");
    }

    // Skipped iteration appended nothing but also did not stop the loop.
    let output = h.controller.state().lock().output.clone();
    assert!(output.contains("You: phrase one"));
    assert!(output.contains("→ [fr] phrase three"));

    let events = drain(&mut h.events);
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::RealtimeStarted)));
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::RealtimeStopped)));
}

#[tokio::test]
async fn realtime_swallows_translation_failures_and_continues() {
    let (_, _, mut providers) = default_providers();
    providers.translator = Arc::new(FailingTranslator);
    providers.capture = ScriptedCapture::new(vec![
        Ok("will not translate".to_string()),
        Ok("also dropped".to_string()),
    ]);
    let h = harness(providers);

    assert!(h.controller.start_realtime());
    // Give the loop time to chew through both scripted utterances.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(h.controller.realtime_active());
    h.controller.stop_realtime().await;

    assert_eq!(rows(&h.history_path).len(), 0);
}

#[tokio::test]
async fn only_one_realtime_loop_at_a_time() {
    let (_, _, providers) = default_providers();
    let h = harness(providers);

    assert!(h.controller.start_realtime());
    assert!(!h.controller.start_realtime());
    h.controller.stop_realtime().await;

    // After a clean stop a new loop may start again.
    assert!(h.controller.start_realtime());
    h.controller.stop_realtime().await;
}

#[tokio::test]
async fn stop_without_start_is_a_noop() {
    let (_, _, providers) = default_providers();
    let h = harness(providers);
    h.controller.stop_realtime().await;
    assert!(!h.controller.realtime_active());
}
