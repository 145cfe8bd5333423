//! Speech capture adapter.
//!
//! Records one utterance from the default input device and transcribes it
//! through an OpenAI-compatible `/audio/transcriptions` endpoint.
//!
//! ## Endpointing
//!
//! Utterance boundaries are energy based. The recorder waits for speech
//! onset (RMS above `onset_threshold`), then stops after `trailing_silence`
//! of quiet, or at the bounded `max_utterance` window when one is supplied
//! (the real-time loop always supplies one). A window that closes without
//! onset is [`WorkflowError::NoSpeechDetected`].
//!
//! The decision logic lives in [`Endpointer`], separate from the audio
//! plumbing, so it can be driven with synthetic level sequences in tests.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use super::SpeechCapture;
use crate::config::CaptureConfig;
use crate::error::WorkflowError;

// ── Transcription seam ───────────────────────────────────────────

/// Turns a mono 16-bit WAV clip into text. Blocking.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, wav: Vec<u8>) -> Result<String, WorkflowError>;
}

/// OpenAI-compatible `/audio/transcriptions` client.
pub struct CloudTranscriber {
    endpoint: String,
    api_key: String,
    model: String,
}

impl CloudTranscriber {
    pub fn new(endpoint: &str, api_key: String, model: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
        }
    }
}

impl Transcriber for CloudTranscriber {
    fn transcribe(&self, wav: Vec<u8>) -> Result<String, WorkflowError> {
        if self.api_key.trim().is_empty() {
            return Err(WorkflowError::Recognition(
                "transcription API key is not configured".into(),
            ));
        }

        // Built per request: `transcribe` always runs on a blocking thread,
        // and the blocking client must never be created on a runtime worker.
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| WorkflowError::Recognition(e.to_string()))?;

        let part = reqwest::blocking::multipart::Part::bytes(wav)
            .file_name("utterance.wav")
            .mime_str("audio/wav")
            .map_err(|e| WorkflowError::Recognition(e.to_string()))?;
        let form = reqwest::blocking::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "text")
            .text("temperature", "0");

        let response = http
            .post(format!("{}/audio/transcriptions", self.endpoint))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|e| WorkflowError::Recognition(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(WorkflowError::Recognition(format!(
                "provider returned status {status}: {detail}"
            )));
        }

        let transcript = response
            .text()
            .map_err(|e| WorkflowError::Recognition(e.to_string()))?
            .trim()
            .to_string();
        Ok(transcript)
    }
}

// ── Endpointing ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Continue,
    Complete,
    NoSpeech,
}

/// Utterance boundary decision state, fed with per-tick RMS levels.
pub(crate) struct Endpointer {
    onset_threshold: f32,
    trailing_silence: Duration,
    speech_wait: Duration,
    max_utterance: Option<Duration>,
    elapsed: Duration,
    quiet: Duration,
    heard_speech: bool,
}

impl Endpointer {
    pub(crate) fn new(
        onset_threshold: f32,
        trailing_silence: Duration,
        speech_wait: Duration,
        max_utterance: Option<Duration>,
    ) -> Self {
        Self {
            onset_threshold,
            trailing_silence,
            speech_wait,
            max_utterance,
            elapsed: Duration::ZERO,
            quiet: Duration::ZERO,
            heard_speech: false,
        }
    }

    pub(crate) fn observe(&mut self, rms: f32, dt: Duration) -> Verdict {
        self.elapsed += dt;

        if rms >= self.onset_threshold {
            self.heard_speech = true;
            self.quiet = Duration::ZERO;
        } else if self.heard_speech {
            self.quiet += dt;
        }

        if self.heard_speech {
            if self.quiet >= self.trailing_silence {
                return Verdict::Complete;
            }
            if let Some(limit) = self.max_utterance {
                if self.elapsed >= limit {
                    return Verdict::Complete;
                }
            }
            Verdict::Continue
        } else {
            // Without onset, the bounded window caps the wait too.
            let wait = self
                .max_utterance
                .map_or(self.speech_wait, |limit| limit.min(self.speech_wait));
            if self.elapsed >= wait {
                Verdict::NoSpeech
            } else {
                Verdict::Continue
            }
        }
    }
}

// ── Microphone capture ───────────────────────────────────────────

pub struct MicrophoneCapture {
    transcriber: Arc<dyn Transcriber>,
    onset_threshold: f32,
    trailing_silence: Duration,
    speech_wait: Duration,
}

impl MicrophoneCapture {
    pub fn new(config: &CaptureConfig, transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            transcriber,
            onset_threshold: config.onset_threshold,
            trailing_silence: Duration::from_millis(config.trailing_silence_ms),
            speech_wait: Duration::from_millis(config.speech_wait_ms),
        }
    }

    /// Record one utterance; returns mono samples and their sample rate.
    fn record(&self, max_utterance: Option<Duration>) -> Result<(Vec<f32>, u32), WorkflowError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| WorkflowError::Recognition("no default input device".into()))?;
        let supported = device
            .default_input_config()
            .map_err(|e| WorkflowError::Recognition(format!("input config: {e}")))?;

        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let stream_config: cpal::StreamConfig = supported.config();

        let buffer: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
        let stream = build_mono_stream(
            &device,
            &stream_config,
            supported.sample_format(),
            channels,
            Arc::clone(&buffer),
        )?;
        stream
            .play()
            .map_err(|e| WorkflowError::Recognition(format!("start capture: {e}")))?;

        let tick = Duration::from_millis(50);
        let mut endpointer = Endpointer::new(
            self.onset_threshold,
            self.trailing_silence,
            self.speech_wait,
            max_utterance,
        );
        let mut consumed = 0usize;

        loop {
            std::thread::sleep(tick);
            let level = {
                let buf = buffer.lock();
                let level = rms(&buf[consumed..]);
                consumed = buf.len();
                level
            };
            match endpointer.observe(level, tick) {
                Verdict::Continue => {}
                Verdict::Complete => break,
                Verdict::NoSpeech => {
                    drop(stream);
                    return Err(WorkflowError::NoSpeechDetected);
                }
            }
        }
        drop(stream);

        let samples = std::mem::take(&mut *buffer.lock());
        Ok((samples, sample_rate))
    }
}

impl SpeechCapture for MicrophoneCapture {
    fn capture(&self, max_utterance: Option<Duration>) -> Result<String, WorkflowError> {
        let (samples, sample_rate) = self.record(max_utterance)?;
        tracing::debug!(
            samples = samples.len(),
            sample_rate,
            "utterance captured, transcribing"
        );
        let wav = encode_wav(&samples, sample_rate)?;
        let transcript = self.transcriber.transcribe(wav)?;
        if transcript.is_empty() {
            // The engine heard the clip but found nothing intelligible.
            return Err(WorkflowError::NoSpeechDetected);
        }
        Ok(transcript)
    }
}

fn build_mono_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    format: cpal::SampleFormat,
    channels: usize,
    buffer: Arc<Mutex<Vec<f32>>>,
) -> Result<cpal::Stream, WorkflowError> {
    let err_fn = |e: cpal::StreamError| tracing::warn!(error = %e, "input stream error");
    let stream = match format {
        cpal::SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                push_mono(&buffer, data.iter().copied(), channels);
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                push_mono(
                    &buffer,
                    data.iter().map(|&s| f32::from(s) / 32768.0),
                    channels,
                );
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::U16 => device.build_input_stream(
            config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                push_mono(
                    &buffer,
                    data.iter().map(|&s| (f32::from(s) - 32768.0) / 32768.0),
                    channels,
                );
            },
            err_fn,
            None,
        ),
        other => {
            return Err(WorkflowError::Recognition(format!(
                "unsupported sample format: {other:?}"
            )))
        }
    };
    stream.map_err(|e| WorkflowError::Recognition(format!("open capture stream: {e}")))
}

/// Downmix interleaved frames to mono and append to the shared buffer.
fn push_mono(buffer: &Mutex<Vec<f32>>, samples: impl Iterator<Item = f32>, channels: usize) {
    let channels = channels.max(1);
    let mut out = buffer.lock();
    let mut frame = Vec::with_capacity(channels);
    for sample in samples {
        frame.push(sample);
        if frame.len() == channels {
            out.push(frame.iter().sum::<f32>() / channels as f32);
            frame.clear();
        }
    }
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Mono 16-bit PCM WAV at the capture rate.
fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, WorkflowError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| WorkflowError::Recognition(format!("wav encode: {e}")))?;
        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
            writer
                .write_sample(value)
                .map_err(|e| WorkflowError::Recognition(format!("wav encode: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| WorkflowError::Recognition(format!("wav encode: {e}")))?;
    }
    Ok(cursor.into_inner())
}

// ── Tests ────────────────────────────────────────────────────────
