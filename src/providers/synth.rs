//! Speech synthesis adapter.
//!
//! Fetches MP3 audio from the Google Translate TTS endpoint
//! (`client=tw-ob`, no API key). The endpoint rejects long inputs, so text
//! is split into word-aligned chunks and the MP3 payloads are concatenated
//! (MP3 frames are self-contained, so the result stays decodable).
//! Playback runs on a detached thread and never reports back.

use async_trait::async_trait;
use std::time::Duration;

use super::{AudioClip, Playback, Synthesizer};
use crate::catalog::Language;
use crate::error::WorkflowError;

/// Longest `q` value the endpoint reliably accepts.
const MAX_CHUNK_CHARS: usize = 180;

// ── Synthesis ────────────────────────────────────────────────────

pub struct GoogleTts {
    http: reqwest::Client,
    base_url: String,
}

impl GoogleTts {
    pub fn new(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0")
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_chunk(&self, chunk: &str, language: Language) -> Result<Vec<u8>, WorkflowError> {
        let response = self
            .http
            .get(format!("{}/translate_tts", self.base_url))
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language.code()),
                ("q", chunk),
            ])
            .send()
            .await
            .map_err(|e| WorkflowError::Synthesis(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkflowError::Synthesis(format!(
                "provider returned status {status}"
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| WorkflowError::Synthesis(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Synthesizer for GoogleTts {
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
    ) -> Result<AudioClip, WorkflowError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(WorkflowError::Synthesis("nothing to synthesize".into()));
        }

        let mut data = Vec::new();
        for chunk in split_chunks(text, MAX_CHUNK_CHARS) {
            data.extend(self.fetch_chunk(&chunk, language).await?);
        }
        if data.is_empty() {
            return Err(WorkflowError::Synthesis("empty audio response".into()));
        }

        tracing::debug!(
            language = language.code(),
            chars = text.len(),
            bytes = data.len(),
            "synthesis completed"
        );
        Ok(AudioClip { data })
    }
}

/// Split on whitespace into chunks of at most `max_chars` characters.
/// A single overlong word is hard-split on char boundaries.
fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();

        if word_chars > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            let mut piece = String::new();
            let mut piece_chars = 0;
            for c in word.chars() {
                piece.push(c);
                piece_chars += 1;
                if piece_chars == max_chars {
                    chunks.push(std::mem::take(&mut piece));
                    piece_chars = 0;
                }
            }
            if !piece.is_empty() {
                chunks.push(piece);
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_chars
        } else {
            word_chars + 1
        };
        if current_chars + needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

// ── Playback ─────────────────────────────────────────────────────

/// Plays clips on a detached thread; failures are logged, never raised.
pub struct DetachedPlayback;

impl Playback for DetachedPlayback {
    fn play(&self, clip: AudioClip) {
        std::thread::spawn(move || {
            if let Err(e) = play_blocking(clip) {
                tracing::warn!(error = %e, "audio playback failed");
            }
        });
    }
}

fn play_blocking(clip: AudioClip) -> anyhow::Result<()> {
    let (_stream, handle) = rodio::OutputStream::try_default()?;
    let sink = rodio::Sink::try_new(&handle)?;
    sink.append(rodio::Decoder::new(std::io::Cursor::new(clip.data))?);
    sink.sleep_until_end();
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────
