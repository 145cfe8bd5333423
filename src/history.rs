//! Translation history log.
//!
//! Append-only CSV, one row per completed translation event. The header is
//! written once when the file is created; afterwards the file is only ever
//! appended to. A mutex spans the encode-and-flush of each row so appends
//! from the real-time task and one-shot workflows never interleave.

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::catalog::Language;
use crate::error::WorkflowError;

const HEADER: [&str; 6] = [
    "timestamp",
    "mode",
    "source_lang",
    "target_lang",
    "source_text",
    "translated_text",
];

// ── Event ────────────────────────────────────────────────────────

/// Which workflow produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Text,
    Speech,
    RealTime,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Speech => "speech",
            Self::RealTime => "real-time",
        }
    }
}

/// One completed translation, as persisted.
///
/// `source_lang` is a concrete code or the `unknown` sentinel — never
/// `auto`; `target_lang` is always a concrete catalog code.
#[derive(Debug, Clone)]
pub struct TranslationEvent {
    pub timestamp: DateTime<Local>,
    pub mode: Mode,
    pub source_lang: String,
    pub target_lang: String,
    pub source_text: String,
    pub translated_text: String,
}

impl TranslationEvent {
    /// Event stamped with the current local time.
    pub fn now(
        mode: Mode,
        source_lang: impl Into<String>,
        target: Language,
        source_text: impl Into<String>,
        translated_text: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            mode,
            source_lang: source_lang.into(),
            target_lang: target.code().to_string(),
            source_text: source_text.into(),
            translated_text: translated_text.into(),
        }
    }
}

// ── Log ──────────────────────────────────────────────────────────

pub struct HistoryLog {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
}

impl HistoryLog {
    /// Open (creating with a header row if absent) the log at `path`.
    pub fn open(path: &Path) -> Result<Self, WorkflowError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| WorkflowError::LogWrite(format!("{}: {e}", parent.display())))?;
            }
        }

        let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| WorkflowError::LogWrite(format!("{}: {e}", path.display())))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer
                .write_record(HEADER)
                .and_then(|()| writer.flush().map_err(csv::Error::from))
                .map_err(|e| WorkflowError::LogWrite(e.to_string()))?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(writer),
        })
    }

    /// Append one event. Every call writes a new row; there is no dedup.
    pub fn append(&self, event: &TranslationEvent) -> Result<(), WorkflowError> {
        let mut writer = self.writer.lock();
        writer
            .write_record([
                event.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().as_str(),
                event.mode.as_str(),
                &event.source_lang,
                &event.target_lang,
                &event.source_text,
                &event.translated_text,
            ])
            .and_then(|()| writer.flush().map_err(csv::Error::from))
            .map_err(|e| WorkflowError::LogWrite(e.to_string()))?;

        tracing::debug!(
            mode = event.mode.as_str(),
            source = %event.source_lang,
            target = %event.target_lang,
            "history row appended"
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ── Tests ────────────────────────────────────────────────────────
