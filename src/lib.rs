//! VoiceBridge: desktop speech and text translator.
//!
//! Five workflows — text translation, text-to-speech, speech-to-text,
//! speech-to-speech, and continuous real-time translation — orchestrated by
//! [`session::SessionController`] over narrow adapter traits
//! ([`providers`]) wrapping the external translation, detection,
//! recognition, and synthesis services. Completed translations are appended
//! to an append-only CSV history ([`history`]).

pub mod catalog;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod history;
pub mod providers;
pub mod session;
pub mod ui;
