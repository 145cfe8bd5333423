//! Static language catalog.
//!
//! The selector surface exposes a fixed, ordered set of languages plus the
//! "Auto Detect" sentinel. Codes are the identifiers the translation
//! provider accepts (`zh-CN` rather than bare `zh`). The catalog never
//! changes at runtime; uniqueness of codes and display names is covered by
//! unit tests so a bad edit fails CI instead of misrouting a request.

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// Sentinel code for "defer to automatic detection".
pub const AUTO_CODE: &str = "auto";
/// Display name of the auto-detect sentinel entry.
pub const AUTO_DISPLAY: &str = "Auto Detect";
/// Sentinel written to history when detection could not resolve a language.
pub const UNKNOWN_CODE: &str = "unknown";

// ── Languages ────────────────────────────────────────────────────

/// The concrete languages the selector surface offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    French,
    Spanish,
    German,
    Italian,
    Portuguese,
    Arabic,
    ChineseSimplified,
    Japanese,
    Korean,
    Russian,
}

impl Language {
    /// Provider language code.
    pub fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::French => "fr",
            Self::Spanish => "es",
            Self::German => "de",
            Self::Italian => "it",
            Self::Portuguese => "pt",
            Self::Arabic => "ar",
            Self::ChineseSimplified => "zh-CN",
            Self::Japanese => "ja",
            Self::Korean => "ko",
            Self::Russian => "ru",
        }
    }

    /// Human-readable name shown in the selector.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::French => "French",
            Self::Spanish => "Spanish",
            Self::German => "German",
            Self::Italian => "Italian",
            Self::Portuguese => "Portuguese",
            Self::Arabic => "Arabic",
            Self::ChineseSimplified => "Chinese (Simplified)",
            Self::Japanese => "Japanese",
            Self::Korean => "Korean",
            Self::Russian => "Russian",
        }
    }

    /// Parse from a provider code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "en" => Some(Self::English),
            "fr" => Some(Self::French),
            "es" => Some(Self::Spanish),
            "de" => Some(Self::German),
            "it" => Some(Self::Italian),
            "pt" => Some(Self::Portuguese),
            "ar" => Some(Self::Arabic),
            "zh-cn" | "zh_cn" => Some(Self::ChineseSimplified),
            "ja" => Some(Self::Japanese),
            "ko" => Some(Self::Korean),
            "ru" => Some(Self::Russian),
            _ => None,
        }
    }

    /// All languages in selector order.
    pub fn all() -> &'static [Language] {
        &[
            Self::English,
            Self::French,
            Self::Spanish,
            Self::German,
            Self::Italian,
            Self::Portuguese,
            Self::Arabic,
            Self::ChineseSimplified,
            Self::Japanese,
            Self::Korean,
            Self::Russian,
        ]
    }
}

// ── Source selection ─────────────────────────────────────────────

/// Source-language selector value: a concrete language or the auto sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceSelection {
    #[default]
    Auto,
    Fixed(Language),
}

impl SourceSelection {
    /// Provider code for this selection (`auto` for the sentinel).
    pub fn code(self) -> &'static str {
        match self {
            Self::Auto => AUTO_CODE,
            Self::Fixed(lang) => lang.code(),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Auto => AUTO_DISPLAY,
            Self::Fixed(lang) => lang.display_name(),
        }
    }
}

// ── Catalog entries ──────────────────────────────────────────────

/// One row of the selector surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageEntry {
    pub display_name: &'static str,
    pub code: &'static str,
}

const ENTRIES: [LanguageEntry; 12] = [
    LanguageEntry { display_name: AUTO_DISPLAY, code: AUTO_CODE },
    LanguageEntry { display_name: "English", code: "en" },
    LanguageEntry { display_name: "French", code: "fr" },
    LanguageEntry { display_name: "Spanish", code: "es" },
    LanguageEntry { display_name: "German", code: "de" },
    LanguageEntry { display_name: "Italian", code: "it" },
    LanguageEntry { display_name: "Portuguese", code: "pt" },
    LanguageEntry { display_name: "Arabic", code: "ar" },
    LanguageEntry { display_name: "Chinese (Simplified)", code: "zh-CN" },
    LanguageEntry { display_name: "Japanese", code: "ja" },
    LanguageEntry { display_name: "Korean", code: "ko" },
    LanguageEntry { display_name: "Russian", code: "ru" },
];

/// The full ordered catalog, auto-detect sentinel first.
pub fn all() -> &'static [LanguageEntry] {
    &ENTRIES
}

/// Resolve a display name to its provider code.
pub fn resolve(display_name: &str) -> Result<&'static str, WorkflowError> {
    ENTRIES
        .iter()
        .find(|e| e.display_name == display_name)
        .map(|e| e.code)
        .ok_or_else(|| WorkflowError::UnknownLanguage(display_name.to_string()))
}

/// Resolve a display name to a source selection (sentinel allowed).
pub fn resolve_source(display_name: &str) -> Result<SourceSelection, WorkflowError> {
    if display_name == AUTO_DISPLAY {
        return Ok(SourceSelection::Auto);
    }
    resolve_target(display_name).map(SourceSelection::Fixed)
}

/// Resolve a display name to a concrete target language.
///
/// The sentinel is not a valid target: history rows must never carry `auto`.
pub fn resolve_target(display_name: &str) -> Result<Language, WorkflowError> {
    Language::all()
        .iter()
        .copied()
        .find(|lang| lang.display_name() == display_name)
        .ok_or_else(|| WorkflowError::UnknownLanguage(display_name.to_string()))
}

// ── Tests ────────────────────────────────────────────────────────
