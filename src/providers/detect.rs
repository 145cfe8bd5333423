//! Language identification adapter.
//!
//! Classification is local (`whatlang` trigram/script analysis) and
//! narrowed to the catalog: low-confidence results, empty text, and
//! languages the selector does not offer all map to
//! [`Detection::Unresolved`], which defers to the translation provider's
//! own server-side detection.

use whatlang::Lang;

use super::{Detection, Detector};
use crate::catalog::Language;

pub struct WhatlangDetector;

impl Detector for WhatlangDetector {
    fn detect(&self, text: &str) -> Detection {
        let text = text.trim();
        if text.is_empty() {
            return Detection::Unresolved;
        }
        match whatlang::detect(text) {
            Some(info) if info.is_reliable() => map_lang(info.lang()),
            _ => Detection::Unresolved,
        }
    }
}

fn map_lang(lang: Lang) -> Detection {
    let mapped = match lang {
        Lang::Eng => Language::English,
        Lang::Fra => Language::French,
        Lang::Spa => Language::Spanish,
        Lang::Deu => Language::German,
        Lang::Ita => Language::Italian,
        Lang::Por => Language::Portuguese,
        Lang::Ara => Language::Arabic,
        Lang::Cmn => Language::ChineseSimplified,
        Lang::Jpn => Language::Japanese,
        Lang::Kor => Language::Korean,
        Lang::Rus => Language::Russian,
        _ => return Detection::Unresolved,
    };
    Detection::Resolved(mapped)
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_japanese() {
        let text = "こんにちは、今日はとても良い天気ですね。散歩に行きましょう。";
        assert_eq!(
            WhatlangDetector.detect(text),
            Detection::Resolved(Language::Japanese)
        );
    }

    #[test]
    fn detects_korean() {
        let text = "안녕하세요, 오늘 날씨가 정말 좋네요. 같이 산책하러 갈까요?";
        assert_eq!(
            WhatlangDetector.detect(text),
            Detection::Resolved(Language::Korean)
        );
    }

    #[test]
    fn detects_english_prose() {
        let text = "The quick brown fox jumps over the lazy dog while the \
                    farmer watches from the old wooden fence near the barn.";
        assert_eq!(
            WhatlangDetector.detect(text),
            Detection::Resolved(Language::English)
        );
    }

    #[test]
    fn empty_text_is_unresolved() {
        assert_eq!(WhatlangDetector.detect(""), Detection::Unresolved);
        assert_eq!(WhatlangDetector.detect("   \n "), Detection::Unresolved);
    }

    #[test]
    fn out_of_catalog_language_is_unresolved() {
        // Greek script is unambiguous for whatlang but absent from the
        // selector, so it must defer to provider-side detection.
        let text = "Καλημέρα σε όλους, σήμερα ο καιρός είναι υπέροχος και \
                    πηγαίνουμε μια βόλτα στη θάλασσα.";
        assert_eq!(WhatlangDetector.detect(text), Detection::Unresolved);
    }

    #[test]
    fn map_covers_every_catalog_language() {
        let pairs = [
            (Lang::Eng, Language::English),
            (Lang::Fra, Language::French),
            (Lang::Spa, Language::Spanish),
            (Lang::Deu, Language::German),
            (Lang::Ita, Language::Italian),
            (Lang::Por, Language::Portuguese),
            (Lang::Ara, Language::Arabic),
            (Lang::Cmn, Language::ChineseSimplified),
            (Lang::Jpn, Language::Japanese),
            (Lang::Kor, Language::Korean),
            (Lang::Rus, Language::Russian),
        ];
        for (input, expected) in pairs {
            assert_eq!(map_lang(input), Detection::Resolved(expected));
        }
        assert_eq!(map_lang(Lang::Nld), Detection::Unresolved);
    }
}
