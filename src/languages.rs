//! # Language Catalogue
//!
//! The languages a learner can pick, with the identifiers each external
//! service expects:
//! - **short code** (`fr`): what the translator takes
//! - **locale tag** (`fr-FR`): what recognition and the quiz dataset use
//! - **voice** (`fr-FR-DeniseNeural`): what speech synthesis uses
//!
//! Anything the catalogue does not know falls back to US English, so a typo in
//! a request degrades to English audio instead of failing the request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported learning languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    French,
    Spanish,
    German,
    Hindi,
    Tamil,
    Telugu,
}

impl Language {
    /// Every language, in the order the language selector lists them.
    pub const ALL: [Language; 7] = [
        Language::French,
        Language::Spanish,
        Language::German,
        Language::Hindi,
        Language::Tamil,
        Language::Telugu,
        Language::English,
    ];

    /// Languages offered in quiz mode.
    pub const QUIZ: [Language; 5] = [
        Language::French,
        Language::Spanish,
        Language::German,
        Language::Hindi,
        Language::Tamil,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::French => "French",
            Language::Spanish => "Spanish",
            Language::German => "German",
            Language::Hindi => "Hindi",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
        }
    }

    pub fn short_code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
            Language::Spanish => "es",
            Language::German => "de",
            Language::Hindi => "hi",
            Language::Tamil => "ta",
            Language::Telugu => "te",
        }
    }

    pub fn locale(&self) -> &'static str {
        match self {
            Language::English => "en-US",
            Language::French => "fr-FR",
            Language::Spanish => "es-ES",
            Language::German => "de-DE",
            Language::Hindi => "hi-IN",
            Language::Tamil => "ta-IN",
            Language::Telugu => "te-IN",
        }
    }

    /// Neural voice used when reading text aloud in this language.
    pub fn voice(&self) -> &'static str {
        match self {
            Language::English => "en-US-AriaNeural",
            Language::French => "fr-FR-DeniseNeural",
            Language::Spanish => "es-ES-ElviraNeural",
            Language::German => "de-DE-KatjaNeural",
            Language::Hindi => "hi-IN-SwaraNeural",
            Language::Tamil => "ta-IN-PallaviNeural",
            Language::Telugu => "te-IN-MohanNeural",
        }
    }

    pub fn in_quiz(&self) -> bool {
        Language::QUIZ.contains(self)
    }

    /// Resolve a short code, a locale tag or a display name (case-insensitive).
    pub fn from_tag(tag: &str) -> Option<Language> {
        let tag = tag.trim();
        Language::ALL.into_iter().find(|language| {
            tag.eq_ignore_ascii_case(language.short_code())
                || tag.eq_ignore_ascii_case(language.locale())
                || tag.eq_ignore_ascii_case(language.name())
        })
    }

    /// Like [`Language::from_tag`], but unknown tags resolve to English.
    pub fn from_tag_or_default(tag: &str) -> Language {
        Language::from_tag(tag).unwrap_or_default()
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_tag(s).ok_or_else(|| format!("Unknown language: {}", s))
    }
}

/// Whether the learner gets audio help for the target language.
///
/// `Hard` hides "hear in target language" in practice and "hear the answer"
/// in the quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeLevel {
    #[default]
    Normal,
    Hard,
}

impl ChallengeLevel {
    pub fn allows_target_audio(&self) -> bool {
        matches!(self, ChallengeLevel::Normal)
    }
}
