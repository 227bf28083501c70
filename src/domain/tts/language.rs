use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Target language of a synthesis request. `Original` means no translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LanguageCode {
    #[default]
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "hi-IN")]
    HindiIndia,
    #[serde(rename = "en-US")]
    EnglishUs,
    #[serde(rename = "en-IN")]
    EnglishIndia,
    #[serde(rename = "es-ES")]
    Spanish,
    #[serde(rename = "fr-FR")]
    French,
    #[serde(rename = "de-DE")]
    German,
    #[serde(rename = "ja-JP")]
    Japanese,
    #[serde(rename = "zh-CN")]
    ChineseSimplified,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 9] = [
        LanguageCode::Original,
        LanguageCode::HindiIndia,
        LanguageCode::EnglishUs,
        LanguageCode::EnglishIndia,
        LanguageCode::Spanish,
        LanguageCode::French,
        LanguageCode::German,
        LanguageCode::Japanese,
        LanguageCode::ChineseSimplified,
    ];

    /// Get the BCP 47 tag (or `original`) as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::Original => "original",
            LanguageCode::HindiIndia => "hi-IN",
            LanguageCode::EnglishUs => "en-US",
            LanguageCode::EnglishIndia => "en-IN",
            LanguageCode::Spanish => "es-ES",
            LanguageCode::French => "fr-FR",
            LanguageCode::German => "de-DE",
            LanguageCode::Japanese => "ja-JP",
            LanguageCode::ChineseSimplified => "zh-CN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LanguageCode::Original => "Original (No Translation)",
            LanguageCode::HindiIndia => "Hindi (India)",
            LanguageCode::EnglishUs => "English (US)",
            LanguageCode::EnglishIndia => "English (India)",
            LanguageCode::Spanish => "Spanish",
            LanguageCode::French => "French",
            LanguageCode::German => "German",
            LanguageCode::Japanese => "Japanese",
            LanguageCode::ChineseSimplified => "Chinese (Simplified)",
        }
    }

    /// Whether text must be translated before synthesis
    pub fn needs_translation(&self) -> bool {
        *self != LanguageCode::Original
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LanguageCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unsupported language: {}", s))
    }
}
