use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Prebuilt provider voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoiceName {
    #[default]
    Puck,
    Charon,
    Kore,
    Fenrir,
    Zephyr,
    Aoede,
    Iapetus,
    Leda,
    Orus,
    Umbriel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceGender {
    Male,
    Female,
}

impl VoiceName {
    pub const ALL: [VoiceName; 10] = [
        VoiceName::Puck,
        VoiceName::Charon,
        VoiceName::Kore,
        VoiceName::Fenrir,
        VoiceName::Zephyr,
        VoiceName::Aoede,
        VoiceName::Iapetus,
        VoiceName::Leda,
        VoiceName::Orus,
        VoiceName::Umbriel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceName::Puck => "puck",
            VoiceName::Charon => "charon",
            VoiceName::Kore => "kore",
            VoiceName::Fenrir => "fenrir",
            VoiceName::Zephyr => "zephyr",
            VoiceName::Aoede => "aoede",
            VoiceName::Iapetus => "iapetus",
            VoiceName::Leda => "leda",
            VoiceName::Orus => "orus",
            VoiceName::Umbriel => "umbriel",
        }
    }

    /// Voice id expected by the provider (capitalized prebuilt name)
    pub fn provider_id(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn gender(&self) -> VoiceGender {
        match self {
            VoiceName::Kore | VoiceName::Aoede | VoiceName::Leda => VoiceGender::Female,
            _ => VoiceGender::Male,
        }
    }
}

impl std::fmt::Display for VoiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VoiceName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VoiceName::ALL
            .iter()
            .copied()
            .find(|voice| voice.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown voice: {}", s))
    }
}
