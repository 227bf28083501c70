use crate::domain::tts::segmenter::normalize_text;
use crate::domain::tts::{SynthesisConfig, VoiceName};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Whole-request fingerprint fields, in canonical order
#[derive(Serialize)]
struct RequestFields<'a> {
    t: &'a str,
    v: &'a str,
    s: f32,
    l: &'a str,
}

/// Per-chunk fingerprint fields. Speed and language are left out on purpose:
/// a chunk's audio for a voice is reusable across requests.
#[derive(Serialize)]
struct ChunkFields<'a> {
    t: &'a str,
    v: &'a str,
}

fn sha256_hex<T: Serialize>(fields: &T) -> String {
    let canonical = serde_json::to_vec(fields).expect("fingerprint fields always serialize");
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    hex::encode(hasher.finalize())
}

/// Fingerprint of a whole synthesis request
pub fn request_fingerprint(text: &str, config: &SynthesisConfig) -> String {
    let text = normalize_text(text);
    sha256_hex(&RequestFields {
        t: &text,
        v: config.voice.as_str(),
        s: config.speed,
        l: config.language.as_str(),
    })
}

/// Fingerprint of a single chunk for a voice
pub fn chunk_fingerprint(text: &str, voice: VoiceName) -> String {
    let text = normalize_text(text);
    sha256_hex(&ChunkFields {
        t: &text,
        v: voice.as_str(),
    })
}
