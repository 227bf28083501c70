pub mod audio;
pub mod cache;
pub mod tts;
