// End-to-end tests for the Lumina TTS service
//
// The provider is replaced by a scripted stub and the cache by the in-memory
// store, so the suite needs neither network nor database.
//
// - test_pipeline: the synthesis pipeline driven directly, on a paused clock
// - test_tts / test_health: the HTTP surface through the axum router

mod test_health;
mod test_pipeline;
mod test_tts;
