use crate::e2e::helpers;

use axum::http::StatusCode;
use helpers::scripted_provider::{server_error, SAMPLES_PER_WORD};
use helpers::{decode_base64, parse_wav, TestContext};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const TEXT: &str = "Hello there, this is the first sentence. And here is the second one.";

async fn synthesize(ctx: &TestContext, body: Value) -> helpers::api_client::ApiResponse {
    ctx.client.post("/api/tts/synthesize", &body).await.unwrap()
}

#[tokio::test]
async fn it_should_synthesize_text_to_speech() {
    let ctx = TestContext::new();

    let response = synthesize(&ctx, json!({ "text": TEXT, "voice": "kore" })).await;

    response.assert_status(StatusCode::OK);
    let body = response.json();
    assert_eq!(body["content_type"], "audio/wav");
    assert_eq!(body["from_cache"], false);
    assert_eq!(
        body["chunks"],
        json!([
            "Hello there, this is the first sentence.",
            "And here is the second one."
        ])
    );
    assert_eq!(body["audio_id"].as_str().unwrap().len(), 64);
    assert_eq!(body["progress"]["progress"], 100.0);
    assert_eq!(body["progress"]["currentStep"], "Success!");

    let wav = parse_wav(&decode_base64(body["audio"].as_str().unwrap()));
    assert_eq!(wav.spec.sample_rate, 24_000);
    assert_eq!(wav.samples.len(), 13 * SAMPLES_PER_WORD + 9_600);

    let timings = body["timings"].as_array().unwrap();
    assert_eq!(timings.len(), 2);
    assert!((timings[1]["start"].as_f64().unwrap() - 0.47).abs() < 1e-9);
    assert_eq!(ctx.provider.call_count(), 2);
}

#[tokio::test]
async fn it_should_answer_a_repeated_request_from_cache() {
    let ctx = TestContext::new();

    let first = synthesize(&ctx, json!({ "text": TEXT })).await;
    first.assert_status(StatusCode::OK);
    let calls = ctx.provider.call_count();

    let second = synthesize(&ctx, json!({ "text": format!("  {}  ", TEXT) })).await;
    second.assert_status(StatusCode::OK);

    assert_eq!(ctx.provider.call_count(), calls);
    assert_eq!(second.json()["from_cache"], true);
    assert_eq!(second.json()["audio_id"], first.json()["audio_id"]);
    assert_eq!(second.json()["audio"], first.json()["audio"]);
    assert_eq!(second.json()["progress"]["currentStep"], "Retrieved from cache");
    assert_eq!(second.json()["progress"]["processedChunks"], 2);
    assert_eq!(second.json()["progress"]["totalChunks"], 2);
}

#[tokio::test]
async fn it_should_not_share_cache_entries_across_voices() {
    let ctx = TestContext::new();

    let puck = synthesize(&ctx, json!({ "text": TEXT, "voice": "puck" })).await;
    let kore = synthesize(&ctx, json!({ "text": TEXT, "voice": "kore" })).await;

    assert_ne!(puck.json()["audio_id"], kore.json()["audio_id"]);
    assert_eq!(kore.json()["from_cache"], false);
    assert_eq!(ctx.provider.call_count(), 4);
}

#[tokio::test]
async fn it_should_serve_the_synthesized_audio_by_id() {
    let ctx = TestContext::new();
    let synthesized = synthesize(&ctx, json!({ "text": TEXT })).await;
    let audio_id = synthesized.json()["audio_id"].as_str().unwrap().to_string();

    let response = ctx
        .client
        .get(&format!("/api/tts/audio/{}", audio_id))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("audio/wav"));
    assert_eq!(response.header("x-chunk-count"), Some("2"));
    assert_eq!(
        response.body_bytes,
        decode_base64(synthesized.json()["audio"].as_str().unwrap())
    );
}

#[tokio::test]
async fn it_should_return_not_found_for_unknown_audio() {
    let ctx = TestContext::new();

    let response = ctx.client.get("/api/tts/audio/deadbeef").await.unwrap();

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn it_should_locate_the_spoken_word() {
    let ctx = TestContext::new();
    let synthesized = synthesize(&ctx, json!({ "text": TEXT })).await;
    let audio_id = synthesized.json()["audio_id"].as_str().unwrap().to_string();
    let path = |t: &str| format!("/api/tts/audio/{}/position?t={}", audio_id, t);

    let start = ctx.client.get(&path("0")).await.unwrap();
    start.assert_status(StatusCode::OK);
    assert_eq!(start.json()["chunk_index"], 0);
    assert_eq!(start.json()["word"], "Hello");

    // a quarter into the second chunk
    let second = ctx.client.get(&path("0.485")).await.unwrap();
    second.assert_status(StatusCode::OK);
    assert_eq!(second.json()["chunk_index"], 1);
    assert_eq!(second.json()["word_index"], 1);
    assert_eq!(second.json()["word"], "here");

    // inside the silence between chunks
    let gap = ctx.client.get(&path("0.2")).await.unwrap();
    gap.assert_status(StatusCode::NOT_FOUND);

    let negative = ctx.client.get(&path("-1")).await.unwrap();
    negative.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn it_should_reject_empty_text() {
    let ctx = TestContext::new();

    let response = synthesize(&ctx, json!({ "text": "   " })).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Invalid input: Text cannot be empty");
    assert_eq!(ctx.provider.call_count(), 0);
}

#[tokio::test]
async fn it_should_reject_text_over_the_size_limit() {
    let ctx = TestContext::new();
    let text = "word ".repeat(20_001);

    let response = synthesize(&ctx, json!({ "text": text })).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(ctx.provider.call_count(), 0);
}

#[tokio::test]
async fn it_should_reject_out_of_range_speed() {
    let ctx = TestContext::new();

    let response = synthesize(&ctx, json!({ "text": TEXT, "speed": 9.0 })).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn it_should_reject_unknown_voice() {
    let ctx = TestContext::new();

    let response = synthesize(&ctx, json!({ "text": TEXT, "voice": "nobody" })).await;

    assert!(response.status.is_client_error());
    assert_eq!(ctx.provider.call_count(), 0);
}

#[tokio::test]
async fn it_should_report_the_failed_segment_as_bad_gateway() {
    let ctx = TestContext::new();
    // the chunk and its second half both fail
    ctx.provider.fail_containing("second one", server_error());

    let response = synthesize(&ctx, json!({ "text": TEXT })).await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(
        response.message(),
        "External service error: synthesis failed at segment(s) 2"
    );

    // nothing was cached for the request
    ctx.provider.clear_failures();
    let retry = synthesize(&ctx, json!({ "text": TEXT })).await;
    retry.assert_status(StatusCode::OK);
    assert_eq!(retry.json()["from_cache"], false);
}

#[tokio::test]
async fn it_should_translate_before_synthesizing() {
    let ctx = TestContext::new();

    let response = synthesize(&ctx, json!({ "text": "Good morning.", "language": "fr-FR" })).await;

    response.assert_status(StatusCode::OK);
    assert_eq!(response.json()["text"], "Good morning. (French)");
    assert_eq!(response.json()["chunks"], json!(["Good morning. (French)"]));
    assert_eq!(ctx.provider.translation_count(), 1);
    assert_eq!(ctx.provider.calls(), vec!["Good morning. (French)".to_string()]);
}

#[tokio::test]
async fn it_should_translate_without_synthesizing() {
    let ctx = TestContext::new();

    let response = ctx
        .client
        .post("/api/translate", &json!({ "text": "Good night", "language": "de-DE" }))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.json()["text"], "Good night (German)");
    assert_eq!(response.json()["language"], "de-DE");
    assert_eq!(ctx.provider.call_count(), 0);
}

#[tokio::test]
async fn it_should_list_voices_and_languages() {
    let ctx = TestContext::new();

    let voices = ctx.client.get("/api/voices").await.unwrap();
    voices.assert_status(StatusCode::OK);
    let voices = voices.json().as_array().unwrap().clone();
    assert_eq!(voices.len(), 10);
    assert_eq!(voices[0], json!({ "id": "puck", "name": "Puck", "gender": "Male" }));
    assert!(voices
        .iter()
        .any(|v| v["id"] == "kore" && v["gender"] == "Female"));

    let languages = ctx.client.get("/api/languages").await.unwrap();
    languages.assert_status(StatusCode::OK);
    let languages = languages.json().as_array().unwrap().clone();
    assert_eq!(languages.len(), 9);
    assert_eq!(languages[0]["code"], "original");
}

#[tokio::test]
async fn it_should_preview_a_voice() {
    let ctx = TestContext::new();

    let response = ctx.client.get("/api/voices/kore/preview").await.unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("audio/wav"));
    assert_eq!(response.header("x-voice"), Some("kore"));
    let wav = parse_wav(&response.body_bytes);
    assert!(!wav.samples.is_empty());

    let unknown = ctx.client.get("/api/voices/nobody/preview").await.unwrap();
    unknown.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn it_should_clear_the_cache() {
    let ctx = TestContext::new();
    let synthesized = synthesize(&ctx, json!({ "text": TEXT })).await;
    let audio_id = synthesized.json()["audio_id"].as_str().unwrap().to_string();

    let response = ctx.client.delete("/api/cache").await.unwrap();
    response.assert_status(StatusCode::NO_CONTENT);
    assert_eq!(ctx.store.entry_count(), 0);

    let audio = ctx
        .client
        .get(&format!("/api/tts/audio/{}", audio_id))
        .await
        .unwrap();
    audio.assert_status(StatusCode::NOT_FOUND);

    // chunks are gone too
    let calls = ctx.provider.call_count();
    synthesize(&ctx, json!({ "text": TEXT }))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(ctx.provider.call_count(), calls + 2);
}
