use crate::e2e::helpers;

use helpers::scripted_provider::{rate_limited, server_error, SAMPLES_PER_WORD, SAMPLE_VALUE};
use helpers::{parse_wav, TestContext};
use lumina_tts::domain::cache::request_fingerprint;
use lumina_tts::domain::tts::{
    LanguageCode, NoopProgress, PipelineSettings, ProcessingState, ProgressSink, RetryPolicy, SynthesisConfig,
    TtsServiceApi, TtsServiceError,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const TEXT: &str = "Alpha beta gamma. Delta epsilon zeta. Eta theta iota. Kappa lambda mu.";

const GAP_SAMPLES: usize = 9_600;

/// Production pacing and backoff; only safe under a paused clock
fn paused_context(concurrency: usize) -> TestContext {
    TestContext::with_pipeline(
        PipelineSettings {
            chunk_max_words: 4,
            concurrency,
            ..PipelineSettings::default()
        },
        RetryPolicy::default(),
    )
}

#[derive(Default)]
struct RecordingSink {
    states: Mutex<Vec<ProcessingState>>,
}

impl ProgressSink for RecordingSink {
    fn report(&self, state: ProcessingState) {
        self.states.lock().push(state);
    }
}

#[tokio::test(start_paused = true)]
async fn it_should_merge_chunks_in_order_with_silence_gaps() {
    let ctx = paused_context(2);

    let result = ctx
        .service
        .synthesize(TEXT, SynthesisConfig::default(), &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        result.chunks,
        vec![
            "Alpha beta gamma.",
            "Delta epsilon zeta.",
            "Eta theta iota.",
            "Kappa lambda mu."
        ]
    );

    let chunk_samples = 3 * SAMPLES_PER_WORD;
    let wav = parse_wav(&result.audio_data);
    assert_eq!(wav.spec.channels, 1);
    assert_eq!(wav.spec.sample_rate, 24_000);
    assert_eq!(wav.spec.bits_per_sample, 16);
    assert_eq!(wav.samples.len(), 4 * chunk_samples + 3 * GAP_SAMPLES);

    // speech, then silence, then speech again
    assert!(wav.samples[..chunk_samples]
        .iter()
        .all(|&s| s == SAMPLE_VALUE));
    assert!(wav.samples[chunk_samples..chunk_samples + GAP_SAMPLES]
        .iter()
        .all(|&s| s == 0));
    assert_eq!(wav.samples[chunk_samples + GAP_SAMPLES], SAMPLE_VALUE);

    let stride = (chunk_samples + GAP_SAMPLES) as f64 / 24_000.0;
    for (index, timing) in result.timings.iter().enumerate() {
        assert!((timing.start - stride * index as f64).abs() < 1e-9);
        assert!((timing.duration - 0.03).abs() < 1e-9);
        assert!((timing.end - timing.start - timing.duration).abs() < 1e-9);
    }
    assert!((result.duration_secs - result.timings[3].end).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn it_should_recover_a_chunk_in_the_serial_pass() {
    let ctx = paused_context(2);
    // exhausts every attempt of the concurrent pass
    ctx.provider.fail_times("Delta epsilon zeta.", 4, server_error());

    let result = ctx
        .service
        .synthesize(TEXT, SynthesisConfig::default(), &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.chunks.len(), 4);
    assert_eq!(ctx.provider.calls_for("Delta epsilon zeta."), 5);
    assert_eq!(ctx.provider.calls_for("Alpha beta gamma."), 1);
}

#[tokio::test(start_paused = true)]
async fn it_should_recover_a_chunk_by_splitting_it() {
    let ctx = paused_context(2);
    let long_sentence = "One two three four five six.";
    ctx.provider.fail_always(long_sentence, server_error());

    let text = format!("Alpha beta gamma. {}", long_sentence);
    let result = ctx
        .service
        .synthesize(&text, SynthesisConfig::default(), &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.chunks, vec!["Alpha beta gamma.", "One two three four five six."]);
    assert_eq!(ctx.provider.calls_for("One two three"), 1);
    assert_eq!(ctx.provider.calls_for("four five six."), 1);

    let wav = parse_wav(&result.audio_data);
    assert_eq!(wav.samples.len(), 9 * SAMPLES_PER_WORD + GAP_SAMPLES);
}

#[tokio::test(start_paused = true)]
async fn it_should_fail_naming_the_exhausted_chunk_and_cache_nothing() {
    let ctx = paused_context(2);
    ctx.provider.fail_always("Delta epsilon zeta.", server_error());

    let err = ctx
        .service
        .synthesize(TEXT, SynthesisConfig::default(), &NoopProgress, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        TtsServiceError::SegmentExhausted { indices } => assert_eq!(indices, vec![2]),
        other => panic!("expected SegmentExhausted, got {:?}", other),
    }
    // four attempts in each of the concurrent and serial passes; too short to split
    assert_eq!(ctx.provider.calls_for("Delta epsilon zeta."), 8);

    let audio_id = request_fingerprint(TEXT, &SynthesisConfig::default());
    assert!(matches!(
        ctx.service.cached_audio(&audio_id).await,
        Err(TtsServiceError::NotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn it_should_reuse_cached_chunks_after_a_failed_run() {
    let ctx = paused_context(2);
    ctx.provider.fail_always("Delta epsilon zeta.", server_error());

    let first = ctx
        .service
        .synthesize(TEXT, SynthesisConfig::default(), &NoopProgress, &CancellationToken::new())
        .await;
    assert!(first.is_err());

    ctx.provider.clear_failures();
    let calls_before = ctx.provider.call_count();

    let second = ctx
        .service
        .synthesize(TEXT, SynthesisConfig::default(), &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(second.chunks.len(), 4);
    assert_eq!(
        ctx.provider.calls()[calls_before..].to_vec(),
        vec!["Delta epsilon zeta.".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn it_should_serve_a_repeated_request_without_provider_calls() {
    let ctx = paused_context(2);
    let cancel = CancellationToken::new();

    let first = ctx
        .service
        .synthesize(TEXT, SynthesisConfig::default(), &NoopProgress, &cancel)
        .await
        .unwrap();
    let calls = ctx.provider.call_count();
    assert_eq!(calls, 4);

    let second = ctx
        .service
        .synthesize(TEXT, SynthesisConfig::default(), &NoopProgress, &cancel)
        .await
        .unwrap();

    assert_eq!(ctx.provider.call_count(), calls);
    assert!(second.from_cache);
    assert_eq!(second.audio_data, first.audio_data);
    assert_eq!(second.chunks, first.chunks);
    assert_eq!(second.timings, first.timings);
}

#[tokio::test(start_paused = true)]
async fn it_should_reuse_chunks_across_speed_and_language() {
    let ctx = paused_context(2);
    let cancel = CancellationToken::new();

    let first = ctx
        .service
        .synthesize(TEXT, SynthesisConfig::default(), &NoopProgress, &cancel)
        .await
        .unwrap();
    let calls = ctx.provider.call_count();

    let other = SynthesisConfig {
        speed: 1.25,
        language: LanguageCode::French,
        ..SynthesisConfig::default()
    };
    let second = ctx
        .service
        .synthesize(TEXT, other, &NoopProgress, &cancel)
        .await
        .unwrap();

    assert!(!second.from_cache);
    assert_ne!(second.audio_id, first.audio_id);
    assert_eq!(ctx.provider.call_count(), calls);
    assert_eq!(second.audio_data, first.audio_data);
}

#[tokio::test(start_paused = true)]
async fn it_should_stop_calling_the_provider_once_cancelled() {
    let ctx = paused_context(2);
    let cancel = CancellationToken::new();
    ctx.provider
        .set_latency(Duration::from_secs(1))
        .cancel_on_call(1, cancel.clone());

    let err = ctx
        .service
        .synthesize(TEXT, SynthesisConfig::default(), &NoopProgress, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, TtsServiceError::Aborted));
    let calls = ctx.provider.call_count();
    // the first call cancels; the second worker sees the token before taking a slot
    assert_eq!(calls, 1);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(ctx.provider.call_count(), calls);

    let audio_id = request_fingerprint(TEXT, &SynthesisConfig::default());
    assert!(ctx.service.cached_audio(&audio_id).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn it_should_abort_immediately_when_already_cancelled() {
    let ctx = paused_context(2);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = ctx
        .service
        .synthesize(TEXT, SynthesisConfig::default(), &NoopProgress, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, TtsServiceError::Aborted));
    assert_eq!(ctx.provider.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn it_should_drop_to_one_worker_after_a_rate_limit() {
    let ctx = paused_context(3);
    ctx.provider
        .set_latency(Duration::from_millis(100))
        .fail_times("Alpha beta gamma.", 1, rate_limited());

    let text = format!("{} Nu xi omicron. Pi rho sigma.", TEXT);
    let result = ctx
        .service
        .synthesize(&text, SynthesisConfig::default(), &NoopProgress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.chunks.len(), 6);
    assert_eq!(ctx.provider.peak_in_flight(), 3);
    assert_eq!(ctx.provider.peak_in_flight_after_rate_limit(), 1);
    assert_eq!(ctx.provider.calls_for("Alpha beta gamma."), 2);
}

#[tokio::test(start_paused = true)]
async fn it_should_report_monotonic_progress_ending_at_success() {
    let ctx = paused_context(2);
    ctx.provider.set_latency(Duration::from_secs(3));
    let sink = RecordingSink::default();

    ctx.service
        .synthesize(TEXT, SynthesisConfig::default(), &sink, &CancellationToken::new())
        .await
        .unwrap();

    let states = sink.states.lock();
    let values: Vec<f32> = states.iter().map(|s| s.progress).collect();
    assert!(values.windows(2).all(|w| w[1] >= w[0]), "{:?}", values);

    // slow calls leave room for ticks between completions
    assert!(states.iter().any(|s| s.current_step.contains("(Segment")));

    let last = states.last().unwrap();
    assert_eq!(last.progress, 100.0);
    assert_eq!(last.current_step, "Success!");
    assert!(!last.is_processing);
    assert_eq!(last.processed_chunks, 4);
    assert_eq!(last.total_chunks, 4);
}

#[tokio::test(start_paused = true)]
async fn it_should_reject_whitespace_only_text() {
    let ctx = paused_context(2);

    let err = ctx
        .service
        .synthesize(" \n\t ", SynthesisConfig::default(), &NoopProgress, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, TtsServiceError::NoContent(_)));
    assert_eq!(ctx.provider.call_count(), 0);
}
