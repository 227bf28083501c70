use super::error::{SynthesisError, TtsServiceError};
use super::progress::{DispatchPhase, ProgressTracker};
use super::resilience::{with_retry, RetryPolicy};
use super::segmenter::halve;
use super::{PipelineSettings, VoiceName};
use crate::domain::audio::{decode, SampleBuffer};
use crate::domain::cache::{chunk_fingerprint, AudioCache};
use crate::infrastructure::repositories::TtsRepository;
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

/// Per-chunk job record, owned by the dispatcher for the length of a run
#[derive(Debug, Clone)]
pub struct SegmentSlot {
    pub index: usize,
    pub text: String,
    pub buffer: Option<SampleBuffer>,
    pub last_error: Option<SynthesisError>,
}

impl SegmentSlot {
    fn new(index: usize, text: String) -> Self {
        Self {
            index,
            text,
            buffer: None,
            last_error: None,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.buffer.is_some()
    }
}

/// Drives the degrading pass sequence over one run's chunks:
/// chunk cache, concurrent fetch, serial retry, split-and-retry.
///
/// All workers run as futures on the caller's task. Shared state is only
/// touched between suspension points and no lock is held across an await.
pub struct Dispatcher<'a> {
    tts_repo: &'a dyn TtsRepository,
    cache: &'a AudioCache,
    settings: &'a PipelineSettings,
    retry_policy: &'a RetryPolicy,
    progress: &'a ProgressTracker<'a>,
    cancel: &'a CancellationToken,
    voice: VoiceName,
    slots: Mutex<Vec<SegmentSlot>>,
    queue: Mutex<VecDeque<usize>>,
    active_concurrency: AtomicUsize,
}

impl<'a> Dispatcher<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tts_repo: &'a dyn TtsRepository,
        cache: &'a AudioCache,
        settings: &'a PipelineSettings,
        retry_policy: &'a RetryPolicy,
        progress: &'a ProgressTracker<'a>,
        cancel: &'a CancellationToken,
        voice: VoiceName,
        chunks: Vec<String>,
    ) -> Self {
        let slots = chunks
            .into_iter()
            .enumerate()
            .map(|(index, text)| SegmentSlot::new(index, text))
            .collect();

        Self {
            tts_repo,
            cache,
            settings,
            retry_policy,
            progress,
            cancel,
            voice,
            slots: Mutex::new(slots),
            queue: Mutex::new(VecDeque::new()),
            active_concurrency: AtomicUsize::new(settings.concurrency.max(1)),
        }
    }

    pub fn active_concurrency(&self) -> usize {
        self.active_concurrency.load(Ordering::SeqCst)
    }

    /// Run every pass. On success every slot holds a buffer, in chunk order.
    pub async fn run(self) -> Result<Vec<SegmentSlot>, TtsServiceError> {
        self.resolve_from_chunk_cache().await;
        self.ensure_not_cancelled()?;

        self.progress.set_phase(DispatchPhase::ConcurrentFetch);
        self.concurrent_fetch().await;
        self.ensure_not_cancelled()?;

        self.progress.set_phase(DispatchPhase::SerialRetry);
        self.serial_retry().await;
        self.ensure_not_cancelled()?;

        self.progress.set_phase(DispatchPhase::SplitRetry);
        self.split_retry().await;
        self.ensure_not_cancelled()?;

        let slots = self.slots.into_inner();
        let failed: Vec<usize> = slots
            .iter()
            .filter(|slot| !slot.is_filled())
            .map(|slot| slot.index + 1)
            .collect();

        if !failed.is_empty() {
            for slot in slots.iter().filter(|slot| !slot.is_filled()) {
                tracing::error!(
                    chunk = slot.index + 1,
                    error = ?slot.last_error,
                    "Chunk failed every pass"
                );
            }
            return Err(TtsServiceError::SegmentExhausted { indices: failed });
        }

        Ok(slots)
    }

    /// Pass 1: fill slots from the per-chunk cache without touching the network
    async fn resolve_from_chunk_cache(&self) {
        let mut hits = 0;
        for index in 0..self.slot_count() {
            let text = self.slot_text(index);
            let fingerprint = chunk_fingerprint(&text, self.voice);
            if let Some(bytes) = self.cache.lookup_chunk(&fingerprint).await {
                let buffer = decode(&bytes, self.settings.sample_rate);
                self.fill(index, buffer);
                hits += 1;
            }
        }

        tracing::info!(
            phase = %DispatchPhase::CacheCheck,
            hits = hits,
            total = self.slot_count(),
            "Chunk cache resolved"
        );
    }

    /// Pass 2: a fixed pool of workers drains a shared FIFO of empty slots
    async fn concurrent_fetch(&self) {
        let pending = self.pending_indices();
        if pending.is_empty() {
            return;
        }

        let pool_size = self.active_concurrency().min(pending.len());
        *self.queue.lock() = pending.into_iter().collect();

        tracing::info!(
            phase = %DispatchPhase::ConcurrentFetch,
            workers = pool_size,
            pending = self.queue.lock().len(),
            "Starting concurrent fetch"
        );

        join_all((0..pool_size).map(|worker_id| self.worker(worker_id))).await;
    }

    async fn worker(&self, worker_id: usize) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            // a rate limit shrinks the pool: surplus workers retire between calls
            if worker_id >= self.active_concurrency() {
                tracing::debug!(worker_id = worker_id, "Worker retiring after concurrency downgrade");
                break;
            }

            let next = self.queue.lock().pop_front();
            let Some(index) = next else { break };

            let text = self.slot_text(index);
            let outcome = self.fetch(&text).await;
            let aborted = matches!(outcome, Err(SynthesisError::Aborted));
            self.settle(index, outcome);
            if aborted {
                break;
            }

            self.pace().await;
        }
    }

    /// Pass 3: retry whatever is still empty, one slot at a time
    async fn serial_retry(&self) {
        let pending = self.pending_indices();
        if pending.is_empty() {
            return;
        }

        tracing::info!(
            phase = %DispatchPhase::SerialRetry,
            pending = pending.len(),
            "Retrying failed chunks serially"
        );

        for index in pending {
            if self.cancel.is_cancelled() {
                return;
            }
            let text = self.slot_text(index);
            let outcome = self.fetch(&text).await;
            self.settle(index, outcome);
            self.pace().await;
        }
    }

    /// Pass 4: halve each remaining chunk once and synthesize the halves
    async fn split_retry(&self) {
        let pending = self.pending_indices();
        if pending.is_empty() {
            return;
        }

        tracing::info!(
            phase = %DispatchPhase::SplitRetry,
            pending = pending.len(),
            "Splitting failed chunks"
        );

        for index in pending {
            if self.cancel.is_cancelled() {
                return;
            }

            let text = self.slot_text(index);
            let parts = halve(&text);
            if parts.len() < 2 {
                tracing::warn!(chunk = index + 1, "Chunk cannot be split any further");
                continue;
            }

            let mut buffers = Vec::with_capacity(parts.len());
            let mut failure = None;
            for part in &parts {
                let outcome = self.fetch(part).await;
                self.pace().await;
                match outcome {
                    Ok(buffer) => buffers.push(buffer),
                    Err(error) => {
                        failure = Some(error);
                        break;
                    }
                }
            }

            match failure {
                None => {
                    let merged = SampleBuffer::concat(buffers, self.settings.sample_rate);
                    self.slots.lock()[index].text = parts.join(" ");
                    self.fill(index, merged);
                    tracing::info!(chunk = index + 1, parts = parts.len(), "Chunk recovered by splitting");
                }
                Some(error) => self.record_error(index, error),
            }
        }
    }

    /// One provider call through the resilience layer. On success the raw bytes
    /// go to the chunk cache before decoding.
    async fn fetch(&self, text: &str) -> Result<SampleBuffer, SynthesisError> {
        let repo = self.tts_repo;
        let voice = self.voice;

        let bytes = with_retry(
            self.retry_policy,
            self.cancel,
            || self.downgrade_concurrency(),
            move || async move {
                repo.synthesize_segment(text, voice)
                    .await
                    .map_err(SynthesisError::from)
            },
        )
        .await?;

        if bytes.is_empty() {
            return Err(SynthesisError::NoContent);
        }

        self.cache
            .store_chunk(&chunk_fingerprint(text, voice), &bytes)
            .await;

        Ok(decode(&bytes, self.settings.sample_rate))
    }

    fn settle(&self, index: usize, outcome: Result<SampleBuffer, SynthesisError>) {
        match outcome {
            Ok(buffer) => self.fill(index, buffer),
            Err(error) => {
                tracing::warn!(chunk = index + 1, error = %error, "Chunk synthesis failed");
                self.record_error(index, error);
            }
        }
    }

    fn downgrade_concurrency(&self) {
        let previous = self.active_concurrency.swap(1, Ordering::SeqCst);
        if previous > 1 {
            tracing::warn!(
                previous = previous,
                "Rate limit observed, dropping concurrency to 1 for the rest of the run"
            );
        }
    }

    /// Sleep the inter-request delay, cut short by cancellation
    async fn pace(&self) {
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(self.settings.inter_request_delay) => {}
        }
    }

    fn ensure_not_cancelled(&self) -> Result<(), TtsServiceError> {
        if self.cancel.is_cancelled() {
            tracing::info!("Dispatch aborted by caller");
            return Err(TtsServiceError::Aborted);
        }
        Ok(())
    }

    fn fill(&self, index: usize, buffer: SampleBuffer) {
        {
            let mut slots = self.slots.lock();
            let slot = &mut slots[index];
            slot.buffer = Some(buffer);
            slot.last_error = None;
        }
        self.progress.record_completion();
    }

    fn record_error(&self, index: usize, error: SynthesisError) {
        self.slots.lock()[index].last_error = Some(error);
    }

    fn slot_count(&self) -> usize {
        self.slots.lock().len()
    }

    fn slot_text(&self, index: usize) -> String {
        self.slots.lock()[index].text.clone()
    }

    fn pending_indices(&self) -> Vec<usize> {
        self.slots
            .lock()
            .iter()
            .filter(|slot| !slot.is_filled())
            .map(|slot| slot.index)
            .collect()
    }
}
