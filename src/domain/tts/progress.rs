use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;

/// How often the virtual progress creeps forward between completions
pub const TICK_INTERVAL: Duration = Duration::from_millis(800);

/// Virtual progress never creeps past this; only real completions go further
const VIRTUAL_CEILING: f32 = 92.0;

const ASSEMBLING_PROGRESS: f32 = 95.0;

/// Status lines shown while synthesis is running, in the order they appear
const STATUS_MESSAGES: [&str; 12] = [
    "Preparing synthesis session...",
    "Reading the source text...",
    "Shaping sentence rhythm...",
    "Requesting voice segments...",
    "Rendering speech...",
    "Balancing pacing and pauses...",
    "Smoothing intonation...",
    "Collecting audio segments...",
    "Checking segment continuity...",
    "Lining up the timeline...",
    "Polishing the final mix...",
    "Wrapping up...",
];

/// Snapshot pushed to progress observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingState {
    pub is_processing: bool,
    pub progress: f32,
    pub current_step: String,
    pub total_chunks: usize,
    pub processed_chunks: usize,
}

impl Default for ProcessingState {
    fn default() -> Self {
        Self {
            is_processing: false,
            progress: 0.0,
            current_step: "Ready".to_string(),
            total_chunks: 0,
            processed_chunks: 0,
        }
    }
}

/// Observer for progress snapshots
pub trait ProgressSink: Send + Sync {
    fn report(&self, state: ProcessingState);
}

/// Discards every snapshot
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _state: ProcessingState) {}
}

impl ProgressSink for watch::Sender<ProcessingState> {
    fn report(&self, state: ProcessingState) {
        self.send_replace(state);
    }
}

/// Stage of a synthesis run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    CacheCheck,
    ConcurrentFetch,
    SerialRetry,
    SplitRetry,
    Assemble,
    Done,
}

impl DispatchPhase {
    /// (base, width) of the real-progress band for this phase
    fn band(&self) -> (f32, f32) {
        match self {
            DispatchPhase::SerialRetry => (10.0, 82.0),
            DispatchPhase::SplitRetry => (10.0, 84.0),
            _ => (10.0, 80.0),
        }
    }
}

impl std::fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DispatchPhase::CacheCheck => "cache_check",
            DispatchPhase::ConcurrentFetch => "concurrent_fetch",
            DispatchPhase::SerialRetry => "serial_retry",
            DispatchPhase::SplitRetry => "split_retry",
            DispatchPhase::Assemble => "assemble",
            DispatchPhase::Done => "done",
        };
        write!(f, "{}", name)
    }
}

struct TrackerState {
    phase: DispatchPhase,
    completed: usize,
    virtual_progress: f32,
    last_reported: f32,
}

/// Turns dispatcher events into a monotonic progress signal.
///
/// The reported value is the max of the real progress (completed chunks
/// scaled into the current phase band) and a virtual value that creeps up on
/// every tick, so the indicator keeps moving while a slow call is in flight.
pub struct ProgressTracker<'a> {
    sink: &'a dyn ProgressSink,
    total: usize,
    state: Mutex<TrackerState>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a dyn ProgressSink, total: usize) -> Self {
        Self {
            sink,
            total,
            state: Mutex::new(TrackerState {
                phase: DispatchPhase::CacheCheck,
                completed: 0,
                virtual_progress: 10.0,
                last_reported: 0.0,
            }),
        }
    }

    pub fn set_phase(&self, phase: DispatchPhase) {
        self.state.lock().phase = phase;
    }

    pub fn completed(&self) -> usize {
        self.state.lock().completed
    }

    /// Report the first status line
    pub fn start(&self) {
        self.emit(STATUS_MESSAGES[0].to_string());
    }

    /// Record one more filled slot
    pub fn record_completion(&self) {
        let completed = {
            let mut state = self.state.lock();
            state.completed = (state.completed + 1).min(self.total);
            state.completed
        };
        self.emit(format!("Segment {}/{} synthesized", completed, self.total));
    }

    /// Advance the virtual component by a small random step
    pub fn tick(&self) {
        let step = {
            let mut state = self.state.lock();
            if state.virtual_progress >= VIRTUAL_CEILING {
                return;
            }
            let increment = 0.8 + rand::thread_rng().gen::<f32>() * 1.2;
            state.virtual_progress = (state.virtual_progress + increment).min(VIRTUAL_CEILING);
            status_line(state.virtual_progress, state.completed, self.total)
        };
        self.emit(step);
    }

    /// Tick forever on a fixed interval. Meant to be raced against the run.
    pub async fn run_ticker(&self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        // the first tick of an interval completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.tick();
        }
    }

    pub fn assembling(&self) {
        self.state.lock().phase = DispatchPhase::Assemble;
        self.emit_at(ASSEMBLING_PROGRESS, true, "Assembling audio stream...".to_string());
    }

    /// Final snapshot for a successful run; every chunk counts as processed
    pub fn finish(&self, step: &str) {
        {
            let mut state = self.state.lock();
            state.phase = DispatchPhase::Done;
            state.completed = self.total;
        }
        self.emit_at(100.0, false, step.to_string());
    }

    /// Final snapshot for a failed or aborted run; progress does not move back
    pub fn fail(&self, step: &str) {
        let last = self.state.lock().last_reported;
        self.emit_at(last, false, step.to_string());
    }

    fn emit(&self, step: String) {
        let progress = {
            let mut state = self.state.lock();
            let (base, width) = state.phase.band();
            let real = if self.total == 0 {
                base
            } else {
                base + ((state.completed as f32 / self.total as f32) * width).floor()
            };
            let progress = real
                .max(state.virtual_progress)
                .max(state.last_reported)
                .min(100.0);
            state.last_reported = progress;
            progress
        };
        self.push(progress, true, step);
    }

    fn emit_at(&self, progress: f32, is_processing: bool, step: String) {
        let progress = {
            let mut state = self.state.lock();
            let progress = progress.max(state.last_reported).min(100.0);
            state.last_reported = progress;
            progress
        };
        self.push(progress, is_processing, step);
    }

    fn push(&self, progress: f32, is_processing: bool, current_step: String) {
        let processed_chunks = self.completed();
        self.sink.report(ProcessingState {
            is_processing,
            progress,
            current_step,
            total_chunks: self.total,
            processed_chunks,
        });
    }
}

fn status_line(virtual_progress: f32, completed: usize, total: usize) -> String {
    let index = ((virtual_progress / 95.0) * STATUS_MESSAGES.len() as f32).floor() as usize;
    let base = STATUS_MESSAGES[index.min(STATUS_MESSAGES.len() - 1)];
    if total > 1 {
        format!("{} (Segment {}/{})", base, (completed + 1).min(total), total)
    } else {
        base.to_string()
    }
}
