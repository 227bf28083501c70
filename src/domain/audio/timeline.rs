use serde::{Deserialize, Serialize};

/// Position of one chunk's audio in the merged timeline, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkTiming {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

/// What is being spoken at a given playback time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackPosition {
    pub chunk_index: usize,
    pub word_index: usize,
}

/// Find the chunk playing at `time` and estimate the current word by linear
/// interpolation across the chunk's words. Returns `None` inside silence gaps
/// and past the end.
pub fn locate(timings: &[ChunkTiming], chunks: &[String], time: f64) -> Option<PlaybackPosition> {
    let chunk_index = timings
        .iter()
        .position(|t| time >= t.start && time < t.end)?;
    let timing = timings[chunk_index];
    let word_count = chunks
        .get(chunk_index)
        .map(|c| c.split_whitespace().count())
        .unwrap_or(0);

    let progress = if timing.duration > 0.0 {
        ((time - timing.start) / timing.duration).min(1.0)
    } else {
        0.0
    };
    let word_index = ((progress * word_count as f64).floor() as usize)
        .min(word_count.saturating_sub(1));

    Some(PlaybackPosition {
        chunk_index,
        word_index,
    })
}
