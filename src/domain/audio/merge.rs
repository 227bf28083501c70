use super::pcm::SampleBuffer;
use super::timeline::ChunkTiming;
use super::wav::encode_wav;
use super::AudioError;

/// Final artifact: a WAV file plus where each chunk sits in it
#[derive(Debug, Clone)]
pub struct MergedAudio {
    pub wav: Vec<u8>,
    pub timings: Vec<ChunkTiming>,
    pub sample_rate: u32,
    pub total_samples: usize,
}

impl MergedAudio {
    pub fn duration_secs(&self) -> f64 {
        self.total_samples as f64 / self.sample_rate as f64
    }
}

/// Concatenate buffers in order with `gap_secs` of silence between them.
pub fn merge(buffers: &[SampleBuffer], gap_secs: f64) -> Result<MergedAudio, AudioError> {
    let first = buffers.first().ok_or(AudioError::Empty)?;
    let sample_rate = first.sample_rate;

    if let Some(other) = buffers.iter().find(|b| b.sample_rate != sample_rate) {
        return Err(AudioError::SampleRateMismatch {
            expected: sample_rate,
            actual: other.sample_rate,
        });
    }

    let gap_samples = (gap_secs.max(0.0) * sample_rate as f64).round() as usize;
    let total_samples = buffers.iter().map(SampleBuffer::len).sum::<usize>()
        + gap_samples * (buffers.len() - 1);

    let mut merged = vec![0.0f32; total_samples];
    let mut timings = Vec::with_capacity(buffers.len());
    let mut offset = 0usize;

    for (index, buffer) in buffers.iter().enumerate() {
        merged[offset..offset + buffer.len()].copy_from_slice(&buffer.samples);

        let start = offset as f64 / sample_rate as f64;
        let duration = buffer.duration_secs();
        timings.push(ChunkTiming {
            start,
            end: start + duration,
            duration,
        });

        offset += buffer.len();
        if index + 1 < buffers.len() {
            offset += gap_samples;
        }
    }

    tracing::debug!(
        buffer_count = buffers.len(),
        total_samples = total_samples,
        gap_samples = gap_samples,
        "Audio buffers merged"
    );

    Ok(MergedAudio {
        wav: encode_wav(&merged, sample_rate)?,
        timings,
        sample_rate,
        total_samples,
    })
}
