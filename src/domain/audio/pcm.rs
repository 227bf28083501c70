/// Fixed output rate of the speech provider
pub const PROVIDER_SAMPLE_RATE: u32 = 24_000;

/// Mono float samples in [-1.0, 1.0]
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channel_count: u16,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channel_count: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Join buffers back to back without any gap. Used to rebuild a slot
    /// from its split halves.
    pub fn concat(buffers: Vec<SampleBuffer>, sample_rate: u32) -> SampleBuffer {
        let total = buffers.iter().map(SampleBuffer::len).sum();
        let mut samples = Vec::with_capacity(total);
        for buffer in buffers {
            samples.extend(buffer.samples);
        }
        SampleBuffer::new(samples, sample_rate)
    }
}

/// Decode raw provider bytes (16-bit signed little-endian PCM, mono).
///
/// An odd trailing byte is dropped rather than treated as an error.
pub fn decode(bytes: &[u8], sample_rate: u32) -> SampleBuffer {
    if bytes.len() % 2 != 0 {
        tracing::warn!(
            byte_len = bytes.len(),
            "PCM data length is odd, dropping trailing byte"
        );
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    SampleBuffer::new(samples, sample_rate)
}
