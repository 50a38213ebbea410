/// Decoded audio: interleaved PCM samples normalized to [-1.0, 1.0].
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSegment {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioSegment {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Index of the first sample of the frame at `time`, aligned to a whole
    /// channel frame and clamped to the buffer.
    pub fn sample_index_at_time(&self, time: f64) -> usize {
        let channels = self.channels.max(1) as usize;
        let frame = (time.max(0.0) * self.sample_rate as f64).round() as usize;
        (frame * channels).min(self.samples.len())
    }

    /// Copy of the `[start, end)` window in seconds. Out-of-range bounds are
    /// clamped, so a window past the end yields a shorter or empty segment.
    pub fn slice(&self, start: f64, end: f64) -> AudioSegment {
        let from = self.sample_index_at_time(start);
        let to = self.sample_index_at_time(end).max(from);
        AudioSegment::new(
            self.samples[from..to].to_vec(),
            self.sample_rate,
            self.channels,
        )
    }

    /// Joins segments back to back. All parts must share rate and layout.
    pub fn concat(parts: &[AudioSegment]) -> Option<AudioSegment> {
        let first = parts.first()?;
        if parts
            .iter()
            .any(|p| p.sample_rate != first.sample_rate || p.channels != first.channels)
        {
            return None;
        }
        let samples = parts.iter().flat_map(|p| p.samples.iter().copied()).collect();
        Some(AudioSegment::new(samples, first.sample_rate, first.channels))
    }
}
