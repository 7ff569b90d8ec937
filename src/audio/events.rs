//! Events emitted by the audio analysis thread.

use std::time::Duration;

/// A detected onset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatEvent {
    /// Track position of the onset
    pub at: Duration,
}

/// Magnitudes of the lowest FFT bins for one analysis window
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpectrumFrame {
    pub magnitudes: Vec<f32>,
}

impl SpectrumFrame {
    /// Magnitude of `bin`, zero when out of range
    pub fn bin(&self, bin: usize) -> f32 {
        self.magnitudes.get(bin).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    Beat(BeatEvent),
    Spectrum(SpectrumFrame),
}
