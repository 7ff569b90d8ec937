//! Audio analysis configuration.

use std::ops::Range;

/// Spectrum and beat analysis configuration
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// FFT window size (must be power of 2)
    pub fft_size: usize,

    /// Samples advanced between consecutive windows
    /// 512 with a 1024 window = 50% overlap
    pub hop_size: usize,

    /// Number of low-frequency magnitude bins forwarded in each spectrum frame
    pub spectrum_bins: usize,

    /// Bass frequency range (Hz) used for onset energy
    pub bass_range_hz: (f32, f32),

    /// Onset threshold: bass energy must exceed the running mean by this ratio
    pub onset_threshold: f32,

    /// Number of past frames in the running mean (43 frames ≈ 1s at 44.1kHz / 512 hop)
    pub history_len: usize,

    /// Refractory interval between two beats (milliseconds)
    pub min_beat_interval_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            hop_size: 512,
            spectrum_bins: 64,
            bass_range_hz: (20.0, 200.0),
            onset_threshold: 1.5,
            history_len: 43,
            min_beat_interval_ms: 250,
        }
    }
}

impl AnalysisConfig {
    /// Convert frequency (Hz) to FFT bin index for the given sample rate
    pub fn hz_to_bin(&self, hz: f32, sample_rate_hz: u32) -> usize {
        ((hz * self.fft_size as f32) / sample_rate_hz as f32) as usize
    }

    /// FFT bin range for bass frequencies (never empty)
    pub fn bass_bins(&self, sample_rate_hz: u32) -> Range<usize> {
        let start = self.hz_to_bin(self.bass_range_hz.0, sample_rate_hz);
        let end = self.hz_to_bin(self.bass_range_hz.1, sample_rate_hz);
        start..end.max(start + 1)
    }

    /// Hop duration in seconds at the given sample rate
    pub fn hop_secs(&self, sample_rate_hz: u32) -> f32 {
        self.hop_size as f32 / sample_rate_hz as f32
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() {
            return Err(format!(
                "FFT size must be power of 2, got {}",
                self.fft_size
            ));
        }
        if self.hop_size == 0 || self.hop_size > self.fft_size {
            return Err(format!(
                "Hop size must be in 1..={}, got {}",
                self.fft_size, self.hop_size
            ));
        }
        if self.spectrum_bins == 0 || self.spectrum_bins > self.fft_size / 2 {
            return Err(format!(
                "Spectrum bins must be in 1..={}, got {}",
                self.fft_size / 2,
                self.spectrum_bins
            ));
        }
        if self.history_len == 0 {
            return Err("History length must be > 0".to_string());
        }
        Ok(())
    }
}
