//! FFT spectrum analysis and energy-onset beat detection.

use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;
use std::time::Duration;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::events::{BeatEvent, SpectrumFrame};
use crate::params::AnalysisConfig;

/// Bass energy below this is treated as silence
const SILENCE_FLOOR: f32 = 1e-4;

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

/// Onset detector over a running mean of bass energy
#[derive(Debug)]
pub struct BeatDetector {
    history: VecDeque<f32>,
    history_len: usize,
    threshold: f32,
    min_interval: Duration,
    last_beat: Option<Duration>,
}

impl BeatDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.history_len),
            history_len: config.history_len,
            threshold: config.onset_threshold,
            min_interval: Duration::from_millis(config.min_beat_interval_ms),
            last_beat: None,
        }
    }

    /// Feed the bass energy of the window at track position `at`;
    /// returns true if this window is an onset.
    pub fn process(&mut self, energy: f32, at: Duration) -> bool {
        // Wait for a full second of context before judging
        let warmed_up = self.history.len() == self.history_len;
        let mean = if self.history.is_empty() {
            0.0
        } else {
            self.history.iter().sum::<f32>() / self.history.len() as f32
        };

        let refractory = self
            .last_beat
            .is_some_and(|last| at.saturating_sub(last) < self.min_interval);

        let is_beat = warmed_up
            && !refractory
            && energy > SILENCE_FLOOR
            && energy > mean * self.threshold;

        if is_beat {
            self.last_beat = Some(at);
        }

        if self.history.len() == self.history_len {
            self.history.pop_front();
        }
        self.history.push_back(energy);

        is_beat
    }
}

/// Windowed FFT producing spectrum frames and beat events
pub struct SpectrumAnalyzer {
    config: AnalysisConfig,
    sample_rate_hz: u32,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    detector: BeatDetector,
}

impl SpectrumAnalyzer {
    pub fn new(config: AnalysisConfig, sample_rate_hz: u32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        Self {
            buffer: vec![Complex::new(0.0, 0.0); config.fft_size],
            detector: BeatDetector::new(&config),
            fft,
            config,
            sample_rate_hz,
        }
    }

    /// Analyze one window of `fft_size` samples starting at track position `at`
    pub fn process_window(&mut self, window: &[f32], at: Duration) -> (SpectrumFrame, Option<BeatEvent>) {
        let size = self.config.fft_size;
        debug_assert_eq!(window.len(), size);

        // Apply Hann window
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = window.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * hann_window(i, size), 0.0);
        }

        self.fft.process(&mut self.buffer);

        let norm = 1.0 / size as f32;
        let magnitudes: Vec<f32> = self.buffer[..self.config.spectrum_bins]
            .iter()
            .map(|c| c.norm() * norm)
            .collect();

        let bass_bins = self.config.bass_bins(self.sample_rate_hz);
        let bass: Vec<f32> = self.buffer[bass_bins.start.min(size / 2)..bass_bins.end.min(size / 2)]
            .iter()
            .map(|c| c.norm() * norm)
            .collect();
        let energy = if bass.is_empty() {
            0.0
        } else {
            bass.iter().sum::<f32>() / bass.len() as f32
        };

        let beat = self
            .detector
            .process(energy, at)
            .then_some(BeatEvent { at });

        (SpectrumFrame { magnitudes }, beat)
    }
}
