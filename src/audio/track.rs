//! WAV track decoding.

use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Decoded audio track, downmixed to mono
#[derive(Debug, Clone)]
pub struct Track {
    pub samples: Vec<f32>,
    pub sample_rate_hz: u32,
}

impl Track {
    pub fn new(samples: Vec<f32>, sample_rate_hz: u32) -> Self {
        Self {
            samples,
            sample_rate_hz,
        }
    }

    /// Decode a WAV file (integer or float PCM, any channel count)
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .map_err(|e| Error::Audio(format!("Failed to open {}: {}", path.display(), e)))?;
        let spec = reader.spec();

        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(Error::Audio(format!(
                "Invalid WAV header in {}",
                path.display()
            )));
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Audio(format!("Failed to decode samples: {}", e)))?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| Error::Audio(format!("Failed to decode samples: {}", e)))?
            }
        };

        let channels = spec.channels as usize;
        let samples = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        let track = Self::new(samples, spec.sample_rate);
        log::info!(
            "Track: {} ({:.1}s @ {}Hz, {} ch)",
            path.display(),
            track.duration().as_secs_f32(),
            spec.sample_rate,
            spec.channels
        );
        Ok(track)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate_hz as f64)
    }
}
