//! Audio system managing track playback and real-time analysis.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::analysis::SpectrumAnalyzer;
use super::events::AudioEvent;
use super::track::Track;
use crate::error::{Error, Result};
use crate::params::AnalysisConfig;

/// Capacity of the event channel; spectrum frames are dropped when full
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Feeder tick in silent mode
const SILENT_TICK: Duration = Duration::from_millis(10);

/// Where the track is played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOutput {
    /// Default output device via cpal
    Device,
    /// No output; samples are fed to the analyzer at real-time pace
    Silent,
}

/// Audio system playing one track and emitting beat/spectrum events
pub struct AudioSystem {
    events: Receiver<AudioEvent>,

    /// Set once the last track sample has been consumed
    finished: Arc<AtomicBool>,

    stop: Arc<AtomicBool>,

    /// Audio output stream (kept alive)
    _stream: Option<cpal::Stream>,

    threads: Vec<JoinHandle<()>>,
}

impl AudioSystem {
    /// Start playback and analysis of `track`
    pub fn start(track: Track, config: AnalysisConfig, output: AudioOutput) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::Config(format!("Invalid analysis config: {}", e)))?;

        let (event_tx, event_rx) = bounded::<AudioEvent>(EVENT_CHANNEL_CAPACITY);

        // Track-rate mono samples waiting for analysis
        let sample_buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
        let finished = Arc::new(AtomicBool::new(false));
        let stop = Arc::new(AtomicBool::new(false));
        let sample_rate_hz = track.sample_rate_hz;
        let samples = Arc::new(track.samples);

        let mut threads = Vec::new();
        let stream = match output {
            AudioOutput::Device => Some(build_output_stream(
                Arc::clone(&samples),
                sample_rate_hz,
                Arc::clone(&sample_buffer),
                Arc::clone(&finished),
            )?),
            AudioOutput::Silent => {
                threads.push(spawn_silent_feeder(
                    Arc::clone(&samples),
                    sample_rate_hz,
                    Arc::clone(&sample_buffer),
                    Arc::clone(&finished),
                    Arc::clone(&stop),
                )?);
                None
            }
        };

        threads.push(spawn_analysis_thread(
            config,
            sample_rate_hz,
            sample_buffer,
            event_tx,
            Arc::clone(&finished),
            Arc::clone(&stop),
        )?);

        Ok(Self {
            events: event_rx,
            finished,
            stop,
            _stream: stream,
            threads,
        })
    }

    /// Event stream; closes after the track ends and the analyzer drains
    pub fn events(&self) -> Receiver<AudioEvent> {
        self.events.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Play `samples` on the default output device, resampling by nearest sample
fn build_output_stream(
    samples: Arc<Vec<f32>>,
    sample_rate_hz: u32,
    sample_buffer: Arc<Mutex<Vec<f32>>>,
    finished: Arc<AtomicBool>,
) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("No audio output device found".to_string()))?;

    let config = device
        .default_output_config()
        .map_err(|e| Error::Audio(format!("Failed to get audio config: {}", e)))?;

    log::info!(
        "Audio: {} @ {}Hz",
        device.name().unwrap_or_else(|_| "Unknown".to_string()),
        config.sample_rate().0
    );

    let channels = config.channels() as usize;
    let step = sample_rate_hz as f64 / config.sample_rate().0 as f64;
    let mut cursor = 0.0f64;

    let stream = device
        .build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut buffer = sample_buffer.lock().unwrap_or_else(|e| e.into_inner());

                for frame in data.chunks_mut(channels) {
                    let index = cursor as usize;
                    let sample = samples.get(index).copied().unwrap_or(0.0);
                    frame.fill(sample.clamp(-1.0, 1.0));

                    // Forward every track sample passed over to the analyzer
                    let next = cursor + step;
                    let end = (next as usize).min(samples.len());
                    if index < end {
                        buffer.extend_from_slice(&samples[index..end]);
                    }
                    cursor = next;
                }

                if cursor as usize >= samples.len() {
                    finished.store(true, Ordering::Release);
                }
            },
            |err| log::error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| Error::Audio(format!("Failed to build audio stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| Error::Audio(format!("Failed to start audio stream: {}", e)))?;

    Ok(stream)
}

/// Feed samples at wall-clock pace without an output device
fn spawn_silent_feeder(
    samples: Arc<Vec<f32>>,
    sample_rate_hz: u32,
    sample_buffer: Arc<Mutex<Vec<f32>>>,
    finished: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("audio-feeder".to_string())
        .spawn(move || {
            let started = Instant::now();
            let mut position = 0usize;

            while !stop.load(Ordering::Acquire) {
                let target = ((started.elapsed().as_secs_f64() * sample_rate_hz as f64) as usize)
                    .min(samples.len());
                if target > position {
                    sample_buffer
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .extend_from_slice(&samples[position..target]);
                    position = target;
                }
                if position >= samples.len() {
                    finished.store(true, Ordering::Release);
                    break;
                }
                thread::sleep(SILENT_TICK);
            }
        })
        .map_err(|e| Error::Audio(format!("Failed to spawn feeder thread: {}", e)))
}

/// Spawn the analysis thread: windows the sample buffer with 50% overlap and
/// emits spectrum frames and beats until the track is drained.
fn spawn_analysis_thread(
    config: AnalysisConfig,
    sample_rate_hz: u32,
    sample_buffer: Arc<Mutex<Vec<f32>>>,
    events: Sender<AudioEvent>,
    finished: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    let interval = Duration::from_secs_f32(config.hop_secs(sample_rate_hz));

    thread::Builder::new()
        .name("audio-analysis".to_string())
        .spawn(move || {
            let fft_size = config.fft_size;
            let hop = config.hop_size;
            let mut analyzer = SpectrumAnalyzer::new(config, sample_rate_hz);
            let mut window = vec![0.0f32; fft_size];
            let mut consumed = 0usize;

            while !stop.load(Ordering::Acquire) {
                thread::sleep(interval);

                // Finished must be read before the buffer so no tail is lost
                let done = finished.load(Ordering::Acquire);

                loop {
                    {
                        let mut buffer = sample_buffer.lock().unwrap_or_else(|e| e.into_inner());
                        if buffer.len() < fft_size {
                            break;
                        }
                        window.copy_from_slice(&buffer[..fft_size]);
                        buffer.drain(..hop);
                    }

                    let at = Duration::from_secs_f64(consumed as f64 / sample_rate_hz as f64);
                    consumed += hop;

                    let (frame, beat) = analyzer.process_window(&window, at);
                    match events.try_send(AudioEvent::Spectrum(frame)) {
                        Ok(()) | Err(TrySendError::Full(_)) => {}
                        Err(TrySendError::Disconnected(_)) => return,
                    }
                    if let Some(beat) = beat {
                        log::debug!("Beat at {:.3}s", at.as_secs_f32());
                        if events.send(AudioEvent::Beat(beat)).is_err() {
                            return;
                        }
                    }
                }

                if done {
                    log::info!("Track finished");
                    break;
                }
            }
        })
        .map_err(|e| Error::Audio(format!("Failed to spawn analysis thread: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_playback_drains_and_closes() {
        // 0.3s of silence at 44.1kHz
        let track = Track::new(vec![0.0; 13230], 44100);
        let audio = AudioSystem::start(track, AnalysisConfig::default(), AudioOutput::Silent)
            .unwrap();

        let events = audio.events();
        let mut spectra = 0;
        let mut beats = 0;
        while let Ok(event) = events.recv_timeout(Duration::from_secs(5)) {
            match event {
                AudioEvent::Spectrum(_) => spectra += 1,
                AudioEvent::Beat(_) => beats += 1,
            }
        }

        // (13230 - 1024) / 512 + 1 windows
        assert_eq!(spectra, 24);
        assert_eq!(beats, 0);
        assert!(audio.is_finished());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AnalysisConfig::default();
        config.fft_size = 1000;

        let track = Track::new(vec![0.0; 100], 44100);
        assert!(matches!(
            AudioSystem::start(track, config, AudioOutput::Silent),
            Err(Error::Config(_))
        ));
    }
}
