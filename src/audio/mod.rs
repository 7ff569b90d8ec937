//! Track playback and real-time FFT analysis.
//!
//! Plays a WAV track (through cpal, or silently at real-time pace) while an
//! analysis thread turns it into spectrum frames and beat onsets.

mod analysis;
mod events;
mod system;
mod track;

// Re-export public types
pub use analysis::{hann_window, BeatDetector, SpectrumAnalyzer};
pub use events::{AudioEvent, BeatEvent, SpectrumFrame};
pub use system::{AudioOutput, AudioSystem};
pub use track::Track;
