//! Beat reactor: turns analysis events into video seeks and early title exits.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use glam::Vec3;
use rand::Rng;

use crate::audio::{AudioEvent, BeatEvent, SpectrumFrame};
use crate::display::{Decoration, DisplaySurface};
use crate::error::{Error, Result};
use crate::video::VideoSource;
use crate::wait::ActiveWait;

/// Bin-0 gain for the logo pulse
const LOGO_PULSE_GAIN: f32 = 10.0;

/// Bin-0 gain for the frame zoom
const FRAME_ZOOM_GAIN: f32 = 80.0;

/// Counters returned when the event stream closes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactorStats {
    pub beats: u64,
    /// Beats that released an active title wait
    pub releases: u64,
    pub spectra: u64,
}

/// Logo pulses in alternating directions, the frame zooms with bass energy
pub fn derive_decoration(frame: &SpectrumFrame, sign: f32) -> Decoration {
    let bass = frame.bin(0);
    Decoration {
        logo_scale: Vec3::ONE + Vec3::ONE * (sign * bass * LOGO_PULSE_GAIN),
        frame_scale: Vec3::ONE + Vec3::ONE * (bass * FRAME_ZOOM_GAIN),
        logo_roll: bass,
    }
}

pub struct BeatReactor<R> {
    video: Box<dyn VideoSource>,
    active: ActiveWait,
    rng: R,
    decorations: Option<Arc<dyn DisplaySurface>>,
    pulse_out: bool,
    stats: ReactorStats,
}

impl<R: Rng> BeatReactor<R> {
    pub fn new(video: Box<dyn VideoSource>, active: ActiveWait, rng: R) -> Self {
        Self {
            video,
            active,
            rng,
            decorations: None,
            pulse_out: false,
            stats: ReactorStats::default(),
        }
    }

    /// Forward spectrum-driven decorations to `display`
    pub fn with_decorations(mut self, display: Arc<dyn DisplaySurface>) -> Self {
        self.decorations = Some(display);
        self
    }

    pub fn stats(&self) -> ReactorStats {
        self.stats
    }

    /// Jump the video to a random frame, then release the current title wait.
    /// Returns true if a wait was armed.
    pub fn on_beat(&mut self, beat: &BeatEvent) -> bool {
        self.stats.beats += 1;

        let frame_count = self.video.frame_count();
        if frame_count > 0 {
            let index = self.rng.gen_range(0..frame_count);
            log::trace!("Beat at {:.3}s -> frame {}", beat.at.as_secs_f32(), index);
            self.video.seek_to_frame(index);
        } else {
            log::debug!("Beat with empty video, skipping seek");
        }

        let released = self.active.cancel();
        if released {
            self.stats.releases += 1;
        }
        released
    }

    pub fn on_spectrum(&mut self, frame: &SpectrumFrame) -> Decoration {
        self.stats.spectra += 1;

        let sign = if self.pulse_out { 1.0 } else { -1.0 };
        self.pulse_out = !self.pulse_out;

        let decoration = derive_decoration(frame, sign);
        if let Some(display) = &self.decorations {
            display.apply_decoration(decoration);
        }
        decoration
    }

    pub fn handle(&mut self, event: &AudioEvent) {
        match event {
            AudioEvent::Beat(beat) => {
                self.on_beat(beat);
            }
            AudioEvent::Spectrum(frame) => {
                self.on_spectrum(frame);
            }
        }
    }

    /// Drain `events` until every sender is gone
    pub fn run(mut self, events: Receiver<AudioEvent>) -> ReactorStats {
        for event in events.iter() {
            self.handle(&event);
        }
        log::debug!(
            "Reactor done: {} beats ({} releases), {} spectrum frames",
            self.stats.beats,
            self.stats.releases,
            self.stats.spectra
        );
        self.stats
    }
}

impl<R: Rng + Send + 'static> BeatReactor<R> {
    /// Run the reactor on its own thread
    pub fn spawn(self, events: Receiver<AudioEvent>) -> Result<JoinHandle<ReactorStats>> {
        thread::Builder::new()
            .name("beat-reactor".to_string())
            .spawn(move || self.run(events))
            .map_err(Error::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::FrameSequence;
    use crate::wait::{begin_wait, WaitHandle, WaitOutcome};
    use crossbeam_channel::unbounded;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    struct FakeVideo {
        frames: u64,
        seeks: Arc<Mutex<Vec<u64>>>,
    }

    impl VideoSource for FakeVideo {
        fn frame_count(&self) -> u64 {
            self.frames
        }

        fn seek_to_frame(&mut self, index: u64) {
            self.seeks.lock().unwrap().push(index);
        }
    }

    fn reactor(frames: u64) -> (BeatReactor<StdRng>, ActiveWait, Arc<Mutex<Vec<u64>>>) {
        let seeks = Arc::new(Mutex::new(Vec::new()));
        let video = FakeVideo {
            frames,
            seeks: Arc::clone(&seeks),
        };
        let active = ActiveWait::new();
        let reactor = BeatReactor::new(Box::new(video), active.clone(), StdRng::seed_from_u64(3));
        (reactor, active, seeks)
    }

    fn beat() -> BeatEvent {
        BeatEvent {
            at: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_beat_seeks_within_range() {
        let (mut reactor, _, seeks) = reactor(10);

        for _ in 0..100 {
            reactor.on_beat(&beat());
        }

        let seeks = seeks.lock().unwrap();
        assert_eq!(seeks.len(), 100);
        assert!(seeks.iter().all(|&i| i < 10));
    }

    #[test]
    fn test_empty_video_skips_seek() {
        let (mut reactor, _, seeks) = reactor(0);

        reactor.on_beat(&beat());
        assert!(seeks.lock().unwrap().is_empty());
        assert_eq!(reactor.stats().beats, 1);
    }

    #[test]
    fn test_beat_releases_armed_wait() {
        let (mut reactor, active, _) = reactor(5);
        let handle = WaitHandle::new();

        // Nothing armed: no-op
        assert!(!reactor.on_beat(&beat()));

        active.arm(handle.clone());
        assert!(reactor.on_beat(&beat()));
        assert!(handle.is_cancelled());

        // Second beat on the same wait is harmless
        assert!(reactor.on_beat(&beat()));
        assert_eq!(reactor.stats().releases, 2);
    }

    #[test]
    fn test_spectrum_pulse_alternates() {
        let (mut reactor, _, _) = reactor(1);
        let frame = SpectrumFrame {
            magnitudes: vec![0.01, 0.5],
        };

        let first = reactor.on_spectrum(&frame);
        let second = reactor.on_spectrum(&frame);

        assert!((first.logo_scale.x - 0.9).abs() < 1e-5);
        assert!((second.logo_scale.x - 1.1).abs() < 1e-5);
        assert!((first.frame_scale.y - 1.8).abs() < 1e-5);
        assert_eq!(first.frame_scale, second.frame_scale);
        assert_eq!(first.logo_roll, 0.01);
    }

    #[test]
    fn test_decorations_reach_display() {
        let display = Arc::new(crate::display::ConsoleDisplay::new());
        let (reactor, _, _) = reactor(1);
        let mut reactor = reactor.with_decorations(display.clone());

        let decoration = reactor.on_spectrum(&SpectrumFrame {
            magnitudes: vec![0.02],
        });
        assert_eq!(display.snapshot().decoration, decoration);
    }

    #[test]
    fn test_run_drains_until_closed() {
        let (reactor, active, seeks) = reactor(4);
        let handle = WaitHandle::new();
        active.arm(handle.clone());

        let (tx, rx) = unbounded();
        tx.send(AudioEvent::Spectrum(SpectrumFrame::default())).unwrap();
        tx.send(AudioEvent::Beat(beat())).unwrap();
        tx.send(AudioEvent::Spectrum(SpectrumFrame::default())).unwrap();
        drop(tx);

        let stats = reactor.spawn(rx).unwrap().join().unwrap();
        assert_eq!(
            stats,
            ReactorStats {
                beats: 1,
                releases: 1,
                spectra: 2
            }
        );
        assert!(handle.is_cancelled());
        assert_eq!(seeks.lock().unwrap().len(), 1);
    }

    /// Display that sleeps on every presented frame
    struct SlowDisplay;

    impl DisplaySurface for SlowDisplay {
        fn set_caption(&self, _text: &str, _style: &crate::style::Style) {}
        fn set_logo(&self, _logo: &str) {}
        fn set_logo_visible(&self, _visible: bool) {}
        fn set_frame_visible(&self, _visible: bool) {}

        fn present_frame(&self, _frame: &crate::display::VideoFrame) {
            std::thread::sleep(Duration::from_millis(300));
        }
    }

    #[test]
    fn test_release_not_delayed_by_frame_load() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..2u8 {
            image::RgbaImage::from_pixel(64, 64, image::Rgba([i, 0, 0, 255]))
                .save(dir.path().join(format!("{}.png", i)))
                .unwrap();
        }
        let video = FrameSequence::open(dir.path(), Arc::new(SlowDisplay)).unwrap();

        let active = ActiveWait::new();
        let mut reactor = BeatReactor::new(Box::new(video), active.clone(), StdRng::seed_from_u64(5));

        let pending = begin_wait(Duration::ZERO, Some(Duration::from_secs(5)));
        active.arm(pending.handle());

        let start = Instant::now();
        let waiter = std::thread::spawn(move || pending.wait());
        assert!(reactor.on_beat(&beat()));
        let report = waiter.join().unwrap();

        assert_eq!(report.outcome, WaitOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
