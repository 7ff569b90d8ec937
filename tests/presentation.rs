//! End-to-end presentation tests
//!
//! A generated click track drives the real analysis thread, beat reactor and
//! title sequencer against file-backed roster, style pools and video frames.

use std::f32::consts::PI;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use beatreel::audio::{AudioOutput, AudioSystem, Track};
use beatreel::display::ConsoleDisplay;
use beatreel::params::{AnalysisConfig, SequenceTiming};
use beatreel::reactor::BeatReactor;
use beatreel::roster::{Language, Roster};
use beatreel::sequencer::{Step, TitleSequencer};
use beatreel::style::{StylePools, StyleSelector};
use beatreel::video::{FrameSequence, VideoSource};
use beatreel::wait::{ActiveWait, WaitOutcome};
use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

const SAMPLE_RATE: u32 = 44100;

const ROSTER: &str = r#"{
    "Teams": [
        {
            "Logo": "G1",
            "Players": [
                {"IGN": "A", "Name": "", "Language": "English"},
                {"IGN": "B", "Name": "Bee", "Language": "Korean"}
            ]
        }
    ]
}"#;

/// Generate a click track WAV: 30ms bass bursts every `period_ms`
fn generate_click_track(path: &Path, period_ms: u32, duration_secs: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV file");

    let num_samples = (duration_secs * SAMPLE_RATE as f32) as usize;
    let period = (SAMPLE_RATE * period_ms / 1000) as usize;
    let burst = (SAMPLE_RATE as usize * 30) / 1000;

    for i in 0..num_samples {
        let sample = if i % period < burst {
            let t = i as f32 / SAMPLE_RATE as f32;
            (2.0 * PI * 60.0 * t).sin() * 0.8
        } else {
            0.0
        };
        writer
            .write_sample((sample * 32767.0) as i16)
            .expect("Failed to write sample");
    }

    writer.finalize().expect("Failed to finalize WAV");
}

/// Lay out roster, style pools, frames and track under a temp dir
fn create_assets() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("roster.json"), ROSTER).unwrap();

    for lang in Language::ALL {
        let fonts = root.join("fonts").join(lang.as_str());
        fs::create_dir_all(&fonts).unwrap();
        for i in 0..2 {
            fs::write(fonts.join(format!("{}_{}.ttf", lang, i)), b"").unwrap();
        }
    }
    let gradients = root.join("gradients");
    fs::create_dir_all(&gradients).unwrap();
    for name in ["dawn", "dusk", "neon"] {
        fs::write(gradients.join(format!("{}.asset", name)), b"").unwrap();
    }

    let frames = root.join("frames");
    fs::create_dir_all(&frames).unwrap();
    for i in 0..4u8 {
        RgbaImage::from_pixel(8, 8, Rgba([i * 60, 0, 0, 255]))
            .save(frames.join(format!("{:04}.png", i)))
            .unwrap();
    }

    generate_click_track(&root.join("track.wav"), 200, 4.0);
    dir
}

#[test]
fn test_beat_paced_scenario() {
    let assets = create_assets();
    let root = assets.path();

    let roster = Arc::new(Roster::load(&root.join("roster.json")).unwrap());
    let pools = Arc::new(StylePools::load(root).unwrap());
    let track = Track::load(&root.join("track.wav")).unwrap();

    let display = Arc::new(ConsoleDisplay::new());
    let video = FrameSequence::open(&root.join("frames"), display.clone()).unwrap();
    assert_eq!(video.frame_count(), 4);

    let active = ActiveWait::new();
    let reactor = BeatReactor::new(Box::new(video), active.clone(), StdRng::seed_from_u64(1));

    let timing = SequenceTiming {
        logo_grace: Duration::from_millis(100),
        ign_grace: Duration::from_millis(80),
        name_grace: Duration::from_millis(80),
        ceiling: Some(Duration::from_secs(2)),
    };
    let mut sequencer = TitleSequencer::new(
        Arc::clone(&roster),
        StyleSelector::new(Arc::clone(&pools)),
        display.clone(),
        active,
        timing.clone(),
        StdRng::seed_from_u64(2),
    );

    let audio = AudioSystem::start(track, AnalysisConfig::default(), AudioOutput::Silent).unwrap();
    let reactor = reactor.spawn(audio.events()).unwrap();

    let report = sequencer.run().unwrap();
    drop(audio);
    let stats = reactor.join().unwrap();

    assert_eq!(
        report.steps(),
        vec![
            Step::GroupLogo { group: 0 },
            Step::MemberIgn { group: 0, member: 0 },
            Step::MemberIgn { group: 0, member: 1 },
            Step::MemberName { group: 0, member: 1 },
        ]
    );

    let graces = [
        timing.logo_grace,
        timing.ign_grace,
        timing.ign_grace,
        timing.name_grace,
    ];
    for (visit, grace) in report.visits.iter().zip(graces) {
        assert!(visit.duration() >= grace);
    }
    assert!(report
        .visits
        .iter()
        .any(|v| v.outcome == WaitOutcome::Cancelled));

    // Last caption is the Korean name in a Korean font
    let screen = display.snapshot();
    assert_eq!(screen.caption, "Bee");
    let style = screen.style.unwrap();
    assert!(pools.fonts(Language::Korean).contains(&style.font));
    assert!(pools.gradients().contains(&style.gradient));
    assert!(!screen.logo_visible);
    assert!(screen.frame_visible);

    assert!(stats.beats > 0);
    assert!(stats.spectra > 0);
    assert!(screen.frame_index.is_some());
}

#[test]
fn test_startup_errors_are_fatal() {
    let assets = create_assets();
    let root = assets.path();

    fs::remove_dir_all(root.join("fonts").join("turkish")).unwrap();
    assert!(StylePools::load(root).is_err());

    fs::write(root.join("roster.json"), "{ broken").unwrap();
    assert!(Roster::load(&root.join("roster.json")).is_err());
}
