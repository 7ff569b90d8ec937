//! beatreel - unattended roster presentation paced by the music
//!
//! Captions cycle through every team and player; each one holds for a grace
//! period and then gives way on the next beat, while beats also throw the
//! background video to a random frame.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use beatreel::audio::{AudioSystem, Track};
use beatreel::cli::Args;
use beatreel::cosmetic::ColorCycler;
use beatreel::display::{ConsoleDisplay, DisplaySurface};
use beatreel::params::AnalysisConfig;
use beatreel::reactor::{BeatReactor, ReactorStats};
use beatreel::roster::Roster;
use beatreel::sequencer::{SequenceReport, TitleSequencer};
use beatreel::style::{StylePools, StyleSelector};
use beatreel::video::{FrameSequence, VideoSource};
use beatreel::wait::ActiveWait;
use beatreel::{Error, Result};

/// Running presentation: every task it started
struct App {
    audio: AudioSystem,
    reactor: JoinHandle<ReactorStats>,
    sequencer: JoinHandle<Result<SequenceReport>>,
    cycler: Option<ColorCycler>,
}

impl App {
    /// Load everything fatal up front, then start audio, reactor and sequencer
    fn start(args: &Args) -> Result<Self> {
        let seed = args.seed();
        log::info!("Seed: {}", seed);
        let mut root_rng = StdRng::seed_from_u64(seed);

        let roster = Arc::new(Roster::load(&args.roster)?);
        let pools = Arc::new(StylePools::load(&args.assets)?);
        let track = Track::load(&args.audio)?;

        let display: Arc<dyn DisplaySurface> = Arc::new(ConsoleDisplay::new());
        let mut video = FrameSequence::open(&args.frames, Arc::clone(&display))?;
        if video.frame_count() > 0 {
            video.seek_to_frame(0);
        }

        let timing = args.timing();
        if timing.ceiling.is_none() {
            log::warn!("No wait ceiling: titles stall if the beats stop");
        }

        let active = ActiveWait::new();
        let cosmetics = args.cosmetics();

        let mut reactor = BeatReactor::new(
            Box::new(video),
            active.clone(),
            StdRng::seed_from_u64(root_rng.gen()),
        );
        if cosmetics.as_ref().is_some_and(|c| c.decorations) {
            reactor = reactor.with_decorations(Arc::clone(&display));
        }

        let sequencer = TitleSequencer::new(
            roster,
            StyleSelector::new(pools),
            Arc::clone(&display),
            active,
            timing,
            StdRng::seed_from_u64(root_rng.gen()),
        )
        .with_policy(args.policy());

        let audio = AudioSystem::start(track, AnalysisConfig::default(), args.output())?;
        let reactor = reactor.spawn(audio.events())?;

        let cycler = match cosmetics {
            Some(config) => Some(ColorCycler::start(
                Arc::clone(&display),
                Duration::from_millis(config.color_cycle_interval_ms),
                StdRng::seed_from_u64(root_rng.gen()),
            )?),
            None => None,
        };

        let sequencer = sequencer.spawn()?;

        Ok(Self {
            audio,
            reactor,
            sequencer,
            cycler,
        })
    }

    /// Block until the roster walk ends, then shut everything down
    fn finish(self) -> Result<SequenceReport> {
        let report = self
            .sequencer
            .join()
            .map_err(|_| Error::Task("title sequencer panicked".to_string()))?;

        if let Some(cycler) = self.cycler {
            cycler.stop();
        }

        if !self.audio.is_finished() {
            log::info!("Roster done before the track, stopping playback");
        }
        // Dropping the audio system closes the event stream
        drop(self.audio);
        match self.reactor.join() {
            Ok(stats) => log::info!(
                "Beats: {} ({} released a title), spectrum frames: {}",
                stats.beats,
                stats.releases,
                stats.spectra
            ),
            Err(_) => log::warn!("Beat reactor panicked"),
        }

        report
    }
}

fn run(args: &Args) -> Result<()> {
    let report = App::start(args)?.finish()?;
    log::info!(
        "Presentation finished: {} titles shown, {} skipped",
        report.visits.len(),
        report.skipped
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
