//! Command-line argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::audio::AudioOutput;
use crate::params::{CosmeticConfig, SequenceTiming};
use crate::sequencer::UnknownLanguagePolicy;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "beatreel")]
#[command(about = "Beat-reactive roster titles over a looping video", long_about = None)]
pub struct Args {
    /// Roster JSON (Teams[].Logo, Teams[].Players[].IGN/Name/Language)
    #[arg(long, value_name = "FILE", default_value = "assets/roster.json")]
    pub roster: PathBuf,

    /// Style asset directory (fonts/<language>/, gradients/)
    #[arg(long, value_name = "DIR", default_value = "assets")]
    pub assets: PathBuf,

    /// Audio track (WAV)
    #[arg(long, value_name = "FILE", default_value = "assets/track.wav")]
    pub audio: PathBuf,

    /// Directory of video frames (png/jpg/bmp)
    #[arg(long, value_name = "DIR", default_value = "assets/frames")]
    pub frames: PathBuf,

    /// Random seed (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Longest a title waits for a beat after its grace period (0 = forever)
    #[arg(long, value_name = "MS", default_value = "8000")]
    pub ceiling_ms: u64,

    /// Minimum time a group logo is shown
    #[arg(long, value_name = "MS", default_value = "1000")]
    pub logo_grace_ms: u64,

    /// Minimum time a player's in-game name is shown
    #[arg(long, value_name = "MS", default_value = "800")]
    pub title_grace_ms: u64,

    /// Minimum time a player's real name is shown
    #[arg(long, value_name = "MS", default_value = "800")]
    pub name_grace_ms: u64,

    /// Abort on an unrecognized player language instead of skipping the name
    #[arg(long)]
    pub strict: bool,

    /// Analyze the track in real time without an audio device
    #[arg(long)]
    pub silent: bool,

    /// Disable colour cycling and spectrum decorations
    #[arg(long)]
    pub no_cosmetics: bool,
}

impl Args {
    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    pub fn timing(&self) -> SequenceTiming {
        SequenceTiming {
            logo_grace: Duration::from_millis(self.logo_grace_ms),
            ign_grace: Duration::from_millis(self.title_grace_ms),
            name_grace: Duration::from_millis(self.name_grace_ms),
            ceiling: (self.ceiling_ms > 0).then(|| Duration::from_millis(self.ceiling_ms)),
        }
    }

    pub fn policy(&self) -> UnknownLanguagePolicy {
        if self.strict {
            UnknownLanguagePolicy::Abort
        } else {
            UnknownLanguagePolicy::Skip
        }
    }

    pub fn output(&self) -> AudioOutput {
        if self.silent {
            AudioOutput::Silent
        } else {
            AudioOutput::Device
        }
    }

    /// Cosmetic settings, `None` when disabled
    pub fn cosmetics(&self) -> Option<CosmeticConfig> {
        (!self.no_cosmetics).then(CosmeticConfig::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["beatreel"]);

        let timing = args.timing();
        assert_eq!(timing.logo_grace, Duration::from_millis(1000));
        assert_eq!(timing.ign_grace, Duration::from_millis(800));
        assert_eq!(timing.ceiling, Some(Duration::from_secs(8)));
        assert_eq!(args.policy(), UnknownLanguagePolicy::Skip);
        assert_eq!(args.output(), AudioOutput::Device);
        assert!(args.cosmetics().is_some());
    }

    #[test]
    fn test_flags() {
        let args = Args::parse_from([
            "beatreel",
            "--ceiling-ms",
            "0",
            "--seed",
            "42",
            "--strict",
            "--silent",
            "--no-cosmetics",
        ]);

        assert_eq!(args.timing().ceiling, None);
        assert_eq!(args.seed(), 42);
        assert_eq!(args.policy(), UnknownLanguagePolicy::Abort);
        assert_eq!(args.output(), AudioOutput::Silent);
        assert!(args.cosmetics().is_none());
    }
}
