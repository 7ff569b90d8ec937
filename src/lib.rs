//! beatreel library - beat-reactive title sequencing over a looping video

pub mod audio;
pub mod cli;
pub mod cosmetic;
pub mod display;
pub mod error;
pub mod params;
pub mod reactor;
pub mod roster;
pub mod sequencer;
pub mod style;
pub mod video;
pub mod wait;

pub use error::{Error, Result};
