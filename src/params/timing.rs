//! Title pacing configuration.

use std::time::Duration;

/// Grace periods and safety ceiling for each sequencer state
#[derive(Debug, Clone)]
pub struct SequenceTiming {
    /// Minimum time a group logo stays up
    pub logo_grace: Duration,

    /// Minimum time a player's in-game name stays up
    pub ign_grace: Duration,

    /// Minimum time a player's real name stays up
    pub name_grace: Duration,

    /// Upper bound on the interruptible tail when no beat arrives.
    /// `None` waits for a beat forever.
    pub ceiling: Option<Duration>,
}

impl Default for SequenceTiming {
    fn default() -> Self {
        Self {
            logo_grace: Duration::from_millis(1000),
            ign_grace: Duration::from_millis(800),
            name_grace: Duration::from_millis(800),
            ceiling: Some(Duration::from_secs(8)),
        }
    }
}

/// Cosmetic background task configuration
#[derive(Debug, Clone)]
pub struct CosmeticConfig {
    /// Text colour change interval (milliseconds)
    pub color_cycle_interval_ms: u64,

    /// Forward spectrum-driven scale transforms to the display
    pub decorations: bool,
}

impl Default for CosmeticConfig {
    fn default() -> Self {
        Self {
            color_cycle_interval_ms: 10,
            decorations: true,
        }
    }
}
