//! Title sequencer: walks the roster group by group, member by member.
//!
//! Each state puts its content on the display and then holds it with a
//! cancellable wait. The wait is published to the shared [`ActiveWait`] slot
//! only once its grace period is over, so a beat can cut the tail short but
//! never the grace period itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::Rng;

use crate::display::DisplaySurface;
use crate::error::{Error, Result};
use crate::params::SequenceTiming;
use crate::roster::{LanguageTag, Roster};
use crate::style::StyleSelector;
use crate::wait::{begin_wait, ActiveWait, WaitOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    GroupLogo,
    MemberIgn,
    MemberName,
}

/// Position in the roster walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    GroupLogo { group: usize },
    MemberIgn { group: usize, member: usize },
    /// Only reached when the member has a real name
    MemberName { group: usize, member: usize },
}

impl Step {
    /// First step of the walk, `None` for an empty roster
    pub fn first(roster: &Roster) -> Option<Step> {
        (!roster.groups.is_empty()).then_some(Step::GroupLogo { group: 0 })
    }

    /// Following step in group-major, member-minor order
    pub fn next(self, roster: &Roster) -> Option<Step> {
        match self {
            Step::GroupLogo { group } => {
                let has_members = roster.group(group).is_some_and(|g| !g.members.is_empty());
                if has_members {
                    Some(Step::MemberIgn { group, member: 0 })
                } else {
                    Self::after_group(roster, group)
                }
            }
            Step::MemberIgn { group, member } => {
                if roster.member(group, member).is_some_and(|m| m.has_name()) {
                    Some(Step::MemberName { group, member })
                } else {
                    Self::after_member(roster, group, member)
                }
            }
            Step::MemberName { group, member } => Self::after_member(roster, group, member),
        }
    }

    fn after_member(roster: &Roster, group: usize, member: usize) -> Option<Step> {
        let count = roster.group(group).map_or(0, |g| g.members.len());
        if member + 1 < count {
            Some(Step::MemberIgn {
                group,
                member: member + 1,
            })
        } else {
            Self::after_group(roster, group)
        }
    }

    fn after_group(roster: &Roster, group: usize) -> Option<Step> {
        (group + 1 < roster.groups.len()).then_some(Step::GroupLogo { group: group + 1 })
    }

    /// Every step of the walk, in order
    pub fn walk(roster: &Roster) -> Vec<Step> {
        let mut steps = Vec::new();
        let mut step = Step::first(roster);
        while let Some(current) = step {
            steps.push(current);
            step = current.next(roster);
        }
        steps
    }

    pub fn phase(&self) -> Phase {
        match self {
            Step::GroupLogo { .. } => Phase::GroupLogo,
            Step::MemberIgn { .. } => Phase::MemberIgn,
            Step::MemberName { .. } => Phase::MemberName,
        }
    }

}

/// What to do with a named member whose language is not recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownLanguagePolicy {
    /// Warn and skip the real-name caption
    #[default]
    Skip,
    /// Stop the walk with an error
    Abort,
}

/// One displayed state
#[derive(Debug, Clone)]
pub struct Visit {
    pub step: Step,
    pub entered: Instant,
    pub exited: Instant,
    pub outcome: WaitOutcome,
}

impl Visit {
    pub fn duration(&self) -> Duration {
        self.exited - self.entered
    }
}

#[derive(Debug, Clone, Default)]
pub struct SequenceReport {
    pub visits: Vec<Visit>,
    /// Name captions skipped for unrecognized languages
    pub skipped: usize,
    /// Walk ended early by `SequencerControl::stop`
    pub stopped: bool,
}

impl SequenceReport {
    pub fn steps(&self) -> Vec<Step> {
        self.visits.iter().map(|v| v.step).collect()
    }
}

/// Cross-thread handle for stopping a running walk
#[derive(Debug, Clone)]
pub struct SequencerControl {
    shutdown: Arc<AtomicBool>,
    active: ActiveWait,
}

impl SequencerControl {
    /// Stop after the current state; releases an interruptible wait at once
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.active.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

pub struct TitleSequencer<R> {
    roster: Arc<Roster>,
    selector: StyleSelector,
    display: Arc<dyn DisplaySurface>,
    active: ActiveWait,
    timing: SequenceTiming,
    policy: UnknownLanguagePolicy,
    rng: R,
    shutdown: Arc<AtomicBool>,
    current: Option<Step>,
}

impl<R: Rng> TitleSequencer<R> {
    pub fn new(
        roster: Arc<Roster>,
        selector: StyleSelector,
        display: Arc<dyn DisplaySurface>,
        active: ActiveWait,
        timing: SequenceTiming,
        rng: R,
    ) -> Self {
        Self {
            roster,
            selector,
            display,
            active,
            timing,
            policy: UnknownLanguagePolicy::default(),
            rng,
            shutdown: Arc::new(AtomicBool::new(false)),
            current: None,
        }
    }

    pub fn with_policy(mut self, policy: UnknownLanguagePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn control(&self) -> SequencerControl {
        SequencerControl {
            shutdown: Arc::clone(&self.shutdown),
            active: self.active.clone(),
        }
    }

    /// Step currently on screen
    pub fn current(&self) -> Option<Step> {
        self.current
    }

    /// Walk the whole roster once, blocking until the last state's wait ends
    pub fn run(&mut self) -> Result<SequenceReport> {
        let roster = Arc::clone(&self.roster);
        let mut report = SequenceReport::default();
        let mut step = Step::first(&roster);

        log::info!(
            "Sequencing {} groups, {} members",
            roster.groups.len(),
            roster.member_count()
        );

        while let Some(current) = step {
            if self.shutdown.load(Ordering::SeqCst) {
                report.stopped = true;
                break;
            }

            let entered = Instant::now();
            if self.enter(current)? {
                self.current = Some(current);
                let outcome = self.hold(current.phase());
                report.visits.push(Visit {
                    step: current,
                    entered,
                    exited: Instant::now(),
                    outcome,
                });
            } else {
                report.skipped += 1;
            }

            step = current.next(&roster);
        }

        self.current = None;
        if !report.stopped {
            log::info!(
                "Roster walk complete: {} states, {} skipped",
                report.visits.len(),
                report.skipped
            );
        }
        Ok(report)
    }

    /// Apply the step's display side effects; false if the step is skipped
    fn enter(&mut self, step: Step) -> Result<bool> {
        let roster = Arc::clone(&self.roster);
        match step {
            Step::GroupLogo { group } => {
                let Some(group) = roster.group(group) else {
                    return Ok(false);
                };
                // Hide before show so the regions never overlap, and blank
                // the previous member's caption before the logo comes up
                self.display.set_frame_visible(false);
                let style = self.selector.pick_style(None, &mut self.rng);
                self.display.set_caption("", &style);
                self.display.set_logo(&group.logo);
                self.display.set_logo_visible(true);
            }
            Step::MemberIgn { group, member } => {
                let Some(member) = roster.member(group, member) else {
                    return Ok(false);
                };
                self.display.set_logo_visible(false);
                self.display.set_frame_visible(true);
                let style = self.selector.pick_style(None, &mut self.rng);
                self.display.set_caption(&member.ign, &style);
            }
            Step::MemberName { group, member } => {
                let Some(member) = roster.member(group, member) else {
                    return Ok(false);
                };
                let language = match &member.language {
                    LanguageTag::Recognized(language) => *language,
                    LanguageTag::Unrecognized(raw) => match self.policy {
                        UnknownLanguagePolicy::Skip => {
                            log::warn!(
                                "Skipping name of '{}': unknown language '{}'",
                                member.ign,
                                raw
                            );
                            return Ok(false);
                        }
                        UnknownLanguagePolicy::Abort => {
                            return Err(Error::UnknownLanguage {
                                ign: member.ign.clone(),
                                raw: raw.clone(),
                            });
                        }
                    },
                };
                self.display.set_logo_visible(false);
                self.display.set_frame_visible(true);
                let style = self.selector.pick_style(Some(language), &mut self.rng);
                self.display.set_caption(&member.name, &style);
            }
        }
        Ok(true)
    }

    /// Hold the current state for its grace period, then until a beat
    fn hold(&self, phase: Phase) -> WaitOutcome {
        let grace = match phase {
            Phase::GroupLogo => self.timing.logo_grace,
            Phase::MemberIgn => self.timing.ign_grace,
            Phase::MemberName => self.timing.name_grace,
        };

        let pending = begin_wait(grace, self.timing.ceiling);
        let handle = pending.handle();
        let report = pending.wait_with(|h| {
            self.active.arm(h.clone());
            // A stop that raced the arm would otherwise be lost
            if self.shutdown.load(Ordering::SeqCst) {
                h.cancel();
            }
        });
        self.active.disarm(&handle);

        if report.outcome == WaitOutcome::TimedOut {
            log::debug!("No beat within ceiling, advancing");
        }
        report.outcome
    }
}

impl<R: Rng + Send + 'static> TitleSequencer<R> {
    /// Run the walk on its own thread
    pub fn spawn(mut self) -> Result<JoinHandle<Result<SequenceReport>>> {
        thread::Builder::new()
            .name("title-sequencer".to_string())
            .spawn(move || self.run())
            .map_err(Error::Io)
    }
}
