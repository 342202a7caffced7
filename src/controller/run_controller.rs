use super::debounce::Debouncer;
use crate::clock::Clock;
use crate::config::{ControlSettings, TimingSettings};
use crate::input::{KeyId, KeyState};
use crate::journal::{Outcome, RunSegment};
use crate::pipeline::PerceptionPipeline;
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Paused,
    Active {
        /// Monotonic instant of the resume.
        started_at: Duration,
        started_wall: DateTime<Local>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlEvent {
    Toggle,
    MarkLost,
    MarkWon,
    Quit,
}

/// Physical keys bound to the four control events.
#[derive(Debug, Clone)]
pub struct ControlKeys {
    pub toggle: KeyId,
    pub quit: KeyId,
    pub mark_lost: KeyId,
    pub mark_won: KeyId,
}

impl ControlKeys {
    pub fn from_settings(controls: &ControlSettings) -> Self {
        Self {
            toggle: KeyId::new(&controls.toggle),
            quit: KeyId::new(&controls.quit),
            mark_lost: KeyId::new(&controls.mark_lost),
            mark_won: KeyId::new(&controls.mark_won),
        }
    }
}

/// State cleared on every transition into Active.
pub trait ResumeReset {
    fn reset_on_resume(&mut self);
}

impl ResumeReset for PerceptionPipeline {
    fn reset_on_resume(&mut self) {
        self.reset();
    }
}

pub struct RunController {
    state: RunState,
    debounce: Debouncer,
    /// Events already fired for the current press of their key.
    spent: HashSet<ControlEvent>,
    toggle_window: Duration,
    outcome_window: Duration,
}

impl RunController {
    pub fn new(timing: &TimingSettings) -> Self {
        Self {
            state: RunState::Paused,
            debounce: Debouncer::new(),
            spent: HashSet::new(),
            toggle_window: timing.toggle_debounce(),
            outcome_window: timing.outcome_debounce(),
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, RunState::Active { .. })
    }

    /// Reads the held keys in priority order: quit, lost, won, toggle.
    /// Lost, won and toggle fire once per press and only outside the
    /// debounce window; releasing the key re-arms it. Quit is level
    /// triggered and never debounced.
    pub fn poll(&mut self, keys: &dyn KeyState, bindings: &ControlKeys, clock: &dyn Clock) -> Option<ControlEvent> {
        if keys.is_pressed(&bindings.quit) {
            return Some(ControlEvent::Quit);
        }
        let edges = [
            (ControlEvent::MarkLost, keys.is_pressed(&bindings.mark_lost)),
            (ControlEvent::MarkWon, keys.is_pressed(&bindings.mark_won)),
            (ControlEvent::Toggle, keys.is_pressed(&bindings.toggle)),
        ];
        for (event, held) in edges {
            if !held {
                self.spent.remove(&event);
            }
        }
        if !self.debounce.is_quiet(clock.monotonic()) {
            return None;
        }
        let (event, _) = edges
            .into_iter()
            .find(|(event, held)| *held && !self.spent.contains(event))?;
        self.spent.insert(event);
        Some(event)
    }

    /// Paused -> Active stamps the run start and resets `perception`.
    /// Active -> Paused keeps everything as is.
    pub fn toggle(&mut self, perception: &mut dyn ResumeReset, clock: &dyn Clock) -> &RunState {
        let now = clock.monotonic();
        self.state = match self.state {
            RunState::Paused => {
                perception.reset_on_resume();
                info!("[RESUMED] Bot active!");
                RunState::Active {
                    started_at: now,
                    started_wall: clock.wall(),
                }
            }
            RunState::Active { .. } => {
                info!("[PAUSED] Bot sleeping...");
                RunState::Paused
            }
        };
        self.debounce.suppress(now, self.toggle_window);
        &self.state
    }

    pub fn mark_lost(&mut self, clock: &dyn Clock) -> RunSegment {
        self.finish(Outcome::Lost, clock)
    }

    pub fn mark_won(&mut self, clock: &dyn Clock) -> RunSegment {
        self.finish(Outcome::Won, clock)
    }

    /// Ends the run (if any) with `outcome` and pauses.
    pub fn finish(&mut self, outcome: Outcome, clock: &dyn Clock) -> RunSegment {
        let now = clock.monotonic();
        let segment = self.close(outcome, now, clock.wall());
        self.debounce.suppress(now, self.outcome_window);
        segment
    }

    /// Closes an active run as aborted. `None` when paused.
    pub fn abort(&mut self, clock: &dyn Clock) -> Option<RunSegment> {
        if !self.is_active() {
            return None;
        }
        Some(self.close(Outcome::Aborted, clock.monotonic(), clock.wall()))
    }

    fn close(&mut self, outcome: Outcome, now: Duration, wall: DateTime<Local>) -> RunSegment {
        match std::mem::replace(&mut self.state, RunState::Paused) {
            RunState::Active {
                started_at,
                started_wall,
            } => RunSegment::completed(outcome, started_wall, wall, now.saturating_sub(started_at)),
            RunState::Paused => RunSegment::without_run(outcome, wall),
        }
    }
}
