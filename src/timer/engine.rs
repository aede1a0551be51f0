//! Work/break phase state machine.
//!
//! Owns the countdown, the running flag, the completed-cycle counter and
//! the lifecycle of the tick source. A host drives it by forwarding tick
//! tokens from the clock channel and user commands from its input
//! surface; all display state derives from `seconds_remaining`.

use std::time::Duration;

use super::clock::{ClockSource, TickToken};
use super::display::{self, TimerDisplay};
use super::registry::{DurationRegistry, Phase, ValidationError};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub struct TimerEngine<C: ClockSource> {
    clock: C,
    registry: DurationRegistry,
    phase: Phase,
    seconds_remaining: u32,
    running: bool,
    completed_cycles: u32,
    armed: Option<TickToken>,
}

impl<C: ClockSource> TimerEngine<C> {
    pub fn new(clock: C, registry: DurationRegistry) -> Self {
        let seconds_remaining = registry.full_seconds(Phase::Work);
        Self {
            clock,
            registry,
            phase: Phase::Work,
            seconds_remaining,
            running: false,
            completed_cycles: 0,
            armed: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn completed_cycles(&self) -> u32 {
        self.completed_cycles
    }

    pub fn registry(&self) -> &DurationRegistry {
        &self.registry
    }

    pub fn display(&self) -> TimerDisplay {
        display::project(self.phase, self.seconds_remaining, self.running, &self.registry)
    }

    fn cancel_armed(&mut self) {
        if let Some(token) = self.armed.take() {
            self.clock.cancel(token);
        }
    }

    fn arm(&mut self) {
        self.cancel_armed();
        self.armed = Some(self.clock.schedule_repeating(TICK_PERIOD));
    }

    /// Arm a fresh tick source and run. Calling while already running
    /// re-arms from a full one-second offset; nothing else changes.
    pub fn start(&mut self) {
        self.arm();
        self.running = true;
    }

    /// Stop ticking, keep the countdown where it is. Idempotent; a
    /// second pause has no source left to cancel.
    pub fn pause(&mut self) {
        self.cancel_armed();
        self.running = false;
    }

    /// Pause and refill the countdown from the current phase's selected
    /// duration.
    pub fn reset(&mut self) {
        self.pause();
        self.seconds_remaining = self.registry.full_seconds(self.phase);
    }

    /// Consume one tick from the clock channel. Stale tokens (from a
    /// source cancelled before the tick was received) and ticks while
    /// paused are discarded without touching the countdown.
    ///
    /// Returns the new phase when this tick exhausted the countdown:
    /// the phase flips, a finished work phase bumps the cycle counter,
    /// and a fresh source is armed immediately. There is no terminal
    /// state; phases chain until the process ends.
    pub fn tick(&mut self, token: TickToken) -> Option<Phase> {
        if !self.running || self.armed != Some(token) {
            return None;
        }

        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining > 0 {
            return None;
        }

        self.cancel_armed();
        if self.phase == Phase::Work {
            self.completed_cycles += 1;
        }
        self.phase = self.phase.other();
        self.seconds_remaining = self.registry.full_seconds(self.phase);
        self.arm();
        Some(self.phase)
    }

    /// Make `minutes` the selected duration for `phase`. Selecting the
    /// value already selected is a complete no-op. When `phase` is the
    /// live phase the in-progress countdown is abandoned: the engine
    /// pauses and the countdown refills to the new duration. The other
    /// phase's selection never disturbs the live countdown.
    pub fn select_duration(&mut self, phase: Phase, minutes: u32) {
        if minutes == self.registry.selected(phase) {
            return;
        }
        self.registry.select(phase, minutes);
        if phase == self.phase {
            self.pause();
            self.seconds_remaining = minutes * 60;
        }
    }

    /// Validate raw custom input and select it. Unparsable or
    /// out-of-range input fails without touching any state.
    pub fn set_custom_duration(&mut self, phase: Phase, raw: &str) -> Result<u32, ValidationError> {
        let minutes = DurationRegistry::parse_custom(phase, raw)?;
        self.select_duration(phase, minutes);
        Ok(minutes)
    }
}
