use serde::Serialize;

use super::registry::{DurationRegistry, Phase};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerDisplay {
    pub minutes_text: String,
    pub seconds_text: String,
    pub status_text: String,
}

/// Project timer state into the user-facing countdown strings.
///
/// Status is picked in this order: a running timer shows the phase
/// label; a stopped timer shows "Ready to start" only while the
/// countdown still equals the phase's full duration, and "Paused" once
/// any of it has been consumed.
pub fn project(
    phase: Phase,
    seconds_remaining: u32,
    running: bool,
    registry: &DurationRegistry,
) -> TimerDisplay {
    let status_text = if running {
        match phase {
            Phase::Work => "Focusing",
            Phase::Break => "Resting",
        }
    } else if seconds_remaining == registry.full_seconds(phase) {
        "Ready to start"
    } else {
        "Paused"
    };

    TimerDisplay {
        minutes_text: format!("{:02}", seconds_remaining / 60),
        seconds_text: format!("{:02}", seconds_remaining % 60),
        status_text: status_text.to_string(),
    }
}
