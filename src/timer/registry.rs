use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const WORK_PRESETS: [u32; 3] = [25, 30, 45];
pub const BREAK_PRESETS: [u32; 3] = [5, 10, 15];
pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;
pub const WORK_MAX_MINUTES: u32 = 120;
pub const BREAK_MAX_MINUTES: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Work => "work",
            Phase::Break => "break",
        }
    }

    pub fn emoji(&self) -> &str {
        match self {
            Phase::Work => "💼",
            Phase::Break => "☕",
        }
    }

    pub fn other(&self) -> Phase {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }

    pub fn presets(&self) -> &'static [u32] {
        match self {
            Phase::Work => &WORK_PRESETS,
            Phase::Break => &BREAK_PRESETS,
        }
    }

    pub fn max_minutes(&self) -> u32 {
        match self {
            Phase::Work => WORK_MAX_MINUTES,
            Phase::Break => BREAK_MAX_MINUTES,
        }
    }

    pub fn default_minutes(&self) -> u32 {
        match self {
            Phase::Work => DEFAULT_WORK_MINUTES,
            Phase::Break => DEFAULT_BREAK_MINUTES,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected custom duration input; the timer state is left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected a whole number of minutes, got {input:?}")]
    NotAnInteger { input: String },

    #[error("{phase} duration must be 1-{max} minutes, got {minutes}")]
    OutOfRange { phase: Phase, minutes: i64, max: u32 },
}

/// Currently selected work/break durations, in minutes.
///
/// Exactly one value is selected per phase; committing a valid custom
/// value replaces the selection the same way picking a preset does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationRegistry {
    work_minutes: u32,
    break_minutes: u32,
}

impl DurationRegistry {
    pub fn new(work_minutes: u32, break_minutes: u32) -> Self {
        Self {
            work_minutes,
            break_minutes,
        }
    }

    pub fn selected(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_minutes,
            Phase::Break => self.break_minutes,
        }
    }

    pub fn select(&mut self, phase: Phase, minutes: u32) {
        match phase {
            Phase::Work => self.work_minutes = minutes,
            Phase::Break => self.break_minutes = minutes,
        }
    }

    pub fn full_seconds(&self, phase: Phase) -> u32 {
        self.selected(phase) * 60
    }

    /// Range-check a minute count against the phase's allowed span.
    pub fn check_range(phase: Phase, minutes: i64) -> Result<u32, ValidationError> {
        let max = phase.max_minutes();
        if minutes <= 0 || minutes > max as i64 {
            return Err(ValidationError::OutOfRange { phase, minutes, max });
        }
        Ok(minutes as u32)
    }

    /// Parse raw custom-duration input into a validated minute count.
    pub fn parse_custom(phase: Phase, raw: &str) -> Result<u32, ValidationError> {
        let trimmed = raw.trim();
        let minutes: i64 = trimmed
            .parse()
            .map_err(|_| ValidationError::NotAnInteger {
                input: raw.to_string(),
            })?;
        Self::check_range(phase, minutes)
    }
}

impl Default for DurationRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_WORK_MINUTES, DEFAULT_BREAK_MINUTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_and_defaults() {
        let registry = DurationRegistry::default();
        assert_eq!(registry.selected(Phase::Work), 25);
        assert_eq!(registry.selected(Phase::Break), 5);
        assert_eq!(registry.full_seconds(Phase::Work), 1500);
        assert!(Phase::Work.presets().contains(&45));
        assert!(Phase::Break.presets().contains(&15));
    }

    #[test]
    fn test_parse_custom_accepts_range_bounds() {
        assert_eq!(DurationRegistry::parse_custom(Phase::Work, "1"), Ok(1));
        assert_eq!(DurationRegistry::parse_custom(Phase::Work, "120"), Ok(120));
        assert_eq!(DurationRegistry::parse_custom(Phase::Break, "60"), Ok(60));
        assert_eq!(DurationRegistry::parse_custom(Phase::Break, " 10 "), Ok(10));
    }

    #[test]
    fn test_parse_custom_rejects_bad_input() {
        assert_eq!(
            DurationRegistry::parse_custom(Phase::Work, "abc"),
            Err(ValidationError::NotAnInteger {
                input: "abc".to_string()
            })
        );
        assert_eq!(
            DurationRegistry::parse_custom(Phase::Work, "0"),
            Err(ValidationError::OutOfRange {
                phase: Phase::Work,
                minutes: 0,
                max: 120
            })
        );
        assert_eq!(
            DurationRegistry::parse_custom(Phase::Work, "121"),
            Err(ValidationError::OutOfRange {
                phase: Phase::Work,
                minutes: 121,
                max: 120
            })
        );
        assert_eq!(
            DurationRegistry::parse_custom(Phase::Break, "61"),
            Err(ValidationError::OutOfRange {
                phase: Phase::Break,
                minutes: 61,
                max: 60
            })
        );
    }
}
