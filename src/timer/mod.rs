//! Focus-timer core: duration registry, cancellable tick source, the
//! phase state machine and the display projection.

pub mod clock;
pub mod display;
pub mod engine;
pub mod registry;
