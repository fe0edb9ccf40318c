mod clock;
mod counter;
mod progress;
mod scene;
mod schedule;
mod stepper;
mod typewriter;

pub use clock::{AnimationFrame, ClockControl, FrameClock};
pub use counter::{ease_out_cubic, Counter, CounterConfig, CounterInterpolator, CounterSet, CounterTick};
pub use progress::{
    icon_index, phrase_index, ProgressConfig, ProgressSequencer, ProgressState, ProgressTick,
};
pub use scene::{Point, Rgba, SceneConfig, SceneRenderer, Segment, Stroke, Surface, SurfaceSize};
pub use schedule::{FrameSource, Scheduler, Timeline};
pub use stepper::{StepTimer, Stepper, TimerControl, TimerPhase};
pub use typewriter::{Typewriter, TypewriterState};

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    #[error("invalid animation config: {0}")]
    InvalidConfig(&'static str),
    #[error("couldn't schedule timer: {0}")]
    Scheduler(String),
}

/// Splits `duration_ms` into `steps` equal periods.
///
/// Zero durations, zero step counts and periods that would round down to
/// nothing are rejected here so the timers never divide by zero or spin.
pub fn step_period(duration_ms: u64, steps: u32) -> Result<Duration, AnimationError> {
    if duration_ms == 0 {
        return Err(AnimationError::InvalidConfig("duration must be positive"));
    }
    if steps == 0 {
        return Err(AnimationError::InvalidConfig("step count must be positive"));
    }
    let period = Duration::from_millis(duration_ms) / steps;
    if period.is_zero() {
        return Err(AnimationError::InvalidConfig(
            "step period rounds down to zero",
        ));
    }
    Ok(period)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_period() {
        assert_eq!(step_period(3000, 100), Ok(Duration::from_millis(30)));
        assert_eq!(
            step_period(2000, 60),
            Ok(Duration::from_nanos(33_333_333))
        );
    }

    #[test]
    fn test_step_period_rejects_bad_config() {
        assert!(matches!(
            step_period(0, 100),
            Err(AnimationError::InvalidConfig(_))
        ));
        assert!(matches!(
            step_period(3000, 0),
            Err(AnimationError::InvalidConfig(_))
        ));
    }
}
