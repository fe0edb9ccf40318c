use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{step_period, AnimationError, Scheduler, StepTimer, Stepper, TimerControl, TimerPhase};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub duration_ms: u64,
    pub steps: u32,
    pub completion_delay_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            duration_ms: 3000,
            steps: 100,
            completion_delay_ms: 500,
        }
    }
}

impl ProgressConfig {
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_completion_delay_ms(mut self, delay_ms: u64) -> Self {
        self.completion_delay_ms = delay_ms;
        self
    }

    pub fn step_duration(&self) -> Result<Duration, AnimationError> {
        step_period(self.duration_ms, self.steps)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub current_step: u32,
    pub total_steps: u32,
}

impl ProgressState {
    pub fn new(total_steps: u32) -> Self {
        Self {
            current_step: 0,
            total_steps,
        }
    }

    pub fn elapsed_ratio(&self) -> f64 {
        if self.total_steps == 0 {
            return 1.0;
        }
        self.current_step as f64 / self.total_steps as f64
    }

    /// Linear percentage, `0.0..=100.0`.
    pub fn progress(&self) -> f64 {
        self.elapsed_ratio() * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressTick {
    pub step: u32,
    pub progress: f64,
}

impl Stepper for ProgressState {
    type Tick = ProgressTick;

    fn advance(&mut self) -> Option<ProgressTick> {
        if self.is_finished() {
            return None;
        }
        self.current_step += 1;
        Some(ProgressTick {
            step: self.current_step,
            progress: self.progress(),
        })
    }

    fn is_finished(&self) -> bool {
        self.current_step >= self.total_steps
    }
}

/// Loading progress from 0 to 100% over a fixed duration, followed by a
/// single completion callback.
pub struct ProgressSequencer<S: Scheduler> {
    timer: StepTimer<ProgressState, S>,
}

impl<S: Scheduler> ProgressSequencer<S> {
    pub fn new(config: ProgressConfig, scheduler: S) -> Result<Self, AnimationError> {
        let period = config.step_duration()?;
        let timer = StepTimer::new(ProgressState::new(config.steps), period, scheduler)?
            .with_finish_delay(Duration::from_millis(config.completion_delay_ms));
        Ok(Self { timer })
    }

    pub fn on_step(self, callback: impl FnMut(&ProgressTick) + 'static) -> Self {
        Self {
            timer: self.timer.on_tick(callback),
        }
    }

    pub fn on_complete(self, callback: impl FnOnce() + 'static) -> Self {
        Self {
            timer: self.timer.on_finish(callback),
        }
    }

    /// No-op returning `Ok(false)` when already running or complete.
    pub fn start(&self) -> Result<bool, AnimationError> {
        self.timer.start()
    }

    pub fn cancel(&self) {
        self.timer.stop();
    }

    pub fn phase(&self) -> TimerPhase {
        self.timer.phase()
    }

    pub fn state(&self) -> ProgressState {
        self.timer.with_machine(|state| *state)
    }

    pub fn progress(&self) -> f64 {
        self.timer.with_machine(ProgressState::progress)
    }

    pub fn control(&self) -> TimerControl<ProgressState, S> {
        self.timer.control()
    }
}

/// Index of the phrase shown at `progress` when `count` phrases split the
/// bar into equal bands. `progress == 100` stays on the last phrase.
pub fn phrase_index(progress: f64, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let ratio = (progress / 100.0).clamp(0.0, 1.0);
    let index = (ratio * count as f64).floor() as usize;
    index.min(count - 1)
}

/// Icon shown at `step` when the icon rotates every `every` steps.
pub fn icon_index(step: u32, every: u32, count: usize) -> usize {
    if count == 0 || every == 0 {
        return 0;
    }
    (step / every) as usize % count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Timeline;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    struct Probe {
        ticks: Rc<RefCell<Vec<(Duration, ProgressTick)>>>,
        completions: Rc<RefCell<Vec<Duration>>>,
    }

    fn probed(timeline: &Timeline, config: ProgressConfig) -> (ProgressSequencer<Timeline>, Probe) {
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let completions = Rc::new(RefCell::new(Vec::new()));
        let (t, c) = (ticks.clone(), completions.clone());
        let (tl, tl2) = (timeline.clone(), timeline.clone());
        let sequencer = ProgressSequencer::new(config, timeline.clone())
            .unwrap()
            .on_step(move |tick| t.borrow_mut().push((tl.now(), *tick)))
            .on_complete(move || c.borrow_mut().push(tl2.now()));
        (sequencer, Probe { ticks, completions })
    }

    #[test]
    fn test_default_run_timing() {
        let timeline = Timeline::new();
        let (sequencer, probe) = probed(&timeline, ProgressConfig::default());
        assert_eq!(sequencer.phase(), TimerPhase::Idle);
        assert_eq!(sequencer.start(), Ok(true));

        timeline.advance_to(ms(30));
        assert_eq!(probe.ticks.borrow().len(), 1);
        assert_eq!(probe.ticks.borrow()[0].1, ProgressTick { step: 1, progress: 1.0 });

        timeline.advance_to(ms(3000));
        {
            let ticks = probe.ticks.borrow();
            assert_eq!(ticks.len(), 100);
            for (i, (at, tick)) in ticks.iter().enumerate() {
                assert_eq!(*at, ms(30 * (i as u64 + 1)));
                assert_eq!(tick.step, i as u32 + 1);
            }
            assert_eq!(ticks[99].1.progress, 100.0);
        }
        assert_eq!(sequencer.phase(), TimerPhase::Complete);
        assert!(probe.completions.borrow().is_empty());

        timeline.advance_to(ms(3499));
        assert!(probe.completions.borrow().is_empty());
        timeline.advance_to(ms(3500));
        assert_eq!(*probe.completions.borrow(), vec![ms(3500)]);

        timeline.advance_to(ms(60_000));
        assert_eq!(probe.completions.borrow().len(), 1);
        assert_eq!(probe.ticks.borrow().len(), 100);
        assert_eq!(timeline.pending(), 0);
    }

    #[test]
    fn test_cancel_before_completion() {
        let timeline = Timeline::new();
        let (sequencer, probe) = probed(&timeline, ProgressConfig::default());
        sequencer.start().unwrap();
        timeline.advance_to(ms(1500));
        assert_eq!(sequencer.state().current_step, 50);

        sequencer.cancel();
        sequencer.cancel();
        timeline.advance_to(ms(10_000));

        assert!(probe.completions.borrow().is_empty());
        assert_eq!(probe.ticks.borrow().len(), 50);
        assert_eq!(sequencer.phase(), TimerPhase::Cancelled);
        assert_eq!(timeline.pending(), 0);
    }

    #[test]
    fn test_cancel_from_step_callback() {
        let timeline = Timeline::new();
        let sequencer = ProgressSequencer::new(ProgressConfig::default(), timeline.clone()).unwrap();
        let control = sequencer.control();
        let completed = Rc::new(Cell::new(false));
        let c = completed.clone();
        let sequencer = sequencer
            .on_step(move |tick| {
                if tick.step == 10 {
                    control.stop();
                }
            })
            .on_complete(move || c.set(true));
        sequencer.start().unwrap();
        timeline.advance_to(ms(10_000));
        assert_eq!(sequencer.state().current_step, 10);
        assert!(!completed.get());
    }

    #[test]
    fn test_completion_only_after_final_step() {
        let timeline = Timeline::new();
        let sequencer = ProgressSequencer::new(
            ProgressConfig::default().with_completion_delay_ms(0),
            timeline.clone(),
        )
        .unwrap();
        let probe = Rc::new(RefCell::new(None));
        let p = probe.clone();
        let t = timeline.clone();
        let sequencer = sequencer.on_complete(move || *p.borrow_mut() = Some(t.now()));
        sequencer.start().unwrap();
        timeline.advance_to(ms(2999));
        assert_eq!(*probe.borrow(), None);
        timeline.advance_to(ms(3000));
        assert_eq!(*probe.borrow(), Some(ms(3000)));
        assert_eq!(sequencer.state().current_step, 100);
    }

    #[test]
    fn test_double_start_does_not_double_schedule() {
        let timeline = Timeline::new();
        let (sequencer, probe) = probed(&timeline, ProgressConfig::default());
        assert_eq!(sequencer.start(), Ok(true));
        assert_eq!(sequencer.start(), Ok(false));
        timeline.advance_to(ms(300));
        assert_eq!(probe.ticks.borrow().len(), 10);
        assert_eq!(sequencer.progress(), 10.0);
    }

    #[test]
    fn test_rejects_bad_config() {
        let zero_steps = ProgressConfig::default().with_steps(0);
        assert!(ProgressSequencer::new(zero_steps, Timeline::new()).is_err());
        let zero_duration = ProgressConfig::default().with_duration_ms(0);
        assert!(ProgressSequencer::new(zero_duration, Timeline::new()).is_err());
    }

    #[test]
    fn test_phrase_index_is_clamped() {
        assert_eq!(phrase_index(0.0, 4), 0);
        assert_eq!(phrase_index(24.0, 4), 0);
        assert_eq!(phrase_index(25.0, 4), 1);
        assert_eq!(phrase_index(74.0, 4), 2);
        assert_eq!(phrase_index(99.0, 4), 3);
        assert_eq!(phrase_index(100.0, 4), 3);
        assert_eq!(phrase_index(150.0, 4), 3);
        assert_eq!(phrase_index(-5.0, 4), 0);
        assert_eq!(phrase_index(50.0, 0), 0);
    }

    #[test]
    fn test_icon_rotation() {
        assert_eq!(icon_index(0, 25, 3), 0);
        assert_eq!(icon_index(24, 25, 3), 0);
        assert_eq!(icon_index(25, 25, 3), 1);
        assert_eq!(icon_index(50, 25, 3), 2);
        assert_eq!(icon_index(75, 25, 3), 0);
        assert_eq!(icon_index(100, 25, 3), 1);
    }

    #[test]
    fn test_state_ratios() {
        let mut state = ProgressState::new(4);
        assert_eq!(state.elapsed_ratio(), 0.0);
        state.advance();
        assert_eq!(state.elapsed_ratio(), 0.25);
        assert_eq!(state.progress(), 25.0);
        while state.advance().is_some() {}
        assert_eq!(state.current_step, 4);
        assert!(state.is_finished());
        assert_eq!(state.advance(), None);
    }
}
