use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{step_period, AnimationError, Scheduler, StepTimer, Stepper, TimerControl, TimerPhase};

/// Ease-out cubic, `1 - (1 - x)^3`.
pub fn ease_out_cubic(x: f64) -> f64 {
    1.0 - (1.0 - x).powi(3)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub targets: BTreeMap<String, u64>,
    pub duration_ms: u64,
    pub steps: u32,
    pub start_delay_ms: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            targets: BTreeMap::new(),
            duration_ms: 2000,
            steps: 60,
            start_delay_ms: 0,
        }
    }
}

impl CounterConfig {
    pub fn new<K: Into<String>>(targets: impl IntoIterator<Item = (K, u64)>) -> Self {
        Self {
            targets: targets.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_start_delay_ms(mut self, delay_ms: u64) -> Self {
        self.start_delay_ms = delay_ms;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counter {
    pub current: u64,
    pub target: u64,
}

/// Counters sharing one step count. Every `current` only grows and lands on
/// its `target` exactly on the last step.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterSet {
    counters: BTreeMap<String, Counter>,
    current_step: u32,
    total_steps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CounterTick {
    pub step: u32,
    pub values: BTreeMap<String, u64>,
}

impl CounterSet {
    pub fn new(targets: &BTreeMap<String, u64>, total_steps: u32) -> Self {
        let counters = targets
            .iter()
            .map(|(name, target)| {
                (
                    name.clone(),
                    Counter {
                        current: 0,
                        target: *target,
                    },
                )
            })
            .collect();
        Self {
            counters,
            current_step: 0,
            total_steps,
        }
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn get(&self, name: &str) -> Option<Counter> {
        self.counters.get(name).copied()
    }

    pub fn displayed(&self, name: &str) -> Option<u64> {
        self.counters.get(name).map(|c| c.current)
    }

    pub fn values(&self) -> BTreeMap<String, u64> {
        self.counters
            .iter()
            .map(|(name, c)| (name.clone(), c.current))
            .collect()
    }
}

impl Stepper for CounterSet {
    type Tick = CounterTick;

    fn advance(&mut self) -> Option<CounterTick> {
        if self.is_finished() {
            return None;
        }
        self.current_step += 1;

        if self.current_step == self.total_steps {
            for counter in self.counters.values_mut() {
                counter.current = counter.target;
            }
        } else {
            let eased = ease_out_cubic(self.current_step as f64 / self.total_steps as f64);
            for counter in self.counters.values_mut() {
                let value = (counter.target as f64 * eased).floor() as u64;
                counter.current = value.clamp(counter.current, counter.target);
            }
        }

        Some(CounterTick {
            step: self.current_step,
            values: self.values(),
        })
    }

    fn is_finished(&self) -> bool {
        self.current_step >= self.total_steps
    }
}

/// Animates a [`CounterSet`] toward its targets with ease-out cubic timing.
pub struct CounterInterpolator<S: Scheduler> {
    timer: StepTimer<CounterSet, S>,
}

impl<S: Scheduler> CounterInterpolator<S> {
    pub fn new(config: CounterConfig, scheduler: S) -> Result<Self, AnimationError> {
        let period = step_period(config.duration_ms, config.steps)?;
        let counters = CounterSet::new(&config.targets, config.steps);
        let timer = StepTimer::new(counters, period, scheduler)?
            .with_start_delay(Duration::from_millis(config.start_delay_ms));
        Ok(Self { timer })
    }

    pub fn on_update(self, callback: impl FnMut(&CounterTick) + 'static) -> Self {
        Self {
            timer: self.timer.on_tick(callback),
        }
    }

    pub fn start(&self) -> Result<bool, AnimationError> {
        self.timer.start()
    }

    pub fn stop(&self) {
        self.timer.stop();
    }

    pub fn phase(&self) -> TimerPhase {
        self.timer.phase()
    }

    pub fn displayed(&self, name: &str) -> Option<u64> {
        self.timer.with_machine(|set| set.displayed(name))
    }

    pub fn values(&self) -> BTreeMap<String, u64> {
        self.timer.with_machine(CounterSet::values)
    }

    pub fn control(&self) -> TimerControl<CounterSet, S> {
        self.timer.control()
    }
}
