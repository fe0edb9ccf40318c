use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use super::{AnimationError, Scheduler};

/// State that moves forward one fixed step at a time.
pub trait Stepper: 'static {
    type Tick: 'static;

    /// Applies the next step and describes it, or returns `None` when there
    /// is nothing left to do.
    fn advance(&mut self) -> Option<Self::Tick>;

    fn is_finished(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running,
    Complete,
    Cancelled,
}

struct Shared<M: Stepper, S: Scheduler> {
    machine: M,
    scheduler: S,
    phase: TimerPhase,
    period: Duration,
    start_delay: Duration,
    finish_delay: Duration,
    // start delay, step interval or finish delay, whichever is pending
    handle: Option<S::Handle>,
    on_tick: Option<Box<dyn FnMut(&M::Tick)>>,
    on_finish: Option<Box<dyn FnOnce()>>,
}

type SharedRef<M, S> = Rc<RefCell<Shared<M, S>>>;

/// Drives a [`Stepper`] from a [`Scheduler`] interval.
///
/// `Idle -> Running -> Complete`, or `Cancelled` once stopped early. Steps
/// never overlap, `start` never schedules twice and, once stopped, no
/// callback of this timer runs again. Dropping the timer stops it.
pub struct StepTimer<M: Stepper, S: Scheduler> {
    shared: SharedRef<M, S>,
}

impl<M: Stepper, S: Scheduler> StepTimer<M, S> {
    pub fn new(machine: M, period: Duration, scheduler: S) -> Result<Self, AnimationError> {
        if period.is_zero() {
            return Err(AnimationError::InvalidConfig(
                "step period must be positive",
            ));
        }
        Ok(Self {
            shared: Rc::new(RefCell::new(Shared {
                machine,
                scheduler,
                phase: TimerPhase::Idle,
                period,
                start_delay: Duration::ZERO,
                finish_delay: Duration::ZERO,
                handle: None,
                on_tick: None,
                on_finish: None,
            })),
        })
    }

    /// Wait before the first step is scheduled.
    pub fn with_start_delay(self, delay: Duration) -> Self {
        self.shared.borrow_mut().start_delay = delay;
        self
    }

    /// Wait between the final step and the finish callback.
    pub fn with_finish_delay(self, delay: Duration) -> Self {
        self.shared.borrow_mut().finish_delay = delay;
        self
    }

    pub fn on_tick(self, callback: impl FnMut(&M::Tick) + 'static) -> Self {
        self.shared.borrow_mut().on_tick = Some(Box::new(callback));
        self
    }

    pub fn on_finish(self, callback: impl FnOnce() + 'static) -> Self {
        self.shared.borrow_mut().on_finish = Some(Box::new(callback));
        self
    }

    /// Returns `Ok(false)` without scheduling anything unless the timer is
    /// still idle.
    pub fn start(&self) -> Result<bool, AnimationError> {
        let (scheduler, delay) = {
            let mut s = self.shared.borrow_mut();
            if s.phase != TimerPhase::Idle {
                return Ok(false);
            }
            s.phase = TimerPhase::Running;
            (s.scheduler.clone(), s.start_delay)
        };

        let result = if delay.is_zero() {
            begin(&self.shared)
        } else {
            let weak = Rc::downgrade(&self.shared);
            scheduler
                .set_timeout(delay, Box::new(move || after_start_delay(&weak)))
                .map(|handle| {
                    self.shared.borrow_mut().handle = Some(handle);
                })
        };

        if let Err(err) = result {
            halt(&self.shared);
            return Err(err);
        }
        Ok(true)
    }

    pub fn stop(&self) {
        halt(&self.shared);
    }

    pub fn phase(&self) -> TimerPhase {
        self.shared.borrow().phase
    }

    /// Reads the driven state. Must not be called from inside `f` of another
    /// `with_machine` on the same timer.
    pub fn with_machine<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.shared.borrow().machine)
    }

    /// A weak handle for stopping the timer, usable from its own callbacks.
    pub fn control(&self) -> TimerControl<M, S> {
        TimerControl {
            shared: Rc::downgrade(&self.shared),
        }
    }
}

impl<M: Stepper, S: Scheduler> Drop for StepTimer<M, S> {
    fn drop(&mut self) {
        halt(&self.shared);
    }
}

pub struct TimerControl<M: Stepper, S: Scheduler> {
    shared: Weak<RefCell<Shared<M, S>>>,
}

impl<M: Stepper, S: Scheduler> Clone for TimerControl<M, S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<M: Stepper, S: Scheduler> TimerControl<M, S> {
    pub fn stop(&self) {
        if let Some(shared) = self.shared.upgrade() {
            halt(&shared);
        }
    }

    /// `None` once the timer itself has been dropped.
    pub fn phase(&self) -> Option<TimerPhase> {
        self.shared.upgrade().map(|shared| shared.borrow().phase)
    }
}

fn after_start_delay<M: Stepper, S: Scheduler>(weak: &Weak<RefCell<Shared<M, S>>>) {
    let Some(shared) = weak.upgrade() else {
        return;
    };
    {
        let mut s = shared.borrow_mut();
        s.handle = None;
        if s.phase != TimerPhase::Running {
            return;
        }
    }
    if let Err(err) = begin(&shared) {
        log::warn!("step timer couldn't start: {err}");
        halt(&shared);
    }
}

fn begin<M: Stepper, S: Scheduler>(shared: &SharedRef<M, S>) -> Result<(), AnimationError> {
    let (scheduler, period, finished) = {
        let s = shared.borrow();
        (s.scheduler.clone(), s.period, s.machine.is_finished())
    };
    if finished {
        complete(shared);
        return Ok(());
    }
    let weak = Rc::downgrade(shared);
    let handle = scheduler.set_interval(period, Box::new(move || step(&weak)))?;
    shared.borrow_mut().handle = Some(handle);
    Ok(())
}

fn step<M: Stepper, S: Scheduler>(weak: &Weak<RefCell<Shared<M, S>>>) {
    let Some(shared) = weak.upgrade() else {
        return;
    };
    let (tick, finished, mut on_tick) = {
        let mut s = shared.borrow_mut();
        if s.phase != TimerPhase::Running {
            return;
        }
        let Some(tick) = s.machine.advance() else {
            return;
        };
        let finished = s.machine.is_finished();
        (tick, finished, s.on_tick.take())
    };

    // the cell is released so the callback may stop the timer or read it
    if let Some(callback) = on_tick.as_mut() {
        callback(&tick);
    }

    let running = {
        let mut s = shared.borrow_mut();
        let running = s.phase == TimerPhase::Running;
        if running && s.on_tick.is_none() {
            s.on_tick = on_tick.take();
        }
        running
    };
    drop(on_tick);

    if finished && running {
        complete(&shared);
    }
}

fn complete<M: Stepper, S: Scheduler>(shared: &SharedRef<M, S>) {
    let (scheduler, interval, delay) = {
        let mut s = shared.borrow_mut();
        s.phase = TimerPhase::Complete;
        (s.scheduler.clone(), s.handle.take(), s.finish_delay)
    };
    if let Some(handle) = interval {
        scheduler.clear(handle);
    }

    if delay.is_zero() {
        finish(shared);
        return;
    }
    let weak = Rc::downgrade(shared);
    match scheduler.set_timeout(
        delay,
        Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.borrow_mut().handle = None;
                finish(&shared);
            }
        }),
    ) {
        Ok(handle) => shared.borrow_mut().handle = Some(handle),
        Err(err) => {
            log::warn!("step timer finishing without its delay: {err}");
            finish(shared);
        }
    }
}

fn finish<M: Stepper, S: Scheduler>(shared: &SharedRef<M, S>) {
    let on_finish = {
        let mut s = shared.borrow_mut();
        s.on_tick = None;
        s.on_finish.take()
    };
    if let Some(callback) = on_finish {
        callback();
    }
}

fn halt<M: Stepper, S: Scheduler>(shared: &SharedRef<M, S>) {
    let (scheduler, handle, on_tick, on_finish) = {
        let mut s = shared.borrow_mut();
        if matches!(s.phase, TimerPhase::Idle | TimerPhase::Running) {
            s.phase = TimerPhase::Cancelled;
        }
        (
            s.scheduler.clone(),
            s.handle.take(),
            s.on_tick.take(),
            s.on_finish.take(),
        )
    };
    if let Some(handle) = handle {
        scheduler.clear(handle);
    }
    drop(on_tick);
    drop(on_finish);
}
