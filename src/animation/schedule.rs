use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;
use std::time::Duration;

use super::AnimationError;

/// Timer backend for the fixed-step animations.
///
/// Callbacks are never invoked synchronously from `set_interval` or
/// `set_timeout`, and an interval is never re-entered while its previous
/// invocation is still running.
pub trait Scheduler: Clone + 'static {
    type Handle: Copy + 'static;

    fn set_interval(
        &self,
        period: Duration,
        callback: Box<dyn FnMut()>,
    ) -> Result<Self::Handle, AnimationError>;

    fn set_timeout(
        &self,
        delay: Duration,
        callback: Box<dyn FnOnce()>,
    ) -> Result<Self::Handle, AnimationError>;

    /// Clearing a handle that already fired or was cleared does nothing.
    fn clear(&self, handle: Self::Handle);
}

/// Source of display refreshes for the [`FrameClock`](super::FrameClock).
pub trait FrameSource: Clone + 'static {
    type Handle: Copy + 'static;

    /// Calls `callback` once, on the next refresh, with the refresh time in ms.
    fn request_frame(
        &self,
        callback: Box<dyn FnOnce(f64)>,
    ) -> Result<Self::Handle, AnimationError>;

    fn cancel_frame(&self, handle: Self::Handle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

enum Task {
    Interval {
        period: Duration,
        // taken out while the callback runs
        callback: Option<Box<dyn FnMut()>>,
    },
    Timeout(Box<dyn FnOnce()>),
    Frame(Box<dyn FnOnce(f64)>),
}

#[derive(Default)]
struct TimelineState {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    queue: BinaryHeap<Reverse<(Duration, u64, TimerId)>>,
    tasks: HashMap<TimerId, Task>,
}

impl TimelineState {
    fn insert(&mut self, due: Duration, task: Task) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.tasks.insert(id, task);
        self.enqueue(due, id);
        id
    }

    fn enqueue(&mut self, due: Duration, id: TimerId) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse((due, seq, id)));
    }
}

/// Single-threaded virtual-time reactor.
///
/// Time only moves when [`Timeline::advance_to`] or [`Timeline::advance_by`]
/// is called; timers due at the same instant fire in registration order.
#[derive(Clone)]
pub struct Timeline {
    state: Rc<RefCell<TimelineState>>,
    frame_interval: Duration,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(TimelineState::default())),
            frame_interval: Self::DEFAULT_FRAME_INTERVAL,
        }
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.frame_interval = interval;
        }
        self
    }

    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of timers and frame requests still scheduled.
    pub fn pending(&self) -> usize {
        self.state.borrow().tasks.len()
    }

    pub fn advance_by(&self, delta: Duration) -> usize {
        let target = self.now() + delta;
        self.advance_to(target)
    }

    /// Fires every callback due at or before `target`, in order, and returns
    /// how many fired.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut fired = 0;
        while let Some((due, id)) = self.pop_due(target) {
            if self.fire(due, id) {
                fired += 1;
            }
        }
        let mut state = self.state.borrow_mut();
        if state.now < target {
            state.now = target;
        }
        fired
    }

    fn pop_due(&self, target: Duration) -> Option<(Duration, TimerId)> {
        let mut state = self.state.borrow_mut();
        loop {
            let Reverse((due, _, id)) = *state.queue.peek()?;
            if due > target {
                return None;
            }
            state.queue.pop();
            // cleared timers leave stale queue entries behind
            if state.tasks.contains_key(&id) {
                return Some((due, id));
            }
        }
    }

    fn fire(&self, due: Duration, id: TimerId) -> bool {
        let task = {
            let mut state = self.state.borrow_mut();
            state.now = due;
            match state.tasks.get_mut(&id) {
                Some(Task::Interval { callback, .. }) => callback.take().map(Fired::Interval),
                Some(_) => match state.tasks.remove(&id) {
                    Some(Task::Timeout(callback)) => Some(Fired::Timeout(callback)),
                    Some(Task::Frame(callback)) => Some(Fired::Frame(callback)),
                    _ => None,
                },
                None => None,
            }
        };

        match task {
            Some(Fired::Interval(mut callback)) => {
                callback();
                let mut state = self.state.borrow_mut();
                let state = &mut *state;
                if let Some(Task::Interval { period, callback: slot }) = state.tasks.get_mut(&id)
                {
                    *slot = Some(callback);
                    let next = due + *period;
                    state.enqueue(next, id);
                }
                true
            }
            Some(Fired::Timeout(callback)) => {
                callback();
                true
            }
            Some(Fired::Frame(callback)) => {
                callback(due.as_secs_f64() * 1000.0);
                true
            }
            None => false,
        }
    }

    fn next_frame_due(&self, now: Duration) -> Duration {
        let interval = self.frame_interval.as_nanos();
        let due = (now.as_nanos() / interval + 1) * interval;
        Duration::from_nanos(due as u64)
    }
}

enum Fired {
    Interval(Box<dyn FnMut()>),
    Timeout(Box<dyn FnOnce()>),
    Frame(Box<dyn FnOnce(f64)>),
}

impl Scheduler for Timeline {
    type Handle = TimerId;

    fn set_interval(
        &self,
        period: Duration,
        callback: Box<dyn FnMut()>,
    ) -> Result<TimerId, AnimationError> {
        if period.is_zero() {
            return Err(AnimationError::Scheduler(
                "interval period must be positive".to_string(),
            ));
        }
        let mut state = self.state.borrow_mut();
        let due = state.now + period;
        Ok(state.insert(
            due,
            Task::Interval {
                period,
                callback: Some(callback),
            },
        ))
    }

    fn set_timeout(
        &self,
        delay: Duration,
        callback: Box<dyn FnOnce()>,
    ) -> Result<TimerId, AnimationError> {
        let mut state = self.state.borrow_mut();
        let due = state.now + delay;
        Ok(state.insert(due, Task::Timeout(callback)))
    }

    fn clear(&self, handle: TimerId) {
        let removed = self.state.borrow_mut().tasks.remove(&handle);
        // dropped outside the borrow in case the closure owns a Timeline clone
        drop(removed);
    }
}

impl FrameSource for Timeline {
    type Handle = TimerId;

    fn request_frame(&self, callback: Box<dyn FnOnce(f64)>) -> Result<TimerId, AnimationError> {
        let due = self.next_frame_due(self.now());
        Ok(self.state.borrow_mut().insert(due, Task::Frame(callback)))
    }

    fn cancel_frame(&self, handle: TimerId) {
        self.clear(handle);
    }
}
