use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::{AnimationError, FrameSource};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimationFrame {
    /// Milliseconds since the first delivered frame.
    pub timestamp: f64,
}

struct ClockState<F: FrameSource> {
    source: F,
    epoch: Option<f64>,
    last: Option<f64>,
    running: bool,
    pending: Option<F::Handle>,
    callback: Option<Box<dyn FnMut(AnimationFrame)>>,
}

impl<F: FrameSource> ClockState<F> {
    fn admit(&mut self, now: f64) -> Option<AnimationFrame> {
        let epoch = *self.epoch.get_or_insert(now);
        let timestamp = now - epoch;
        if self.last.is_some_and(|last| timestamp <= last) {
            return None;
        }
        self.last = Some(timestamp);
        Some(AnimationFrame { timestamp })
    }
}

/// Delivers one strictly increasing timestamp per display refresh to a single
/// callback until stopped. Dropping the clock stops it.
pub struct FrameClock<F: FrameSource> {
    state: Rc<RefCell<ClockState<F>>>,
}

impl<F: FrameSource> FrameClock<F> {
    pub fn start(
        source: F,
        callback: impl FnMut(AnimationFrame) + 'static,
    ) -> Result<Self, AnimationError> {
        let state = Rc::new(RefCell::new(ClockState {
            source,
            epoch: None,
            last: None,
            running: true,
            pending: None,
            callback: Some(Box::new(callback)),
        }));
        request_next(&state)?;
        log::debug!("frame clock started");
        Ok(Self { state })
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    pub fn stop(&self) {
        halt(&self.state);
    }

    /// A handle that can stop the clock from inside its own callback.
    pub fn control(&self) -> ClockControl<F> {
        ClockControl {
            state: Rc::downgrade(&self.state),
        }
    }
}

impl<F: FrameSource> Drop for FrameClock<F> {
    fn drop(&mut self) {
        halt(&self.state);
    }
}

pub struct ClockControl<F: FrameSource> {
    state: Weak<RefCell<ClockState<F>>>,
}

impl<F: FrameSource> Clone for ClockControl<F> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<F: FrameSource> ClockControl<F> {
    pub fn stop(&self) {
        if let Some(state) = self.state.upgrade() {
            halt(&state);
        }
    }
}

fn request_next<F: FrameSource>(state: &Rc<RefCell<ClockState<F>>>) -> Result<(), AnimationError> {
    let source = state.borrow().source.clone();
    let weak = Rc::downgrade(state);
    let handle = source.request_frame(Box::new(move |now| on_refresh(&weak, now)))?;
    state.borrow_mut().pending = Some(handle);
    Ok(())
}

fn on_refresh<F: FrameSource>(weak: &Weak<RefCell<ClockState<F>>>, now: f64) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    let (frame, mut callback) = {
        let mut s = state.borrow_mut();
        s.pending = None;
        if !s.running {
            return;
        }
        (s.admit(now), s.callback.take())
    };

    if let (Some(frame), Some(callback)) = (frame, callback.as_mut()) {
        callback(frame);
    }

    let running = {
        let mut s = state.borrow_mut();
        if s.running && s.callback.is_none() {
            s.callback = callback.take();
        }
        s.running
    };
    drop(callback);

    if running {
        if let Err(err) = request_next(&state) {
            log::warn!("frame clock stopped: {err}");
            halt(&state);
        }
    }
}

fn halt<F: FrameSource>(state: &Rc<RefCell<ClockState<F>>>) {
    let (source, pending, callback) = {
        let mut s = state.borrow_mut();
        if !s.running {
            return;
        }
        s.running = false;
        (s.source.clone(), s.pending.take(), s.callback.take())
    };
    if let Some(handle) = pending {
        source.cancel_frame(handle);
    }
    drop(callback);
    log::debug!("frame clock stopped");
}
