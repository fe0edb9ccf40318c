use std::time::Duration;

use super::{AnimationError, Scheduler, StepTimer, Stepper, TimerPhase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypewriterState {
    chars: Vec<char>,
    revealed: usize,
}

impl TypewriterState {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            revealed: 0,
        }
    }

    pub fn visible(&self) -> String {
        self.chars[..self.revealed].iter().collect()
    }
}

impl Stepper for TypewriterState {
    type Tick = String;

    fn advance(&mut self) -> Option<String> {
        if self.is_finished() {
            return None;
        }
        self.revealed += 1;
        Some(self.visible())
    }

    fn is_finished(&self) -> bool {
        self.revealed >= self.chars.len()
    }
}

/// Reveals a line of text one character every `speed_ms`.
pub struct Typewriter<S: Scheduler> {
    timer: StepTimer<TypewriterState, S>,
}

impl<S: Scheduler> Typewriter<S> {
    pub const DEFAULT_SPEED_MS: u64 = 100;

    pub fn new(text: &str, speed_ms: u64, scheduler: S) -> Result<Self, AnimationError> {
        let timer = StepTimer::new(
            TypewriterState::new(text),
            Duration::from_millis(speed_ms),
            scheduler,
        )?;
        Ok(Self { timer })
    }

    pub fn on_update(self, callback: impl FnMut(&String) + 'static) -> Self {
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

    pub fn visible(&self) -> String {
        self.timer.with_machine(TypewriterState::visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Timeline;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_reveals_one_char_per_tick() {
        let timeline = Timeline::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let typewriter = Typewriter::new("Hi ✨", 80, timeline.clone())
            .unwrap()
            .on_update(move |text| s.borrow_mut().push(text.clone()));
        typewriter.start().unwrap();

        timeline.advance_to(Duration::from_millis(160));
        assert_eq!(typewriter.visible(), "Hi");
        timeline.advance_to(Duration::from_secs(5));
        assert_eq!(*seen.borrow(), vec!["H", "Hi", "Hi ", "Hi ✨"]);
        assert_eq!(typewriter.phase(), TimerPhase::Complete);
        assert_eq!(timeline.pending(), 0);
    }

    #[test]
    fn test_empty_text_completes_immediately() {
        let timeline = Timeline::new();
        let typewriter = Typewriter::new("", 100, timeline.clone()).unwrap();
        typewriter.start().unwrap();
        assert_eq!(typewriter.phase(), TimerPhase::Complete);
        assert_eq!(typewriter.visible(), "");
    }

    #[test]
    fn test_zero_speed_is_rejected() {
        assert!(Typewriter::new("text", 0, Timeline::new()).is_err());
    }
}
