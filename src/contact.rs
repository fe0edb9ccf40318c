use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

use crate::animation::{AnimationError, Scheduler};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern should compile"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Email,
    Message,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    #[error("Name is required")]
    NameRequired,
    #[error("Email is required")]
    EmailRequired,
    #[error("Email is invalid")]
    EmailInvalid,
    #[error("Message is required")]
    MessageRequired,
}

impl FieldError {
    pub fn field(&self) -> Field {
        match self {
            Self::NameRequired => Field::Name,
            Self::EmailRequired | Self::EmailInvalid => Field::Email,
            Self::MessageRequired => Field::Message,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    errors: BTreeMap<Field, FieldError>,
}

impl FormErrors {
    pub fn get(&self, field: Field) -> Option<FieldError> {
        self.errors.get(&field).copied()
    }

    pub fn clear(&mut self, field: Field) {
        self.errors.remove(&field);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    fn insert(&mut self, error: FieldError) {
        self.errors.insert(error.field(), error);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Message => &self.message,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::Message => self.message = value,
        }
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if self.name.trim().is_empty() {
            errors.insert(FieldError::NameRequired);
        }
        if self.email.trim().is_empty() {
            errors.insert(FieldError::EmailRequired);
        } else if !EMAIL_PATTERN.is_match(&self.email) {
            errors.insert(FieldError::EmailInvalid);
        }
        if self.message.trim().is_empty() {
            errors.insert(FieldError::MessageRequired);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("{} field(s) failed validation", .0.len())]
    Invalid(FormErrors),
    #[error("a message is already being sent")]
    Busy,
    #[error(transparent)]
    Scheduler(#[from] AnimationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Submitting,
    Submitted,
}

struct SubmissionState<S: Scheduler> {
    scheduler: S,
    phase: SubmissionPhase,
    sending: Duration,
    confirmation: Duration,
    pending: Option<S::Handle>,
    on_change: Option<Box<dyn FnMut(SubmissionPhase)>>,
}

/// Pretend delivery of a contact message: nothing leaves the page, the
/// phases just play out on the scheduler.
///
/// `Idle -> Submitting -> Submitted -> Idle`. Dropping it cancels any
/// pending transition.
pub struct ContactSubmission<S: Scheduler> {
    state: Rc<RefCell<SubmissionState<S>>>,
}

impl<S: Scheduler> ContactSubmission<S> {
    pub const SENDING: Duration = Duration::from_millis(2000);
    pub const CONFIRMATION: Duration = Duration::from_millis(3000);

    pub fn new(scheduler: S) -> Self {
        Self {
            state: Rc::new(RefCell::new(SubmissionState {
                scheduler,
                phase: SubmissionPhase::Idle,
                sending: Self::SENDING,
                confirmation: Self::CONFIRMATION,
                pending: None,
                on_change: None,
            })),
        }
    }

    pub fn with_timings(self, sending: Duration, confirmation: Duration) -> Self {
        {
            let mut s = self.state.borrow_mut();
            s.sending = sending;
            s.confirmation = confirmation;
        }
        self
    }

    pub fn on_change(self, callback: impl FnMut(SubmissionPhase) + 'static) -> Self {
        self.state.borrow_mut().on_change = Some(Box::new(callback));
        self
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.state.borrow().phase
    }

    /// Validates `form` and, if it passes, starts the fake send. The caller
    /// clears the form once the phase reaches `Submitted`.
    pub fn submit(&self, form: &ContactForm) -> Result<(), ContactError> {
        if self.phase() != SubmissionPhase::Idle {
            return Err(ContactError::Busy);
        }
        form.validate().map_err(ContactError::Invalid)?;

        let (scheduler, sending) = {
            let s = self.state.borrow();
            (s.scheduler.clone(), s.sending)
        };
        let weak = Rc::downgrade(&self.state);
        let handle = scheduler.set_timeout(sending, Box::new(move || sent(&weak)))?;
        self.state.borrow_mut().pending = Some(handle);
        log::debug!("contact form submitted");
        transition(&self.state, SubmissionPhase::Submitting);
        Ok(())
    }

    /// Abandons any pending transition and returns to `Idle` without
    /// notifying.
    pub fn cancel(&self) {
        let (scheduler, pending) = {
            let mut s = self.state.borrow_mut();
            s.phase = SubmissionPhase::Idle;
            (s.scheduler.clone(), s.pending.take())
        };
        if let Some(handle) = pending {
            scheduler.clear(handle);
        }
    }
}

impl<S: Scheduler> Drop for ContactSubmission<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn sent<S: Scheduler>(weak: &Weak<RefCell<SubmissionState<S>>>) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    let (scheduler, confirmation) = {
        let mut s = state.borrow_mut();
        s.pending = None;
        (s.scheduler.clone(), s.confirmation)
    };
    let weak = Rc::downgrade(&state);
    let reset = scheduler.set_timeout(
        confirmation,
        Box::new(move || {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().pending = None;
                transition(&state, SubmissionPhase::Idle);
            }
        }),
    );
    if let Ok(handle) = reset {
        state.borrow_mut().pending = Some(handle);
    }
    transition(&state, SubmissionPhase::Submitted);
    if let Err(err) = reset {
        log::warn!("contact confirmation skipped: {err}");
        transition(&state, SubmissionPhase::Idle);
    }
}

fn transition<S: Scheduler>(state: &Rc<RefCell<SubmissionState<S>>>, phase: SubmissionPhase) {
    let mut on_change = {
        let mut s = state.borrow_mut();
        s.phase = phase;
        s.on_change.take()
    };
    if let Some(callback) = on_change.as_mut() {
        callback(phase);
    }
    let mut s = state.borrow_mut();
    if s.on_change.is_none() {
        s.on_change = on_change;
    }
}
