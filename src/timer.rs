//! Cancelable periodic / one-shot triggers on top of an externally driven scheduler.
//!
//! Every periodic trigger the game arms is owned by exactly one
//! [`CancelableTimer`]. Re-arming a timer cancels the previous registration
//! first, so a component can never leak a second interval of the same kind.
//! Fired callbacks carry the [`TimerId`] they were registered under; owners
//! ignore ids that are no longer theirs.

/// Opaque handle issued by a [`Scheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u32);

/// What a registration is for. The session dispatches on this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerEvent {
    /// One-second level countdown.
    Countdown,
    /// 1.4s ghost relocation.
    GhostWander,
    /// 3.5s music-box phrase retrigger.
    MusicPhrase,
    /// 220ms whisper filter / gain sweep.
    WhisperModulation,
    /// Display refresh sample for the jumpscare animation.
    AnimationFrame,
    /// Freeze-frame hold after the jumpscare animation completes.
    JumpscareHold,
    /// Expiry of a transient HUD message.
    MessageExpiry,
}

/// A registration that came due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    pub event: TimerEvent,
}

/// Clock + callback registration capability (browser timers, or a manual clock in tests).
pub trait Scheduler {
    /// Monotonic milliseconds.
    fn now_ms(&self) -> f64;
    fn set_interval(&mut self, period_ms: u32, event: TimerEvent) -> TimerId;
    fn set_timeout(&mut self, delay_ms: u32, event: TimerEvent) -> TimerId;
    /// One-shot callback on the next display refresh; fires as [`TimerEvent::AnimationFrame`].
    fn request_frame(&mut self) -> TimerId;
    /// Cancelling an unknown or already fired id is a no-op.
    fn cancel(&mut self, id: TimerId);
}

/// Single-slot timer registration owned by a component.
#[derive(Debug, Default)]
pub struct CancelableTimer {
    id: Option<TimerId>,
}

impl CancelableTimer {
    pub const fn new() -> Self {
        Self { id: None }
    }

    pub fn interval<S: Scheduler + ?Sized>(&mut self, sched: &mut S, period_ms: u32, event: TimerEvent) {
        self.cancel(sched);
        self.id = Some(sched.set_interval(period_ms, event));
    }

    pub fn timeout<S: Scheduler + ?Sized>(&mut self, sched: &mut S, delay_ms: u32, event: TimerEvent) {
        self.cancel(sched);
        self.id = Some(sched.set_timeout(delay_ms, event));
    }

    pub fn frame<S: Scheduler + ?Sized>(&mut self, sched: &mut S) {
        self.cancel(sched);
        self.id = Some(sched.request_frame());
    }

    pub fn cancel<S: Scheduler + ?Sized>(&mut self, sched: &mut S) {
        if let Some(id) = self.id.take() {
            sched.cancel(id);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.id.is_some()
    }

    /// True if `id` is the live registration of this timer.
    pub fn owns(&self, id: TimerId) -> bool {
        self.id == Some(id)
    }

    /// For one-shot registrations: consume the slot when its callback arrives.
    /// Returns false for stale ids.
    pub fn take_fired(&mut self, id: TimerId) -> bool {
        if self.owns(id) {
            self.id = None;
            true
        } else {
            false
        }
    }
}
