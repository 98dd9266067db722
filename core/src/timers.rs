//! Virtual-clock timers.
//!
//! Every delayed action of the widget is a timer on a [`Timeline`]. Time only
//! moves when the owner calls [`Timeline::pop_due`], so behaviour under
//! delays is deterministic in tests and the host decides how real time maps
//! onto it.

use std::time::Duration;

use crate::host::SessionId;

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Start playback after open or switch
    Autoplay,
    /// Read progress from a backend that has no time events
    ProgressPoll,
    /// Collapse the action buttons while playing
    AutoHideActions,
    /// Hide the subtitle again after it was revealed
    SubtitleReveal,
}

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Timer {
    handle: TimerHandle,
    kind: TimerKind,
    session: SessionId,
    due: Duration,
    repeat: Option<Duration>,
}

/// A fired timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub handle: TimerHandle,
    pub kind: TimerKind,
    pub session: SessionId,
}

#[derive(Debug, Default)]
pub struct Timeline {
    now: Duration,
    next_handle: u64,
    timers: Vec<Timer>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, kind: TimerKind, session: SessionId, delay: Duration) -> TimerHandle {
        self.insert(kind, session, delay, None)
    }

    /// Fire every `interval` until cancelled. A zero interval is treated as one
    /// millisecond so a single advance always terminates.
    pub fn schedule_repeating(&mut self, kind: TimerKind, session: SessionId, interval: Duration) -> TimerHandle {
        let interval = interval.max(Duration::from_millis(1));
        self.insert(kind, session, interval, Some(interval))
    }

    fn insert(&mut self, kind: TimerKind, session: SessionId, delay: Duration, repeat: Option<Duration>) -> TimerHandle {
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        self.timers.push(Timer {
            handle,
            kind,
            session,
            due: self.now + delay,
            repeat,
        });
        handle
    }

    /// Returns true when the timer was still pending
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        self.timers.len() != before
    }

    /// Cancel every timer of `kind`, whatever its session
    pub fn cancel_kind(&mut self, kind: TimerKind) {
        self.timers.retain(|t| t.kind != kind);
    }

    /// Cancel every timer belonging to `session`
    pub fn cancel_session(&mut self, session: SessionId) {
        self.timers.retain(|t| t.session != session);
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.timers.iter().any(|t| t.kind == kind)
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to its
    /// due time. Ties fire in scheduling order. Once nothing is due the clock
    /// moves to `until` and `None` is returned.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(_, t)| (t.due, t.handle))
            .map(|(i, _)| i);

        let Some(index) = index else {
            self.now = self.now.max(until);
            return None;
        };

        let timer = &mut self.timers[index];
        self.now = self.now.max(timer.due);
        let fired = Fired {
            handle: timer.handle,
            kind: timer.kind,
            session: timer.session,
        };

        match timer.repeat {
            Some(interval) => timer.due += interval,
            None => {
                self.timers.swap_remove(index);
            }
        }
        Some(fired)
    }
}
