//! Cancellable pacing between cycles and taps.
//!
//! The loop never calls `thread::sleep` directly; it asks a `Pacer`, so quit
//! requests are noticed mid-wait and tests can run without wall-clock delays.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::automation::state::ABORT_REQUESTED;

/// Granularity at which a sleeping `ThreadPacer` checks for abort.
const SLICE: Duration = Duration::from_millis(50);

pub trait Pacer {
    /// Waits for `duration`. Returns false if cancelled before it elapsed.
    fn pause(&mut self, duration: Duration) -> bool;

    /// True once the loop should stop.
    fn cancelled(&self) -> bool;
}

/// Sleeps on the current thread, watching an abort flag.
#[derive(Clone, Copy, Debug)]
pub struct ThreadPacer {
    abort: &'static AtomicBool,
}

impl ThreadPacer {
    /// Pacer bound to the global abort flag.
    pub fn new() -> Self {
        Self::with_flag(&ABORT_REQUESTED)
    }

    pub fn with_flag(abort: &'static AtomicBool) -> Self {
        Self { abort }
    }
}

impl Default for ThreadPacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Pacer for ThreadPacer {
    fn pause(&mut self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(SLICE.min(deadline - now));
        }
    }

    fn cancelled(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }
}

/// Records requested pauses instead of sleeping.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pub pauses: Vec<Duration>,
    /// Cancel once this many pauses have completed
    pub cancel_after: Option<usize>,
}

#[cfg(test)]
impl Pacer for RecordingPacer {
    fn pause(&mut self, duration: Duration) -> bool {
        if self.cancelled() {
            return false;
        }
        self.pauses.push(duration);
        true
    }

    fn cancelled(&self) -> bool {
        self.cancel_after
            .is_some_and(|limit| self.pauses.len() >= limit)
    }
}
