//! Rate-limit backoff delays
//!
//! The controller owns one cooldown window. Until a credential is forced out
//! of rotation for exhausting its usage budget, cooldowns and wait polls last
//! half the window. After the first forced disablement they last the full
//! window for the rest of the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Computes the cooldown and polling delay shared by the token pool
#[derive(Debug)]
pub struct BackoffController {
    window: Duration,
    escalated: AtomicBool,
}

impl BackoffController {
    /// Creates a controller for the given cooldown window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            escalated: AtomicBool::new(false),
        }
    }

    /// The full cooldown window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Delay used for the next cooldown or wait poll
    pub fn current_delay(&self) -> Duration {
        if self.is_escalated() {
            self.window
        } else {
            self.window / 2
        }
    }

    /// Widens the delay to the full window
    ///
    /// Returns true if this call performed the escalation.
    pub fn escalate(&self) -> bool {
        let first = !self.escalated.swap(true, Ordering::AcqRel);
        if first {
            tracing::warn!(
                "Token usage ceiling reached, widening cooldown to {:?}",
                self.window
            );
        }
        first
    }

    pub fn is_escalated(&self) -> bool {
        self.escalated.load(Ordering::Acquire)
    }
}
