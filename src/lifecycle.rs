use std::sync::atomic::{AtomicBool, Ordering};

/// Handshake progress. Advisory only: no method is gated on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
}

/// Records whether the client has sent `notifications/initialized`.
#[derive(Debug, Default)]
pub struct LifecycleTracker {
    initialized: AtomicBool,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        if self.initialized.load(Ordering::Acquire) {
            LifecycleState::Initialized
        } else {
            LifecycleState::Uninitialized
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state() == LifecycleState::Initialized
    }

    /// Move to `Initialized`. Returns true only for the call that made the
    /// transition.
    pub fn mark_initialized(&self) -> bool {
        !self.initialized.swap(true, Ordering::AcqRel)
    }
}
