//! Frame and timer scheduling
//!
//! Hosts hand out opaque handles for animation-frame and timeout callbacks and
//! later report them back as [`MediaEvent`](crate::MediaEvent)s. The pending
//! slots here hold at most one outstanding callback each and cancel it when
//! replaced or dropped.

use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

/// Handle for a requested animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameHandle(pub u64);

/// Handle for a scheduled timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(pub u64);

/// Next-rendering-tick callbacks (`requestAnimationFrame`)
pub trait FrameScheduler {
    fn request_frame(&self) -> FrameHandle;
    fn cancel_frame(&self, handle: FrameHandle);
}

/// Delayed callbacks (`setTimeout`)
pub trait TimerScheduler {
    fn set_timeout(&self, delay: Duration) -> TimerHandle;
    fn clear_timeout(&self, handle: TimerHandle);
}

/// A single frame-scheduled value. Scheduling again cancels the previous frame.
pub struct PendingFrame<T> {
    scheduler: Rc<dyn FrameScheduler>,
    pending: Option<(FrameHandle, T)>,
}

impl<T> PendingFrame<T> {
    pub fn new(scheduler: Rc<dyn FrameScheduler>) -> Self {
        Self {
            scheduler,
            pending: None,
        }
    }

    pub fn schedule(&mut self, value: T) {
        self.cancel();
        let handle = self.scheduler.request_frame();
        self.pending = Some((handle, value));
    }

    /// Keep the outstanding frame if there is one, only replacing the value
    pub fn schedule_or_update(&mut self, value: T) {
        match self.pending.as_mut() {
            Some((_, pending)) => *pending = value,
            None => self.schedule(value),
        }
    }

    /// Claim the value if `handle` is the outstanding frame
    pub fn fire(&mut self, handle: FrameHandle) -> Option<T> {
        match self.pending.take() {
            Some((h, value)) if h == handle => Some(value),
            other => {
                self.pending = other;
                None
            }
        }
    }

    pub fn cancel(&mut self) {
        if let Some((handle, _)) = self.pending.take() {
            debug!(frame = handle.0, "Cancelling pending frame");
            self.scheduler.cancel_frame(handle);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<T> Drop for PendingFrame<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A single delayed value. Scheduling again clears the previous timeout.
pub struct PendingTimeout<T> {
    scheduler: Rc<dyn TimerScheduler>,
    pending: Option<(TimerHandle, T)>,
}

impl<T> PendingTimeout<T> {
    pub fn new(scheduler: Rc<dyn TimerScheduler>) -> Self {
        Self {
            scheduler,
            pending: None,
        }
    }

    pub fn schedule(&mut self, delay: Duration, value: T) {
        self.cancel();
        let handle = self.scheduler.set_timeout(delay);
        self.pending = Some((handle, value));
    }

    pub fn fire(&mut self, handle: TimerHandle) -> Option<T> {
        match self.pending.take() {
            Some((h, value)) if h == handle => Some(value),
            other => {
                self.pending = other;
                None
            }
        }
    }

    pub fn cancel(&mut self) {
        if let Some((handle, _)) = self.pending.take() {
            debug!(timer = handle.0, "Clearing pending timeout");
            self.scheduler.clear_timeout(handle);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<T> Drop for PendingTimeout<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
