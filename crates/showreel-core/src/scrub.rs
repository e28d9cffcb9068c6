//! Scrub/Seek Engine
//!
//! Hover preview, click-to-seek and handle dragging on the progress track.
//! While a drag is in progress the drag position owns `current_time`: the
//! surface is paused, native time updates are ignored, and surface seeks are
//! coalesced to one per animation frame. Document-wide pointer listeners are
//! held by a [`DragScope`] for exactly the lifetime of the drag.

use crate::{
    playback::PlaybackController,
    scheduler::{FrameHandle, FrameScheduler, PendingFrame, PendingTimeout, TimerHandle, TimerScheduler},
    surface::MediaSurface,
    TrackBounds,
};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};

/// Handle for a set of document-level pointer listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

/// Document-level pointer-move / pointer-up listeners
pub trait DocumentHost {
    fn add_drag_listeners(&self) -> ListenerId;
    fn remove_drag_listeners(&self, id: ListenerId);
}

/// Document listeners acquired for one drag, removed on drop
pub struct DragScope {
    document: Rc<dyn DocumentHost>,
    id: ListenerId,
}

impl DragScope {
    pub fn acquire(document: Rc<dyn DocumentHost>) -> Self {
        let id = document.add_drag_listeners();
        debug!(listeners = id.0, "Drag listeners attached");
        Self { document, id }
    }
}

impl Drop for DragScope {
    fn drop(&mut self) {
        debug!(listeners = self.id.0, "Drag listeners removed");
        self.document.remove_drag_listeners(self.id);
    }
}

/// Fractional pointer position along the track, clamped to [0, 1].
/// A collapsed track yields 0.
pub fn track_fraction(pointer_x: f64, bounds: TrackBounds) -> f64 {
    if !(bounds.width > 0.0) || !pointer_x.is_finite() {
        return 0.0;
    }
    ((pointer_x - bounds.left) / bounds.width).clamp(0.0, 1.0)
}

pub struct ScrubEngine {
    document: Rc<dyn DocumentHost>,
    drag: Option<DragScope>,
    hovering: bool,
    was_playing_before_drag: bool,
    tooltip_time: f64,
    tooltip_fraction: f64,
    pending_seek: PendingFrame<f64>,
    pending_resume: PendingTimeout<()>,
    settle_delay: Duration,
}

impl ScrubEngine {
    pub fn new(
        document: Rc<dyn DocumentHost>,
        frames: Rc<dyn FrameScheduler>,
        timers: Rc<dyn TimerScheduler>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            document,
            drag: None,
            hovering: false,
            was_playing_before_drag: false,
            tooltip_time: 0.0,
            tooltip_fraction: 0.0,
            pending_seek: PendingFrame::new(frames),
            pending_resume: PendingTimeout::new(timers),
            settle_delay,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    pub fn was_playing_before_drag(&self) -> bool {
        self.was_playing_before_drag
    }

    pub fn tooltip_time(&self) -> f64 {
        self.tooltip_time
    }

    pub fn tooltip_fraction(&self) -> f64 {
        self.tooltip_fraction
    }

    /// Shown while hovering or dragging, once a non-zero duration is known
    pub fn tooltip_visible(&self, duration: Option<f64>) -> bool {
        (self.hovering || self.is_dragging()) && duration.is_some_and(|d| d > 0.0)
    }

    pub fn has_pending_seek(&self) -> bool {
        self.pending_seek.is_pending()
    }

    pub fn has_pending_resume(&self) -> bool {
        self.pending_resume.is_pending()
    }

    fn set_tooltip(&mut self, fraction: f64, duration: f64) {
        self.tooltip_fraction = fraction;
        self.tooltip_time = fraction * duration;
    }

    /// Pointer moving over the track without a drag
    pub fn hover(&mut self, pointer_x: f64, bounds: TrackBounds, playback: &PlaybackController) {
        if self.is_dragging() {
            return;
        }
        self.hovering = true;
        let fraction = track_fraction(pointer_x, bounds);
        self.set_tooltip(fraction, playback.duration_or_zero());
    }

    pub fn leave(&mut self) {
        if !self.is_dragging() {
            self.hovering = false;
        }
    }

    /// Direct click on the track: seek immediately, keep playing
    pub fn click(
        &mut self,
        pointer_x: f64,
        bounds: TrackBounds,
        playback: &mut PlaybackController,
        surface: &dyn MediaSurface,
    ) {
        if self.is_dragging() {
            return;
        }
        let fraction = track_fraction(pointer_x, bounds);
        let time = playback.seek_to(fraction * playback.duration_or_zero());
        surface.set_current_time(time);
        debug!(time, "Seek by click");
    }

    /// Pointer down on the handle. Returns false when no drag started (already
    /// dragging, or the handle is hidden because the duration is unknown).
    pub fn begin_drag(&mut self, playback: &PlaybackController, surface: &dyn MediaSurface) -> bool {
        if self.is_dragging() || playback.duration_or_zero() <= 0.0 {
            return false;
        }
        self.pending_resume.cancel();
        self.was_playing_before_drag = playback.is_playing();
        if self.was_playing_before_drag {
            surface.pause();
        }
        self.drag = Some(DragScope::acquire(Rc::clone(&self.document)));
        info!(was_playing = self.was_playing_before_drag, "Drag started");
        true
    }

    /// Playback was requested mid-drag: resume on release like a drag that
    /// began while playing
    pub fn resume_on_release(&mut self) {
        if self.is_dragging() {
            self.was_playing_before_drag = true;
        }
    }

    /// Document pointer move during a drag
    pub fn drag_move(&mut self, pointer_x: f64, bounds: TrackBounds, playback: &mut PlaybackController) {
        if !self.is_dragging() {
            return;
        }
        let fraction = track_fraction(pointer_x, bounds);
        self.set_tooltip(fraction, playback.duration_or_zero());
        let time = playback.seek_to(self.tooltip_time);
        self.pending_seek.schedule(time);
    }

    /// Document pointer up. Playback resumes after the settle delay if it was
    /// playing when the drag began and nothing deactivated it since.
    pub fn end_drag(&mut self, playback: &PlaybackController) {
        if self.drag.take().is_none() {
            return;
        }
        self.hovering = false;
        let resume = self.was_playing_before_drag && playback.is_playing();
        if resume {
            self.pending_resume.schedule(self.settle_delay, ());
        }
        info!(resume, "Drag ended");
    }

    /// Apply a coalesced seek. Returns true if `handle` belonged to this engine.
    pub fn on_frame(&mut self, handle: FrameHandle, surface: &dyn MediaSurface) -> bool {
        match self.pending_seek.fire(handle) {
            Some(time) => {
                surface.set_current_time(time);
                true
            }
            None => false,
        }
    }

    /// Post-drag resume. Rejections come back as a play-rejected event.
    pub fn on_timeout(
        &mut self,
        handle: TimerHandle,
        playback: &PlaybackController,
        surface: &dyn MediaSurface,
    ) -> bool {
        if self.pending_resume.fire(handle).is_none() {
            return false;
        }
        if playback.is_playing() && !self.is_dragging() {
            surface.play();
        }
        true
    }

    /// Drop the drag, its listeners and any scheduled work
    pub fn cancel(&mut self) {
        self.drag = None;
        self.hovering = false;
        self.pending_seek.cancel();
        self.pending_resume.cancel();
    }
}
