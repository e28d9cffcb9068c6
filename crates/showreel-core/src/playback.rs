//! Playback Controller
//!
//! Owns play/pause state, position and duration for one player and keeps the
//! active-video registry consistent with it: a playing interactive player is
//! always the registry's active entry.

use crate::{
    registry::ActiveVideoRegistry,
    scheduler::{FrameHandle, FrameScheduler, PendingFrame},
    surface::MediaSurface,
    Error, PlaybackState, Result,
};
use std::rc::Rc;
use tracing::{debug, info, warn};

pub struct PlaybackController {
    source: String,
    state: PlaybackState,
    current_time: f64,
    duration: Option<f64>,
    has_ever_been_activated: bool,
    /// `None` for background players, which never register
    registry: Option<ActiveVideoRegistry>,
    /// Coalesces time-update reads to one per frame
    time_read: PendingFrame<()>,
}

impl PlaybackController {
    pub fn new(
        source: impl Into<String>,
        registry: Option<ActiveVideoRegistry>,
        frames: Rc<dyn FrameScheduler>,
    ) -> Self {
        Self {
            source: source.into(),
            state: PlaybackState::Unstarted,
            current_time: 0.0,
            duration: None,
            has_ever_been_activated: false,
            registry,
            time_read: PendingFrame::new(frames),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// `None` until metadata has loaded
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Duration for scaling track positions; 0 while unknown
    pub fn duration_or_zero(&self) -> f64 {
        self.duration.unwrap_or(0.0)
    }

    pub fn has_ever_been_activated(&self) -> bool {
        self.has_ever_been_activated
    }

    pub fn mark_activated(&mut self) {
        self.has_ever_been_activated = true;
    }

    /// Whether this player currently holds the registry entry
    pub fn holds_registry(&self) -> bool {
        self.registry
            .as_ref()
            .is_some_and(|r| r.is_active(&self.source))
    }

    fn set_state(&mut self, new_state: PlaybackState) -> Result<()> {
        let current = self.state;
        if current == new_state {
            return Ok(());
        }
        if !current.can_transition_to(new_state) {
            return Err(Error::InvalidStateTransition {
                from: current.to_string(),
                to: new_state.to_string(),
            });
        }
        self.state = new_state;
        info!(source = %self.source, from = %current, to = %new_state, "State transition");
        Ok(())
    }

    /// Play if paused, pause if playing
    pub fn toggle_play(&mut self, surface: &dyn MediaSurface) -> Result<()> {
        if self.is_playing() {
            self.pause(surface)
        } else {
            self.play(surface)
        }
    }

    /// Become the active video and start playback
    pub fn play(&mut self, surface: &dyn MediaSurface) -> Result<()> {
        self.mark_playing()?;
        surface.play();
        Ok(())
    }

    /// Become the active video without touching the surface. Used while a
    /// drag holds the surface paused; the drag release starts it.
    pub fn mark_playing(&mut self) -> Result<()> {
        if self.state == PlaybackState::Ended {
            self.set_state(PlaybackState::Paused)?;
        }
        if let Some(registry) = &self.registry {
            registry.set_active(Some(&self.source));
        }
        self.set_state(PlaybackState::Playing)
    }

    /// Explicit pause: also gives up the registry entry
    pub fn pause(&mut self, surface: &dyn MediaSurface) -> Result<()> {
        if !self.is_playing() {
            return Ok(());
        }
        surface.pause();
        self.set_state(PlaybackState::Paused)?;
        if let Some(registry) = &self.registry {
            registry.clear(&self.source);
        }
        Ok(())
    }

    /// Enforce the registry: a playing player whose source is no longer the
    /// active entry pauses itself. Returns true if it paused.
    pub fn sync_active(&mut self, surface: &dyn MediaSurface) -> bool {
        let Some(registry) = &self.registry else {
            return false;
        };
        if !self.is_playing() || registry.is_active(&self.source) {
            return false;
        }
        info!(source = %self.source, active = ?registry.active(), "Deactivated by another player");
        surface.pause();
        self.state = PlaybackState::Paused;
        true
    }

    pub fn on_loaded_metadata(&mut self, duration: f64) {
        self.duration = (duration.is_finite() && duration >= 0.0).then_some(duration);
        self.current_time = self.clamp_time(self.current_time);
        debug!(source = %self.source, duration = ?self.duration, "Metadata loaded");
    }

    /// Native time update. The surface position is read on the next frame,
    /// and not at all while a drag owns the position.
    pub fn on_time_update(&mut self, dragging: bool) {
        if !dragging {
            self.time_read.schedule_or_update(());
        }
    }

    /// Returns true if `handle` was this controller's pending time read
    pub fn on_frame(&mut self, handle: FrameHandle, surface: &dyn MediaSurface, dragging: bool) -> bool {
        if self.time_read.fire(handle).is_none() {
            return false;
        }
        if !dragging {
            self.current_time = self.clamp_time(surface.current_time());
        }
        true
    }

    pub fn on_ended(&mut self, surface: &dyn MediaSurface) {
        if self.is_playing() {
            // Playing -> Ended is always valid
            self.state = PlaybackState::Ended;
            info!(source = %self.source, "Playback ended");
        }
        self.time_read.cancel();
        self.current_time = 0.0;
        surface.set_current_time(0.0);
        if let Some(registry) = &self.registry {
            registry.clear(&self.source);
        }
    }

    /// Play request refused by the browser; never surfaced as an error
    pub fn on_play_rejected(&mut self, reason: &str) {
        warn!(source = %self.source, reason, "Play blocked by browser");
        if !self.is_playing() {
            return;
        }
        self.state = PlaybackState::Paused;
        if let Some(registry) = &self.registry {
            registry.clear(&self.source);
        }
    }

    /// Set the position from a seek, clamped to the known duration
    pub fn seek_to(&mut self, seconds: f64) -> f64 {
        self.current_time = self.clamp_time(seconds);
        self.current_time
    }

    /// Forget everything tied to the previous source
    pub fn reset_source(&mut self, source: impl Into<String>, surface: &dyn MediaSurface) {
        if self.is_playing() {
            surface.pause();
            self.state = PlaybackState::Paused;
        }
        if let Some(registry) = &self.registry {
            registry.clear(&self.source);
        }
        self.time_read.cancel();
        self.source = source.into();
        self.current_time = 0.0;
        self.duration = None;
    }

    /// Release the registry entry on teardown
    pub fn release(&mut self) {
        self.time_read.cancel();
        if let Some(registry) = &self.registry {
            registry.clear(&self.source);
        }
    }

    fn clamp_time(&self, seconds: f64) -> f64 {
        match self.duration {
            Some(duration) if seconds.is_finite() => seconds.clamp(0.0, duration),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimHost;

    const SRC: &str = "/video/rul.m3u8";

    fn controller(host: &SimHost, registry: &ActiveVideoRegistry) -> PlaybackController {
        PlaybackController::new(SRC, Some(registry.clone()), host.frames())
    }

    #[test]
    fn test_toggle_registers_and_releases() {
        let host = SimHost::new();
        let registry = ActiveVideoRegistry::new();
        let surface = host.surface();
        let mut playback = controller(&host, &registry);

        playback.toggle_play(&*surface).unwrap();
        assert_eq!(playback.state(), PlaybackState::Playing);
        assert!(registry.is_active(SRC));
        assert!(!surface.is_paused());

        playback.toggle_play(&*surface).unwrap();
        assert_eq!(playback.state(), PlaybackState::Paused);
        assert_eq!(registry.active(), None);
        assert!(surface.is_paused());
    }

    #[test]
    fn test_time_before_metadata_is_zero() {
        let host = SimHost::new();
        let registry = ActiveVideoRegistry::new();
        let mut playback = controller(&host, &registry);

        assert_eq!(playback.seek_to(42.0), 0.0);
        playback.on_loaded_metadata(120.0);
        assert_eq!(playback.seek_to(42.0), 42.0);
        assert_eq!(playback.seek_to(500.0), 120.0);
        assert_eq!(playback.seek_to(-1.0), 0.0);
    }

    #[test]
    fn test_infinite_duration_stays_unknown() {
        let host = SimHost::new();
        let mut playback = PlaybackController::new(SRC, None, host.frames());
        playback.on_loaded_metadata(f64::INFINITY);
        assert_eq!(playback.duration(), None);
    }

    #[test]
    fn test_time_updates_coalesce_to_one_frame() {
        let host = SimHost::new();
        let registry = ActiveVideoRegistry::new();
        let surface = host.surface();
        let mut playback = controller(&host, &registry);
        playback.on_loaded_metadata(120.0);

        surface.set_playhead(3.0);
        playback.on_time_update(false);
        playback.on_time_update(false);
        playback.on_time_update(false);
        let frames = host.take_frames();
        assert_eq!(frames.len(), 1);

        assert!(playback.on_frame(frames[0], &*surface, false));
        assert_eq!(playback.current_time(), 3.0);
    }

    #[test]
    fn test_frame_read_skipped_while_dragging() {
        let host = SimHost::new();
        let registry = ActiveVideoRegistry::new();
        let surface = host.surface();
        let mut playback = controller(&host, &registry);
        playback.on_loaded_metadata(120.0);
        playback.seek_to(60.0);

        playback.on_time_update(false);
        surface.set_playhead(5.0);
        let frames = host.take_frames();
        assert!(playback.on_frame(frames[0], &*surface, true));
        assert_eq!(playback.current_time(), 60.0);
    }

    #[test]
    fn test_ended_resets_and_clears_registry() {
        let host = SimHost::new();
        let registry = ActiveVideoRegistry::new();
        let surface = host.surface();
        let mut playback = controller(&host, &registry);
        playback.on_loaded_metadata(120.0);
        playback.play(&*surface).unwrap();
        playback.seek_to(119.5);

        playback.on_ended(&*surface);
        assert_eq!(playback.state(), PlaybackState::Ended);
        assert_eq!(playback.current_time(), 0.0);
        assert_eq!(surface.current_time(), 0.0);
        assert_eq!(registry.active(), None);

        // Replays from the start
        playback.toggle_play(&*surface).unwrap();
        assert_eq!(playback.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_external_deactivation() {
        let host = SimHost::new();
        let registry = ActiveVideoRegistry::new();
        let surface = host.surface();
        let mut playback = controller(&host, &registry);
        playback.play(&*surface).unwrap();

        registry.set_active(Some("/video/other.m3u8"));
        assert!(playback.sync_active(&*surface));
        assert_eq!(playback.state(), PlaybackState::Paused);
        assert!(surface.is_paused());
        assert_eq!(registry.active().as_deref(), Some("/video/other.m3u8"));
    }

    #[test]
    fn test_play_rejection_reverts_to_paused() {
        let host = SimHost::new();
        let registry = ActiveVideoRegistry::new();
        let surface = host.surface();
        let mut playback = controller(&host, &registry);
        playback.play(&*surface).unwrap();

        playback.on_play_rejected("NotAllowedError");
        assert_eq!(playback.state(), PlaybackState::Paused);
        assert_eq!(registry.active(), None);
    }
}
