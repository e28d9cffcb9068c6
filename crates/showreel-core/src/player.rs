//! Video Player - composes the stream loader, playback controller, scrub
//! engine and fullscreen coordinator for one on-screen player
//!
//! The player is driven entirely by its host: user input arrives through the
//! control methods, and everything the browser reports asynchronously (media
//! events, animation frames, timeouts, fullscreen changes) arrives through
//! [`VideoPlayer::handle_event`]. Dropping the player is its teardown.

use crate::{
    config::PlayerConfig,
    fullscreen::{FullscreenCoordinator, FullscreenHost},
    playback::PlaybackController,
    registry::ActiveVideoRegistry,
    scheduler::{FrameScheduler, TimerScheduler},
    scrub::{DocumentHost, ScrubEngine},
    stream::{StreamAttachment, StreamEngine, StreamLoader},
    surface::{MediaEvent, MediaSurface},
    time::{format_time, progress_fraction},
    Error, PlaybackState, PlayerMode, PlayerSnapshot, Result, TrackBounds,
};
use std::rc::Rc;
use tracing::{debug, info, instrument, warn};

/// Host services a player runs on
pub struct PlayerEnv<S> {
    pub surface: Rc<S>,
    pub engine: Rc<dyn StreamEngine<S>>,
    pub frames: Rc<dyn FrameScheduler>,
    pub timers: Rc<dyn TimerScheduler>,
    pub document: Rc<dyn DocumentHost>,
    pub fullscreen: Rc<dyn FullscreenHost>,
}

pub struct VideoPlayer<S: MediaSurface + 'static> {
    config: PlayerConfig,
    surface: Rc<S>,
    fullscreen_host: Rc<dyn FullscreenHost>,
    loader: StreamLoader<S>,
    playback: PlaybackController,
    scrub: ScrubEngine,
    fullscreen: FullscreenCoordinator,
}

impl<S: MediaSurface + 'static> VideoPlayer<S> {
    /// Mount a slide-deck player coordinated through `registry`
    pub fn interactive(
        source: &str,
        config: PlayerConfig,
        env: PlayerEnv<S>,
        registry: ActiveVideoRegistry,
    ) -> Result<Self> {
        if config.mode != PlayerMode::Interactive {
            return Err(Error::InvalidConfig(
                "interactive player needs an interactive config".to_string(),
            ));
        }
        Self::mount(source, config, env, Some(registry))
    }

    /// Mount an ambient player; it is never registered as active
    pub fn background(source: &str, config: PlayerConfig, env: PlayerEnv<S>) -> Result<Self> {
        if config.mode != PlayerMode::Background {
            return Err(Error::InvalidConfig(
                "background player needs a background config".to_string(),
            ));
        }
        Self::mount(source, config, env, None)
    }

    #[instrument(skip(config, env, registry))]
    fn mount(
        source: &str,
        config: PlayerConfig,
        env: PlayerEnv<S>,
        registry: Option<ActiveVideoRegistry>,
    ) -> Result<Self> {
        config.validate()?;

        let mut player = Self {
            playback: PlaybackController::new(source, registry, Rc::clone(&env.frames)),
            scrub: ScrubEngine::new(env.document, env.frames, env.timers, config.settle_delay()),
            loader: StreamLoader::new(env.engine, config.force_highest_quality),
            fullscreen: FullscreenCoordinator::new(),
            fullscreen_host: env.fullscreen,
            surface: env.surface,
            config,
        };

        player.surface.set_muted(player.config.muted);
        player.attach_stream();
        info!(mode = %player.config.mode, "Player mounted");
        Ok(player)
    }

    /// Load failures leave the media silently unplayable
    fn attach_stream(&mut self) {
        let source = self.playback.source().to_string();
        if let Err(e) = self.loader.attach(&source, &self.surface) {
            warn!(source = %source, error = %e, code = e.error_code(), "Stream not attached");
        }
    }

    fn ensure_interactive(&self) -> Result<()> {
        match self.config.mode {
            PlayerMode::Interactive => Ok(()),
            PlayerMode::Background => Err(Error::NotInteractive),
        }
    }

    /// Dispatch a host notification
    pub fn handle_event(&mut self, event: MediaEvent) {
        self.sync_active();

        match event {
            MediaEvent::ManifestParsed => {
                self.loader.on_manifest_parsed();
                if self.loader.attachment() == StreamAttachment::Engine {
                    self.autoplay();
                }
            }
            MediaEvent::LoadedMetadata { duration } => {
                self.playback.on_loaded_metadata(duration);
                if self.loader.attachment() == StreamAttachment::Native {
                    self.autoplay();
                }
            }
            MediaEvent::TimeUpdate => {
                self.playback.on_time_update(self.scrub.is_dragging());
            }
            MediaEvent::Ended => {
                self.playback.on_ended(&*self.surface);
            }
            MediaEvent::PlayRejected { reason } => {
                self.playback.on_play_rejected(&reason);
            }
            MediaEvent::FullscreenChange { active } => {
                self.fullscreen.on_change(active);
            }
            MediaEvent::AnimationFrame(handle) => {
                if !self.scrub.on_frame(handle, &*self.surface) {
                    let dragging = self.scrub.is_dragging();
                    self.playback.on_frame(handle, &*self.surface, dragging);
                }
            }
            MediaEvent::Timeout(handle) => {
                self.scrub.on_timeout(handle, &self.playback, &*self.surface);
            }
        }
    }

    fn autoplay(&mut self) {
        if !self.config.autoplay || self.playback.is_playing() {
            return;
        }
        debug!(source = %self.playback.source(), "Autoplay requested");
        if let Err(e) = self.playback.play(&*self.surface) {
            warn!(error = %e, "Autoplay skipped");
        }
    }

    /// Pause this player if another one took the registry entry.
    /// Returns true if it paused.
    pub fn sync_active(&mut self) -> bool {
        self.playback.sync_active(&*self.surface)
    }

    /// Play/pause control and click on the video
    #[instrument(skip(self), fields(source = %self.playback.source()))]
    pub fn toggle_play(&mut self) -> Result<()> {
        self.ensure_interactive()?;
        self.sync_active();
        if self.playback.is_playing() {
            self.playback.pause(&*self.surface)
        } else {
            self.start_playback()
        }
    }

    /// First-activation control: start playback, become active and go
    /// fullscreen in one action
    #[instrument(skip(self), fields(source = %self.playback.source()))]
    pub fn activate(&mut self) -> Result<()> {
        self.ensure_interactive()?;
        self.sync_active();
        self.playback.mark_activated();
        self.start_playback()?;
        self.fullscreen.request(&*self.fullscreen_host);
        Ok(())
    }

    /// A drag keeps the surface paused until release
    fn start_playback(&mut self) -> Result<()> {
        if self.scrub.is_dragging() {
            self.playback.mark_playing()?;
            self.scrub.resume_on_release();
            return Ok(());
        }
        self.playback.play(&*self.surface)
    }

    pub fn toggle_fullscreen(&mut self) -> Result<()> {
        self.ensure_interactive()?;
        self.fullscreen.toggle(&*self.fullscreen_host);
        Ok(())
    }

    pub fn track_hover(&mut self, pointer_x: f64, bounds: TrackBounds) -> Result<()> {
        self.ensure_interactive()?;
        self.scrub.hover(pointer_x, bounds, &self.playback);
        Ok(())
    }

    pub fn track_leave(&mut self) -> Result<()> {
        self.ensure_interactive()?;
        self.scrub.leave();
        Ok(())
    }

    pub fn track_click(&mut self, pointer_x: f64, bounds: TrackBounds) -> Result<()> {
        self.ensure_interactive()?;
        self.sync_active();
        self.scrub
            .click(pointer_x, bounds, &mut self.playback, &*self.surface);
        Ok(())
    }

    /// Pointer down on the scrub handle. Returns whether a drag started.
    pub fn begin_drag(&mut self) -> Result<bool> {
        self.ensure_interactive()?;
        self.sync_active();
        Ok(self.scrub.begin_drag(&self.playback, &*self.surface))
    }

    /// Document-level pointer move
    pub fn drag_move(&mut self, pointer_x: f64, bounds: TrackBounds) -> Result<()> {
        self.ensure_interactive()?;
        self.scrub.drag_move(pointer_x, bounds, &mut self.playback);
        Ok(())
    }

    /// Document-level pointer up
    pub fn end_drag(&mut self) -> Result<()> {
        self.ensure_interactive()?;
        self.sync_active();
        self.scrub.end_drag(&self.playback);
        Ok(())
    }

    /// Swap the manifest URL: the old session is destroyed before the new
    /// one is created
    #[instrument(skip(self), fields(from = %self.playback.source()))]
    pub fn set_source(&mut self, source: &str) {
        if source == self.playback.source() {
            return;
        }
        self.scrub.cancel();
        self.playback.reset_source(source, &*self.surface);
        self.attach_stream();
    }

    /// Explicit teardown; equivalent to dropping the player
    pub fn unmount(self) {
        info!(source = %self.playback.source(), "Player unmounted");
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let duration = self.playback.duration();
        let current_time = self.playback.current_time();
        PlayerSnapshot {
            source: self.playback.source().to_string(),
            mode: self.config.mode,
            state: self.playback.state(),
            is_playing: self.playback.is_playing(),
            current_time,
            duration,
            progress: progress_fraction(current_time, duration),
            is_fullscreen: self.fullscreen.is_fullscreen(),
            is_dragging: self.scrub.is_dragging(),
            was_playing_before_drag: self.scrub.was_playing_before_drag(),
            tooltip_time: self.scrub.tooltip_time(),
            tooltip_fraction: self.scrub.tooltip_fraction(),
            tooltip_visible: self.scrub.tooltip_visible(duration),
            handle_visible: duration.is_some_and(|d| d > 0.0),
            has_ever_been_activated: self.playback.has_ever_been_activated(),
            current_label: format_time(current_time),
            duration_label: format_time(duration.unwrap_or(0.0)),
            tooltip_label: format_time(self.scrub.tooltip_time()),
        }
    }

    pub fn surface(&self) -> &Rc<S> {
        &self.surface
    }

    pub fn source(&self) -> &str {
        self.playback.source()
    }

    pub fn mode(&self) -> PlayerMode {
        self.config.mode
    }

    pub fn state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn is_dragging(&self) -> bool {
        self.scrub.is_dragging()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_fullscreen()
    }

    pub fn current_time(&self) -> f64 {
        self.playback.current_time()
    }

    pub fn duration(&self) -> Option<f64> {
        self.playback.duration()
    }

    pub fn has_pending_seek(&self) -> bool {
        self.scrub.has_pending_seek()
    }

    pub fn loader(&self) -> &StreamLoader<S> {
        &self.loader
    }
}

impl<S: MediaSurface + 'static> Drop for VideoPlayer<S> {
    fn drop(&mut self) {
        self.scrub.cancel();
        self.playback.release();
        self.loader.detach();
        debug!(source = %self.playback.source(), "Player resources released");
    }
}
