//! Simulation host
//!
//! Deterministic, in-memory implementations of every host trait. Frames,
//! timeouts, media events and fullscreen notifications are queued instead of
//! being delivered by a browser; [`SimHost::pump`] and [`SimHost::run_for`]
//! deliver them to players in browser order. Used by the test suites and by
//! the CLI scenario replayer.

use crate::{
    fullscreen::FullscreenHost,
    player::{PlayerEnv, VideoPlayer},
    scheduler::{FrameHandle, FrameScheduler, TimerHandle, TimerScheduler},
    scrub::{DocumentHost, ListenerId},
    stream::{StreamEngine, StreamSession},
    surface::{MediaEvent, MediaSurface},
    Error, Rendition, Result,
};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

/// Upper bound on delivery rounds in one pump, against runaway feedback
const MAX_PUMP_ROUNDS: usize = 64;

const AUTOPLAY_REJECTION: &str =
    "NotAllowedError: play() failed because the user didn't interact with the document first";

struct SimState {
    next_id: u64,
    clock: Duration,
    frames: Vec<FrameHandle>,
    cancelled_frames: usize,
    timers: Vec<(TimerHandle, Duration)>,
    listeners: HashSet<ListenerId>,
    engine_supported: bool,
    native_hls: bool,
    levels: Vec<Rendition>,
    media_duration: Option<f64>,
    live_sessions: usize,
    destroyed_sessions: usize,
    selected_level: Option<usize>,
    autoplay_blocked: bool,
    fullscreen_allowed: bool,
    fullscreen_owner: Option<u64>,
    /// Surface-addressed events waiting for delivery
    events: Vec<(u64, MediaEvent)>,
}

impl SimState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared simulation state; clones refer to the same page
#[derive(Clone)]
pub struct SimHost {
    state: Rc<RefCell<SimState>>,
}

impl SimHost {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState {
                next_id: 0,
                clock: Duration::ZERO,
                frames: Vec::new(),
                cancelled_frames: 0,
                timers: Vec::new(),
                listeners: HashSet::new(),
                engine_supported: true,
                native_hls: true,
                levels: Vec::new(),
                media_duration: None,
                live_sessions: 0,
                destroyed_sessions: 0,
                selected_level: None,
                autoplay_blocked: false,
                fullscreen_allowed: true,
                fullscreen_owner: None,
                events: Vec::new(),
            })),
        }
    }

    // ---------------------------------------------------------------------
    // Host handles
    // ---------------------------------------------------------------------

    pub fn surface(&self) -> Rc<SimSurface> {
        let id = self.state.borrow_mut().next_id();
        Rc::new(SimSurface {
            id,
            state: Rc::clone(&self.state),
            paused: Cell::new(true),
            time: Cell::new(0.0),
            muted: Cell::new(false),
            src: RefCell::new(None),
            play_requests: Cell::new(0),
            seeks: RefCell::new(Vec::new()),
        })
    }

    pub fn frames(&self) -> Rc<dyn FrameScheduler> {
        Rc::new(SimFrames { state: Rc::clone(&self.state) })
    }

    pub fn timers(&self) -> Rc<dyn TimerScheduler> {
        Rc::new(SimTimers { state: Rc::clone(&self.state) })
    }

    pub fn document(&self) -> Rc<dyn DocumentHost> {
        Rc::new(SimDocument { state: Rc::clone(&self.state) })
    }

    pub fn engine(&self) -> Rc<dyn StreamEngine<SimSurface>> {
        Rc::new(SimEngine { state: Rc::clone(&self.state) })
    }

    /// Fullscreen API for the container of `surface`
    pub fn fullscreen(&self, surface: &Rc<SimSurface>) -> Rc<SimFullscreen> {
        Rc::new(SimFullscreen {
            state: Rc::clone(&self.state),
            surface_id: surface.id,
        })
    }

    /// Complete environment around a fresh surface
    pub fn env(&self) -> PlayerEnv<SimSurface> {
        let surface = self.surface();
        let fullscreen: Rc<dyn FullscreenHost> = self.fullscreen(&surface);
        PlayerEnv {
            engine: self.engine(),
            frames: self.frames(),
            timers: self.timers(),
            document: self.document(),
            fullscreen,
            surface,
        }
    }

    // ---------------------------------------------------------------------
    // Page setup
    // ---------------------------------------------------------------------

    pub fn set_engine_supported(&self, supported: bool) {
        self.state.borrow_mut().engine_supported = supported;
    }

    pub fn set_native_hls(&self, supported: bool) {
        self.state.borrow_mut().native_hls = supported;
    }

    /// Renditions every new engine session reports
    pub fn set_levels(&self, levels: Vec<Rendition>) {
        self.state.borrow_mut().levels = levels;
    }

    /// Duration reported by `loadedmetadata` after a source is attached
    pub fn set_media_duration(&self, duration: Option<f64>) {
        self.state.borrow_mut().media_duration = duration;
    }

    pub fn set_autoplay_blocked(&self, blocked: bool) {
        self.state.borrow_mut().autoplay_blocked = blocked;
    }

    pub fn set_fullscreen_allowed(&self, allowed: bool) {
        self.state.borrow_mut().fullscreen_allowed = allowed;
    }

    /// User leaves fullscreen through the browser (Esc)
    pub fn press_escape(&self) {
        let mut state = self.state.borrow_mut();
        if let Some(owner) = state.fullscreen_owner.take() {
            state.events.push((owner, MediaEvent::FullscreenChange { active: false }));
        }
    }

    /// Queue a native media event for `surface`
    pub fn emit(&self, surface: &SimSurface, event: MediaEvent) {
        self.state.borrow_mut().events.push((surface.id, event));
    }

    // ---------------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------------

    pub fn clock(&self) -> Duration {
        self.state.borrow().clock
    }

    pub fn pending_frame_count(&self) -> usize {
        self.state.borrow().frames.len()
    }

    pub fn cancelled_frame_count(&self) -> usize {
        self.state.borrow().cancelled_frames
    }

    pub fn pending_timer_count(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Document-level listener sets currently attached
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn live_session_count(&self) -> usize {
        self.state.borrow().live_sessions
    }

    pub fn destroyed_session_count(&self) -> usize {
        self.state.borrow().destroyed_sessions
    }

    pub fn selected_level(&self) -> Option<usize> {
        self.state.borrow().selected_level
    }

    // ---------------------------------------------------------------------
    // Delivery
    // ---------------------------------------------------------------------

    /// Take every requested animation frame, as the next rendering tick would
    pub fn take_frames(&self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.state.borrow_mut().frames)
    }

    /// Move the clock forward and return the timeouts that fell due
    pub fn advance(&self, elapsed: Duration) -> Vec<TimerHandle> {
        let mut state = self.state.borrow_mut();
        state.clock += elapsed;
        let now = state.clock;
        let (due, waiting): (Vec<_>, Vec<_>) = state.timers.drain(..).partition(|(_, at)| *at <= now);
        state.timers = waiting;
        due.into_iter().map(|(handle, _)| handle).collect()
    }

    fn take_events(&self, surface_id: u64) -> Vec<MediaEvent> {
        let mut state = self.state.borrow_mut();
        let (mine, rest): (Vec<_>, Vec<_>) = state.events.drain(..).partition(|(id, _)| *id == surface_id);
        state.events = rest;
        mine.into_iter().map(|(_, event)| event).collect()
    }

    /// Deliver queued media events and animation frames until the page is idle
    pub fn pump(&self, players: &mut [&mut VideoPlayer<SimSurface>]) {
        // Registry subscribers run first
        for player in players.iter_mut() {
            player.sync_active();
        }

        for _ in 0..MAX_PUMP_ROUNDS {
            let mut delivered = false;

            for player in players.iter_mut() {
                for event in self.take_events(player.surface().id) {
                    player.handle_event(event);
                    delivered = true;
                }
            }

            for frame in self.take_frames() {
                for player in players.iter_mut() {
                    player.handle_event(MediaEvent::AnimationFrame(frame));
                }
                delivered = true;
            }

            if !delivered {
                return;
            }
        }
        debug!("Pump stopped after {} rounds", MAX_PUMP_ROUNDS);
    }

    /// Advance the clock, fire due timeouts, then pump
    pub fn run_for(&self, elapsed: Duration, players: &mut [&mut VideoPlayer<SimSurface>]) {
        self.pump(players);
        for timer in self.advance(elapsed) {
            for player in players.iter_mut() {
                player.handle_event(MediaEvent::Timeout(timer));
            }
        }
        self.pump(players);
    }
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory `<video>` element
pub struct SimSurface {
    id: u64,
    state: Rc<RefCell<SimState>>,
    paused: Cell<bool>,
    time: Cell<f64>,
    muted: Cell<bool>,
    src: RefCell<Option<String>>,
    play_requests: Cell<usize>,
    seeks: RefCell<Vec<f64>>,
}

impl SimSurface {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn src(&self) -> Option<String> {
        self.src.borrow().clone()
    }

    /// Move the playhead as decoding would, without a seek
    pub fn set_playhead(&self, seconds: f64) {
        self.time.set(seconds);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.get()
    }

    pub fn play_requests(&self) -> usize {
        self.play_requests.get()
    }

    /// Every position written through `set_current_time`
    pub fn seeks(&self) -> Vec<f64> {
        self.seeks.borrow().clone()
    }

    fn queue_metadata(&self) {
        let mut state = self.state.borrow_mut();
        if let Some(duration) = state.media_duration {
            state.events.push((self.id, MediaEvent::LoadedMetadata { duration }));
        }
    }
}

impl MediaSurface for SimSurface {
    fn play(&self) {
        self.play_requests.set(self.play_requests.get() + 1);
        let mut state = self.state.borrow_mut();
        if state.autoplay_blocked {
            state.events.push((
                self.id,
                MediaEvent::PlayRejected { reason: AUTOPLAY_REJECTION.to_string() },
            ));
        } else {
            self.paused.set(false);
        }
    }

    fn pause(&self) {
        self.paused.set(true);
    }

    fn is_paused(&self) -> bool {
        self.paused.get()
    }

    fn current_time(&self) -> f64 {
        self.time.get()
    }

    fn set_current_time(&self, seconds: f64) {
        self.time.set(seconds);
        self.seeks.borrow_mut().push(seconds);
    }

    fn set_src(&self, url: &str) {
        *self.src.borrow_mut() = Some(url.to_string());
        self.queue_metadata();
    }

    fn can_play_type(&self, mime: &str) -> bool {
        self.state.borrow().native_hls && mime == "application/vnd.apple.mpegurl"
    }

    fn set_muted(&self, muted: bool) {
        self.muted.set(muted);
    }
}

struct SimFrames {
    state: Rc<RefCell<SimState>>,
}

impl FrameScheduler for SimFrames {
    fn request_frame(&self) -> FrameHandle {
        let mut state = self.state.borrow_mut();
        let handle = FrameHandle(state.next_id());
        state.frames.push(handle);
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        let mut state = self.state.borrow_mut();
        let before = state.frames.len();
        state.frames.retain(|h| *h != handle);
        if state.frames.len() < before {
            state.cancelled_frames += 1;
        }
    }
}

struct SimTimers {
    state: Rc<RefCell<SimState>>,
}

impl TimerScheduler for SimTimers {
    fn set_timeout(&self, delay: Duration) -> TimerHandle {
        let mut state = self.state.borrow_mut();
        let handle = TimerHandle(state.next_id());
        let due = state.clock + delay;
        state.timers.push((handle, due));
        handle
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        self.state.borrow_mut().timers.retain(|(h, _)| *h != handle);
    }
}

struct SimDocument {
    state: Rc<RefCell<SimState>>,
}

impl DocumentHost for SimDocument {
    fn add_drag_listeners(&self) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_id());
        state.listeners.insert(id);
        id
    }

    fn remove_drag_listeners(&self, id: ListenerId) {
        self.state.borrow_mut().listeners.remove(&id);
    }
}

/// Fullscreen API bound to one surface's container. Only one element can be
/// fullscreen at a time; the previous owner is notified when it loses it.
pub struct SimFullscreen {
    state: Rc<RefCell<SimState>>,
    surface_id: u64,
}

impl FullscreenHost for SimFullscreen {
    fn request_fullscreen(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.fullscreen_allowed {
            return Err(Error::FullscreenDenied("requestFullscreen is not allowed".to_string()));
        }
        match state.fullscreen_owner.replace(self.surface_id) {
            Some(previous) if previous == self.surface_id => {}
            previous => {
                if let Some(previous) = previous {
                    state.events.push((previous, MediaEvent::FullscreenChange { active: false }));
                }
                state.events.push((self.surface_id, MediaEvent::FullscreenChange { active: true }));
            }
        }
        Ok(())
    }

    fn exit_fullscreen(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fullscreen_owner == Some(self.surface_id) {
            state.fullscreen_owner = None;
            state.events.push((self.surface_id, MediaEvent::FullscreenChange { active: false }));
        }
        Ok(())
    }
}

struct SimEngine {
    state: Rc<RefCell<SimState>>,
}

impl StreamEngine<SimSurface> for SimEngine {
    fn is_supported(&self) -> bool {
        self.state.borrow().engine_supported
    }

    fn create_session(&self, _source: &str, surface: &SimSurface) -> Box<dyn StreamSession> {
        {
            let mut state = self.state.borrow_mut();
            state.live_sessions += 1;
            state.selected_level = None;
            state.events.push((surface.id, MediaEvent::ManifestParsed));
        }
        surface.queue_metadata();
        Box::new(SimSession {
            state: Rc::clone(&self.state),
            destroyed: false,
        })
    }
}

struct SimSession {
    state: Rc<RefCell<SimState>>,
    destroyed: bool,
}

impl StreamSession for SimSession {
    fn levels(&self) -> Vec<Rendition> {
        self.state.borrow().levels.clone()
    }

    fn set_current_level(&mut self, index: usize) {
        self.state.borrow_mut().selected_level = Some(index);
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        let mut state = self.state.borrow_mut();
        state.live_sessions -= 1;
        state.destroyed_sessions += 1;
    }
}
