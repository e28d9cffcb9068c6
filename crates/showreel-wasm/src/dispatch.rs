//! Routes browser callbacks into a player
//!
//! Browser callbacks can fire while the player is already borrowed by a JS
//! control call (a synchronously rejected `play()`, for example). Inputs are
//! queued and applied as soon as the player is free; the control call drains
//! the queue on its way out.

use crate::surface::WebSurface;
use showreel_core::{MediaEvent, TrackBounds, VideoPlayer};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use tokio::sync::Notify;
use tracing::{debug, warn};
use wasm_bindgen::JsValue;
use web_sys::Element;

pub type SharedPlayer = Rc<RefCell<VideoPlayer<WebSurface>>>;

/// Something the browser reported for one player
#[derive(Debug)]
pub enum Input {
    Media(MediaEvent),
    /// Document pointer move during a drag, in client coordinates
    DragMove(f64),
    DragEnd,
    /// The active-video registry changed
    RegistryChanged,
}

enum Target {
    /// Still mounting; inputs wait
    Pending,
    Attached(Weak<RefCell<VideoPlayer<WebSurface>>>),
    /// Unmounted; inputs are dropped
    Closed,
}

pub struct Dispatcher {
    target: RefCell<Target>,
    queue: RefCell<VecDeque<Input>>,
    track: Option<Element>,
    on_render: RefCell<Option<js_sys::Function>>,
    closed: Rc<Notify>,
}

impl Dispatcher {
    pub fn new(track: Option<Element>) -> Self {
        Self {
            target: RefCell::new(Target::Pending),
            queue: RefCell::new(VecDeque::new()),
            track,
            on_render: RefCell::new(None),
            closed: Rc::new(Notify::new()),
        }
    }

    pub fn attach(&self, player: &SharedPlayer) {
        *self.target.borrow_mut() = Target::Attached(Rc::downgrade(player));
    }

    pub fn is_live(&self) -> bool {
        match &*self.target.borrow() {
            Target::Pending => true,
            Target::Attached(weak) => weak.strong_count() > 0,
            Target::Closed => false,
        }
    }

    /// Stop routing inputs and wake tasks waiting on [`closed_signal`](Self::closed_signal)
    pub fn close(&self) {
        if matches!(*self.target.borrow(), Target::Closed) {
            return;
        }
        *self.target.borrow_mut() = Target::Closed;
        self.queue.borrow_mut().clear();
        self.set_on_render(None);
        self.closed.notify_one();
    }

    /// Notified once by [`close`](Self::close)
    pub fn closed_signal(&self) -> Rc<Notify> {
        Rc::clone(&self.closed)
    }

    pub fn set_on_render(&self, callback: Option<js_sys::Function>) {
        *self.on_render.borrow_mut() = callback;
    }

    /// Current extent of the progress track
    pub fn track_bounds(&self) -> TrackBounds {
        match &self.track {
            Some(track) => {
                let rect = track.get_bounding_client_rect();
                TrackBounds::new(rect.left(), rect.width())
            }
            None => TrackBounds::default(),
        }
    }

    /// Queue an input and apply it if the player is free
    pub fn send(&self, input: Input) {
        self.queue.borrow_mut().push_back(input);
        self.flush();
    }

    /// Apply queued inputs, then render
    pub fn flush(&self) {
        let player = match &*self.target.borrow() {
            Target::Pending => return,
            Target::Attached(weak) => weak.upgrade(),
            Target::Closed => None,
        };
        let Some(player) = player else {
            self.queue.borrow_mut().clear();
            return;
        };

        loop {
            let Ok(mut guard) = player.try_borrow_mut() else {
                debug!("Player busy, inputs deferred");
                return;
            };
            let next = self.queue.borrow_mut().pop_front();
            let Some(input) = next else { break };
            self.apply(&mut *guard, input);
        }

        self.render(&player);
    }

    fn apply(&self, player: &mut VideoPlayer<WebSurface>, input: Input) {
        let result = match input {
            Input::Media(event) => {
                player.handle_event(event);
                Ok(())
            }
            Input::DragMove(x) => player.drag_move(x, self.track_bounds()),
            Input::DragEnd => player.end_drag(),
            Input::RegistryChanged => {
                player.sync_active();
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!(error = %e, "Input dropped");
        }
    }

    fn render(&self, player: &SharedPlayer) {
        let Some(callback) = self.on_render.borrow().clone() else {
            return;
        };
        let snapshot = match player.try_borrow() {
            Ok(player) => player.snapshot(),
            Err(_) => return,
        };
        match serde_wasm_bindgen::to_value(&snapshot) {
            Ok(value) => {
                if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                    warn!(error = ?e, "Render callback threw");
                }
            }
            Err(e) => warn!(error = %e, "Snapshot not serializable"),
        }
    }
}
