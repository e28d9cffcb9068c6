//! Browser implementations of the scheduling, document and fullscreen hosts

use crate::dispatch::{Dispatcher, Input};
use showreel_core::{
    DocumentHost, Error, FrameHandle, FrameScheduler, FullscreenHost, ListenerId, MediaEvent,
    Result, TimerHandle, TimerScheduler,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, EventTarget, MouseEvent, Node, Window};

/// An event listener that is removed when dropped
pub struct EventBinding {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
    attached: Cell<bool>,
}

impl EventBinding {
    pub fn new(target: &EventTarget, event: &'static str, handler: impl FnMut(Event) + 'static) -> Self {
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        let attached = target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .is_ok();
        if !attached {
            warn!(event, "Listener not attached");
        }
        Self {
            target: target.clone(),
            event,
            callback,
            attached: Cell::new(attached),
        }
    }

    /// Stop receiving events; the closure itself stays alive
    pub fn detach(&self) {
        if self.attached.replace(false) {
            let _ = self
                .target
                .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
        }
    }
}

impl Drop for EventBinding {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Callbacks keyed by handle id. A callback marks itself fired after it ran;
/// fired callbacks are freed on the next schedule, never while running.
struct CallbackSlots {
    next_id: Cell<u64>,
    live: RefCell<HashMap<u64, (i32, Closure<dyn FnMut()>)>>,
    fired: Rc<RefCell<Vec<u64>>>,
}

impl CallbackSlots {
    fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            live: RefCell::new(HashMap::new()),
            fired: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn prune(&self) {
        let fired: Vec<u64> = self.fired.borrow_mut().drain(..).collect();
        let mut live = self.live.borrow_mut();
        for id in fired {
            live.remove(&id);
        }
    }

    /// Build the callback for slot `id`, delivering `event` when it runs
    fn callback(&self, id: u64, dispatch: &Rc<Dispatcher>, event: MediaEvent) -> Closure<dyn FnMut()> {
        let dispatch = Rc::clone(dispatch);
        let fired = Rc::clone(&self.fired);
        let mut event = Some(event);
        Closure::<dyn FnMut()>::new(move || {
            if let Some(event) = event.take() {
                dispatch.send(Input::Media(event));
            }
            fired.borrow_mut().push(id);
        })
    }

    fn insert(&self, id: u64, browser_id: i32, callback: Closure<dyn FnMut()>) {
        self.live.borrow_mut().insert(id, (browser_id, callback));
    }

    fn remove(&self, id: u64) -> Option<i32> {
        self.live.borrow_mut().remove(&id).map(|(browser_id, _)| browser_id)
    }
}

/// `requestAnimationFrame`
pub struct WebFrames {
    window: Window,
    dispatch: Rc<Dispatcher>,
    slots: CallbackSlots,
}

impl WebFrames {
    pub fn new(window: Window, dispatch: Rc<Dispatcher>) -> Self {
        Self {
            window,
            dispatch,
            slots: CallbackSlots::new(),
        }
    }
}

impl FrameScheduler for WebFrames {
    fn request_frame(&self) -> FrameHandle {
        self.slots.prune();
        let id = self.slots.next_id();
        let handle = FrameHandle(id);
        let callback = self
            .slots
            .callback(id, &self.dispatch, MediaEvent::AnimationFrame(handle));
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(browser_id) => self.slots.insert(id, browser_id, callback),
            Err(e) => warn!(error = ?e, "requestAnimationFrame failed"),
        }
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        if let Some(browser_id) = self.slots.remove(handle.0) {
            let _ = self.window.cancel_animation_frame(browser_id);
        }
    }
}

/// `setTimeout`
pub struct WebTimers {
    window: Window,
    dispatch: Rc<Dispatcher>,
    slots: CallbackSlots,
}

impl WebTimers {
    pub fn new(window: Window, dispatch: Rc<Dispatcher>) -> Self {
        Self {
            window,
            dispatch,
            slots: CallbackSlots::new(),
        }
    }
}

impl TimerScheduler for WebTimers {
    fn set_timeout(&self, delay: Duration) -> TimerHandle {
        self.slots.prune();
        let id = self.slots.next_id();
        let handle = TimerHandle(id);
        let callback = self
            .slots
            .callback(id, &self.dispatch, MediaEvent::Timeout(handle));
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.as_ref().unchecked_ref(), millis)
        {
            Ok(browser_id) => self.slots.insert(id, browser_id, callback),
            Err(e) => warn!(error = ?e, "setTimeout failed"),
        }
        handle
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        if let Some(browser_id) = self.slots.remove(handle.0) {
            self.window.clear_timeout_with_handle(browser_id);
        }
    }
}

/// Document-level `pointermove` / `pointerup` listeners for a drag
pub struct WebDocument {
    document: Document,
    dispatch: Rc<Dispatcher>,
    next_id: Cell<u64>,
    live: RefCell<HashMap<u64, [EventBinding; 2]>>,
    /// Detached bindings whose closures may still be on the stack
    retired: RefCell<Vec<[EventBinding; 2]>>,
}

impl WebDocument {
    pub fn new(document: Document, dispatch: Rc<Dispatcher>) -> Self {
        Self {
            document,
            dispatch,
            next_id: Cell::new(0),
            live: RefCell::new(HashMap::new()),
            retired: RefCell::new(Vec::new()),
        }
    }
}

impl DocumentHost for WebDocument {
    fn add_drag_listeners(&self) -> ListenerId {
        self.retired.borrow_mut().clear();

        let id = self.next_id.get() + 1;
        self.next_id.set(id);

        let dispatch = Rc::clone(&self.dispatch);
        let on_move = EventBinding::new(&self.document, "pointermove", move |event| {
            if let Some(pointer) = event.dyn_ref::<MouseEvent>() {
                dispatch.send(Input::DragMove(f64::from(pointer.client_x())));
            }
        });
        let dispatch = Rc::clone(&self.dispatch);
        let on_up = EventBinding::new(&self.document, "pointerup", move |_| {
            dispatch.send(Input::DragEnd);
        });

        self.live.borrow_mut().insert(id, [on_move, on_up]);
        debug!(listeners = id, "Document drag listeners bound");
        ListenerId(id)
    }

    fn remove_drag_listeners(&self, id: ListenerId) {
        let removed = self.live.borrow_mut().remove(&id.0);
        if let Some(bindings) = removed {
            for binding in &bindings {
                binding.detach();
            }
            self.retired.borrow_mut().push(bindings);
        }
    }
}

/// Fullscreen API on the player container
pub struct WebFullscreen {
    container: Element,
    document: Document,
}

impl WebFullscreen {
    pub fn new(container: Element, document: Document) -> Self {
        Self { container, document }
    }

    /// Mirror `fullscreenchange` (and `fullscreenerror`) into the player:
    /// active is true only when the container itself is fullscreen
    pub fn bind_events(&self, dispatch: &Rc<Dispatcher>) -> Vec<EventBinding> {
        ["fullscreenchange", "fullscreenerror"]
            .into_iter()
            .map(|event| {
                let document = self.document.clone();
                let container: Node = self.container.clone().into();
                let dispatch = Rc::clone(dispatch);
                EventBinding::new(&self.document, event, move |_| {
                    let active = document
                        .fullscreen_element()
                        .is_some_and(|element| element.is_same_node(Some(&container)));
                    dispatch.send(Input::Media(MediaEvent::FullscreenChange { active }));
                })
            })
            .collect()
    }
}

impl FullscreenHost for WebFullscreen {
    fn request_fullscreen(&self) -> Result<()> {
        self.container.request_fullscreen().map_err(|e| {
            Error::FullscreenDenied(
                e.as_string()
                    .unwrap_or_else(|| "requestFullscreen threw".to_string()),
            )
        })
    }

    fn exit_fullscreen(&self) -> Result<()> {
        if self.document.fullscreen_element().is_some() {
            self.document.exit_fullscreen();
        }
        Ok(())
    }
}
