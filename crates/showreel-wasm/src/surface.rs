//! `<video>` element surface

use crate::dispatch::{Dispatcher, Input};
use crate::host::EventBinding;
use showreel_core::{MediaEvent, MediaSurface};
use std::rc::Rc;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlVideoElement;

pub struct WebSurface {
    video: HtmlVideoElement,
    dispatch: Rc<Dispatcher>,
}

impl WebSurface {
    pub fn new(video: HtmlVideoElement, dispatch: Rc<Dispatcher>) -> Self {
        Self { video, dispatch }
    }

    pub fn video(&self) -> &HtmlVideoElement {
        &self.video
    }

    /// Forward the element's native media events for as long as the
    /// returned bindings live
    pub fn bind_events(&self) -> Vec<EventBinding> {
        let mut bindings = Vec::with_capacity(3);

        let video = self.video.clone();
        let dispatch = Rc::clone(&self.dispatch);
        bindings.push(EventBinding::new(&self.video, "loadedmetadata", move |_| {
            dispatch.send(Input::Media(MediaEvent::LoadedMetadata {
                duration: video.duration(),
            }));
        }));

        let dispatch = Rc::clone(&self.dispatch);
        bindings.push(EventBinding::new(&self.video, "timeupdate", move |_| {
            dispatch.send(Input::Media(MediaEvent::TimeUpdate));
        }));

        let dispatch = Rc::clone(&self.dispatch);
        bindings.push(EventBinding::new(&self.video, "ended", move |_| {
            dispatch.send(Input::Media(MediaEvent::Ended));
        }));

        bindings
    }

    fn reject(dispatch: &Dispatcher, reason: wasm_bindgen::JsValue) {
        let reason = js_sys::Error::from(reason)
            .message()
            .as_string()
            .unwrap_or_else(|| "play() rejected".to_string());
        dispatch.send(Input::Media(MediaEvent::PlayRejected { reason }));
    }
}

impl MediaSurface for WebSurface {
    fn play(&self) {
        match self.video.play() {
            Ok(promise) => {
                let dispatch = Rc::clone(&self.dispatch);
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(reason) = JsFuture::from(promise).await {
                        Self::reject(&dispatch, reason);
                    }
                });
            }
            Err(reason) => Self::reject(&self.dispatch, reason),
        }
    }

    fn pause(&self) {
        let _ = self.video.pause();
    }

    fn is_paused(&self) -> bool {
        self.video.paused()
    }

    fn current_time(&self) -> f64 {
        self.video.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.video.set_current_time(seconds);
    }

    fn set_src(&self, url: &str) {
        self.video.set_src(url);
    }

    fn can_play_type(&self, mime: &str) -> bool {
        !self.video.can_play_type(mime).is_empty()
    }

    fn set_muted(&self, muted: bool) {
        self.video.set_muted(muted);
    }
}
