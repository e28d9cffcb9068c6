//! hls.js streaming engine
//!
//! hls.js is expected as the global `Hls` (loaded by a `<script>` tag or
//! assigned to `window.Hls` by the bundle).

use crate::dispatch::{Dispatcher, Input};
use crate::surface::WebSurface;
use showreel_core::{MediaEvent, Rendition, Resolution, StreamEngine, StreamSession};
use std::rc::Rc;
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const MANIFEST_PARSED: &str = "hlsManifestParsed";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = Hls)]
    type Hls;

    #[wasm_bindgen(static_method_of = Hls, js_name = isSupported, catch)]
    fn is_supported() -> Result<bool, JsValue>;

    #[wasm_bindgen(constructor)]
    fn new() -> Hls;

    #[wasm_bindgen(method, js_name = loadSource)]
    fn load_source(this: &Hls, url: &str);

    #[wasm_bindgen(method, js_name = attachMedia)]
    fn attach_media(this: &Hls, media: &web_sys::HtmlMediaElement);

    #[wasm_bindgen(method)]
    fn on(this: &Hls, event: &str, callback: &js_sys::Function);

    #[wasm_bindgen(method, getter)]
    fn levels(this: &Hls) -> JsValue;

    #[wasm_bindgen(method, setter, js_name = currentLevel)]
    fn set_current_level(this: &Hls, level: i32);

    #[wasm_bindgen(method)]
    fn destroy(this: &Hls);
}

pub struct HlsEngine {
    dispatch: Rc<Dispatcher>,
}

impl HlsEngine {
    pub fn new(dispatch: Rc<Dispatcher>) -> Self {
        Self { dispatch }
    }
}

impl StreamEngine<WebSurface> for HlsEngine {
    fn is_supported(&self) -> bool {
        Hls::is_supported().unwrap_or(false)
    }

    fn create_session(&self, source: &str, surface: &WebSurface) -> Box<dyn StreamSession> {
        let hls = Hls::new();
        let dispatch = Rc::clone(&self.dispatch);
        let on_manifest_parsed = Closure::<dyn FnMut()>::new(move || {
            dispatch.send(Input::Media(MediaEvent::ManifestParsed));
        });
        hls.on(MANIFEST_PARSED, on_manifest_parsed.as_ref().unchecked_ref());
        hls.load_source(source);
        hls.attach_media(surface.video());

        Box::new(HlsSession {
            hls,
            _on_manifest_parsed: on_manifest_parsed,
        })
    }
}

struct HlsSession {
    hls: Hls,
    _on_manifest_parsed: Closure<dyn FnMut()>,
}

fn number(object: &JsValue, key: &str) -> Option<f64> {
    js_sys::Reflect::get(object, &JsValue::from_str(key))
        .ok()
        .and_then(|value| value.as_f64())
}

impl StreamSession for HlsSession {
    fn levels(&self) -> Vec<Rendition> {
        let Ok(levels) = self.hls.levels().dyn_into::<js_sys::Array>() else {
            return Vec::new();
        };
        levels
            .iter()
            .map(|level| {
                let resolution = match (number(&level, "width"), number(&level, "height")) {
                    (Some(w), Some(h)) if w > 0.0 && h > 0.0 => Some(Resolution::new(w as u32, h as u32)),
                    _ => None,
                };
                let bandwidth = number(&level, "bitrate").unwrap_or(0.0) as u64;
                Rendition::new(bandwidth, resolution)
            })
            .collect()
    }

    fn set_current_level(&mut self, index: usize) {
        self.hls.set_current_level(i32::try_from(index).unwrap_or(-1));
    }

    fn destroy(&mut self) {
        debug!("Destroying hls.js instance");
        self.hls.destroy();
    }
}
