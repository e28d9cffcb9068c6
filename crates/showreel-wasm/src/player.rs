//! JS-facing player handle

use crate::dispatch::{Dispatcher, Input, SharedPlayer};
use crate::hls::HlsEngine;
use crate::host::{EventBinding, WebDocument, WebFrames, WebFullscreen, WebTimers};
use crate::registry::ShowreelRegistry;
use crate::surface::WebSurface;
use crate::to_js_error;
use showreel_core::{PlayerConfig, PlayerEnv, VideoPlayer};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info};
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlVideoElement, MouseEvent};

/// One mounted player. Call `unmount()` (or `free()`) when its DOM goes away.
#[wasm_bindgen]
pub struct ShowreelPlayer {
    player: Option<SharedPlayer>,
    dispatch: Rc<Dispatcher>,
    bindings: Vec<EventBinding>,
}

fn parse_config(json: Option<String>, fallback: PlayerConfig) -> Result<PlayerConfig, JsValue> {
    match json {
        Some(json) => PlayerConfig::from_json(&json).map_err(to_js_error),
        None => Ok(fallback),
    }
}

fn environment(
    video: HtmlVideoElement,
    container: Element,
    dispatch: &Rc<Dispatcher>,
) -> Result<(PlayerEnv<WebSurface>, Vec<EventBinding>), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let surface = Rc::new(WebSurface::new(video, Rc::clone(dispatch)));
    let fullscreen = WebFullscreen::new(container, document.clone());

    let mut bindings = surface.bind_events();
    bindings.extend(fullscreen.bind_events(dispatch));

    let env = PlayerEnv {
        surface,
        engine: Rc::new(HlsEngine::new(Rc::clone(dispatch))),
        frames: Rc::new(WebFrames::new(window.clone(), Rc::clone(dispatch))),
        timers: Rc::new(WebTimers::new(window, Rc::clone(dispatch))),
        document: Rc::new(WebDocument::new(document, Rc::clone(dispatch))),
        fullscreen: Rc::new(fullscreen),
    };
    Ok((env, bindings))
}

#[wasm_bindgen]
impl ShowreelPlayer {
    /// Mount a slide-deck player.
    ///
    /// `track` is the progress-track element; pointer positions are read
    /// relative to its bounding box. `config` is an optional JSON
    /// `PlayerConfig`.
    pub fn interactive(
        video: HtmlVideoElement,
        container: Element,
        track: Element,
        source: &str,
        registry: &ShowreelRegistry,
        config: Option<String>,
    ) -> Result<ShowreelPlayer, JsValue> {
        let config = parse_config(config, PlayerConfig::interactive())?;
        let dispatch = Rc::new(Dispatcher::new(Some(track)));
        let (env, bindings) = environment(video, container, &dispatch)?;

        let player = VideoPlayer::interactive(source, config, env, registry.inner().clone())
            .map_err(to_js_error)?;
        let handle = Self::attach(player, dispatch, bindings);

        let mut watch = registry.inner().subscribe();
        let closed = handle.dispatch.closed_signal();
        let dispatch = Rc::downgrade(&handle.dispatch);
        wasm_bindgen_futures::spawn_local(async move {
            while watch.changed_or_closed(&closed).await.is_some() {
                match dispatch.upgrade() {
                    Some(dispatch) if dispatch.is_live() => dispatch.send(Input::RegistryChanged),
                    _ => break,
                }
            }
            debug!("Registry watch ended");
        });

        Ok(handle)
    }

    /// Mount an ambient player: autoplays muted, ignores the registry
    pub fn background(
        video: HtmlVideoElement,
        container: Element,
        source: &str,
        config: Option<String>,
    ) -> Result<ShowreelPlayer, JsValue> {
        let config = parse_config(config, PlayerConfig::background())?;
        let dispatch = Rc::new(Dispatcher::new(None));
        let (env, bindings) = environment(video, container, &dispatch)?;

        let player = VideoPlayer::background(source, config, env).map_err(to_js_error)?;
        Ok(Self::attach(player, dispatch, bindings))
    }

    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&self) -> Result<(), JsValue> {
        self.with_player(|player| player.toggle_play())
    }

    /// First-activation control: play and go fullscreen
    pub fn activate(&self) -> Result<(), JsValue> {
        self.with_player(|player| player.activate())
    }

    #[wasm_bindgen(js_name = toggleFullscreen)]
    pub fn toggle_fullscreen(&self) -> Result<(), JsValue> {
        self.with_player(|player| player.toggle_fullscreen())
    }

    #[wasm_bindgen(js_name = trackHover)]
    pub fn track_hover(&self, client_x: f64) -> Result<(), JsValue> {
        let bounds = self.dispatch.track_bounds();
        self.with_player(|player| player.track_hover(client_x, bounds))
    }

    #[wasm_bindgen(js_name = trackLeave)]
    pub fn track_leave(&self) -> Result<(), JsValue> {
        self.with_player(|player| player.track_leave())
    }

    #[wasm_bindgen(js_name = trackClick)]
    pub fn track_click(&self, client_x: f64) -> Result<(), JsValue> {
        let bounds = self.dispatch.track_bounds();
        self.with_player(|player| player.track_click(client_x, bounds))
    }

    /// Pointer down on the scrub handle. Returns whether a drag started.
    #[wasm_bindgen(js_name = handlePointerDown)]
    pub fn handle_pointer_down(&self, event: MouseEvent) -> Result<bool, JsValue> {
        event.prevent_default();
        event.stop_propagation();
        self.with_player(|player| player.begin_drag())
    }

    #[wasm_bindgen(js_name = setSource)]
    pub fn set_source(&self, source: &str) -> Result<(), JsValue> {
        self.with_player(|player| {
            player.set_source(source);
            Ok(())
        })
    }

    /// Current `PlayerSnapshot` as a plain object
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let player = self.shared()?;
        let snapshot = player
            .try_borrow()
            .map_err(|_| JsValue::from_str("player is busy"))?
            .snapshot();
        serde_wasm_bindgen::to_value(&snapshot).map_err(Into::into)
    }

    /// Call `callback(snapshot)` after every state change; `null` to stop
    #[wasm_bindgen(js_name = onRender)]
    pub fn on_render(&self, callback: Option<js_sys::Function>) {
        self.dispatch.set_on_render(callback);
        self.dispatch.flush();
    }

    /// Tear down: destroys the stream session, removes every listener and
    /// releases the registry entry
    pub fn unmount(&mut self) {
        self.dispatch.close();
        if let Some(player) = self.player.take() {
            let source = player.borrow().source().to_string();
            drop(player);
            info!(source = %source, "Player unmounted");
        }
        self.bindings.clear();
    }
}

impl Drop for ShowreelPlayer {
    fn drop(&mut self) {
        self.dispatch.close();
    }
}

impl ShowreelPlayer {
    fn attach(
        player: VideoPlayer<WebSurface>,
        dispatch: Rc<Dispatcher>,
        bindings: Vec<EventBinding>,
    ) -> Self {
        let player = Rc::new(RefCell::new(player));
        dispatch.attach(&player);
        dispatch.flush();
        Self {
            player: Some(player),
            dispatch,
            bindings,
        }
    }

    fn shared(&self) -> Result<&SharedPlayer, JsValue> {
        self.player
            .as_ref()
            .ok_or_else(|| JsValue::from_str("player is unmounted"))
    }

    /// Run a control call, then apply whatever the browser reported meanwhile
    fn with_player<T>(
        &self,
        f: impl FnOnce(&mut VideoPlayer<WebSurface>) -> showreel_core::Result<T>,
    ) -> Result<T, JsValue> {
        let player = self.shared()?;
        let result = {
            let mut guard = player
                .try_borrow_mut()
                .map_err(|_| JsValue::from_str("player is busy"))?;
            f(&mut *guard)
        };
        self.dispatch.flush();
        result.map_err(to_js_error)
    }
}
