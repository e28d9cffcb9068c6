//! Showreel WASM - Browser bindings for the Showreel video players
//!
//! Implements the `showreel-core` host traits on `web-sys`:
//! - `<video>` element as the media surface
//! - hls.js as the adaptive streaming engine
//! - `requestAnimationFrame` / `setTimeout` scheduling
//! - Document pointer listeners for handle dragging
//! - The Fullscreen API on the player container
//!
//! ## Usage
//!
//! ```javascript
//! import init, { ShowreelPlayer, ShowreelRegistry } from '@showreel/wasm';
//!
//! await init();
//! const registry = new ShowreelRegistry();
//! const player = ShowreelPlayer.interactive(video, container, track, '/video/rul.m3u8', registry);
//! player.onRender((snapshot) => render(snapshot));
//! track.addEventListener('pointermove', (e) => player.trackHover(e.clientX));
//! handle.addEventListener('pointerdown', (e) => player.handlePointerDown(e));
//! ```

use wasm_bindgen::prelude::*;

mod dispatch;
mod hls;
mod host;
mod logging;
mod player;
mod registry;
mod surface;

pub use player::ShowreelPlayer;
pub use registry::ShowreelRegistry;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::init_logging(tracing::Level::INFO);
    showreel_core::init();
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    showreel_core::VERSION.to_string()
}

/// `MM:SS` label for a position in seconds
#[wasm_bindgen(js_name = formatTime)]
pub fn format_time(seconds: f64) -> String {
    showreel_core::format_time(seconds)
}

/// Turn a core error into a JS `Error` carrying its code
pub(crate) fn to_js_error(error: showreel_core::Error) -> JsValue {
    js_sys::Error::new(&format!("{}: {}", error.error_code(), error)).into()
}
