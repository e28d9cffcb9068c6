//! Page-wide active-video registry for JS

use showreel_core::ActiveVideoRegistry;
use tracing::warn;
use wasm_bindgen::prelude::*;

/// Shared by every interactive player on the page
#[wasm_bindgen]
#[derive(Clone, Default)]
pub struct ShowreelRegistry {
    inner: ActiveVideoRegistry,
}

#[wasm_bindgen]
impl ShowreelRegistry {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Source of the player currently allowed to play, if any
    #[wasm_bindgen(getter)]
    pub fn active(&self) -> Option<String> {
        self.inner.active()
    }

    /// Make `source` the active video; every other player pauses itself
    #[wasm_bindgen(js_name = setActive)]
    pub fn set_active(&self, source: Option<String>) {
        self.inner.set_active(source.as_deref());
    }

    /// Call `callback(activeSource | null)` on every change
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: js_sys::Function) {
        let mut watch = self.inner.subscribe();
        wasm_bindgen_futures::spawn_local(async move {
            while let Some(active) = watch.changed().await {
                let value = match active {
                    Some(source) => JsValue::from_str(&source),
                    None => JsValue::NULL,
                };
                if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                    warn!(error = ?e, "Registry listener threw");
                }
            }
        });
    }
}

impl ShowreelRegistry {
    pub(crate) fn inner(&self) -> &ActiveVideoRegistry {
        &self.inner
    }
}
