//! WASM bindings for sprite-atlas.
//!
//! This module provides JavaScript-friendly APIs for use in the browser.

use crate::{software_manager, AtlasConfig, AtlasManager, Metadata, OverflowPolicy, SoftwareBackend};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the browser console
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

fn js_err(e: crate::AtlasError) -> JsError {
    JsError::new(&e.to_string())
}

/// Atlas configuration options.
#[wasm_bindgen]
pub struct AtlasOptions {
    tile_size: u32,
    atlas_size: u32,
    enforce_tile_size: bool,
    clip_overflow: bool,
}

impl Default for AtlasOptions {
    fn default() -> Self {
        let config = AtlasConfig::default();
        Self {
            tile_size: config.default_tile_size,
            atlas_size: config.atlas_size,
            enforce_tile_size: config.enforce_tile_size,
            clip_overflow: false,
        }
    }
}

#[wasm_bindgen]
impl AtlasOptions {
    #[wasm_bindgen(constructor)]
    pub fn new() -> AtlasOptions {
        AtlasOptions::default()
    }

    #[wasm_bindgen(setter)]
    pub fn set_tile_size(&mut self, value: u32) {
        self.tile_size = value;
    }

    #[wasm_bindgen(setter)]
    pub fn set_atlas_size(&mut self, value: u32) {
        self.atlas_size = value;
    }

    #[wasm_bindgen(setter)]
    pub fn set_enforce_tile_size(&mut self, value: bool) {
        self.enforce_tile_size = value;
    }

    #[wasm_bindgen(setter)]
    pub fn set_clip_overflow(&mut self, value: bool) {
        self.clip_overflow = value;
    }
}

impl AtlasOptions {
    fn to_config(&self) -> AtlasConfig {
        let overflow = if self.clip_overflow {
            OverflowPolicy::Clip
        } else {
            OverflowPolicy::Reject
        };
        AtlasConfig::default()
            .with_tile_size(self.tile_size)
            .with_atlas_size(self.atlas_size)
            .with_enforced_tile_size(self.enforce_tile_size)
            .with_overflow(overflow)
    }
}

/// A sprite atlas living in the browser.
#[wasm_bindgen]
pub struct AtlasHandle {
    inner: AtlasManager<SoftwareBackend>,
}

#[wasm_bindgen]
impl AtlasHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(options: Option<AtlasOptions>) -> AtlasHandle {
        let options = options.unwrap_or_default();
        AtlasHandle {
            inner: software_manager("", options.to_config()),
        }
    }

    /// Register a PNG. `metadata` is an optional JSON object string.
    pub fn add_png(&mut self, id: &str, data: &[u8], metadata: Option<String>) -> Result<String, JsError> {
        let metadata = match metadata {
            Some(json) => Some(
                serde_json::from_str::<Metadata>(&json)
                    .map_err(|e| JsError::new(&format!("Invalid metadata JSON: {}", e)))?,
            ),
            None => None,
        };
        self.inner.add_bytes(id, data, metadata).map_err(js_err)
    }

    /// Number of registered sprites.
    #[wasm_bindgen(getter)]
    pub fn sprite_count(&self) -> usize {
        self.inner.len()
    }

    /// `[x, y, w, h]` in normalized atlas coordinates.
    pub fn uv(&mut self, id: &str) -> Result<Option<Vec<f32>>, JsError> {
        let view = self.inner.get(id).map_err(js_err)?;
        Ok(view.uv.map(|uv| vec![uv.x, uv.y, uv.w, uv.h]))
    }

    /// `[x, y, w, h]` in atlas pixels.
    pub fn quad(&mut self, id: &str) -> Result<Option<Vec<f32>>, JsError> {
        let quad = self.inner.get_quad(id).map_err(js_err)?;
        Ok(quad.map(|q| vec![q.x, q.y, q.w, q.h]))
    }

    /// Sprite metadata as a JSON string.
    pub fn metadata(&self, id: &str) -> Option<String> {
        self.inner
            .get_metadata(id)
            .and_then(|m| serde_json::to_string(m).ok())
    }

    pub fn row(&mut self, index: u32) -> Result<js_sys::Array, JsError> {
        let ids = self.inner.get_row(index).map_err(js_err)?;
        Ok(ids.into_iter().map(JsValue::from).collect())
    }

    pub fn column(&mut self, index: u32) -> Result<js_sys::Array, JsError> {
        let ids = self.inner.get_column(index).map_err(js_err)?;
        Ok(ids.into_iter().map(JsValue::from).collect())
    }

    /// Encode the current atlas as PNG bytes.
    pub fn to_png(&mut self) -> Result<Vec<u8>, JsError> {
        let atlas = self
            .inner
            .atlas()
            .map_err(js_err)?
            .ok_or_else(|| JsError::new("no sprites registered"))?;
        SoftwareBackend::encode_png(atlas.image()).map_err(js_err)
    }
}
