use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
    /// Degenerate pointer layout, e.g. both pinch fingers on the same spot.
    #[error("degenerate pointer geometry: {0}")]
    InputGeometry(String),
    #[error("render failed: {0}")]
    Render(String),
    #[error("overlay image could not be loaded: {0}")]
    OverlayLoad(String),
    #[error("video size unknown, using fallback aspect ratio")]
    ViewportDegenerate,
    #[error("camera unavailable: {0}")]
    Camera(String),
}

impl OverlayError {
    pub fn render(e: JsValue) -> Self {
        OverlayError::Render(js_message(&e))
    }

    pub fn camera(e: JsValue) -> Self {
        OverlayError::Camera(js_message(&e))
    }
}

/// Best-effort text for a thrown JS value.
pub fn js_message(e: &JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{:?}", e))
}
