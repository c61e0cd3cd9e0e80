//! Browser entry points. The page owns the workflow; these run the backends.

use wasm_bindgen::prelude::*;

use crate::backend::{image_compressor, pdf_compressor, DocumentOptions, ImageOptions};
use crate::error::BackendError;
use crate::level::CompressionLevel;

fn to_js(context: &str, err: BackendError) -> JsError {
    let message = format!("{}: {}", context, err);
    web_sys::console::error_1(&message.as_str().into());
    JsError::new(&message)
}

#[wasm_bindgen]
pub fn size_hint_mb(level: i32) -> f64 {
    CompressionLevel::new(level.into()).size_hint_mb()
}

#[wasm_bindgen]
pub fn compress_image(input: &[u8], level: i32) -> Result<Vec<u8>, JsError> {
    let options = ImageOptions::for_level(CompressionLevel::new(level.into()));
    image_compressor::shrink_image(input, &options)
        .map_err(|e| to_js("Image compression failed", e))
}

#[wasm_bindgen]
pub fn compress_document(input: &[u8]) -> Result<Vec<u8>, JsError> {
    let mut doc = pdf_compressor::load(input).map_err(|e| to_js("PDF compression failed", e))?;
    pdf_compressor::serialize(&mut doc, &DocumentOptions::default())
        .map_err(|e| to_js("PDF compression failed", e))
}
