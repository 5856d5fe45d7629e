//! JS value helpers shared by the widget adapters

use serde::Serialize;
use wasm_bindgen::JsValue;
use web_sys::js_sys::Reflect;

/// Serialize into a plain JS object (maps become objects, not `Map`s)
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
}

/// Best-effort text of a thrown JS value
pub fn js_message(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }

    Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Empty the element matching `selector`, if any
pub fn clear_element(selector: &str) {
    let element = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.query_selector(selector).ok().flatten());

    if let Some(element) = element {
        element.set_inner_html("");
    }
}
