//! Raw bindings to the globally loaded Stripe.js v3, PayPal SDK and Firebase
//! scripts. Typed wrappers live in [`crate::stripe`], [`crate::paypal`] and
//! [`crate::services`].

use wasm_bindgen::prelude::*;
use web_sys::js_sys::{Function, Promise};

#[wasm_bindgen]
extern "C" {
    //--------------------------------------------------------------------------
    // Stripe
    //--------------------------------------------------------------------------

    #[derive(Debug, Clone)]
    pub type JsStripe;

    #[derive(Debug, Clone)]
    pub type JsElements;

    /// The hosted card input
    #[derive(Debug, Clone)]
    pub type JsCardElement;

    /// `Stripe("pk_...")`
    #[wasm_bindgen(catch, js_name = Stripe, js_namespace = window)]
    pub fn new_stripe(publishable_key: &str) -> Result<JsStripe, JsValue>;

    /// `stripe.elements(options)`
    #[wasm_bindgen(method, js_name = elements)]
    pub fn elements(this: &JsStripe, options: &JsValue) -> JsElements;

    /// `stripe.createSource(card)` resolves to `{ source }` or `{ error }`
    #[wasm_bindgen(method, js_name = createSource)]
    pub fn create_source(this: &JsStripe, card: &JsCardElement) -> Promise;

    /// `elements.create("card", options)`
    #[wasm_bindgen(method, js_name = create)]
    pub fn create_card(this: &JsElements, kind: &str, options: &JsValue) -> JsCardElement;

    #[wasm_bindgen(method, catch)]
    pub fn mount(this: &JsCardElement, selector: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method)]
    pub fn unmount(this: &JsCardElement);

    #[wasm_bindgen(method)]
    pub fn clear(this: &JsCardElement);

    /// `card.on("change", handler)`
    #[wasm_bindgen(method)]
    pub fn on(this: &JsCardElement, event: &str, handler: &Function);

    //--------------------------------------------------------------------------
    // PayPal
    //--------------------------------------------------------------------------

    #[derive(Debug, Clone)]
    pub type JsPaypalButtons;

    /// `actions` argument of the button callbacks
    #[derive(Debug, Clone)]
    pub type JsOrderActions;

    #[derive(Debug, Clone)]
    pub type JsOrderApi;

    /// `paypal.Buttons({ createOrder, onApprove, onError })`
    #[wasm_bindgen(catch, js_namespace = paypal, js_name = Buttons)]
    pub fn paypal_buttons(options: &JsValue) -> Result<JsPaypalButtons, JsValue>;

    #[wasm_bindgen(method)]
    pub fn render(this: &JsPaypalButtons, selector: &str) -> Promise;

    #[wasm_bindgen(method)]
    pub fn close(this: &JsPaypalButtons) -> Promise;

    #[wasm_bindgen(method, getter)]
    pub fn order(this: &JsOrderActions) -> JsOrderApi;

    /// `actions.order.create(order)` resolves to the order id
    #[wasm_bindgen(method, js_name = create)]
    pub fn create_order(this: &JsOrderApi, order: &JsValue) -> Promise;

    /// `actions.order.capture()` resolves to the captured order
    #[wasm_bindgen(method)]
    pub fn capture(this: &JsOrderApi) -> Promise;

    //--------------------------------------------------------------------------
    // Firebase analytics
    //--------------------------------------------------------------------------

    #[derive(Debug, Clone)]
    pub type JsAnalytics;

    #[wasm_bindgen(catch, js_namespace = firebase, js_name = analytics)]
    pub fn firebase_analytics() -> Result<JsAnalytics, JsValue>;

    #[wasm_bindgen(method, js_name = logEvent)]
    pub fn log_event(this: &JsAnalytics, name: &str, params: &JsValue);
}
