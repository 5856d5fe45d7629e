//! checkout-web
//!
//! Leptos WASM payment form: Stripe card input, PayPal buttons and the
//! pricing page that feeds them a product.

mod api;
mod app;
mod bindings;
mod components;
mod interop;
mod pages;
mod paypal;
mod services;
mod stripe;

pub use app::App;
pub use components::PaymentForm;
pub use paypal::PaypalWalletAdapter;
pub use services::{FirebaseAnalytics, ToastNotifier};
pub use stripe::StripeCardAdapter;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    leptos::mount::mount_to_body(App);
}
