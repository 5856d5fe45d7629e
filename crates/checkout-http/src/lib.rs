//! # checkout-http
//!
//! [`PaymentBackend`](checkout_core::PaymentBackend) over the payment
//! service's JSON API.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use checkout_http::HttpPaymentBackend;
//!
//! let backend = Rc::new(HttpPaymentBackend::new("https://example.com/api/payments"));
//! let checkout = Checkout::builder().backend(backend) /* ... */ .build()?;
//! ```

mod client;
mod error;
mod wire;

pub use client::{HttpBackendConfig, HttpPaymentBackend};
pub use error::HttpError;
