//! # checkout-core
//!
//! Checkout logic for the PRO upgrade payment form.
//!
//! The form collects a card (hosted card-input widget) or a wallet approval
//! (hosted wallet button), hands the resulting token or captured order to the
//! payment backend, and shows the outcome.
//!
//! ```text
//!   Idle ──submit──▶ Validating ──tokenized──▶ Processing ──┬──▶ Success
//!    ▲                                                     └──▶ Error ──retry──┐
//!    └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Providers and the backend are reached only through the traits in
//! [`ports`], so the same controller runs in the browser (see `checkout-web`)
//! and against the in-memory doubles in [`mock`].

pub mod checkout;
pub mod config;
pub mod error;
pub mod machine;
pub mod mock;
pub mod model;
pub mod ports;
pub mod pricing;

pub use checkout::{Checkout, CheckoutBuilder, WALLET_FAILURE};
pub use config::{CheckoutConfig, DiscountCap};
pub use error::{CheckoutError, Result};
pub use machine::{CheckoutEvent, CheckoutModel, CheckoutPhase, ProcessingStep};
pub use model::{
    AnalyticsEvent, BackendReceipt, CapturedOrder, CardChange, CheckoutAction, CouponResult,
    CouponState, Notification, OrderRequest, Product, ProductKind, SourceToken,
};
pub use ports::{
    AdapterError, Analytics, CardAdapter, CardChanges, Notifier, OrderCapture, PaymentBackend,
    ProductSelection, ProviderError, ServiceError, ServiceResult, TokenizeError, WalletAdapter,
    WalletEvent, WalletEvents,
};
