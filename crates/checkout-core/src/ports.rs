//! Collaborator Interfaces
//!
//! The checkout runs on a single-threaded UI event loop, so none of these
//! traits require `Send`. Implementations are injected as `Rc<dyn ...>`.
//!
//! ```text
//! ┌──────────────┐  tokenize   ┌─────────────┐
//! │ CardAdapter  │────────────▶│             │  createSubscription / createOrder
//! └──────────────┘             │  Checkout   │─────────────────────────────────▶ PaymentBackend
//! ┌──────────────┐  events     │             │  paypalHandler / getCoupon
//! │WalletAdapter │────────────▶│             │
//! └──────────────┘             └─────────────┘──▶ Notifier, Analytics
//! ```

use async_trait::async_trait;
use futures::stream::LocalBoxStream;
use thiserror::Error;
use tokio::sync::{oneshot, watch};

use crate::model::{
    AnalyticsEvent, BackendReceipt, CapturedOrder, CardChange, CouponResult, Notification,
    OrderRequest, Product, SourceToken,
};
use crate::pricing;

/// Failure reported by the payment backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Backend answered with a `serverError`
    #[error("{message}")]
    Rejected { message: String },

    /// Request never produced a usable answer
    #[error("{0}")]
    Transport(String),
}

impl ServiceError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// Card provider rejected the input; carries the provider's message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TokenizeError(pub String);

/// Wallet provider failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ProviderError(pub String);

/// Widget mount failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct AdapterError(pub String);

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Backend payment service
#[async_trait(?Send)]
pub trait PaymentBackend {
    /// Look up a coupon code
    async fn get_coupon(&self, code: &str) -> ServiceResult<CouponResult>;

    async fn create_subscription(
        &self,
        source: &SourceToken,
        plan_id: &str,
        coupon_id: Option<&str>,
    ) -> ServiceResult<BackendReceipt>;

    async fn create_order(
        &self,
        source: &SourceToken,
        sku: &str,
        coupon_id: Option<&str>,
    ) -> ServiceResult<BackendReceipt>;

    /// Attach a payment source to the customer without charging
    async fn set_source(&self, source: &SourceToken) -> ServiceResult<BackendReceipt>;

    /// Hand a captured wallet order to the backend
    async fn paypal_handler(&self, order: &CapturedOrder) -> ServiceResult<BackendReceipt>;

    /// Price after discount, in minor units
    fn calc_total(&self, price: i64, coupon: Option<&CouponResult>) -> i64 {
        pricing::apply_coupon(price, coupon)
    }
}

/// Stream of raw card validation events
pub type CardChanges = LocalBoxStream<'static, CardChange>;

/// Hosted card-input widget
#[async_trait(?Send)]
pub trait CardAdapter {
    /// Render the widget into `target`; a no-op when already attached
    fn attach(&self, target: &str) -> std::result::Result<(), AdapterError>;

    fn detach(&self);

    fn is_attached(&self) -> bool;

    /// Convert the current input into a single-use source token
    ///
    /// Never panics on provider failure; the error is returned as a value.
    async fn tokenize(&self) -> std::result::Result<SourceToken, TokenizeError>;

    /// Reset the widget's input
    fn clear(&self);

    /// Change events; `None` once taken
    fn take_changes(&self) -> Option<CardChanges>;
}

/// Capture handle passed along with a wallet approval
#[async_trait(?Send)]
pub trait OrderCapture {
    async fn capture(self: Box<Self>) -> std::result::Result<CapturedOrder, ProviderError>;
}

/// Callback from the wallet button
pub enum WalletEvent {
    /// Provider asks for the order to create; `None` aborts creation
    CreateOrder {
        reply: oneshot::Sender<Option<OrderRequest>>,
    },
    /// User approved the payment in the wallet popup
    Approved(Box<dyn OrderCapture>),
    /// Provider-side failure
    Failed(String),
}

impl std::fmt::Debug for WalletEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateOrder { .. } => f.write_str("CreateOrder"),
            Self::Approved(_) => f.write_str("Approved"),
            Self::Failed(detail) => f.debug_tuple("Failed").field(detail).finish(),
        }
    }
}

pub type WalletEvents = LocalBoxStream<'static, WalletEvent>;

/// Hosted wallet-button widget
pub trait WalletAdapter {
    /// Render the button into `target`, replacing any previous render
    fn attach(&self, target: &str) -> std::result::Result<(), AdapterError>;

    fn detach(&self);

    /// Button callbacks; `None` once taken
    fn take_events(&self) -> Option<WalletEvents>;
}

/// User notification sink
pub trait Notifier {
    fn notify(&self, notification: &Notification);
}

/// Analytics sink
pub trait Analytics {
    fn log_event(&self, event: &AnalyticsEvent);
}

/// Currently selected product, observed by the checkout
#[derive(Clone, Debug)]
pub struct ProductSelection {
    tx: std::rc::Rc<watch::Sender<Option<Product>>>,
}

impl Default for ProductSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductSelection {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx: std::rc::Rc::new(tx),
        }
    }

    /// Publish a new selection (or clear it with `None`)
    pub fn select(&self, product: Option<Product>) {
        self.tx.send_replace(product);
    }

    pub fn current(&self) -> Option<Product> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Product>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_displays_message_verbatim() {
        let err = ServiceError::rejected("Your card has insufficient funds.");
        assert_eq!(err.to_string(), "Your card has insufficient funds.");
    }

    #[tokio::test]
    async fn test_product_selection_notifies_subscribers() {
        let selection = ProductSelection::new();
        let mut rx = selection.subscribe();

        selection.select(Some(Product::order("proLifetime", "sku_life", 25000)));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().id, "proLifetime");

        selection.select(None);
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
        assert!(selection.current().is_none());
    }
}
