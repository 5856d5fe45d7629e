//! Checkout Controller
//!
//! Wires the card and wallet adapters to the payment backend and keeps the
//! form's [`CheckoutModel`] current. Observers read the model through a
//! `watch` channel.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let checkout = Rc::new(
//!     Checkout::builder()
//!         .backend(backend)
//!         .card(card)
//!         .wallet(wallet)
//!         .notifier(notifier)
//!         .analytics(analytics)
//!         .build()?,
//! );
//!
//! checkout.mount_card()?;
//! spawn_local({ let c = checkout.clone(); async move { c.run().await } });
//!
//! checkout.products().select(Some(product));
//! checkout.submit_card_payment().await?;
//! ```

use std::rc::Rc;

use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, Result};
use crate::machine::{CheckoutEvent, CheckoutModel};
use crate::model::{
    AnalyticsEvent, BackendReceipt, CardChange, CheckoutAction, CouponResult, CouponState,
    OrderRequest, Product, ProductKind, SourceToken,
};
use crate::ports::{
    Analytics, CardAdapter, Notifier, OrderCapture, PaymentBackend, ProductSelection,
    WalletAdapter, WalletEvent,
};
use crate::pricing;

/// Shown for any wallet provider failure; provider detail is not user-safe
pub const WALLET_FAILURE: &str = "Unable to process PayPal payment";

/// Payment form controller
pub struct Checkout {
    config: CheckoutConfig,
    backend: Rc<dyn PaymentBackend>,
    card: Rc<dyn CardAdapter>,
    wallet: Rc<dyn WalletAdapter>,
    notifier: Rc<dyn Notifier>,
    analytics: Rc<dyn Analytics>,
    products: ProductSelection,
    state: watch::Sender<CheckoutModel>,
    /// Held for the whole of any backend/provider round trip
    busy: Mutex<()>,
}

impl Checkout {
    pub fn builder() -> CheckoutBuilder {
        CheckoutBuilder::new()
    }

    pub const fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Product channel this checkout follows
    pub const fn products(&self) -> &ProductSelection {
        &self.products
    }

    pub fn subscribe(&self) -> watch::Receiver<CheckoutModel> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CheckoutModel {
        self.state.borrow().clone()
    }

    /// Mount the card widget unless it is already mounted
    pub fn mount_card(&self) -> Result<()> {
        if self.card.is_attached() {
            return Ok(());
        }

        self.card
            .attach(&self.config.card_element)
            .map_err(|e| CheckoutError::Adapter(e.to_string()))?;

        tracing::info!(target_element = %self.config.card_element, "Card widget mounted");
        Ok(())
    }

    /// Detach both widgets (view teardown)
    pub fn unmount(&self) {
        self.card.detach();
        self.wallet.detach();
        tracing::debug!("Checkout widgets detached");
    }

    /// Switch to `product`, clearing coupon state and re-rendering the wallet button
    ///
    /// Selecting a product starts a fresh checkout (`Idle`). Clearing the
    /// selection keeps the current phase so a finished checkout still shows
    /// its success state.
    pub fn select_product(&self, product: Option<Product>) -> Result<()> {
        let starts_new = product.is_some();
        let _guard = if starts_new {
            Some(self.busy.try_lock().map_err(|_| CheckoutError::Busy)?)
        } else {
            None
        };

        let wallet_eligible = product.as_ref().is_some_and(Product::is_order);
        tracing::debug!(product = ?product.as_ref().map(|p| &p.id), "Product selected");

        self.state.send_modify(|model| {
            model.product = product;
            model.coupon = CouponState::Empty;
        });

        if starts_new {
            self.dispatch(CheckoutEvent::Reset)?;
        }

        self.wallet.detach();
        if wallet_eligible {
            self.wallet
                .attach(&self.config.wallet_element)
                .map_err(|e| CheckoutError::Adapter(e.to_string()))?;
        }

        Ok(())
    }

    /// Look up `code` and apply it when valid
    ///
    /// Returns the applied coupon, or `None` if the code was rejected or the
    /// lookup failed.
    pub async fn apply_coupon(&self, code: &str) -> Result<Option<CouponResult>> {
        if !self.config.allow_coupons {
            return Err(CheckoutError::CouponsDisabled);
        }
        let _guard = self.busy.try_lock().map_err(|_| CheckoutError::Busy)?;

        self.dispatch(CheckoutEvent::Dismiss)?;
        self.state.send_modify(|model| model.coupon = CouponState::Loading);

        tracing::info!(code = %code, "Looking up coupon");

        let coupon = match self.backend.get_coupon(code).await {
            Ok(coupon) if coupon.valid => CouponState::Applied(coupon),
            Ok(_) => {
                tracing::info!(code = %code, "Coupon rejected");
                CouponState::Rejected
            }
            Err(e) => {
                tracing::warn!(code = %code, error = %e, "Coupon lookup failed");
                CouponState::Rejected
            }
        };

        let applied = coupon.result().cloned();
        self.state.send_modify(|model| model.coupon = coupon);
        Ok(applied)
    }

    /// Tokenize the card and run the configured backend charge
    pub async fn submit_card_payment(&self) -> Result<BackendReceipt> {
        let _guard = self.busy.try_lock().map_err(|_| {
            tracing::warn!("Card submit ignored: checkout busy");
            CheckoutError::Busy
        })?;

        let (product, coupon_id) = {
            let model = self.state.borrow();
            (
                model.product.clone(),
                model.coupon.coupon_id().map(str::to_string),
            )
        };
        if self.config.action == CheckoutAction::Purchase && product.is_none() {
            return Err(CheckoutError::NoProductSelected);
        }

        let attempt = Uuid::new_v4();
        tracing::info!(
            attempt = %attempt,
            action = %self.config.action,
            product = ?product.as_ref().map(|p| &p.id),
            coupon = ?coupon_id,
            "Submitting card payment"
        );

        self.dispatch(CheckoutEvent::SubmitCard)?;

        let token = match self.card.tokenize().await {
            Ok(token) => token,
            Err(e) => {
                let message = format!("Unsuccessful {e}");
                tracing::warn!(attempt = %attempt, error = %e, "Card tokenization failed");
                self.dispatch(CheckoutEvent::Failed(message.clone()))?;
                return Err(CheckoutError::Tokenization(message));
            }
        };

        self.dispatch(CheckoutEvent::Tokenized)?;

        let outcome = self
            .charge(&token, product.as_ref(), coupon_id.as_deref())
            .await;
        self.settle(outcome, product)
    }

    async fn charge(
        &self,
        token: &SourceToken,
        product: Option<&Product>,
        coupon_id: Option<&str>,
    ) -> Result<BackendReceipt> {
        let result = match (self.config.action, product) {
            (CheckoutAction::Source, _) => self.backend.set_source(token).await,
            (CheckoutAction::Purchase, None) => return Err(CheckoutError::NoProductSelected),
            (CheckoutAction::Purchase, Some(product)) => match product.kind {
                ProductKind::Subscription => {
                    self.backend
                        .create_subscription(token, product.plan()?, coupon_id)
                        .await
                }
                ProductKind::Order => {
                    self.backend
                        .create_order(token, &product.sku, coupon_id)
                        .await
                }
                ProductKind::Unsupported => {
                    return Err(CheckoutError::UnsupportedProduct {
                        product_id: product.id.clone(),
                        reason: "product type cannot be purchased".into(),
                    });
                }
            },
        };

        result.map_err(|e| CheckoutError::Backend(e.to_string()))
    }

    /// Discounted price in minor units
    pub fn total(&self) -> Result<i64> {
        let model = self.state.borrow();
        let product = model
            .product
            .as_ref()
            .ok_or(CheckoutError::NoProductSelected)?;
        Ok(self.backend.calc_total(product.price, model.coupon.result()))
    }

    /// Total as a major-unit decimal string, e.g. `"49.00"`
    pub fn display_total(&self) -> Result<String> {
        self.total().map(pricing::format_major_units)
    }

    /// Build the wallet order, enforcing the discount caps first
    pub fn create_order_request(&self) -> Result<OrderRequest> {
        let _guard = self.busy.try_lock().map_err(|_| CheckoutError::Busy)?;

        let product = self
            .state
            .borrow()
            .product
            .clone()
            .ok_or(CheckoutError::NoProductSelected)?;

        if !product.is_order() {
            return Err(CheckoutError::UnsupportedProduct {
                product_id: product.id,
                reason: "wallet checkout requires an order product".into(),
            });
        }

        let total = self.total()?;

        if let Some(cap) = self.config.discount_violation(&product.id, total) {
            let message = cap.message.clone();
            tracing::warn!(
                product = %product.id,
                total,
                min_total = cap.min_total,
                "Order blocked by discount cap"
            );
            self.dispatch(CheckoutEvent::Failed(message.clone()))?;
            return Err(CheckoutError::BusinessRule(message));
        }

        Ok(OrderRequest::single(
            &product,
            &self.config.currency,
            pricing::format_major_units(total),
        ))
    }

    /// Capture an approved wallet order and hand it to the backend
    pub async fn approve_wallet_order(
        &self,
        capture: Box<dyn OrderCapture>,
    ) -> Result<BackendReceipt> {
        let _guard = self.busy.try_lock().map_err(|_| {
            tracing::warn!("Wallet approval ignored: checkout busy");
            CheckoutError::Busy
        })?;

        let product = self.state.borrow().product.clone();
        tracing::info!(product = ?product.as_ref().map(|p| &p.id), "Wallet payment approved");

        self.dispatch(CheckoutEvent::WalletApproved)?;

        let captured = match capture.capture().await {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!(error = %e, "Wallet capture failed");
                self.dispatch(CheckoutEvent::Failed(WALLET_FAILURE.into()))?;
                return Err(CheckoutError::Provider(e.0));
            }
        };

        self.dispatch(CheckoutEvent::WalletCaptured)?;

        let outcome = self
            .backend
            .paypal_handler(&captured)
            .await
            .map_err(|e| CheckoutError::Backend(e.to_string()));
        self.settle(outcome, product)
    }

    /// Provider-side wallet error
    ///
    /// Ignored while another operation owns the checkout; that operation
    /// settles the phase itself. A refusal already on screen (e.g. a discount
    /// cap that made the provider abort order creation) is kept instead of the
    /// generic message.
    pub fn wallet_failed(&self, detail: &str) -> Result<()> {
        let Ok(_guard) = self.busy.try_lock() else {
            tracing::info!(detail = %detail, "Wallet provider error ignored: checkout busy");
            return Ok(());
        };

        let (in_flight, showing_error) = {
            let model = self.state.borrow();
            (model.phase.is_in_flight(), model.server_error().is_some())
        };
        if in_flight {
            tracing::info!(detail = %detail, "Wallet provider error ignored: payment in flight");
            return Ok(());
        }

        tracing::warn!(detail = %detail, "Wallet provider error");
        if showing_error {
            return Ok(());
        }
        self.dispatch(CheckoutEvent::Failed(WALLET_FAILURE.into()))
    }

    /// Store a raw validation event from the card widget
    pub fn record_card_change(&self, change: CardChange) {
        self.state
            .send_modify(|model| model.card_state = Some(change));
    }

    /// Apply every selection published on the product channel
    ///
    /// A selection made while the checkout is busy is applied once the
    /// outstanding operation releases the lock, using the channel's latest
    /// value at that point.
    pub async fn run_product_feed(&self) {
        let mut rx = self.products.subscribe();

        if rx.borrow().is_some() {
            self.apply_latest_selection(&mut rx).await;
        }

        while rx.changed().await.is_ok() {
            self.apply_latest_selection(&mut rx).await;
        }
    }

    async fn apply_latest_selection(&self, rx: &mut watch::Receiver<Option<Product>>) {
        loop {
            let product = rx.borrow_and_update().clone();
            match self.select_product(product) {
                Ok(()) => return,
                Err(CheckoutError::Busy) => {
                    tracing::debug!("Product selection deferred: checkout busy");
                    drop(self.busy.lock().await);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Product selection not applied");
                    return;
                }
            }
        }
    }

    /// Record card validation events until the widget stream ends
    pub async fn run_card_changes(&self) {
        use futures::StreamExt;

        let Some(mut changes) = self.card.take_changes() else {
            tracing::debug!("Card change stream already taken");
            return;
        };

        while let Some(change) = changes.next().await {
            self.record_card_change(change);
        }
    }

    /// Serve wallet button callbacks until the widget stream ends
    pub async fn run_wallet_events(&self) {
        use futures::StreamExt;

        let Some(mut events) = self.wallet.take_events() else {
            tracing::debug!("Wallet event stream already taken");
            return;
        };

        while let Some(event) = events.next().await {
            match event {
                WalletEvent::CreateOrder { reply } => {
                    let order = self.create_order_request().ok();
                    if reply.send(order).is_err() {
                        tracing::debug!("Wallet stopped waiting for the order");
                    }
                }
                WalletEvent::Approved(capture) => {
                    // Outcome is already reflected in the model.
                    let _ = self.approve_wallet_order(capture).await;
                }
                WalletEvent::Failed(detail) => {
                    let _ = self.wallet_failed(&detail);
                }
            }
        }
    }

    /// Drive all event sources
    pub async fn run(&self) {
        futures::join!(
            self.run_product_feed(),
            self.run_card_changes(),
            self.run_wallet_events(),
        );
    }

    fn settle(&self, outcome: Result<BackendReceipt>, product: Option<Product>) -> Result<BackendReceipt> {
        match outcome {
            Ok(receipt) => {
                self.complete(product)?;
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Checkout failed");
                self.dispatch(CheckoutEvent::Failed(err.user_message()))?;
                Err(err)
            }
        }
    }

    /// Success path; the transition goes first so a rejected `Succeeded`
    /// leaves the widgets, selection and notifications untouched
    fn complete(&self, product: Option<Product>) -> Result<()> {
        self.dispatch(CheckoutEvent::Succeeded)?;

        self.card.clear();
        self.wallet.detach();
        self.state.send_modify(|model| model.product = None);
        self.products.select(None);
        self.notifier.notify(&self.config.success_notification);

        let product_id = product.map(|p| p.id);
        tracing::info!(
            action = %self.config.action,
            product = ?product_id,
            "Checkout completed"
        );
        self.analytics
            .log_event(&AnalyticsEvent::upgrade(self.config.action, product_id));

        Ok(())
    }

    /// Run `event` through the transition function and publish the result
    fn dispatch(&self, event: CheckoutEvent) -> Result<()> {
        let mut outcome = Ok(());

        self.state.send_if_modified(|model| match model.phase.transition(&event) {
            Ok(next) => {
                tracing::debug!(from = ?model.phase, to = ?next, "Checkout transition");
                let changed = next != model.phase;
                model.phase = next;
                changed
            }
            Err(err) => {
                tracing::warn!(error = %err, "Rejected checkout event");
                outcome = Err(err);
                false
            }
        });

        outcome
    }
}

/// Builder for [`Checkout`]
#[derive(Default)]
pub struct CheckoutBuilder {
    config: CheckoutConfig,
    backend: Option<Rc<dyn PaymentBackend>>,
    card: Option<Rc<dyn CardAdapter>>,
    wallet: Option<Rc<dyn WalletAdapter>>,
    notifier: Option<Rc<dyn Notifier>>,
    analytics: Option<Rc<dyn Analytics>>,
    products: Option<ProductSelection>,
}

impl CheckoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(mut self, config: CheckoutConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn action(mut self, action: CheckoutAction) -> Self {
        self.config.action = action;
        self
    }

    #[must_use]
    pub fn allow_coupons(mut self, allow: bool) -> Self {
        self.config.allow_coupons = allow;
        self
    }

    #[must_use]
    pub fn backend(mut self, backend: Rc<dyn PaymentBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub fn card(mut self, card: Rc<dyn CardAdapter>) -> Self {
        self.card = Some(card);
        self
    }

    #[must_use]
    pub fn wallet(mut self, wallet: Rc<dyn WalletAdapter>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    #[must_use]
    pub fn notifier(mut self, notifier: Rc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn analytics(mut self, analytics: Rc<dyn Analytics>) -> Self {
        self.analytics = Some(analytics);
        self
    }

    /// Share an existing product channel (e.g. with a pricing page)
    #[must_use]
    pub fn products(mut self, products: ProductSelection) -> Self {
        self.products = Some(products);
        self
    }

    pub fn build(self) -> Result<Checkout> {
        self.config.validate()?;

        let missing = |what: &str| CheckoutError::Config(format!("{what} is required"));
        let (state, _rx) = watch::channel(CheckoutModel::default());

        Ok(Checkout {
            backend: self.backend.ok_or_else(|| missing("Payment backend"))?,
            card: self.card.ok_or_else(|| missing("Card adapter"))?,
            wallet: self.wallet.ok_or_else(|| missing("Wallet adapter"))?,
            notifier: self.notifier.ok_or_else(|| missing("Notifier"))?,
            analytics: self.analytics.ok_or_else(|| missing("Analytics sink"))?,
            products: self.products.unwrap_or_default(),
            config: self.config,
            state,
            busy: Mutex::new(()),
        })
    }
}
