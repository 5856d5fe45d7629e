//! In-Memory Collaborators
//!
//! For testing and demo purposes. Every mock records what it was asked to do
//! so tests can assert on side effects.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::{mpsc, Notify};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::model::{
    AnalyticsEvent, BackendReceipt, CapturedOrder, CardChange, CouponResult, Notification,
    SourceToken,
};
use crate::ports::{
    AdapterError, Analytics, CardAdapter, CardChanges, Notifier, OrderCapture, PaymentBackend,
    ProviderError, ServiceError, ServiceResult, TokenizeError, WalletAdapter, WalletEvent,
    WalletEvents,
};

/// A call received by [`MockBackend`]
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    GetCoupon(String),
    CreateSubscription {
        plan_id: String,
        coupon_id: Option<String>,
    },
    CreateOrder {
        sku: String,
        coupon_id: Option<String>,
    },
    SetSource,
    PaypalHandler(CapturedOrder),
}

/// Scriptable payment backend
pub struct MockBackend {
    coupons: RefCell<HashMap<String, ServiceResult<CouponResult>>>,
    outcome: RefCell<ServiceResult<BackendReceipt>>,
    gate: RefCell<Option<Rc<Notify>>>,
    calls: RefCell<Vec<BackendCall>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            coupons: RefCell::new(HashMap::new()),
            outcome: RefCell::new(Ok(BackendReceipt(serde_json::json!({ "ok": true })))),
            gate: RefCell::new(None),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Answer lookups of `code` with `result`
    pub fn with_coupon(self, code: &str, result: ServiceResult<CouponResult>) -> Self {
        self.coupons.borrow_mut().insert(code.to_string(), result);
        self
    }

    /// Outcome of every charge / source / wallet call
    pub fn set_outcome(&self, outcome: ServiceResult<BackendReceipt>) {
        *self.outcome.borrow_mut() = outcome;
    }

    /// Hold charge calls until `gate` is notified
    pub fn hold_until(&self, gate: Rc<Notify>) {
        *self.gate.borrow_mut() = Some(gate);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.borrow().clone()
    }

    async fn settle(&self, call: BackendCall) -> ServiceResult<BackendReceipt> {
        self.calls.borrow_mut().push(call);
        let gate = self.gate.borrow().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.outcome.borrow().clone()
    }
}

#[async_trait(?Send)]
impl PaymentBackend for MockBackend {
    async fn get_coupon(&self, code: &str) -> ServiceResult<CouponResult> {
        self.calls.borrow_mut().push(BackendCall::GetCoupon(code.to_string()));
        self.coupons.borrow().get(code).cloned().unwrap_or_else(|| {
            Ok(CouponResult {
                id: code.to_string(),
                valid: false,
                percent_off: None,
                amount_off: None,
            })
        })
    }

    async fn create_subscription(
        &self,
        _source: &SourceToken,
        plan_id: &str,
        coupon_id: Option<&str>,
    ) -> ServiceResult<BackendReceipt> {
        self.settle(BackendCall::CreateSubscription {
            plan_id: plan_id.to_string(),
            coupon_id: coupon_id.map(str::to_string),
        })
        .await
    }

    async fn create_order(
        &self,
        _source: &SourceToken,
        sku: &str,
        coupon_id: Option<&str>,
    ) -> ServiceResult<BackendReceipt> {
        self.settle(BackendCall::CreateOrder {
            sku: sku.to_string(),
            coupon_id: coupon_id.map(str::to_string),
        })
        .await
    }

    async fn set_source(&self, _source: &SourceToken) -> ServiceResult<BackendReceipt> {
        self.settle(BackendCall::SetSource).await
    }

    async fn paypal_handler(&self, order: &CapturedOrder) -> ServiceResult<BackendReceipt> {
        self.settle(BackendCall::PaypalHandler(order.clone())).await
    }
}

/// Card widget double
pub struct MockCardAdapter {
    attached: Cell<bool>,
    attach_count: Cell<usize>,
    clear_count: Cell<usize>,
    tokenize_count: Cell<usize>,
    token: RefCell<Result<SourceToken, TokenizeError>>,
    changes_tx: mpsc::UnboundedSender<CardChange>,
    changes_rx: RefCell<Option<mpsc::UnboundedReceiver<CardChange>>>,
}

impl Default for MockCardAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCardAdapter {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            attached: Cell::new(false),
            attach_count: Cell::new(0),
            clear_count: Cell::new(0),
            tokenize_count: Cell::new(0),
            token: RefCell::new(Ok(SourceToken::new("src_test"))),
            changes_tx: tx,
            changes_rx: RefCell::new(Some(rx)),
        }
    }

    /// Make the next tokenizations fail with `message`
    pub fn decline(&self, message: &str) {
        *self.token.borrow_mut() = Err(TokenizeError(message.to_string()));
    }

    /// Make the next tokenizations succeed with `token`
    pub fn accept(&self, token: &str) {
        *self.token.borrow_mut() = Ok(SourceToken::new(token));
    }

    pub fn emit_change(&self, event: serde_json::Value) {
        // Receiver may already be dropped after the pump stopped.
        let _ = self.changes_tx.send(CardChange(event));
    }

    pub fn attach_count(&self) -> usize {
        self.attach_count.get()
    }

    pub fn clear_count(&self) -> usize {
        self.clear_count.get()
    }

    pub fn tokenize_count(&self) -> usize {
        self.tokenize_count.get()
    }
}

#[async_trait(?Send)]
impl CardAdapter for MockCardAdapter {
    fn attach(&self, _target: &str) -> Result<(), AdapterError> {
        if !self.attached.get() {
            self.attached.set(true);
            self.attach_count.set(self.attach_count.get() + 1);
        }
        Ok(())
    }

    fn detach(&self) {
        self.attached.set(false);
    }

    fn is_attached(&self) -> bool {
        self.attached.get()
    }

    async fn tokenize(&self) -> Result<SourceToken, TokenizeError> {
        self.tokenize_count.set(self.tokenize_count.get() + 1);
        self.token.borrow().clone()
    }

    fn clear(&self) {
        self.clear_count.set(self.clear_count.get() + 1);
    }

    fn take_changes(&self) -> Option<CardChanges> {
        self.changes_rx
            .borrow_mut()
            .take()
            .map(|rx| UnboundedReceiverStream::new(rx).boxed_local())
    }
}

/// Wallet button double
pub struct MockWalletAdapter {
    rendered_in: RefCell<Option<String>>,
    attach_count: Cell<usize>,
    detach_count: Cell<usize>,
    events_tx: mpsc::UnboundedSender<WalletEvent>,
    events_rx: RefCell<Option<mpsc::UnboundedReceiver<WalletEvent>>>,
}

impl Default for MockWalletAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWalletAdapter {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            rendered_in: RefCell::new(None),
            attach_count: Cell::new(0),
            detach_count: Cell::new(0),
            events_tx: tx,
            events_rx: RefCell::new(Some(rx)),
        }
    }

    /// Simulate a button callback
    pub fn emit(&self, event: WalletEvent) {
        let _ = self.events_tx.send(event);
    }

    pub fn rendered_in(&self) -> Option<String> {
        self.rendered_in.borrow().clone()
    }

    pub fn attach_count(&self) -> usize {
        self.attach_count.get()
    }

    pub fn detach_count(&self) -> usize {
        self.detach_count.get()
    }
}

impl WalletAdapter for MockWalletAdapter {
    fn attach(&self, target: &str) -> Result<(), AdapterError> {
        self.detach();
        *self.rendered_in.borrow_mut() = Some(target.to_string());
        self.attach_count.set(self.attach_count.get() + 1);
        Ok(())
    }

    fn detach(&self) {
        if self.rendered_in.borrow_mut().take().is_some() {
            self.detach_count.set(self.detach_count.get() + 1);
        }
    }

    fn take_events(&self) -> Option<WalletEvents> {
        self.events_rx
            .borrow_mut()
            .take()
            .map(|rx| UnboundedReceiverStream::new(rx).boxed_local())
    }
}

/// Capture handle with a fixed outcome
pub struct MockCapture {
    result: Result<CapturedOrder, ProviderError>,
    captured: Rc<Cell<bool>>,
}

impl MockCapture {
    pub fn ok(order: serde_json::Value) -> Self {
        Self {
            result: Ok(CapturedOrder(order)),
            captured: Rc::new(Cell::new(false)),
        }
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            result: Err(ProviderError(detail.to_string())),
            captured: Rc::new(Cell::new(false)),
        }
    }

    /// Flag set once `capture` ran
    pub fn captured_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.captured)
    }
}

#[async_trait(?Send)]
impl OrderCapture for MockCapture {
    async fn capture(self: Box<Self>) -> Result<CapturedOrder, ProviderError> {
        self.captured.set(true);
        self.result
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.sent.borrow_mut().push(notification.clone());
    }
}

#[derive(Default)]
pub struct RecordingAnalytics {
    events: RefCell<Vec<AnalyticsEvent>>,
}

impl RecordingAnalytics {
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.borrow().clone()
    }
}

impl Analytics for RecordingAnalytics {
    fn log_event(&self, event: &AnalyticsEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Shorthand for a backend error
pub fn rejected(message: &str) -> ServiceError {
    ServiceError::rejected(message)
}
