//! PayPal Smart Buttons adapter
//!
//! The SDK drives the flow through three callbacks. Each one is turned into a
//! [`WalletEvent`] for the checkout; `createOrder` waits on a oneshot reply so
//! the order body (or a refusal) comes from the checkout's business rules, and
//! `onApprove` settles only after the checkout ran the capture.

use std::cell::RefCell;

use async_trait::async_trait;
use checkout_core::{
    AdapterError, CapturedOrder, OrderCapture, OrderRequest, ProviderError, WalletAdapter,
    WalletEvent, WalletEvents,
};
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::js_sys::{Object, Promise, Reflect};

use crate::bindings::{self, JsOrderActions, JsPaypalButtons};
use crate::interop::{clear_element, js_message, to_js};

type EventSender = mpsc::UnboundedSender<WalletEvent>;

/// JS callbacks handed to `paypal.Buttons`; dropped with the render
struct ButtonHooks {
    create_order: Closure<dyn FnMut(JsValue, JsValue) -> Promise>,
    on_approve: Closure<dyn FnMut(JsValue, JsValue) -> Promise>,
    on_error: Closure<dyn FnMut(JsValue)>,
}

impl ButtonHooks {
    fn new(events: &EventSender) -> Self {
        let tx = events.clone();
        let create_order = Closure::<dyn FnMut(JsValue, JsValue) -> Promise>::new(
            move |_data: JsValue, actions: JsValue| {
                let tx = tx.clone();
                future_to_promise(async move {
                    let (reply, answer) = oneshot::channel();
                    tx.send(WalletEvent::CreateOrder { reply })
                        .map_err(|_| JsValue::from_str("checkout is gone"))?;

                    match answer.await {
                        Ok(Some(order)) => submit_order(&actions.unchecked_into(), &order).await,
                        _ => Err(JsValue::from_str("order creation refused")),
                    }
                })
            },
        );

        let tx = events.clone();
        let on_approve = Closure::<dyn FnMut(JsValue, JsValue) -> Promise>::new(
            move |_data: JsValue, actions: JsValue| {
                let (settled, captured) = oneshot::channel();
                let capture = PaypalCapture {
                    actions: actions.unchecked_into(),
                    settled,
                };
                if tx.send(WalletEvent::Approved(Box::new(capture))).is_err() {
                    return Promise::reject(&JsValue::from_str("checkout is gone"));
                }

                future_to_promise(async move {
                    approval_outcome(captured.await)
                        .map(|()| JsValue::UNDEFINED)
                        .map_err(|message| JsValue::from_str(&message))
                })
            },
        );

        let tx = events.clone();
        let on_error = Closure::<dyn FnMut(JsValue)>::new(move |err: JsValue| {
            let _ = tx.send(WalletEvent::Failed(js_message(&err)));
        });

        Self {
            create_order,
            on_approve,
            on_error,
        }
    }

    fn options(&self) -> Result<JsValue, JsValue> {
        let options = Object::new();
        Reflect::set(&options, &"createOrder".into(), self.create_order.as_ref())?;
        Reflect::set(&options, &"onApprove".into(), self.on_approve.as_ref())?;
        Reflect::set(&options, &"onError".into(), self.on_error.as_ref())?;
        Ok(options.into())
    }
}

async fn submit_order(actions: &JsOrderActions, order: &OrderRequest) -> Result<JsValue, JsValue> {
    let body = to_js(order).map_err(|e| JsValue::from_str(&e.to_string()))?;
    JsFuture::from(actions.order().create_order(&body)).await
}

type CaptureSettled = Result<(), String>;

/// How the `onApprove` promise settles once the checkout has (or has not)
/// run the capture
fn approval_outcome(settled: Result<CaptureSettled, oneshot::error::RecvError>) -> CaptureSettled {
    settled.unwrap_or_else(|_| Err("payment was not captured".into()))
}

/// Capture handle for an approved order; settles the `onApprove` promise
struct PaypalCapture {
    actions: JsOrderActions,
    settled: oneshot::Sender<CaptureSettled>,
}

#[async_trait(?Send)]
impl OrderCapture for PaypalCapture {
    async fn capture(self: Box<Self>) -> Result<CapturedOrder, ProviderError> {
        let Self { actions, settled } = *self;

        let outcome = match JsFuture::from(actions.order().capture()).await {
            Ok(captured) => serde_wasm_bindgen::from_value(captured)
                .map(CapturedOrder)
                .map_err(|e| ProviderError(e.to_string())),
            Err(e) => Err(ProviderError(js_message(&e))),
        };

        let _ = settled.send(outcome.as_ref().map(|_| ()).map_err(|e| e.0.clone()));
        outcome
    }
}

struct Rendered {
    target: String,
    buttons: JsPaypalButtons,
    _hooks: ButtonHooks,
}

/// Wallet button rendered by the PayPal SDK
pub struct PaypalWalletAdapter {
    events_tx: EventSender,
    events_rx: RefCell<Option<mpsc::UnboundedReceiver<WalletEvent>>>,
    rendered: RefCell<Option<Rendered>>,
}

impl Default for PaypalWalletAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PaypalWalletAdapter {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            events_tx: tx,
            events_rx: RefCell::new(Some(rx)),
            rendered: RefCell::new(None),
        }
    }
}

impl WalletAdapter for PaypalWalletAdapter {
    fn attach(&self, target: &str) -> Result<(), AdapterError> {
        self.detach();
        clear_element(target);

        let hooks = ButtonHooks::new(&self.events_tx);
        let options = hooks.options().map_err(|e| AdapterError(js_message(&e)))?;
        let buttons = bindings::paypal_buttons(&options)
            .map_err(|e| AdapterError(format!("PayPal SDK unavailable: {}", js_message(&e))))?;

        let render = JsFuture::from(buttons.render(target));
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = render.await {
                tracing::warn!(error = %js_message(&e), "PayPal buttons failed to render");
            }
        });

        *self.rendered.borrow_mut() = Some(Rendered {
            target: target.to_string(),
            buttons,
            _hooks: hooks,
        });
        tracing::debug!(target = %target, "PayPal buttons rendered");
        Ok(())
    }

    fn detach(&self) {
        let Some(rendered) = self.rendered.borrow_mut().take() else {
            return;
        };
        let _ = rendered.buttons.close();
        clear_element(&rendered.target);
    }

    fn take_events(&self) -> Option<WalletEvents> {
        self.events_rx
            .borrow_mut()
            .take()
            .map(|rx| UnboundedReceiverStream::new(rx).boxed_local())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_approval_settles_with_capture() {
        let (settled, captured) = oneshot::channel();
        settled.send(Ok(())).unwrap();
        assert_eq!(approval_outcome(captured.await), Ok(()));
    }

    #[tokio::test]
    async fn test_approval_carries_capture_failure() {
        let (settled, captured) = oneshot::channel();
        settled.send(Err("INSTRUMENT_DECLINED".into())).unwrap();
        assert_eq!(
            approval_outcome(captured.await),
            Err("INSTRUMENT_DECLINED".to_string())
        );
    }

    #[tokio::test]
    async fn test_unclaimed_approval_rejects() {
        let (settled, captured) = oneshot::channel::<CaptureSettled>();
        drop(settled);
        assert!(approval_outcome(captured.await).is_err());
    }
}
