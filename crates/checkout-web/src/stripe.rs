//! Stripe Card Element adapter

use std::cell::{Cell, RefCell};

use async_trait::async_trait;
use checkout_core::{AdapterError, CardAdapter, CardChange, CardChanges, SourceToken, TokenizeError};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::bindings::{self, JsCardElement, JsStripe};
use crate::interop::{js_message, to_js};

const FONT_CSS: &str = "https://use.typekit.net/rcr1opg.css";

#[derive(Serialize)]
struct ElementsOptions {
    fonts: Vec<FontSource>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FontSource {
    css_src: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CardOptions {
    style: serde_json::Value,
    icon_style: &'static str,
}

/// `createSource` resolution
#[derive(Deserialize)]
struct SourceResult {
    #[serde(default)]
    source: Option<StripeSource>,
    #[serde(default)]
    error: Option<StripeError>,
}

#[derive(Deserialize)]
struct StripeSource {
    id: String,
}

#[derive(Deserialize)]
struct StripeError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl SourceResult {
    fn into_token(self) -> Result<SourceToken, TokenizeError> {
        match (self.source, self.error) {
            (_, Some(error)) => Err(TokenizeError(
                error
                    .message
                    .or(error.code)
                    .unwrap_or_else(|| "card was declined".into()),
            )),
            (Some(source), None) => Ok(SourceToken::new(source.id)),
            (None, None) => Err(TokenizeError("no source returned".into())),
        }
    }
}

fn card_style() -> serde_json::Value {
    serde_json::json!({
        "base": {
            "color": "#32325d",
            "fontFamily": "sofia-pro, Helvetica, sans-serif",
            "fontSmoothing": "antialiased",
            "fontSize": "16px",
            "::placeholder": { "color": "#aab7c4" }
        },
        "invalid": {
            "color": "#fa755a",
            "iconColor": "#fa755a"
        }
    })
}

/// Card input rendered by Stripe Elements
pub struct StripeCardAdapter {
    stripe: JsStripe,
    card: JsCardElement,
    attached: Cell<bool>,
    changes: RefCell<Option<mpsc::UnboundedReceiver<CardChange>>>,
    _on_change: Closure<dyn FnMut(JsValue)>,
}

impl StripeCardAdapter {
    /// Create the Stripe client and card element (not yet mounted)
    pub fn new(publishable_key: &str) -> Result<Self, AdapterError> {
        let stripe = bindings::new_stripe(publishable_key)
            .map_err(|e| AdapterError(format!("Stripe.js unavailable: {}", js_message(&e))))?;

        let elements_options = to_js(&ElementsOptions {
            fonts: vec![FontSource { css_src: FONT_CSS }],
        })
        .map_err(|e| AdapterError(e.to_string()))?;
        let elements = stripe.elements(&elements_options);

        let card_options = to_js(&CardOptions {
            style: card_style(),
            icon_style: "solid",
        })
        .map_err(|e| AdapterError(e.to_string()))?;
        let card = elements.create_card("card", &card_options);

        let (tx, rx) = mpsc::unbounded_channel();
        let on_change = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            match serde_wasm_bindgen::from_value::<serde_json::Value>(event) {
                Ok(change) => {
                    let _ = tx.send(CardChange(change));
                }
                Err(e) => tracing::warn!(error = %e, "Unreadable card change event"),
            }
        });
        card.on("change", on_change.as_ref().unchecked_ref());

        Ok(Self {
            stripe,
            card,
            attached: Cell::new(false),
            changes: RefCell::new(Some(rx)),
            _on_change: on_change,
        })
    }
}

#[async_trait(?Send)]
impl CardAdapter for StripeCardAdapter {
    fn attach(&self, target: &str) -> Result<(), AdapterError> {
        if self.attached.get() {
            return Ok(());
        }
        self.card
            .mount(target)
            .map_err(|e| AdapterError(js_message(&e)))?;
        self.attached.set(true);
        tracing::debug!(target = %target, "Card element mounted");
        Ok(())
    }

    fn detach(&self) {
        if self.attached.replace(false) {
            self.card.unmount();
        }
    }

    fn is_attached(&self) -> bool {
        self.attached.get()
    }

    async fn tokenize(&self) -> Result<SourceToken, TokenizeError> {
        let resolved = JsFuture::from(self.stripe.create_source(&self.card))
            .await
            .map_err(|e| TokenizeError(js_message(&e)))?;

        let result: SourceResult =
            serde_wasm_bindgen::from_value(resolved).map_err(|e| TokenizeError(e.to_string()))?;
        result.into_token()
    }

    fn clear(&self) {
        self.card.clear();
    }

    fn take_changes(&self) -> Option<CardChanges> {
        self.changes
            .borrow_mut()
            .take()
            .map(|rx| UnboundedReceiverStream::new(rx).boxed_local())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: serde_json::Value) -> SourceResult {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_source_becomes_token() {
        let token = parse(serde_json::json!({ "source": { "id": "src_1", "type": "card" } }))
            .into_token()
            .unwrap();
        assert_eq!(token.as_str(), "src_1");
    }

    #[test]
    fn test_error_message_is_kept() {
        let err = parse(serde_json::json!({
            "error": { "message": "Your card number is incomplete.", "code": "incomplete_number" }
        }))
        .into_token()
        .unwrap_err();
        assert_eq!(err.0, "Your card number is incomplete.");
    }

    #[test]
    fn test_empty_result_is_an_error() {
        assert!(parse(serde_json::json!({})).into_token().is_err());
    }
}
