//! Checkout Domain Model
//!
//! Products, coupons, opaque provider tokens and the payloads this component
//! hands to its collaborators.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

/// How a product is billed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductKind {
    /// Recurring plan, charged through `createSubscription`
    #[serde(rename = "subscribe", alias = "subscription")]
    Subscription,

    /// One-time order, charged through `createOrder` or the wallet
    #[serde(rename = "order", alias = "one-time-order")]
    Order,

    /// Anything else the catalogue may contain
    #[serde(other)]
    Unsupported,
}

/// A purchasable product, immutable for the duration of one checkout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,

    pub sku: String,

    /// Price in minor currency units
    pub price: i64,

    #[serde(rename = "type")]
    pub kind: ProductKind,

    #[serde(default)]
    pub description: String,

    /// Billing plan (subscriptions only)
    #[serde(default)]
    pub plan_id: Option<String>,
}

impl Product {
    pub fn subscription(id: impl Into<String>, plan_id: impl Into<String>, price: i64) -> Self {
        let id = id.into();
        Self {
            sku: id.clone(),
            id,
            price,
            kind: ProductKind::Subscription,
            description: String::new(),
            plan_id: Some(plan_id.into()),
        }
    }

    pub fn order(id: impl Into<String>, sku: impl Into<String>, price: i64) -> Self {
        Self {
            id: id.into(),
            sku: sku.into(),
            price,
            kind: ProductKind::Order,
            description: String::new(),
            plan_id: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Plan identifier of a subscription product
    pub fn plan(&self) -> Result<&str> {
        self.plan_id
            .as_deref()
            .ok_or_else(|| CheckoutError::UnsupportedProduct {
                product_id: self.id.clone(),
                reason: "subscription has no plan id".into(),
            })
    }

    pub fn is_order(&self) -> bool {
        self.kind == ProductKind::Order
    }
}

/// What a successful card submission does on the backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutAction {
    /// Charge the selected product
    #[default]
    Purchase,

    /// Only store the card as the customer's payment source
    Source,
}

impl CheckoutAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Source => "source",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "purchase" => Some(Self::Purchase),
            "source" => Some(Self::Source),
            _ => None,
        }
    }
}

impl std::fmt::Display for CheckoutAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend coupon lookup result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponResult {
    pub id: String,

    pub valid: bool,

    /// Percentage discount (e.g. `25` for 25% off)
    #[serde(default, alias = "percent_off")]
    pub percent_off: Option<Decimal>,

    /// Fixed discount in minor currency units
    #[serde(default, alias = "amount_off")]
    pub amount_off: Option<i64>,
}

/// Coupon region of the checkout
///
/// A single enum so an applied coupon and a coupon error can never coexist.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CouponState {
    #[default]
    Empty,
    Loading,
    Applied(CouponResult),
    Rejected,
}

impl CouponState {
    pub const fn result(&self) -> Option<&CouponResult> {
        match self {
            Self::Applied(coupon) => Some(coupon),
            _ => None,
        }
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    pub fn coupon_id(&self) -> Option<&str> {
        self.result().map(|c| c.id.as_str())
    }
}

/// Single-use payment-method token from the card provider
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceToken(String);

impl SourceToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SourceToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SourceToken(..)")
    }
}

/// Wallet order after capture, forwarded verbatim to the backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapturedOrder(pub serde_json::Value);

/// Opaque success payload returned by the backend
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendReceipt(pub serde_json::Value);

/// Raw card validation event as emitted by the provider
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardChange(pub serde_json::Value);

/// Money amount in the wallet provider's wire format
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAmount {
    pub currency_code: String,

    /// Major units with two decimals, e.g. `"49.00"`
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseUnit {
    pub description: String,
    pub reference_id: String,
    pub amount: OrderAmount,
}

/// Order payload handed to the wallet provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub purchase_units: Vec<PurchaseUnit>,
}

impl OrderRequest {
    pub fn single(product: &Product, currency: &str, value: String) -> Self {
        Self {
            purchase_units: vec![PurchaseUnit {
                description: product.description.clone(),
                reference_id: product.sku.clone(),
                amount: OrderAmount {
                    currency_code: currency.to_string(),
                    value,
                },
            }],
        }
    }
}

/// User-facing notification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub text: String,
}

/// Analytics event emitted after a completed checkout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub name: String,

    /// Checkout action (`purchase` or `source`)
    pub value: String,

    /// Product id, if one was selected
    pub product: Option<String>,

    pub occurred_at: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub const UPGRADE: &'static str = "pro_upgrade";

    pub fn upgrade(action: CheckoutAction, product: Option<String>) -> Self {
        Self {
            name: Self::UPGRADE.into(),
            value: action.as_str().into(),
            product,
            occurred_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_product_kind_wire_names() {
        let p: Product = serde_json::from_str(
            r#"{"id":"proMonthly","sku":"pm","price":1000,"type":"subscribe","planId":"p1"}"#,
        )
        .unwrap();
        assert_eq!(p.kind, ProductKind::Subscription);
        assert_eq!(p.plan().unwrap(), "p1");

        let p: Product = serde_json::from_str(
            r#"{"id":"proLifetime","sku":"pl","price":25000,"type":"one-time-order"}"#,
        )
        .unwrap();
        assert!(p.is_order());

        let p: Product =
            serde_json::from_str(r#"{"id":"x","sku":"x","price":1,"type":"gift"}"#).unwrap();
        assert_eq!(p.kind, ProductKind::Unsupported);
    }

    #[test]
    fn test_subscription_without_plan() {
        let mut p = Product::subscription("proMonthly", "p1", 1000);
        p.plan_id = None;
        assert!(matches!(
            p.plan(),
            Err(CheckoutError::UnsupportedProduct { .. })
        ));
    }

    #[test]
    fn test_coupon_deserializes_stripe_fields() {
        let c: CouponResult =
            serde_json::from_str(r#"{"id":"HALF","valid":true,"percent_off":"50"}"#).unwrap();
        assert_eq!(c.percent_off, Some(dec!(50)));
        assert_eq!(c.amount_off, None);
    }

    #[test]
    fn test_order_request_wire_format() {
        let product = Product::order("proLifetime", "sku_life", 25000).with_description("Lifetime");
        let order = OrderRequest::single(&product, "USD", "250.00".into());
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["purchase_units"][0]["reference_id"], "sku_life");
        assert_eq!(json["purchase_units"][0]["amount"]["currency_code"], "USD");
        assert_eq!(json["purchase_units"][0]["amount"]["value"], "250.00");
    }

    #[test]
    fn test_source_token_debug_is_redacted() {
        let token = SourceToken::new("src_secret");
        assert_eq!(format!("{token:?}"), "SourceToken(..)");
    }
}
