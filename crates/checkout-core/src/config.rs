//! Checkout Configuration

use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};
use crate::model::{CheckoutAction, Notification};

/// Minimum discounted total enforced for a product
///
/// Wallet orders below `min_total` are refused locally with `message`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountCap {
    pub product_id: String,

    /// Minor units
    pub min_total: i64,

    pub message: String,
}

/// Checkout settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Charge the product or only store the card
    #[serde(default)]
    pub action: CheckoutAction,

    /// Show the coupon form and accept lookups
    #[serde(default)]
    pub allow_coupons: bool,

    /// ISO currency code sent to the wallet provider
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Selector of the card widget container
    #[serde(default = "default_card_element")]
    pub card_element: String,

    /// Selector of the wallet button container
    #[serde(default = "default_wallet_element")]
    pub wallet_element: String,

    #[serde(default = "default_discount_caps")]
    pub discount_caps: Vec<DiscountCap>,

    #[serde(default = "default_success_notification")]
    pub success_notification: Notification,
}

fn default_currency() -> String {
    "USD".into()
}

fn default_card_element() -> String {
    "#card-element".into()
}

fn default_wallet_element() -> String {
    "#paypal-element".into()
}

fn default_discount_caps() -> Vec<DiscountCap> {
    vec![DiscountCap {
        product_id: "proLifetime".into(),
        min_total: 20000,
        message: "Coupon exceeds max discount on Lifetime access, try a different coupon ".into(),
    }]
}

fn default_success_notification() -> Notification {
    Notification {
        title: "Success!".into(),
        text: "Thank you :)".into(),
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            action: CheckoutAction::default(),
            allow_coupons: false,
            currency: default_currency(),
            card_element: default_card_element(),
            wallet_element: default_wallet_element(),
            discount_caps: default_discount_caps(),
            success_notification: default_success_notification(),
        }
    }
}

impl CheckoutConfig {
    /// Read overrides from `CHECKOUT_ACTION`, `CHECKOUT_ALLOW_COUPONS` and `CHECKOUT_CURRENCY`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(action) = std::env::var("CHECKOUT_ACTION") {
            config.action = CheckoutAction::parse(&action)
                .ok_or_else(|| CheckoutError::Config(format!("unknown CHECKOUT_ACTION: {action}")))?;
        }

        if let Ok(flag) = std::env::var("CHECKOUT_ALLOW_COUPONS") {
            config.allow_coupons = matches!(flag.trim(), "1" | "true" | "yes");
        }

        if let Ok(currency) = std::env::var("CHECKOUT_CURRENCY") {
            config.currency = currency.trim().to_uppercase();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.currency.trim().is_empty() {
            return Err(CheckoutError::Config("currency must not be empty".into()));
        }
        if self.card_element.trim().is_empty() || self.wallet_element.trim().is_empty() {
            return Err(CheckoutError::Config("element selectors must not be empty".into()));
        }
        Ok(())
    }

    /// Business rule violated by `total` for `product_id`, if any
    pub fn discount_violation(&self, product_id: &str, total: i64) -> Option<&DiscountCap> {
        self.discount_caps
            .iter()
            .find(|cap| cap.product_id == product_id && total < cap.min_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: CheckoutConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CheckoutConfig::default());
        assert_eq!(config.action, CheckoutAction::Purchase);
        assert_eq!(config.currency, "USD");
    }

    #[test]
    fn test_lifetime_discount_cap() {
        let config = CheckoutConfig::default();
        assert!(config.discount_violation("proLifetime", 19999).is_some());
        assert!(config.discount_violation("proLifetime", 20000).is_none());
        assert!(config.discount_violation("proMonthly", 100).is_none());
    }

    #[test]
    fn test_validate_rejects_empty_currency() {
        let config = CheckoutConfig {
            currency: " ".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CheckoutError::Config(_))));
    }
}
