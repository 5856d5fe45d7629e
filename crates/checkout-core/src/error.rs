//! Error Types

use thiserror::Error;

use crate::machine::{CheckoutEvent, CheckoutPhase};

/// Result type alias for checkout operations
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Checkout error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Another checkout operation is still outstanding
    #[error("Checkout busy: another payment operation is in progress")]
    Busy,

    /// No product is currently selected
    #[error("No product selected")]
    NoProductSelected,

    /// Product cannot be purchased with the requested flow
    #[error("Unsupported product {product_id}: {reason}")]
    UnsupportedProduct { product_id: String, reason: String },

    /// Coupons are not enabled for this form
    #[error("Coupons are disabled")]
    CouponsDisabled,

    /// Event not accepted in the current phase
    #[error("Illegal transition: {event:?} in phase {from:?}")]
    IllegalTransition {
        from: CheckoutPhase,
        event: CheckoutEvent,
    },

    /// Card provider rejected the input
    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    /// Payment backend returned an error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Card or wallet provider reported a failure
    #[error("Provider error: {0}")]
    Provider(String),

    /// Local business rule blocked the order
    #[error("Business rule violated: {0}")]
    BusinessRule(String),

    /// Widget could not be mounted
    #[error("Adapter error: {0}")]
    Adapter(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CheckoutError {
    /// Check if the user may simply try again
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Busy | Self::Tokenization(_) | Self::Backend(_) | Self::Provider(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Busy => "A payment is already being processed.".into(),
            Self::NoProductSelected => "Please select a plan first.".into(),
            Self::CouponsDisabled => "Coupons are not available for this purchase.".into(),
            Self::Tokenization(msg) | Self::Backend(msg) | Self::BusinessRule(msg) => msg.clone(),
            Self::Provider(_) => "Payment provider error, please try again.".into(),
            Self::UnsupportedProduct { .. } => self.to_string(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(CheckoutError::Busy.is_retryable());
        assert!(CheckoutError::Backend("boom".into()).is_retryable());
        assert!(!CheckoutError::CouponsDisabled.is_retryable());
    }

    #[test]
    fn test_user_message_passes_backend_text_through() {
        let err = CheckoutError::Backend("Card expired".into());
        assert_eq!(err.user_message(), "Card expired");
    }
}
