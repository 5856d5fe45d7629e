//! Checkout State Machine
//!
//! `Idle → Validating → Processing → {Success, Error}`. `Error` goes back to
//! `Idle` on the next user action; `Success` is terminal until a new product
//! is selected.
//!
//! Every phase change goes through [`CheckoutPhase::transition`], so a state
//! with both `success` and a server error cannot be constructed.

use crate::error::{CheckoutError, Result};
use crate::model::{CardChange, CouponState, Product};

/// What the backend/provider is currently doing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessingStep {
    /// Card tokenized, waiting on the backend charge
    Charging,
    /// Wallet approved, waiting on provider capture
    CapturingWallet,
    /// Wallet captured, waiting on the backend to activate access
    ActivatingAccess,
}

/// Mutually exclusive checkout phases
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Validating,
    Processing(ProcessingStep),
    Success,
    Error(String),
}

/// Inputs to the transition function
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutEvent {
    SubmitCard,
    Tokenized,
    WalletApproved,
    WalletCaptured,
    Succeeded,
    Failed(String),
    Dismiss,
    Reset,
}

impl CheckoutPhase {
    /// Compute the next phase, rejecting events the current phase does not accept
    pub fn transition(&self, event: &CheckoutEvent) -> Result<Self> {
        use CheckoutEvent as E;
        use CheckoutPhase as P;

        let next = match (self, event) {
            (P::Idle | P::Error(_), E::SubmitCard) => P::Validating,
            (P::Validating, E::Tokenized) => P::Processing(ProcessingStep::Charging),
            (P::Idle | P::Error(_), E::WalletApproved) => {
                P::Processing(ProcessingStep::CapturingWallet)
            }
            (P::Processing(ProcessingStep::CapturingWallet), E::WalletCaptured) => {
                P::Processing(ProcessingStep::ActivatingAccess)
            }
            (P::Processing(_), E::Succeeded) => P::Success,
            (P::Success, E::Failed(_)) => return Err(self.illegal(event)),
            (_, E::Failed(message)) => P::Error(message.clone()),
            (P::Error(_), E::Dismiss) => P::Idle,
            (_, E::Dismiss) => self.clone(),
            (_, E::Reset) => P::Idle,
            _ => return Err(self.illegal(event)),
        };

        Ok(next)
    }

    fn illegal(&self, event: &CheckoutEvent) -> CheckoutError {
        CheckoutError::IllegalTransition {
            from: self.clone(),
            event: event.clone(),
        }
    }

    /// Progress label while an async call is outstanding
    pub const fn loading_state(&self) -> Option<&'static str> {
        match self {
            Self::Validating => Some("validating card..."),
            Self::Processing(ProcessingStep::Charging) => Some("processing..."),
            Self::Processing(ProcessingStep::CapturingWallet) => Some("processing payment..."),
            Self::Processing(ProcessingStep::ActivatingAccess) => {
                Some("success, setting up PRO access...")
            }
            _ => None,
        }
    }

    pub fn server_error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub const fn is_in_flight(&self) -> bool {
        matches!(self, Self::Validating | Self::Processing(_))
    }
}

/// Snapshot of everything the form renders
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CheckoutModel {
    pub phase: CheckoutPhase,
    pub product: Option<Product>,
    pub coupon: CouponState,
    /// Last raw validation event from the card widget
    pub card_state: Option<CardChange>,
}

impl CheckoutModel {
    pub fn loading_state(&self) -> Option<&'static str> {
        self.phase.loading_state()
    }

    pub fn server_error(&self) -> Option<&str> {
        self.phase.server_error()
    }

    pub const fn success(&self) -> bool {
        self.phase.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(events: &[CheckoutEvent]) -> Result<CheckoutPhase> {
        events
            .iter()
            .try_fold(CheckoutPhase::Idle, |phase, event| phase.transition(event))
    }

    #[test]
    fn test_card_happy_path() {
        let phase = run(&[
            CheckoutEvent::SubmitCard,
            CheckoutEvent::Tokenized,
            CheckoutEvent::Succeeded,
        ])
        .unwrap();
        assert!(phase.is_success());
        assert_eq!(phase.server_error(), None);
        assert_eq!(phase.loading_state(), None);
    }

    #[test]
    fn test_wallet_happy_path() {
        let phase = run(&[CheckoutEvent::WalletApproved]).unwrap();
        assert_eq!(phase.loading_state(), Some("processing payment..."));
        let phase = phase.transition(&CheckoutEvent::WalletCaptured).unwrap();
        assert_eq!(phase.loading_state(), Some("success, setting up PRO access..."));
        assert!(phase.transition(&CheckoutEvent::Succeeded).unwrap().is_success());
    }

    #[test]
    fn test_error_clears_loading() {
        let phase = run(&[
            CheckoutEvent::SubmitCard,
            CheckoutEvent::Failed("Unsuccessful card_declined".into()),
        ])
        .unwrap();
        assert_eq!(phase.server_error(), Some("Unsuccessful card_declined"));
        assert_eq!(phase.loading_state(), None);
        assert!(!phase.is_success());
    }

    #[test]
    fn test_error_allows_retry() {
        let phase = CheckoutPhase::Error("nope".into());
        assert_eq!(
            phase.transition(&CheckoutEvent::SubmitCard).unwrap(),
            CheckoutPhase::Validating
        );
        assert_eq!(
            phase.transition(&CheckoutEvent::Dismiss).unwrap(),
            CheckoutPhase::Idle
        );
    }

    #[test]
    fn test_success_is_terminal_until_reset() {
        let phase = CheckoutPhase::Success;
        assert!(phase.transition(&CheckoutEvent::SubmitCard).is_err());
        assert!(phase.transition(&CheckoutEvent::Failed("x".into())).is_err());
        assert_eq!(
            phase.transition(&CheckoutEvent::Dismiss).unwrap(),
            CheckoutPhase::Success
        );
        assert_eq!(
            phase.transition(&CheckoutEvent::Reset).unwrap(),
            CheckoutPhase::Idle
        );
    }

    #[test]
    fn test_double_submit_is_illegal() {
        let err = CheckoutPhase::Validating
            .transition(&CheckoutEvent::SubmitCard)
            .unwrap_err();
        assert!(matches!(err, CheckoutError::IllegalTransition { .. }));
        assert!(
            CheckoutPhase::Processing(ProcessingStep::Charging)
                .transition(&CheckoutEvent::WalletApproved)
                .is_err()
        );
    }

    #[test]
    fn test_tokenized_requires_validating() {
        assert!(CheckoutPhase::Idle.transition(&CheckoutEvent::Tokenized).is_err());
        assert!(
            CheckoutPhase::Processing(ProcessingStep::Charging)
                .transition(&CheckoutEvent::WalletCaptured)
                .is_err()
        );
    }
}
