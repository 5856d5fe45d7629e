//! Payment Service Client

use async_trait::async_trait;
use checkout_core::{
    BackendReceipt, CapturedOrder, CouponResult, PaymentBackend, ServiceResult, SourceToken,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::HttpError;
use crate::wire::{self, CouponLookup, OrderCharge, SourceUpdate, SubscriptionRequest, WalletCapture};

/// Payment service connection settings
#[derive(Clone, Debug)]
pub struct HttpBackendConfig {
    /// Base URL, e.g. `https://example.com/api/payments`
    pub base_url: String,

    /// Sent as `Authorization: Bearer ...` when set
    pub bearer_token: Option<String>,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api/payments".into(),
            bearer_token: None,
        }
    }
}

impl HttpBackendConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("CHECKOUT_API_URL")
            .unwrap_or_else(|_| Self::default().base_url);
        let bearer_token = std::env::var("CHECKOUT_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        Self {
            base_url,
            bearer_token,
        }
    }
}

/// JSON-over-HTTP payment backend
pub struct HttpPaymentBackend {
    client: reqwest::Client,
    config: HttpBackendConfig,
}

impl HttpPaymentBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::from_config(HttpBackendConfig {
            base_url: base_url.into(),
            ..Default::default()
        })
    }

    pub fn from_config(config: HttpBackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_config(HttpBackendConfig::from_env())
    }

    pub const fn config(&self) -> &HttpBackendConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ServiceResult<T> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "Calling payment service");

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(HttpError::from)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(HttpError::from)?;

        let outcome = wire::interpret(status, &text);
        if let Err(e) = &outcome {
            tracing::warn!(url = %url, status, error = %e, "Payment service call failed");
        }
        outcome
    }
}

#[async_trait(?Send)]
impl PaymentBackend for HttpPaymentBackend {
    async fn get_coupon(&self, code: &str) -> ServiceResult<CouponResult> {
        self.post("coupon", &CouponLookup { code }).await
    }

    async fn create_subscription(
        &self,
        source: &SourceToken,
        plan_id: &str,
        coupon_id: Option<&str>,
    ) -> ServiceResult<BackendReceipt> {
        self.post(
            "subscription",
            &SubscriptionRequest {
                source,
                plan_id,
                coupon_id,
            },
        )
        .await
    }

    async fn create_order(
        &self,
        source: &SourceToken,
        sku: &str,
        coupon_id: Option<&str>,
    ) -> ServiceResult<BackendReceipt> {
        self.post(
            "order",
            &OrderCharge {
                source,
                sku,
                coupon_id,
            },
        )
        .await
    }

    async fn set_source(&self, source: &SourceToken) -> ServiceResult<BackendReceipt> {
        self.post("source", &SourceUpdate { source }).await
    }

    async fn paypal_handler(&self, order: &CapturedOrder) -> ServiceResult<BackendReceipt> {
        self.post("paypal", &WalletCapture { order }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let backend = HttpPaymentBackend::new("https://example.com/api/payments/");
        assert_eq!(
            backend.endpoint("coupon"),
            "https://example.com/api/payments/coupon"
        );
    }

    #[test]
    fn test_default_config() {
        let config = HttpBackendConfig::default();
        assert!(config.base_url.ends_with("/api/payments"));
        assert!(config.bearer_token.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let backend = HttpPaymentBackend::new("http://127.0.0.1:9");
        let err = backend.get_coupon("TEN").await.unwrap_err();
        assert!(matches!(err, checkout_core::ServiceError::Transport(_)));
    }
}
