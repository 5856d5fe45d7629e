//! Request and response bodies

use checkout_core::{CapturedOrder, ServiceError, ServiceResult, SourceToken};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::HttpError;

pub const EMPTY_RESPONSE: &str = "Empty response from payment service";

#[derive(Serialize)]
pub struct CouponLookup<'a> {
    pub code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest<'a> {
    pub source: &'a SourceToken,
    pub plan_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_id: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCharge<'a> {
    pub source: &'a SourceToken,
    pub sku: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_id: Option<&'a str>,
}

#[derive(Serialize)]
pub struct SourceUpdate<'a> {
    pub source: &'a SourceToken,
}

#[derive(Serialize)]
pub struct WalletCapture<'a> {
    pub order: &'a CapturedOrder,
}

/// `{res?, serverError?}` envelope every endpoint answers with
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    res: Option<T>,
    server_error: Option<ServerError>,
}

#[derive(Deserialize)]
struct ServerError {
    message: String,
}

/// Map an HTTP status and body to the backend outcome
pub fn interpret<T: DeserializeOwned>(status: u16, body: &str) -> ServiceResult<T> {
    let success = (200..300).contains(&status);

    let envelope: Envelope<T> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if !success => return Err(HttpError::Status(status).into()),
        Err(e) => return Err(HttpError::Decode(e).into()),
    };

    match (envelope.server_error, envelope.res) {
        (Some(error), _) => Err(ServiceError::rejected(error.message)),
        (None, Some(res)) => Ok(res),
        (None, None) if success => Err(ServiceError::rejected(EMPTY_RESPONSE)),
        (None, None) => Err(HttpError::Status(status).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkout_core::CouponResult;
    use serde_json::{json, Value};

    #[test]
    fn test_res_is_returned() {
        let coupon: CouponResult =
            interpret(200, r#"{"res":{"id":"TEN","valid":true,"percentOff":"10"}}"#).unwrap();
        assert!(coupon.valid);
        assert_eq!(coupon.id, "TEN");
    }

    #[test]
    fn test_server_error_message_verbatim() {
        let err = interpret::<Value>(200, r#"{"serverError":{"message":"Your card was declined."}}"#)
            .unwrap_err();
        assert_eq!(err, ServiceError::rejected("Your card was declined."));
    }

    #[test]
    fn test_server_error_on_failure_status() {
        let err = interpret::<Value>(402, r#"{"serverError":{"message":"Payment required"}}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "Payment required");
    }

    #[test]
    fn test_empty_envelope() {
        let err = interpret::<Value>(200, "{}").unwrap_err();
        assert_eq!(err, ServiceError::rejected(EMPTY_RESPONSE));
    }

    #[test]
    fn test_non_json_error_page() {
        let err = interpret::<Value>(502, "<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(
            err,
            ServiceError::Transport("Payment service returned HTTP 502".into())
        );
    }

    #[test]
    fn test_garbage_success_body() {
        let err = interpret::<Value>(200, "not json").unwrap_err();
        assert!(matches!(err, ServiceError::Transport(_)));
    }

    #[test]
    fn test_request_bodies_use_camel_case() {
        let token = SourceToken::new("src_1");
        let body = serde_json::to_value(SubscriptionRequest {
            source: &token,
            plan_id: "p1",
            coupon_id: None,
        })
        .unwrap();
        assert_eq!(body, json!({ "source": "src_1", "planId": "p1" }));

        let body = serde_json::to_value(OrderCharge {
            source: &token,
            sku: "sku_life",
            coupon_id: Some("TEN"),
        })
        .unwrap();
        assert_eq!(
            body,
            json!({ "source": "src_1", "sku": "sku_life", "couponId": "TEN" })
        );
    }
}
