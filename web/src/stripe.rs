//! Payment provider collaborator (Stripe-style API).
//!
//! Owns the HTTP calls to the provider and the webhook signature scheme. The
//! provider signs each webhook delivery with HMAC-SHA256 over
//! `"{timestamp}.{raw_body}"` and sends `t=<timestamp>,v1=<hex>` in the
//! signature header; verification must happen on the raw body before any
//! parsing.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::WebError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Webhook deliveries older than this are rejected as replays.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

/// Checkout session as returned by the provider; only the fields this service
/// consumes.
#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug)]
pub struct CheckoutParams<'a> {
    /// Minor currency units.
    pub amount: i64,
    pub currency: &'a str,
    pub product_name: &'a str,
    /// Marketplace share withheld before organizer payout, minor units.
    pub application_fee: i64,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
    /// Our event id, echoed back in webhook payloads for reconciliation.
    pub client_reference_id: &'a str,
}

impl StripeClient {
    pub fn new(secret_key: String) -> Self {
        Self::with_base_url(secret_key, "https://api.stripe.com".to_string())
    }

    pub fn with_base_url(secret_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            base_url,
        }
    }

    pub async fn create_checkout_session(
        &self,
        params: &CheckoutParams<'_>,
    ) -> Result<CheckoutSession, WebError> {
        let amount = params.amount.to_string();
        let fee = params.application_fee.to_string();

        let form = [
            ("mode", "payment"),
            ("success_url", params.success_url),
            ("cancel_url", params.cancel_url),
            ("client_reference_id", params.client_reference_id),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", params.currency),
            ("line_items[0][price_data][unit_amount]", amount.as_str()),
            (
                "line_items[0][price_data][product_data][name]",
                params.product_name,
            ),
            ("payment_intent_data[application_fee_amount]", fee.as_str()),
        ];

        let resp = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await
            .map_err(|e| WebError::ExternalService(format!("checkout session request: {e}")))?;

        if !resp.status().is_success() {
            return Err(WebError::ExternalService(format!(
                "checkout session creation failed with status {}",
                resp.status()
            )));
        }

        resp.json::<CheckoutSession>()
            .await
            .map_err(|e| WebError::ExternalService(format!("checkout session response: {e}")))
    }

    /// Returns the full charge to the payer. Used when a payment succeeds for
    /// a seat that no longer exists.
    pub async fn refund_payment(&self, payment_intent: &str) -> Result<(), WebError> {
        let resp = self
            .http
            .post(format!("{}/v1/refunds", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[("payment_intent", payment_intent)])
            .send()
            .await
            .map_err(|e| WebError::ExternalService(format!("refund request: {e}")))?;

        if !resp.status().is_success() {
            return Err(WebError::ExternalService(format!(
                "refund failed with status {}",
                resp.status()
            )));
        }

        Ok(())
    }
}

/// Provider webhook envelope; only the fields this service consumes.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: WebhookObject,
}

#[derive(Debug, Deserialize)]
pub struct WebhookObject {
    /// Checkout session id; matches `provider_ref` on our payment row.
    pub id: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
}

/// Verifies the provider signature over the raw request body.
///
/// `now_unix` is injected so the tolerance window is testable.
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    now_unix: i64,
) -> bool {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let Some(timestamp) = timestamp else {
        return false;
    };
    if candidates.is_empty() {
        return false;
    }
    if (now_unix - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return false;
    }

    let Some(expected) = compute_signature(payload, secret, timestamp) else {
        return false;
    };

    candidates
        .iter()
        .any(|candidate| constant_time_eq(candidate.as_bytes(), expected.as_bytes()))
}

fn compute_signature(payload: &[u8], secret: &str, timestamp: i64) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);

    Some(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const BODY: &[u8] = br#"{"type":"checkout.session.completed","data":{"object":{"id":"cs_123"}}}"#;

    fn signed_header(payload: &[u8], timestamp: i64) -> String {
        let signature = compute_signature(payload, SECRET, timestamp).unwrap();
        format!("t={timestamp},v1={signature}")
    }

    #[test]
    fn valid_signature_is_accepted() {
        let now = 1_750_000_000;
        let header = signed_header(BODY, now);
        assert!(verify_signature(BODY, &header, SECRET, now));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let now = 1_750_000_000;
        let header = signed_header(BODY, now);
        assert!(!verify_signature(b"{\"tampered\":true}", &header, SECRET, now));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = 1_750_000_000;
        let header = signed_header(BODY, now);
        assert!(!verify_signature(BODY, &header, "whsec_other", now));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let then = 1_750_000_000;
        let header = signed_header(BODY, then);
        assert!(!verify_signature(
            BODY,
            &header,
            SECRET,
            then + SIGNATURE_TOLERANCE_SECS + 1
        ));
    }

    #[test]
    fn timestamp_within_tolerance_is_accepted() {
        let then = 1_750_000_000;
        let header = signed_header(BODY, then);
        assert!(verify_signature(BODY, &header, SECRET, then + 120));
    }

    #[test]
    fn malformed_header_is_rejected() {
        let now = 1_750_000_000;
        assert!(!verify_signature(BODY, "", SECRET, now));
        assert!(!verify_signature(BODY, "v1=deadbeef", SECRET, now));
        assert!(!verify_signature(BODY, "t=abc,v1=deadbeef", SECRET, now));
        assert!(!verify_signature(BODY, &format!("t={now}"), SECRET, now));
    }

    #[test]
    fn any_matching_candidate_verifies() {
        let now = 1_750_000_000;
        let signature = compute_signature(BODY, SECRET, now).unwrap();
        let header = format!("t={now},v1=deadbeef,v1={signature}");
        assert!(verify_signature(BODY, &header, SECRET, now));
    }

    #[test]
    fn webhook_envelope_parses() {
        let event: WebhookEvent = serde_json::from_slice(BODY).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(event.data.object.id, "cs_123");
        assert!(event.data.object.payment_intent.is_none());
    }
}
