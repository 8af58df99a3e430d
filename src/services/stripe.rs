//! Stripe payment intents and webhook verification.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use std::collections::BTreeMap;

use crate::utils::error::AppError;

const STRIPE_API_URL: &str = "https://api.stripe.com/v1";

/// Signed webhooks older than this are treated as replays.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";

type HmacSha256 = Hmac<Sha256>;

/// Currencies the processor charges in whole units, with no minor unit.
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "bif", "clp", "djf", "gnf", "jpy", "kmf", "krw", "mga", "pyg", "rwf", "ugx", "vnd", "vuv",
    "xaf", "xof", "xpf",
];

/// Decimal places between a currency's major unit and the integer amount
/// sent to the processor.
pub fn minor_unit_scale(currency: &str) -> u32 {
    let currency = currency.trim().to_ascii_lowercase();
    if ZERO_DECIMAL_CURRENCIES.contains(&currency.as_str()) {
        0
    } else {
        2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentRequest {
    /// Amount in the currency's minor unit.
    pub amount: i64,
    pub currency: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_payment_intent(&self, request: PaymentIntentRequest) -> Result<PaymentIntent, AppError>;
}

#[derive(Clone)]
pub struct StripeClient {
    http: Client,
    api_url: String,
    secret_key: Option<String>,
}

impl StripeClient {
    pub fn new(secret_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            api_url: STRIPE_API_URL.to_string(),
            secret_key,
        }
    }

    fn form(request: &PaymentIntentRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("amount".to_string(), request.amount.to_string()),
            ("currency".to_string(), request.currency.to_lowercase()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        form.extend(
            request
                .metadata
                .iter()
                .map(|(key, value)| (format!("metadata[{key}]"), value.clone())),
        );
        form
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_payment_intent(&self, request: PaymentIntentRequest) -> Result<PaymentIntent, AppError> {
        let secret_key = self
            .secret_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("STRIPE_SECRET_KEY is not configured".into()))?;

        let response = self
            .http
            .post(format!("{}/payment_intents", self.api_url))
            .bearer_auth(secret_key)
            .form(&Self::form(&request))
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Stripe request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Stripe rejected payment intent");
            return Err(AppError::ExternalServiceError(format!(
                "Payment processor returned {status}"
            )));
        }

        let intent = response
            .json::<PaymentIntent>()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Unreadable Stripe response: {e}")))?;

        tracing::info!(intent_id = %intent.id, amount = request.amount, "Payment intent created");
        Ok(intent)
    }
}

/// Checks a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=<hex>...]`)
/// against the raw request body.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), AppError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| AppError::WebhookSignature("missing or invalid timestamp".into()))?;
    if signatures.is_empty() {
        return Err(AppError::WebhookSignature("missing v1 signature".into()));
    }
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(AppError::WebhookSignature("timestamp outside tolerance".into()));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::InternalServerError(format!("Invalid webhook secret: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    let matched = signatures.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(AppError::WebhookSignature("signature mismatch".into()))
    }
}

/// The webhook events the order lifecycle reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    PaymentSucceeded { intent_id: String },
    PaymentFailed { intent_id: String },
    Ignored { event_type: String },
}

impl WebhookEvent {
    pub fn parse(payload: &[u8]) -> Result<Self, AppError> {
        let body: Value = serde_json::from_slice(payload)
            .map_err(|e| AppError::ValidationError(format!("Malformed webhook payload: {e}")))?;

        let event_type = body
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        let intent_id = || {
            body.pointer("/data/object/id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    AppError::ValidationError(format!("{event_type} event without a payment intent id"))
                })
        };

        Ok(match event_type.as_str() {
            PAYMENT_SUCCEEDED => WebhookEvent::PaymentSucceeded {
                intent_id: intent_id()?,
            },
            PAYMENT_FAILED => WebhookEvent::PaymentFailed {
                intent_id: intent_id()?,
            },
            other => WebhookEvent::Ignored {
                event_type: other.to_string(),
            },
        })
    }
}
