//! Checkout and the webhook-driven order lifecycle.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use super::inventory::InventoryProxy;
use super::stripe::{minor_unit_scale, verify_signature, PaymentIntentRequest, PaymentProcessor, WebhookEvent};
use crate::models::{NewOrder, OrderStatus};
use crate::store::OrderStore;
use crate::utils::error::AppError;

pub const DEFAULT_CURRENCY: &str = "eur";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutRequest {
    /// Amount in the currency's minor unit (cents, or whole yen).
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub metadata: Map<String, Value>,
    pub order: Option<CheckoutOrder>,
}

/// The order half of a checkout body. Everything is optional on the wire so
/// a malformed body is reported as a validation error, not a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutOrder {
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub xs2_event_id: String,
    pub xs2_event_name: Option<String>,
    pub xs2_ticket_ids: Vec<String>,
    pub quantity: Option<i32>,
    pub total_amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutReceipt {
    pub client_secret: String,
    pub order_id: Uuid,
}

impl CheckoutRequest {
    fn currency(&self) -> String {
        self.currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
            .to_lowercase()
    }

    fn intent_metadata(&self, event_id: &str) -> BTreeMap<String, String> {
        let mut metadata: BTreeMap<String, String> = self
            .metadata
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect();
        metadata.insert("event_id".to_string(), event_id.to_string());
        metadata
    }

    /// Checks the request shape and derives the order to insert.
    pub fn prepare(&self) -> Result<(i64, NewOrder), AppError> {
        let amount = self
            .amount
            .filter(|amount| *amount > 0)
            .ok_or_else(|| AppError::ValidationError("amount must be a positive integer in minor units".into()))?;
        let order = self
            .order
            .as_ref()
            .ok_or_else(|| AppError::ValidationError("order is required".into()))?;

        let ticket_ids: Vec<String> = order
            .xs2_ticket_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        let quantity = match order.quantity {
            Some(quantity) => quantity,
            None => i32::try_from(ticket_ids.len())
                .map_err(|_| AppError::ValidationError("too many tickets".into()))?,
        };

        let currency = self.currency();
        let new_order = NewOrder {
            customer_email: order.customer_email.trim().to_string(),
            customer_name: order.customer_name.clone(),
            xs2_event_id: order.xs2_event_id.trim().to_string(),
            xs2_event_name: order.xs2_event_name.clone(),
            xs2_ticket_ids: ticket_ids,
            quantity,
            total_amount: order
                .total_amount
                .unwrap_or_else(|| Decimal::new(amount, minor_unit_scale(&currency))),
            currency,
            stripe_payment_intent_id: None,
        };
        new_order.validate().map_err(AppError::ValidationError)?;

        Ok((amount, new_order))
    }
}

pub struct CheckoutService {
    inventory: Arc<InventoryProxy>,
    payments: Arc<dyn PaymentProcessor>,
    orders: Arc<dyn OrderStore>,
    webhook_secret: Option<String>,
}

impl CheckoutService {
    pub fn new(
        inventory: Arc<InventoryProxy>,
        payments: Arc<dyn PaymentProcessor>,
        orders: Arc<dyn OrderStore>,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            inventory,
            payments,
            orders,
            webhook_secret,
        }
    }

    /// Stock check, payment intent, pending order, in that order. Nothing
    /// is created when any ticket is unavailable.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutReceipt, AppError> {
        let (amount, mut new_order) = request.prepare()?;

        let unavailable = self
            .inventory
            .validate_stock(&new_order.xs2_ticket_ids)
            .await?;
        if !unavailable.is_empty() {
            return Err(AppError::UnavailableTickets(unavailable));
        }

        let intent = self
            .payments
            .create_payment_intent(PaymentIntentRequest {
                amount,
                currency: new_order.currency.clone(),
                metadata: request.intent_metadata(&new_order.xs2_event_id),
            })
            .await?;

        new_order.stripe_payment_intent_id = Some(intent.id.clone());
        let order = match self.orders.insert_order(new_order).await {
            Ok(order) => order,
            Err(e) => {
                // The intent exists at the processor but no order points at it.
                tracing::error!(intent_id = %intent.id, error = %e, "Order insert failed after payment intent creation");
                return Err(e);
            }
        };

        tracing::info!(order_id = %order.id, intent_id = %intent.id, amount, "Checkout created pending order");

        Ok(CheckoutReceipt {
            client_secret: intent.client_secret,
            order_id: order.id,
        })
    }

    pub async fn handle_webhook(&self, payload: &[u8], signature: Option<&str>) -> Result<WebhookEvent, AppError> {
        self.handle_webhook_at(payload, signature, Utc::now().timestamp())
            .await
    }

    /// Verifies and applies one webhook delivery. The store is only touched
    /// once the signature checks out.
    pub async fn handle_webhook_at(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: i64,
    ) -> Result<WebhookEvent, AppError> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or_else(|| AppError::Configuration("STRIPE_WEBHOOK_SECRET is not configured".into()))?;
        let signature = signature
            .ok_or_else(|| AppError::WebhookSignature("missing stripe-signature header".into()))?;

        verify_signature(payload, signature, secret, now)?;

        let event = WebhookEvent::parse(payload)?;
        let (intent_id, status) = match &event {
            WebhookEvent::PaymentSucceeded { intent_id } => (intent_id, OrderStatus::Paid),
            WebhookEvent::PaymentFailed { intent_id } => (intent_id, OrderStatus::Cancelled),
            WebhookEvent::Ignored { event_type } => {
                tracing::debug!(%event_type, "Ignoring webhook event");
                return Ok(event);
            }
        };

        let updated = self.orders.set_status_by_intent(intent_id, status).await?;
        if updated == 0 {
            tracing::warn!(%intent_id, status = status.as_str(), "Webhook matched no order");
        } else {
            tracing::info!(%intent_id, status = status.as_str(), updated, "Order status updated");
        }

        Ok(event)
    }
}
