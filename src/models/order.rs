use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of an order. `Paid` and `Cancelled` are terminal; only the
/// payment webhook moves an order out of `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub xs2_event_id: String,
    pub xs2_event_name: Option<String>,
    pub xs2_ticket_ids: Vec<String>,
    pub quantity: i32,
    pub total_amount: Decimal,
    pub currency: String,
    pub stripe_payment_intent_id: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a caller supplies when creating an order. Status is always
/// `pending` at insert time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_email: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub xs2_event_id: String,
    #[serde(default)]
    pub xs2_event_name: Option<String>,
    pub xs2_ticket_ids: Vec<String>,
    pub quantity: i32,
    pub total_amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub stripe_payment_intent_id: Option<String>,
}

impl NewOrder {
    pub fn validate(&self) -> Result<(), String> {
        if self.customer_email.trim().is_empty() || !self.customer_email.contains('@') {
            return Err("customer_email must be a valid email address".into());
        }
        if self.xs2_event_id.trim().is_empty() {
            return Err("xs2_event_id is required".into());
        }
        if self.xs2_ticket_ids.is_empty() {
            return Err("xs2_ticket_ids must contain at least one ticket".into());
        }
        if self.quantity <= 0 {
            return Err("quantity must be positive".into());
        }
        if self.total_amount.is_sign_negative() {
            return Err("total_amount must not be negative".into());
        }
        if self.currency.trim().len() != 3 {
            return Err("currency must be a three-letter ISO code".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_order() -> NewOrder {
        NewOrder {
            customer_email: "fan@example.com".into(),
            customer_name: Some("Sam Fan".into()),
            xs2_event_id: "evt_123456".into(),
            xs2_event_name: Some("Final".into()),
            xs2_ticket_ids: vec!["tkt_1".into()],
            quantity: 2,
            total_amount: Decimal::new(15000, 2),
            currency: "eur".into(),
            stripe_payment_intent_id: None,
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(OrderStatus::Cancelled).unwrap(), "cancelled");
        assert_eq!(OrderStatus::Paid.as_str(), "paid");
    }

    #[test]
    fn validate_accepts_complete_order() {
        assert!(new_order().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_pieces() {
        let mut order = new_order();
        order.xs2_ticket_ids.clear();
        assert!(order.validate().is_err());

        let mut order = new_order();
        order.customer_email = "not-an-email".into();
        assert!(order.validate().is_err());

        let mut order = new_order();
        order.quantity = 0;
        assert!(order.validate().is_err());

        let mut order = new_order();
        order.currency = "euro".into();
        assert!(order.validate().is_err());
    }
}
