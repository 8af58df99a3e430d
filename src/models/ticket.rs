use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::event::{first_decimal, first_i64, first_str};

pub const AVAILABLE: &str = "available";

/// An upstream ticket listing. Never persisted; fetched per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub ticket_id: String,
    pub event_id: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub sub_category: Option<String>,
    pub ticket_type: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub stock: i64,
    pub ticket_status: Option<String>,
}

impl TicketRecord {
    pub fn from_upstream(value: &Value) -> Option<Self> {
        Some(Self {
            ticket_id: first_str(value, &["ticket_id", "id"])?,
            event_id: first_str(value, &["event_id"]),
            category_id: first_str(value, &["category_id"]),
            category_name: first_str(value, &["category_name", "ticket_title"]),
            sub_category: first_str(value, &["sub_category"]),
            ticket_type: first_str(value, &["type_ticket", "ticket_type"]),
            price: first_decimal(value, &["price", "net_rate"]),
            currency: first_str(value, &["currency_code", "currency"]),
            stock: first_i64(value, &["stock"]).unwrap_or(0),
            ticket_status: first_str(value, &["ticket_status", "status"]),
        })
    }

    /// True when the ticket can be sold right now.
    pub fn is_purchasable(&self) -> bool {
        self.stock > 0
            && self
                .ticket_status
                .as_deref()
                .is_some_and(|status| status.eq_ignore_ascii_case(AVAILABLE))
    }

    pub fn group_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.event_id.as_deref().unwrap_or_default(),
            self.category_id.as_deref().unwrap_or_default(),
            self.sub_category.as_deref().unwrap_or_default()
        )
    }
}

/// Tickets sharing event, category and sub-category, summarized for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketGroup {
    pub group_key: String,
    pub event_id: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub sub_category: Option<String>,
    pub ticket_type: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub currency: Option<String>,
    pub total_stock: i64,
    pub ticket_ids: Vec<String>,
}

impl TicketGroup {
    fn seed(ticket: &TicketRecord) -> Self {
        Self {
            group_key: ticket.group_key(),
            event_id: ticket.event_id.clone(),
            category_id: ticket.category_id.clone(),
            category_name: ticket.category_name.clone(),
            sub_category: ticket.sub_category.clone(),
            ticket_type: ticket.ticket_type.clone(),
            min_price: None,
            max_price: None,
            currency: ticket.currency.clone(),
            total_stock: 0,
            ticket_ids: Vec::new(),
        }
    }

    fn absorb(&mut self, ticket: &TicketRecord) {
        if let Some(price) = ticket.price {
            self.min_price = Some(self.min_price.map_or(price, |p| p.min(price)));
            self.max_price = Some(self.max_price.map_or(price, |p| p.max(price)));
        }
        self.total_stock += ticket.stock.max(0);
        self.ticket_ids.push(ticket.ticket_id.clone());
    }
}

/// Groups tickets by `(event_id, category_id, sub_category)`, ordered by key.
pub fn group_tickets(tickets: &[TicketRecord]) -> Vec<TicketGroup> {
    let mut groups: BTreeMap<String, TicketGroup> = BTreeMap::new();
    for ticket in tickets {
        groups
            .entry(ticket.group_key())
            .or_insert_with(|| TicketGroup::seed(ticket))
            .absorb(ticket);
    }
    groups.into_values().collect()
}
