//! Shopping cart as an immutable value.
//!
//! The cart lives with the client session, never on the server. Every
//! operation returns a new [`Cart`] and leaves the receiver untouched, so the
//! owner decides when to swap state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ticket::TicketGroup;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Derived from the ticket group and price; equal ids are the same line.
    pub id: String,
    pub xs2_ticket_id: String,
    pub xs2_event_id: String,
    pub event_name: String,
    pub category_name: String,
    pub ticket_type: Option<String>,
    pub price: Decimal,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_id(group_key: &str, price: Decimal) -> String {
        format!("{group_key}@{}", price.normalize())
    }

    /// Builds a line for `quantity` tickets from a group, priced at the
    /// group's lowest price and referencing its first listing.
    pub fn from_group(group: &TicketGroup, event_name: &str, quantity: u32) -> Option<Self> {
        let price = group.min_price?;
        let ticket_id = group.ticket_ids.first()?.clone();

        Some(Self {
            id: Self::line_id(&group.group_key, price),
            xs2_ticket_id: ticket_id,
            xs2_event_id: group.event_id.clone().unwrap_or_default(),
            event_name: event_name.to_string(),
            category_name: group
                .category_name
                .clone()
                .or_else(|| group.category_id.clone())
                .unwrap_or_default(),
            ticket_type: group.ticket_type.clone(),
            price,
            quantity,
        })
    }

    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Adds a line, merging quantities into an existing line with the same id.
    pub fn add_item(&self, item: CartItem) -> Self {
        let mut items = self.items.clone();
        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
            None => items.push(item),
        }
        Self { items }
    }

    pub fn remove_item(&self, id: &str) -> Self {
        Self {
            items: self.items.iter().filter(|i| i.id != id).cloned().collect(),
        }
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn update_quantity(&self, id: &str, quantity: u32) -> Self {
        if quantity == 0 {
            return self.remove_item(id);
        }
        Self {
            items: self
                .items
                .iter()
                .cloned()
                .map(|mut item| {
                    if item.id == id {
                        item.quantity = quantity;
                    }
                    item
                })
                .collect(),
        }
    }

    pub fn clear(&self) -> Self {
        Self::new()
    }

    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().fold(0u32, |count, i| count.saturating_add(i.quantity))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, price: i64, quantity: u32) -> CartItem {
        CartItem {
            id: id.to_string(),
            xs2_ticket_id: format!("tkt_{id}"),
            xs2_event_id: "evt_1".into(),
            event_name: "Final".into(),
            category_name: "Cat 1".into(),
            ticket_type: None,
            price: Decimal::from(price),
            quantity,
        }
    }

    #[test]
    fn adding_same_id_merges_quantities() {
        let cart = Cart::new().add_item(item("A", 50, 2)).add_item(item("A", 50, 3));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn merged_quantities_saturate() {
        let cart = Cart::new()
            .add_item(item("A", 1, u32::MAX - 1))
            .add_item(item("A", 1, 5))
            .add_item(item("B", 1, 3));

        assert_eq!(cart.items()[0].quantity, u32::MAX);
        assert_eq!(cart.item_count(), u32::MAX);
    }

    #[test]
    fn operations_leave_the_original_untouched() {
        let original = Cart::new().add_item(item("A", 50, 1));
        let grown = original.add_item(item("B", 20, 2));

        assert_eq!(original.items().len(), 1);
        assert_eq!(grown.items().len(), 2);
        assert_eq!(grown.total(), Decimal::from(90));
        assert_eq!(grown.item_count(), 3);
    }

    #[test]
    fn update_and_remove() {
        let cart = Cart::new().add_item(item("A", 10, 1)).add_item(item("B", 5, 1));

        let updated = cart.update_quantity("A", 4);
        assert_eq!(updated.total(), Decimal::from(45));

        let removed = updated.update_quantity("B", 0);
        assert_eq!(removed.items().len(), 1);
        assert!(removed.remove_item("A").is_empty());
        assert!(cart.clear().is_empty());
    }

    #[test]
    fn line_id_ignores_trailing_zeros() {
        assert_eq!(
            CartItem::line_id("e:c:s", Decimal::new(12000, 2)),
            CartItem::line_id("e:c:s", Decimal::from(120))
        );
    }

    #[test]
    fn from_group_prices_at_group_minimum() {
        let group = TicketGroup {
            group_key: "evt_1:c1:regular".into(),
            event_id: Some("evt_1".into()),
            category_id: Some("c1".into()),
            category_name: None,
            sub_category: Some("regular".into()),
            ticket_type: Some("e-ticket".into()),
            min_price: Some(Decimal::from(80)),
            max_price: Some(Decimal::from(120)),
            currency: Some("EUR".into()),
            total_stock: 6,
            ticket_ids: vec!["t1".into(), "t2".into()],
        };

        let line = CartItem::from_group(&group, "Final", 2).unwrap();
        assert_eq!(line.id, "evt_1:c1:regular@80");
        assert_eq!(line.category_name, "c1");
        assert_eq!(line.subtotal(), Decimal::from(160));
    }
}
