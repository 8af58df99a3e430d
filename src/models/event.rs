use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// An upstream inventory event in the one shape the rest of the server uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: String,
    pub name: String,
    pub sport_type: Option<String>,
    pub tournament_id: Option<String>,
    pub tournament_name: Option<String>,
    pub venue_id: Option<String>,
    pub venue_name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub date_start: Option<String>,
    pub date_stop: Option<String>,
    pub event_status: Option<String>,
    pub min_ticket_price: Option<Decimal>,
    pub max_ticket_price: Option<Decimal>,
    pub currency: Option<String>,
    pub home_team_id: Option<String>,
    pub visiting_team_id: Option<String>,
}

impl EventRecord {
    /// Normalizes one upstream event object. Returns `None` when the object
    /// has no usable identifier.
    pub fn from_upstream(value: &Value) -> Option<Self> {
        let event_id = first_str(value, &["event_id", "id"])?;
        let name = first_str(value, &["name", "event_name", "official_name"])
            .unwrap_or_else(|| event_id.clone());

        Some(Self {
            event_id,
            name,
            sport_type: first_str(value, &["sport_type", "sport"]),
            tournament_id: first_str(value, &["tournament_id"]),
            tournament_name: first_str(value, &["tournament_name", "tournament"]),
            venue_id: first_str(value, &["venue_id"]),
            venue_name: first_str(value, &["venue_name", "venue"]),
            city: first_str(value, &["city", "city_name"]),
            country: first_str(value, &["iso_country", "country"]),
            date_start: first_str(value, &["date_start", "date_start_main_event"]),
            date_stop: first_str(value, &["date_stop", "date_stop_main_event"]),
            event_status: first_str(value, &["event_status", "status"]),
            min_ticket_price: first_decimal(value, &["min_ticket_price_eur", "min_ticket_price"]),
            max_ticket_price: first_decimal(value, &["max_ticket_price_eur", "max_ticket_price"]),
            currency: first_str(value, &["currency"]),
            home_team_id: first_str(value, &["hometeam_id", "home_team_id"]),
            visiting_team_id: first_str(value, &["visiting_id", "visiting_team_id"]),
        })
    }

    /// Normalizes a list, logging and skipping anything unrecognized.
    pub fn from_upstream_list(values: &[Value]) -> Vec<Self> {
        values
            .iter()
            .filter_map(|value| {
                let record = Self::from_upstream(value);
                if record.is_none() {
                    tracing::warn!(payload = %value, "Dropping upstream event without an id");
                }
                record
            })
            .collect()
    }

    /// Calendar date of the event start, when upstream sent one.
    pub fn start_date(&self) -> Option<&str> {
        let date = self.date_start.as_deref()?.get(..10)?;
        chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .map(|_| date)
    }
}

/// Reads the first present, non-empty field among `keys` as a string.
/// Numeric identifiers are accepted and stringified.
pub(crate) fn first_str(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub(crate) fn first_decimal(value: &Value, keys: &[&str]) -> Option<Decimal> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::Number(n) => {
            let raw = n.to_string();
            Decimal::from_str(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .ok()
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    })
}

pub(crate) fn first_i64(value: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
