//! Inventory proxy: the one place that talks to the ticket-inventory API.
//!
//! Internal query parameters are translated into the upstream dialect,
//! collection and single-event responses are folded into one envelope, and
//! event responses are cached for a day under the [`EVENTS_TAG`] tag.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{NaiveDate, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use super::cache::ResponseCache;
use super::xs2::{InventoryApi, Params};
use crate::models::{group_tickets, EventRecord, TicketGroup, TicketRecord};
use crate::utils::error::AppError;

pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const EVENTS_TAG: &str = "xs2-events";

/// Marker asking for past and future events alike.
pub const ORIGIN_PARAM: &str = "origin";
pub const ALL_EVENTS_ORIGIN: &str = "allevents";

const DEFAULT_FILTERED_PAGE_SIZE: &str = "50";
const FILTER_KEYS: &[&str] = &[
    "sport_type",
    "tournament_id",
    "team_id",
    "venue_id",
    "date_start",
    "date_stop",
    "event_status",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryRequest {
    Single(String),
    Collection(Params),
}

impl InventoryRequest {
    pub fn cache_key(&self) -> String {
        match self {
            InventoryRequest::Single(event_id) => format!("event:{event_id}"),
            InventoryRequest::Collection(params) => {
                let query = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(params.iter())
                    .finish();
                format!("events?{query}")
            }
        }
    }
}

/// Maps an internal query onto the upstream parameter dialect.
pub fn translate(raw: &Params, today: NaiveDate) -> InventoryRequest {
    if let Some(event_id) = raw
        .get("event_id")
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
    {
        return InventoryRequest::Single(event_id.to_string());
    }

    let all_events = raw
        .get(ORIGIN_PARAM)
        .is_some_and(|origin| origin.trim() == ALL_EVENTS_ORIGIN);

    let mut params = Params::new();
    for (key, value) in raw {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        // Aliases never override an explicitly named upstream parameter.
        match key.as_str() {
            ORIGIN_PARAM | "event_id" => {}
            "team" => {
                params.entry("team_id".to_string()).or_insert_with(|| value.to_string());
            }
            "page_number" => {
                params.entry("page".to_string()).or_insert_with(|| value.to_string());
            }
            other => {
                params.insert(other.to_string(), value.to_string());
            }
        }
    }

    if FILTER_KEYS.iter().any(|key| params.contains_key(*key)) {
        params
            .entry("page_size".to_string())
            .or_insert_with(|| DEFAULT_FILTERED_PAGE_SIZE.to_string());
    }

    if params.contains_key("sport_type") && !params.contains_key("date_stop") && !all_events {
        params.insert("date_stop".to_string(), format!("ge:{today}"));
    }

    InventoryRequest::Collection(params)
}

/// Events in the shared envelope shape.
#[derive(Debug, Clone, PartialEq)]
pub struct EventsPage {
    pub events: Vec<EventRecord>,
    pub pagination: Option<Value>,
}

impl EventsPage {
    pub fn from_upstream(body: &Value, single: bool) -> Self {
        if single {
            // Some deployments wrap a single event, most return it bare.
            let event = body.get("event").unwrap_or(body);
            return Self {
                events: EventRecord::from_upstream_list(std::slice::from_ref(event)),
                pagination: None,
            };
        }

        Self {
            events: EventRecord::from_upstream_list(collection(body, &["events", "results", "items"])),
            pagination: body.get("pagination").filter(|p| !p.is_null()).cloned(),
        }
    }

    /// The upstream cursor for the next page, if any.
    pub fn next_cursor(&self) -> Option<&Value> {
        self.pagination
            .as_ref()?
            .get("next_page")
            .filter(|cursor| !cursor.is_null())
    }
}

#[derive(Serialize)]
struct EventsBody<'a> {
    results: &'a [EventRecord],
    items: &'a [EventRecord],
    events: &'a [EventRecord],
    pagination: &'a Option<Value>,
    status: u16,
}

impl IntoResponse for EventsPage {
    fn into_response(self) -> Response {
        let body = EventsBody {
            results: &self.events,
            items: &self.events,
            events: &self.events,
            pagination: &self.pagination,
            status: StatusCode::OK.as_u16(),
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

fn collection<'a>(body: &'a Value, keys: &[&str]) -> &'a [Value] {
    if let Value::Array(items) = body {
        return items;
    }
    keys.iter()
        .find_map(|key| body.get(*key)?.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub struct InventoryProxy {
    api: Arc<dyn InventoryApi>,
    cache: ResponseCache,
}

impl InventoryProxy {
    pub fn new(api: Arc<dyn InventoryApi>) -> Self {
        Self::with_ttl(api, CACHE_TTL)
    }

    pub fn with_ttl(api: Arc<dyn InventoryApi>, ttl: Duration) -> Self {
        Self {
            api,
            cache: ResponseCache::new(ttl),
        }
    }

    pub async fn events(&self, raw: &Params) -> Result<EventsPage, AppError> {
        self.events_on(raw, Utc::now().date_naive()).await
    }

    pub async fn events_on(&self, raw: &Params, today: NaiveDate) -> Result<EventsPage, AppError> {
        let request = translate(raw, today);
        let key = request.cache_key();

        let (body, single) = match &request {
            InventoryRequest::Single(event_id) => {
                if !is_safe_id(event_id) {
                    return Err(AppError::ValidationError(format!(
                        "Invalid event_id '{event_id}'"
                    )));
                }
                let body = self
                    .cached(&key, &format!("events/{event_id}"), &Params::new())
                    .await?;
                (body, true)
            }
            InventoryRequest::Collection(params) => (self.cached(&key, "events", params).await?, false),
        };

        Ok(EventsPage::from_upstream(&body, single))
    }

    /// Fetches one event by id, `None` when upstream does not know it.
    pub async fn event(&self, event_id: &str) -> Result<Option<EventRecord>, AppError> {
        let params = Params::from([("event_id".to_string(), event_id.to_string())]);
        match self.events(&params).await {
            Ok(page) => Ok(page.events.into_iter().next()),
            Err(AppError::Upstream { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn cached(&self, key: &str, path: &str, params: &Params) -> Result<Value, AppError> {
        if let Some(hit) = self.cache.get(key).await {
            tracing::debug!(cache_key = %key, "Inventory cache hit");
            return Ok(hit);
        }

        let body = self.api.get_json(path, params).await?;
        self.cache.insert(key.to_string(), EVENTS_TAG, body.clone()).await;
        Ok(body)
    }

    /// Ticket list passthrough. Never cached.
    pub async fn tickets(&self, raw: &Params) -> Result<Value, AppError> {
        let params: Params = raw
            .iter()
            .filter(|(key, value)| key.as_str() != ORIGIN_PARAM && !value.trim().is_empty())
            .map(|(key, value)| (key.clone(), value.trim().to_string()))
            .collect();

        self.api.get_json("tickets", &params).await
    }

    pub async fn ticket_groups(&self, event_id: &str) -> Result<Vec<TicketGroup>, AppError> {
        let params = Params::from([
            ("event_id".to_string(), event_id.to_string()),
            ("ticket_status".to_string(), "available".to_string()),
            ("page_size".to_string(), "100".to_string()),
        ]);
        let body = self.api.get_json("tickets", &params).await?;

        let tickets: Vec<TicketRecord> = collection(&body, &["tickets", "results", "items"])
            .iter()
            .filter_map(TicketRecord::from_upstream)
            .filter(|ticket| ticket.stock > 0)
            .collect();

        Ok(group_tickets(&tickets))
    }

    /// Checks every ticket concurrently against live inventory. Returns the
    /// ids that cannot be sold: unknown, not `available`, or out of stock.
    /// An empty result means the whole set can be sold.
    pub async fn validate_stock(&self, ticket_ids: &[String]) -> Result<Vec<String>, AppError> {
        let unique: BTreeSet<&str> = ticket_ids.iter().map(|id| id.trim()).collect();

        let checks = unique.into_iter().map(|ticket_id| async move {
            if !is_safe_id(ticket_id) {
                return Ok((ticket_id, false));
            }
            match self
                .api
                .get_json(&format!("tickets/{ticket_id}"), &Params::new())
                .await
            {
                Ok(body) => {
                    let ticket = body.get("ticket").unwrap_or(&body);
                    let purchasable = TicketRecord::from_upstream(ticket)
                        .is_some_and(|record| record.is_purchasable());
                    Ok((ticket_id, purchasable))
                }
                Err(AppError::Upstream { status: 404, .. }) => Ok((ticket_id, false)),
                Err(e) => Err(e),
            }
        });

        let unavailable: Vec<String> = try_join_all(checks)
            .await?
            .into_iter()
            .filter(|(_, purchasable)| !purchasable)
            .map(|(ticket_id, _)| ticket_id.to_string())
            .collect();

        if !unavailable.is_empty() {
            tracing::info!(unavailable = ?unavailable, "Stock validation failed");
        }

        Ok(unavailable)
    }

    pub async fn revalidate(&self, tag: &str) -> usize {
        let dropped = self.cache.invalidate_tag(tag).await;
        tracing::info!(tag, dropped, "Inventory cache revalidated");
        dropped
    }
}
