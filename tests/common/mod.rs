#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use chrono::{NaiveDate, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use storefront_server::config::Config;
use storefront_server::models::{
    CatalogQuery, Category, City, Country, Listing, NewOrder, Order, OrderStatus, SitemapEntry,
    SitemapKind, Sport, Team, Tournament, Venue,
};
use storefront_server::routes::create_routes;
use storefront_server::services::stripe::{PaymentIntent, PaymentIntentRequest};
use storefront_server::services::xs2::Params;
use storefront_server::services::{CheckoutService, InventoryApi, InventoryProxy, PaymentProcessor};
use storefront_server::state::AppState;
use storefront_server::store::{CatalogStore, EventVenue, OrderStore};
use storefront_server::utils::error::AppError;
use storefront_server::utils::pagination::PageRequest;

pub const WEBHOOK_SECRET: &str = "whsec_integration";
pub const BASE_URL: &str = "https://tickets.example.com";
pub const REVALIDATE_SECRET: &str = "revalidate_integration";

fn page_of<T: Clone>(rows: &[T], page: PageRequest) -> Listing<T> {
    Listing {
        rows: rows
            .iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect(),
        total: rows.len() as i64,
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub tournaments: Vec<Tournament>,
    pub event_venues: HashMap<String, Option<String>>,
    pub categories: Vec<Category>,
    pub orders: Mutex<Vec<Order>>,
    pub fail_catalog: bool,
}

impl MemoryStore {
    pub fn with_tournaments(count: usize) -> Self {
        let tournaments = (1..=count)
            .map(|i| Tournament {
                tournament_id: format!("trn_{i:02}"),
                name: format!("Cup {i:02}"),
                sport_type: "football".into(),
                season: Some("25/26".into()),
                region: Some("EUROPE".into()),
                country: None,
                date_start: NaiveDate::from_ymd_opt(2026, 1, 1),
                date_stop: None,
                is_popular: i % 2 == 0,
                slug: None,
                updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            })
            .collect();

        Self {
            tournaments,
            ..Default::default()
        }
    }

    pub fn order_status(&self, intent_id: &str) -> Option<OrderStatus> {
        self.orders
            .lock()
            .unwrap()
            .iter()
            .find(|order| order.stripe_payment_intent_id.as_deref() == Some(intent_id))
            .map(|order| order.status)
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), AppError> {
        if self.fail_catalog {
            return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_sports(&self, _query: &CatalogQuery, _page: PageRequest) -> Result<Listing<Sport>, AppError> {
        self.check()?;
        Ok(Listing { rows: vec![], total: 0 })
    }

    async fn list_tournaments(
        &self,
        query: &CatalogQuery,
        page: PageRequest,
    ) -> Result<Listing<Tournament>, AppError> {
        self.check()?;
        let matching: Vec<Tournament> = self
            .tournaments
            .iter()
            .filter(|t| query.sport_type.as_deref().map_or(true, |s| t.sport_type == s))
            .filter(|t| query.region.as_deref().map_or(true, |r| t.region.as_deref() == Some(r)))
            .cloned()
            .collect();

        Ok(page_of(&matching, page))
    }

    async fn list_venues(&self, _query: &CatalogQuery, _page: PageRequest) -> Result<Listing<Venue>, AppError> {
        self.check()?;
        Ok(Listing { rows: vec![], total: 0 })
    }

    async fn list_teams(&self, _query: &CatalogQuery, _page: PageRequest) -> Result<Listing<Team>, AppError> {
        self.check()?;
        Ok(Listing { rows: vec![], total: 0 })
    }

    async fn list_countries(
        &self,
        _query: &CatalogQuery,
        _page: PageRequest,
    ) -> Result<Listing<Country>, AppError> {
        self.check()?;
        Ok(Listing { rows: vec![], total: 0 })
    }

    async fn list_cities(&self, _query: &CatalogQuery, _page: PageRequest) -> Result<Listing<City>, AppError> {
        self.check()?;
        Ok(Listing { rows: vec![], total: 0 })
    }

    async fn event_venue(&self, event_id: &str) -> Result<EventVenue, AppError> {
        self.check()?;
        Ok(match self.event_venues.get(event_id) {
            None => EventVenue::UnknownEvent,
            Some(None) => EventVenue::NoVenue,
            Some(Some(venue)) => EventVenue::Venue(venue.clone()),
        })
    }

    async fn venue_categories(&self, venue_id: &str) -> Result<Vec<Category>, AppError> {
        self.check()?;
        Ok(self
            .categories
            .iter()
            .filter(|c| c.venue_id == venue_id)
            .cloned()
            .collect())
    }

    async fn sitemap_entries(&self, kind: SitemapKind) -> Result<Vec<SitemapEntry>, AppError> {
        self.check()?;
        let entries = match kind {
            SitemapKind::Tournaments => self
                .tournaments
                .iter()
                .map(|t| SitemapEntry {
                    id: t.tournament_id.clone(),
                    name: Some(t.name.clone()),
                    slug: t.slug.clone(),
                    sport_type: Some(t.sport_type.clone()),
                    updated_at: t.updated_at,
                })
                .collect(),
            _ => Vec::new(),
        };
        Ok(entries)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, AppError> {
        let now = Utc::now();
        let row = Order {
            id: Uuid::new_v4(),
            customer_email: order.customer_email,
            customer_name: order.customer_name,
            xs2_event_id: order.xs2_event_id,
            xs2_event_name: order.xs2_event_name,
            xs2_ticket_ids: order.xs2_ticket_ids,
            quantity: order.quantity,
            total_amount: order.total_amount,
            currency: order.currency.to_lowercase(),
            stripe_payment_intent_id: order.stripe_payment_intent_id,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.orders.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|order| order.id == id)
            .cloned())
    }

    async fn set_status_by_intent(&self, intent_id: &str, status: OrderStatus) -> Result<u64, AppError> {
        let mut orders = self.orders.lock().unwrap();
        let mut updated = 0;
        for order in orders
            .iter_mut()
            .filter(|order| order.stripe_payment_intent_id.as_deref() == Some(intent_id))
        {
            order.status = status;
            order.updated_at = Utc::now();
            updated += 1;
        }
        Ok(updated)
    }
}

/// How the fake inventory advertises its next page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cursor {
    /// `/v1/events?page=N`, dropping every other filter.
    #[default]
    RelativePath,
    /// The page number as a JSON string.
    PageNumberString,
    /// Always offers another page, repeating the first page's rows.
    Endless,
}

/// Inventory API answering from fixed tables and counting requests.
#[derive(Default)]
pub struct FakeInventory {
    pub tickets: HashMap<String, Value>,
    pub events: Vec<Value>,
    pub page_size: usize,
    pub cursor: Cursor,
    pub calls: AtomicUsize,
}

impl FakeInventory {
    pub fn with_ticket(mut self, id: &str, stock: i64, status: &str) -> Self {
        self.tickets.insert(
            id.to_string(),
            json!({"ticket_id": id, "event_id": "evt_1", "stock": stock, "ticket_status": status}),
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryApi for FakeInventory {
    async fn get_json(&self, path: &str, params: &Params) -> Result<Value, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(ticket_id) = path.strip_prefix("tickets/") {
            return self
                .tickets
                .get(ticket_id)
                .cloned()
                .ok_or_else(|| AppError::Upstream { status: 404, details: json!({"error": "not found"}) });
        }

        if let Some(event_id) = path.strip_prefix("events/") {
            return self
                .events
                .iter()
                .find(|event| event["event_id"] == event_id)
                .cloned()
                .ok_or_else(|| AppError::Upstream { status: 404, details: json!({"error": "not found"}) });
        }

        if path == "events" {
            let size = self.page_size.max(1);
            let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
            if self.cursor == Cursor::Endless {
                let rows: Vec<Value> = self.events.iter().take(size).cloned().collect();
                return Ok(json!({"events": rows, "pagination": {"next_page": page + 1}}));
            }

            let rows: Vec<Value> = self.events.iter().skip((page - 1) * size).take(size).cloned().collect();
            let next = (page * size < self.events.len()).then(|| match self.cursor {
                Cursor::PageNumberString => (page + 1).to_string(),
                _ => format!("/v1/events?page={}", page + 1),
            });
            return Ok(json!({"events": rows, "pagination": {"next_page": next}}));
        }

        Ok(json!({"tickets": self.tickets.values().cloned().collect::<Vec<_>>()}))
    }
}

#[derive(Default)]
pub struct FakePayments {
    pub created: AtomicUsize,
    pub last_request: Mutex<Option<PaymentIntentRequest>>,
}

impl FakePayments {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProcessor for FakePayments {
    async fn create_payment_intent(&self, request: PaymentIntentRequest) -> Result<PaymentIntent, AppError> {
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_request.lock().unwrap() = Some(request);
        Ok(PaymentIntent {
            id: format!("pi_{n}"),
            client_secret: format!("pi_{n}_secret"),
        })
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".into(),
        database_max_connections: 1,
        port: 0,
        xs2_api_url: "http://inventory.invalid".into(),
        xs2_api_key: Some("test".into()),
        stripe_secret_key: Some("sk_test".into()),
        stripe_webhook_secret: Some(WEBHOOK_SECRET.into()),
        public_base_url: Some(BASE_URL.into()),
        revalidate_secret: Some(REVALIDATE_SECRET.into()),
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub inventory: Arc<FakeInventory>,
    pub payments: Arc<FakePayments>,
}

pub fn test_app(store: MemoryStore, inventory: FakeInventory) -> TestApp {
    test_app_with_config(store, inventory, test_config())
}

pub fn test_app_with_config(store: MemoryStore, inventory: FakeInventory, config: Config) -> TestApp {
    let store = Arc::new(store);
    let inventory = Arc::new(inventory);
    let payments = Arc::new(FakePayments::default());

    let proxy = Arc::new(InventoryProxy::new(inventory.clone()));
    let checkout = Arc::new(CheckoutService::new(
        proxy.clone(),
        payments.clone(),
        store.clone(),
        config.stripe_webhook_secret.clone(),
    ));

    let state = AppState {
        config: Arc::new(config),
        catalog: store.clone(),
        orders: store.clone(),
        inventory: proxy,
        checkout,
    };

    TestApp {
        router: create_routes(state),
        store,
        inventory,
        payments,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn revalidate_request(tag: &str, secret: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/api/xs2/revalidate?tag={tag}"));
    if let Some(secret) = secret {
        builder = builder.header("x-revalidate-secret", secret);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn stripe_signature(payload: &str, timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}
