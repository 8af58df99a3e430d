//! Persistence seams.
//!
//! Handlers only see these traits. [`postgres::PgStore`] is the production
//! implementation; tests substitute in-memory fakes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    CatalogQuery, Category, City, Country, Listing, NewOrder, Order, OrderStatus, SitemapEntry,
    SitemapKind, Sport, Team, Tournament, Venue,
};
use crate::utils::error::AppError;
use crate::utils::pagination::PageRequest;

pub mod filters;
pub mod postgres;

pub use filters::CatalogEntity;
pub use postgres::PgStore;

/// Where an event sits, as far as the catalog knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventVenue {
    UnknownEvent,
    NoVenue,
    Venue(String),
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_sports(&self, query: &CatalogQuery, page: PageRequest) -> Result<Listing<Sport>, AppError>;

    async fn list_tournaments(
        &self,
        query: &CatalogQuery,
        page: PageRequest,
    ) -> Result<Listing<Tournament>, AppError>;

    async fn list_venues(&self, query: &CatalogQuery, page: PageRequest) -> Result<Listing<Venue>, AppError>;

    async fn list_teams(&self, query: &CatalogQuery, page: PageRequest) -> Result<Listing<Team>, AppError>;

    async fn list_countries(
        &self,
        query: &CatalogQuery,
        page: PageRequest,
    ) -> Result<Listing<Country>, AppError>;

    async fn list_cities(&self, query: &CatalogQuery, page: PageRequest) -> Result<Listing<City>, AppError>;

    async fn event_venue(&self, event_id: &str) -> Result<EventVenue, AppError>;

    async fn venue_categories(&self, venue_id: &str) -> Result<Vec<Category>, AppError>;

    async fn sitemap_entries(&self, kind: SitemapKind) -> Result<Vec<SitemapEntry>, AppError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, AppError>;

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, AppError>;

    /// Sets the status of every order tied to the payment intent,
    /// regardless of its current status. Returns the number of rows changed.
    async fn set_status_by_intent(&self, intent_id: &str, status: OrderStatus) -> Result<u64, AppError>;
}
