use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::filters::{count_query, page_query, CatalogEntity};
use super::{CatalogStore, EventVenue, OrderStore};
use crate::models::{
    CatalogQuery, Category, City, Country, Listing, NewOrder, Order, OrderStatus, SitemapEntry,
    SitemapKind, Sport, Team, Tournament, Venue,
};
use crate::utils::error::AppError;
use crate::utils::pagination::PageRequest;

/// Sitemap protocol limit on URLs per file.
const SITEMAP_MAX_URLS: i64 = 50_000;

const ORDER_COLUMNS: &str = "id, customer_email, customer_name, xs2_event_id, xs2_event_name, \
    xs2_ticket_ids, quantity, total_amount, currency, stripe_payment_intent_id, status, \
    created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list<T>(
        &self,
        entity: CatalogEntity,
        query: &CatalogQuery,
        page: PageRequest,
    ) -> Result<Listing<T>, AppError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut count = count_query(entity, query);
        let mut rows = page_query(entity, query, page);

        let ((total,), rows) = tokio::try_join!(
            count.build_query_as::<(i64,)>().fetch_one(&self.pool),
            rows.build_query_as::<T>().fetch_all(&self.pool),
        )?;

        tracing::debug!(
            entity = entity.plural(),
            total,
            returned = rows.len(),
            page = page.page,
            "Catalog page loaded"
        );

        Ok(Listing { rows, total })
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_sports(&self, query: &CatalogQuery, page: PageRequest) -> Result<Listing<Sport>, AppError> {
        self.list(CatalogEntity::Sports, query, page).await
    }

    async fn list_tournaments(
        &self,
        query: &CatalogQuery,
        page: PageRequest,
    ) -> Result<Listing<Tournament>, AppError> {
        self.list(CatalogEntity::Tournaments, query, page).await
    }

    async fn list_venues(&self, query: &CatalogQuery, page: PageRequest) -> Result<Listing<Venue>, AppError> {
        self.list(CatalogEntity::Venues, query, page).await
    }

    async fn list_teams(&self, query: &CatalogQuery, page: PageRequest) -> Result<Listing<Team>, AppError> {
        self.list(CatalogEntity::Teams, query, page).await
    }

    async fn list_countries(
        &self,
        query: &CatalogQuery,
        page: PageRequest,
    ) -> Result<Listing<Country>, AppError> {
        self.list(CatalogEntity::Countries, query, page).await
    }

    async fn list_cities(&self, query: &CatalogQuery, page: PageRequest) -> Result<Listing<City>, AppError> {
        self.list(CatalogEntity::Cities, query, page).await
    }

    async fn event_venue(&self, event_id: &str) -> Result<EventVenue, AppError> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT venue_id FROM events WHERE event_id = $1")
                .bind(event_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match row {
            None => EventVenue::UnknownEvent,
            Some((None,)) => EventVenue::NoVenue,
            Some((Some(venue_id),)) if venue_id.trim().is_empty() => EventVenue::NoVenue,
            Some((Some(venue_id),)) => EventVenue::Venue(venue_id),
        })
    }

    async fn venue_categories(&self, venue_id: &str) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT category_id, venue_id, name, sub_category, ticket_type \
             FROM categories WHERE venue_id = $1 ORDER BY name ASC",
        )
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn sitemap_entries(&self, kind: SitemapKind) -> Result<Vec<SitemapEntry>, AppError> {
        let sql = match kind {
            SitemapKind::Events => {
                "SELECT event_id AS id, name, slug, sport_type, updated_at FROM events \
                 WHERE date_start IS NULL OR date_start >= NOW() - INTERVAL '1 day' \
                 ORDER BY date_start ASC NULLS LAST LIMIT $1"
            }
            SitemapKind::Tournaments => {
                "SELECT tournament_id AS id, name, slug, sport_type, updated_at FROM tournaments \
                 ORDER BY updated_at DESC LIMIT $1"
            }
            SitemapKind::Teams => {
                "SELECT team_id AS id, COALESCE(name, official_name) AS name, slug, sport_type, \
                 updated_at FROM teams ORDER BY updated_at DESC LIMIT $1"
            }
            SitemapKind::Venues => {
                "SELECT venue_id AS id, COALESCE(name, official_name) AS name, slug, \
                 NULL::text AS sport_type, updated_at FROM venues ORDER BY updated_at DESC LIMIT $1"
            }
        };

        let entries = sqlx::query_as::<_, SitemapEntry>(sql)
            .bind(SITEMAP_MAX_URLS)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, AppError> {
        let sql = format!(
            "INSERT INTO orders (id, customer_email, customer_name, xs2_event_id, xs2_event_name, \
             xs2_ticket_ids, quantity, total_amount, currency, stripe_payment_intent_id, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {ORDER_COLUMNS}"
        );

        let inserted = sqlx::query_as::<_, Order>(&sql)
            .bind(Uuid::new_v4())
            .bind(order.customer_email)
            .bind(order.customer_name)
            .bind(order.xs2_event_id)
            .bind(order.xs2_event_name)
            .bind(order.xs2_ticket_ids)
            .bind(order.quantity)
            .bind(order.total_amount)
            .bind(order.currency.to_lowercase())
            .bind(order.stripe_payment_intent_id)
            .bind(OrderStatus::Pending)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(order_id = %inserted.id, event_id = %inserted.xs2_event_id, "Order created");

        Ok(inserted)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    async fn set_status_by_intent(&self, intent_id: &str, status: OrderStatus) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE orders SET status = $1, updated_at = NOW() WHERE stripe_payment_intent_id = $2",
        )
        .bind(status)
        .bind(intent_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
