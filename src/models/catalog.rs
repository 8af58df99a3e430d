use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sport {
    pub sport_id: String,
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tournament {
    pub tournament_id: String,
    pub name: String,
    pub sport_type: String,
    pub season: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_stop: Option<NaiveDate>,
    pub is_popular: bool,
    pub slug: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Venue {
    pub venue_id: String,
    pub name: Option<String>,
    pub official_name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub capacity: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub slug: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub team_id: String,
    pub name: Option<String>,
    pub official_name: Option<String>,
    pub sport_type: String,
    pub country: Option<String>,
    pub is_popular: bool,
    pub logo_url: Option<String>,
    pub slug: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Country {
    pub country_code: String,
    pub name: String,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct City {
    pub city_id: String,
    pub name: String,
    pub country: Option<String>,
}

/// Seating category at a venue, e.g. "Longside Lower Tier".
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub category_id: String,
    pub venue_id: String,
    pub name: String,
    pub sub_category: Option<String>,
    pub ticket_type: Option<String>,
}

/// Filters accepted by every catalog list route. Each entity only honours
/// the subset it has columns for.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub sport_type: Option<String>,
    pub country: Option<String>,
    pub is_popular: Option<bool>,
    pub region: Option<String>,
    /// Comma-separated list of primary keys.
    pub ids: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl CatalogQuery {
    pub fn id_list(&self) -> Option<Vec<String>> {
        let ids: Vec<String> = self
            .ids
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();

        (!ids.is_empty()).then_some(ids)
    }
}

/// One page of rows plus the total number of rows matching the filters.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub rows: Vec<T>,
    pub total: i64,
}

/// Which catalog table a sitemap is generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    Events,
    Tournaments,
    Teams,
    Venues,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SitemapEntry {
    pub id: String,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub sport_type: Option<String>,
    pub updated_at: DateTime<Utc>,
}
