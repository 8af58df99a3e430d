use axum::extract::{Query, State};
use serde::Serialize;

use super::inventory::{required_event_id, EventIdQuery};
use crate::models::{CatalogQuery, Category, City, Country, Listing, Sport, Team, Tournament, Venue};
use crate::services::xs2::Params;
use crate::state::AppState;
use crate::store::{CatalogEntity, EventVenue};
use crate::utils::error::{AppError, ListError};
use crate::utils::pagination::{PageRequest, Pagination};
use crate::utils::response::ListEnvelope;

type ListResult<T> = Result<ListEnvelope<T>, ListError>;

fn envelope<T: Serialize>(
    entity: CatalogEntity,
    page: PageRequest,
    listing: Result<Listing<T>, AppError>,
) -> ListResult<T> {
    let listing = listing.map_err(|e| e.with_fallback(entity.plural()))?;
    let pagination = Pagination::for_request(page, listing.total);

    Ok(ListEnvelope::paginated(entity.plural(), listing.rows, pagination))
}

fn text(raw: &Params, key: &str) -> Option<String> {
    raw.get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn number(raw: &Params, key: &str) -> Result<Option<u32>, AppError> {
    text(raw, key)
        .map(|value| {
            value
                .parse::<u32>()
                .map_err(|_| AppError::ValidationError(format!("{key} must be a non-negative integer, got '{value}'")))
        })
        .transpose()
}

fn flag(raw: &Params, key: &str) -> Result<Option<bool>, AppError> {
    text(raw, key)
        .map(|value| match value.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(AppError::ValidationError(format!("{key} must be true or false, got '{value}'"))),
        })
        .transpose()
}

/// Reads the catalog filters from the raw query string. Bad values are 400s
/// that still carry the entity's empty arrays.
fn parse_query(entity: CatalogEntity, raw: &Params) -> Result<(CatalogQuery, PageRequest), ListError> {
    let parse = || -> Result<CatalogQuery, AppError> {
        Ok(CatalogQuery {
            sport_type: text(raw, "sport_type"),
            country: text(raw, "country"),
            is_popular: flag(raw, "is_popular")?,
            region: text(raw, "region"),
            ids: text(raw, "ids"),
            page: number(raw, "page")?,
            page_size: number(raw, "page_size")?,
        })
    };

    let query = parse().map_err(|e| e.with_fallback(entity.plural()))?;
    let page = PageRequest::new(query.page, query.page_size);
    Ok((query, page))
}

pub async fn list_sports(State(state): State<AppState>, Query(raw): Query<Params>) -> ListResult<Sport> {
    let (query, page) = parse_query(CatalogEntity::Sports, &raw)?;
    envelope(CatalogEntity::Sports, page, state.catalog.list_sports(&query, page).await)
}

pub async fn list_tournaments(State(state): State<AppState>, Query(raw): Query<Params>) -> ListResult<Tournament> {
    let (query, page) = parse_query(CatalogEntity::Tournaments, &raw)?;
    envelope(CatalogEntity::Tournaments, page, state.catalog.list_tournaments(&query, page).await)
}

pub async fn list_venues(State(state): State<AppState>, Query(raw): Query<Params>) -> ListResult<Venue> {
    let (query, page) = parse_query(CatalogEntity::Venues, &raw)?;
    envelope(CatalogEntity::Venues, page, state.catalog.list_venues(&query, page).await)
}

pub async fn list_teams(State(state): State<AppState>, Query(raw): Query<Params>) -> ListResult<Team> {
    let (query, page) = parse_query(CatalogEntity::Teams, &raw)?;
    envelope(CatalogEntity::Teams, page, state.catalog.list_teams(&query, page).await)
}

pub async fn list_countries(State(state): State<AppState>, Query(raw): Query<Params>) -> ListResult<Country> {
    let (query, page) = parse_query(CatalogEntity::Countries, &raw)?;
    envelope(CatalogEntity::Countries, page, state.catalog.list_countries(&query, page).await)
}

pub async fn list_cities(State(state): State<AppState>, Query(raw): Query<Params>) -> ListResult<City> {
    let (query, page) = parse_query(CatalogEntity::Cities, &raw)?;
    envelope(CatalogEntity::Cities, page, state.catalog.list_cities(&query, page).await)
}

/// Seating categories of the venue hosting an event.
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<EventIdQuery>,
) -> ListResult<Category> {
    let fallback = |e: AppError| e.with_fallback("categories");
    let event_id = required_event_id(query).map_err(fallback)?;

    let venue_id = match state.catalog.event_venue(&event_id).await.map_err(fallback)? {
        EventVenue::Venue(venue_id) => venue_id,
        EventVenue::UnknownEvent => {
            return Err(fallback(AppError::NotFound(format!("Event '{event_id}' not found"))));
        }
        EventVenue::NoVenue => {
            return Err(fallback(AppError::NotFound(format!(
                "Event '{event_id}' has no venue"
            ))));
        }
    };

    let categories = state
        .catalog
        .venue_categories(&venue_id)
        .await
        .map_err(fallback)?;

    Ok(ListEnvelope::new("categories", categories))
}
