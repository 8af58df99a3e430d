use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::{EventRecord, TicketGroup};
use crate::services::inventory::EventsPage;
use crate::services::resolution::resolve_event;
use crate::services::xs2::Params;
use crate::state::AppState;
use crate::utils::error::{AppError, ListError};
use crate::utils::response::ListEnvelope;

pub const REVALIDATE_SECRET_HEADER: &str = "x-revalidate-secret";

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub slug: Option<String>,
    pub sport_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventIdQuery {
    pub event_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RevalidateQuery {
    pub tag: Option<String>,
}

#[derive(Serialize)]
pub struct RevalidateResponse {
    pub revalidated: bool,
    pub tag: String,
    pub dropped: usize,
    /// Milliseconds since the Unix epoch.
    pub now: i64,
}

pub(crate) fn required_event_id(query: EventIdQuery) -> Result<String, AppError> {
    query
        .event_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::ValidationError("event_id is required".into()))
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<EventsPage, ListError> {
    state
        .inventory
        .events(&params)
        .await
        .map_err(|e| e.with_fallback("events"))
}

pub async fn resolve(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Result<ListEnvelope<EventRecord>, ListError> {
    let slug = query
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::ValidationError("slug is required".into()).with_fallback("events"))?;

    let event = resolve_event(&state.inventory, query.sport_type.as_deref(), slug)
        .await
        .map_err(|e| e.with_fallback("events"))?
        .ok_or_else(|| {
            AppError::NotFound(format!("No event matches slug '{slug}'")).with_fallback("events")
        })?;

    Ok(ListEnvelope::new("events", vec![event]))
}

pub async fn list_tickets(State(state): State<AppState>, Query(params): Query<Params>) -> Response {
    match state.inventory.tickets(&params).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.with_fallback("tickets").into_response(),
    }
}

pub async fn ticket_groups(
    State(state): State<AppState>,
    Query(query): Query<EventIdQuery>,
) -> Result<ListEnvelope<TicketGroup>, ListError> {
    let event_id = required_event_id(query).map_err(|e| e.with_fallback("groups"))?;

    let groups = state
        .inventory
        .ticket_groups(&event_id)
        .await
        .map_err(|e| e.with_fallback("groups"))?;

    Ok(ListEnvelope::new("groups", groups))
}

fn check_revalidate_secret(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let expected = state
        .config
        .revalidate_secret
        .as_deref()
        .ok_or_else(|| AppError::Configuration("REVALIDATE_SECRET is not configured".into()))?;

    let presented = headers
        .get(REVALIDATE_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim);

    match presented {
        Some(secret) if secret == expected => Ok(()),
        Some(_) => Err(AppError::AuthError("invalid revalidation secret".into())),
        None => Err(AppError::AuthError(format!("missing {REVALIDATE_SECRET_HEADER} header"))),
    }
}

pub async fn revalidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RevalidateQuery>,
) -> Result<Json<RevalidateResponse>, AppError> {
    check_revalidate_secret(&state, &headers)?;

    let tag = query
        .tag
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .ok_or_else(|| AppError::ValidationError("tag is required".into()))?;

    let dropped = state.inventory.revalidate(&tag).await;

    Ok(Json(RevalidateResponse {
        revalidated: true,
        tag,
        dropped,
        now: Utc::now().timestamp_millis(),
    }))
}
