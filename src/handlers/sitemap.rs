use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::models::SitemapKind;
use crate::services::sitemap::{entries_urlset, sitemap_index, static_urlset};
use crate::state::AppState;
use crate::utils::error::AppError;

fn base_url(state: &AppState) -> Result<&str, AppError> {
    state
        .config
        .public_base_url
        .as_deref()
        .ok_or_else(|| AppError::Configuration("PUBLIC_BASE_URL is not configured".into()))
}

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], body).into_response()
}

async fn entries(state: &AppState, kind: SitemapKind) -> Result<Response, AppError> {
    let base = base_url(state)?;
    let entries = state.catalog.sitemap_entries(kind).await?;
    tracing::debug!(?kind, count = entries.len(), "Sitemap generated");

    Ok(xml(entries_urlset(base, kind, &entries)))
}

pub async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(xml(sitemap_index(base_url(&state)?, Utc::now())))
}

pub async fn static_pages(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(xml(static_urlset(base_url(&state)?)))
}

pub async fn events(State(state): State<AppState>) -> Result<Response, AppError> {
    entries(&state, SitemapKind::Events).await
}

pub async fn tournaments(State(state): State<AppState>) -> Result<Response, AppError> {
    entries(&state, SitemapKind::Tournaments).await
}

pub async fn teams(State(state): State<AppState>) -> Result<Response, AppError> {
    entries(&state, SitemapKind::Teams).await
}

pub async fn venues(State(state): State<AppState>) -> Result<Response, AppError> {
    entries(&state, SitemapKind::Venues).await
}
