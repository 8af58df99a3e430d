use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_sitemap_cache_layer};
use crate::handlers::{catalog, health_check, inventory, orders, payments, sitemap};
use crate::state::AppState;

fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(inventory::list_events))
        .route("/events/resolve", get(inventory::resolve))
        .route("/tickets", get(inventory::list_tickets))
        .route("/tickets/groups", get(inventory::ticket_groups))
        .route("/categories", get(catalog::list_categories))
        .route("/sports", get(catalog::list_sports))
        .route("/tournaments", get(catalog::list_tournaments))
        .route("/venues", get(catalog::list_venues))
        .route("/teams", get(catalog::list_teams))
        .route("/countries", get(catalog::list_countries))
        .route("/cities", get(catalog::list_cities))
        .route("/revalidate", post(inventory::revalidate))
}

fn sitemap_routes() -> Router<AppState> {
    Router::new()
        .route("/sitemap.xml", get(sitemap::index))
        .route("/sitemap-static.xml", get(sitemap::static_pages))
        .route("/sitemap-events.xml", get(sitemap::events))
        .route("/sitemap-tournaments.xml", get(sitemap::tournaments))
        .route("/sitemap-teams.xml", get(sitemap::teams))
        .route("/sitemap-venues.xml", get(sitemap::venues))
        .layer(create_sitemap_cache_layer())
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/xs2", inventory_routes())
        .route("/api/orders", post(orders::create_order).get(orders::get_order))
        .route("/api/stripe/checkout", post(payments::create_checkout))
        .route("/api/stripe/webhook", post(payments::stripe_webhook))
        .merge(sitemap_routes())
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer())
        .with_state(state)
}
