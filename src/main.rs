use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use storefront_server::config::Config;
use storefront_server::routes::create_routes;
use storefront_server::services::{CheckoutService, InventoryProxy, StripeClient, Xs2Client};
use storefront_server::state::AppState;
use storefront_server::store::PgStore;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    config.log_summary();

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    let store = Arc::new(PgStore::new(pool));
    let inventory = Arc::new(InventoryProxy::new(Arc::new(Xs2Client::new(
        config.xs2_api_url.clone(),
        config.xs2_api_key.clone(),
    ))));
    let checkout = Arc::new(CheckoutService::new(
        inventory.clone(),
        Arc::new(StripeClient::new(config.stripe_secret_key.clone())),
        store.clone(),
        config.stripe_webhook_secret.clone(),
    ));

    let addr = config.bind_addr();
    let state = AppState {
        config: Arc::new(config),
        catalog: store.clone(),
        orders: store,
        inventory,
        checkout,
    };

    let app: Router = create_routes(state);

    tracing::info!("Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
