use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::utils::response::success;

pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod payments;
pub mod sitemap;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "storefront-server",
    };

    success(payload, "Health check successful").into_response()
}
