use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::services::checkout::{CheckoutReceipt, CheckoutRequest};
use crate::state::AppState;
use crate::utils::error::AppError;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

pub async fn create_checkout(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutReceipt>, AppError> {
    let Json(request) = payload.map_err(AppError::from)?;
    let receipt = state.checkout.checkout(request).await?;
    Ok(Json(receipt))
}

/// Payment processor callback. The raw body is needed as sent, since the
/// signature covers its exact bytes.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    state.checkout.handle_webhook(&body, signature).await?;
    Ok("ok")
}
