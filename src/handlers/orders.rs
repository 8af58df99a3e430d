use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{NewOrder, Order};
use crate::state::AppState;
use crate::utils::error::AppError;

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub id: Option<String>,
}

/// Records a pending order directly, outside the checkout flow.
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<NewOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let Json(payload) = payload.map_err(AppError::from)?;
    payload.validate().map_err(AppError::ValidationError)?;

    let order = state.orders.insert_order(payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Order>, AppError> {
    let raw = query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::ValidationError("id is required".into()))?;
    let id = Uuid::parse_str(raw)
        .map_err(|_| AppError::ValidationError(format!("'{raw}' is not a valid order id")))?;

    state
        .orders
        .find_order(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Order '{id}' not found")))
}
