//! Admin order management.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use mff_core::{OrderNumber, OrderStatus};

use crate::db::{FormProgressRepository, OrderRepository};
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::order::StatusUpdate;
use crate::state::AppState;

/// Optional status filter for the order list.
#[derive(Debug, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

/// Every order, newest first.
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Value>> {
    let orders = OrderRepository::new(state.pool())
        .list_all(filter.status)
        .await?;
    Ok(Json(json!({ "success": true, "orders": orders })))
}

/// One order with its form progress.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_order_number(&id)?;
    let order = OrderRepository::new(state.pool())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    let progress = FormProgressRepository::new(state.pool()).get(&id).await?;

    Ok(Json(json!({
        "success": true,
        "order": order,
        "progress": progress.data,
        "revision": progress.revision,
    })))
}

/// Move an order to a new status. Completed and cancelled orders are final.
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<Json<Value>> {
    let id = parse_order_number(&id)?;
    let orders = OrderRepository::new(state.pool());
    let current = orders
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    if current.status.is_terminal() && current.status != body.status {
        return Err(AppError::Conflict(format!(
            "Order is already {}",
            current.status
        )));
    }

    let order = orders.update_status(&id, body.status).await?;
    tracing::info!(
        order_id = %id,
        from = %current.status,
        to = %order.status,
        "Order status changed"
    );

    Ok(Json(json!({ "success": true, "order": order })))
}

fn parse_order_number(raw: &str) -> Result<OrderNumber> {
    OrderNumber::parse(raw).map_err(|_| AppError::NotFound("Order not found".to_string()))
}
