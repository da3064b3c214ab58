//! Form-progress routes.
//!
//! ```text
//! GET /api/orders/{id}/progress[?step=name]
//! PUT /api/orders/{id}/progress   { step, data, revision? }
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use mff_core::validate_step_name;

use crate::db::FormProgressRepository;
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::{OptionalUser, PendingOrder};
use crate::routes::orders::{OrderCaller, load_for_caller};
use crate::state::AppState;

/// Query parameters for reading progress.
#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub step: Option<String>,
}

/// Body of a progress save.
#[derive(Debug, Deserialize)]
pub struct SaveProgressRequest {
    pub step: String,
    #[serde(default)]
    pub data: Value,
    /// Revision the client last saw; the save is rejected if it is stale.
    pub revision: Option<i64>,
}

/// Read the whole progress document, or one step of it.
#[instrument(skip(state, user, pending, query))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    PendingOrder(pending): PendingOrder,
    Path(id): Path<String>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<Value>> {
    let caller = OrderCaller {
        user: user.as_ref().map(|u| u.id),
        pending: pending.as_ref(),
    };
    let order = load_for_caller(&state, &id, caller).await?;
    let record = FormProgressRepository::new(state.pool())
        .get(&order.id)
        .await?;

    let data = match query.step {
        Some(step) => record.data.step(&step).cloned().unwrap_or(Value::Null),
        None => record.data.into_value(),
    };

    Ok(Json(json!({
        "success": true,
        "data": data,
        "revision": record.revision,
    })))
}

/// Save one step of the progress document.
#[instrument(skip(state, user, pending, body), fields(step = %body.step))]
pub async fn save(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    PendingOrder(pending): PendingOrder,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<SaveProgressRequest>,
) -> Result<Json<Value>> {
    let caller = OrderCaller {
        user: user.as_ref().map(|u| u.id),
        pending: pending.as_ref(),
    };
    let order = load_for_caller(&state, &id, caller).await?;
    validate_step_name(&body.step).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let record = FormProgressRepository::new(state.pool())
        .merge_step(&order.id, &body.step, body.data, body.revision)
        .await?;

    tracing::info!(order_id = %order.id, revision = record.revision, "Form progress saved");
    Ok(Json(json!({
        "success": true,
        "data": record.data,
        "revision": record.revision,
    })))
}
