//! Generic CRUD handlers for CMS content.
//!
//! Each collection mounts the same five handlers, instantiated for its
//! entity type:
//!
//! ```text
//! GET    /api/admin/{collection}        - list (display order, then age)
//! POST   /api/admin/{collection}        - create
//! GET    /api/admin/{collection}/{id}
//! PUT    /api/admin/{collection}/{id}   - replace fields
//! DELETE /api/admin/{collection}/{id}
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::db::ContentRepository;
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::content::{ContentEntity, ContentInput};
use crate::state::AppState;

/// Routes for one content collection.
pub fn collection_routes<T: ContentEntity>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<T>).post(create::<T>))
        .route("/{id}", get(show::<T>).put(update::<T>).delete(delete::<T>))
}

fn parse_id<T: ContentEntity>(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("{} not found", T::NAME)))
}

async fn list<T: ContentEntity>(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Value>> {
    let items = ContentRepository::<T>::new(state.pool()).list(false).await?;
    Ok(Json(json!({ "success": true, "items": items })))
}

async fn create<T: ContentEntity>(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(input): ApiJson<ContentInput<T::Fields>>,
) -> Result<(StatusCode, Json<Value>)> {
    let columns = T::columns(input.fields).map_err(AppError::BadRequest)?;
    let item = ContentRepository::<T>::new(state.pool())
        .create(
            columns,
            input.order.unwrap_or(0),
            input.is_active.unwrap_or(true),
        )
        .await?;

    tracing::info!(admin_id = %admin.id, table = T::TABLE, "Content created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "item": item })),
    ))
}

async fn show<T: ContentEntity>(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id::<T>(&id)?;
    let item = ContentRepository::<T>::new(state.pool()).get(id).await?;
    Ok(Json(json!({ "success": true, "item": item })))
}

async fn update<T: ContentEntity>(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ContentInput<T::Fields>>,
) -> Result<Json<Value>> {
    let id = parse_id::<T>(&id)?;
    let columns = T::columns(input.fields).map_err(AppError::BadRequest)?;
    let item = ContentRepository::<T>::new(state.pool())
        .update(id, columns, input.order, input.is_active)
        .await?;

    tracing::info!(admin_id = %admin.id, table = T::TABLE, %id, "Content updated");
    Ok(Json(json!({ "success": true, "item": item })))
}

async fn delete<T: ContentEntity>(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id::<T>(&id)?;
    ContentRepository::<T>::new(state.pool()).delete(id).await?;

    tracing::info!(admin_id = %admin.id, table = T::TABLE, %id, "Content deleted");
    Ok(Json(json!({ "success": true })))
}
