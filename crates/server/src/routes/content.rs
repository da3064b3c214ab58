//! Public read access to CMS content.
//!
//! `GET /api/content/{collection}` lists the active rows of one collection.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use sqlx::PgPool;
use tracing::instrument;

use crate::db::ContentRepository;
use crate::error::{AppError, Result};
use crate::models::content::{
    Collection, ContentEntity, ContentSection, DemoVideo, FaqItem, HowItWorksItem, PricingPlan,
    ServiceItem,
};
use crate::state::AppState;

/// List the active rows of a collection.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<Value>> {
    let collection = Collection::from_slug(&collection)
        .ok_or_else(|| AppError::NotFound(format!("Unknown collection: {collection}")))?;

    let pool = state.pool();
    let items = match collection {
        Collection::Services => active::<ServiceItem>(pool).await?,
        Collection::Pricing => active::<PricingPlan>(pool).await?,
        Collection::Faqs => active::<FaqItem>(pool).await?,
        Collection::HowItWorks => active::<HowItWorksItem>(pool).await?,
        Collection::Sections => active::<ContentSection>(pool).await?,
        Collection::Videos => active::<DemoVideo>(pool).await?,
    };

    Ok(Json(json!({ "success": true, "items": items })))
}

async fn active<T: ContentEntity>(pool: &PgPool) -> Result<Value> {
    let rows = ContentRepository::<T>::new(pool).list(true).await?;
    serde_json::to_value(rows).map_err(|e| AppError::Internal(e.to_string()))
}
