//! Wizard state routes.
//!
//! The consumer wizard's in-progress selections live in the server-side
//! session. Clients read the current [`WizardState`] and change it only by
//! posting [`WizardAction`]s.

use axum::Json;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use mff_core::{WizardAction, WizardState};

use crate::error::{ApiJson, AppError, Result};
use crate::models::session::keys;

async fn load(session: &Session) -> Result<WizardState> {
    session
        .get::<WizardState>(keys::WIZARD)
        .await
        .map(Option::unwrap_or_default)
        .map_err(|e| AppError::Internal(format!("session read failed: {e}")))
}

/// Current wizard state (empty if nothing has been chosen yet).
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<Value>> {
    let state = load(&session).await?;
    Ok(Json(json!({ "success": true, "state": state })))
}

/// Apply one action to the wizard state.
#[instrument(skip(session, action))]
pub async fn apply(
    session: Session,
    ApiJson(action): ApiJson<WizardAction>,
) -> Result<Json<Value>> {
    let mut state = load(&session).await?;
    state
        .apply(action)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    session
        .insert(keys::WIZARD, &state)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;

    Ok(Json(json!({ "success": true, "state": state })))
}

/// Forget the wizard state.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<Value>> {
    session
        .remove::<WizardState>(keys::WIZARD)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;

    Ok(Json(json!({ "success": true, "state": WizardState::default() })))
}
