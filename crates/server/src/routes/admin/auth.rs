//! Admin authentication and account management.
//!
//! ```text
//! POST /api/admin/auth/register  - create the first admin (closed afterwards)
//! POST /api/admin/auth/login
//! POST /api/admin/auth/logout
//! GET  /api/admin/auth/me
//! GET  /api/admin/admins
//! POST /api/admin/admins         - add another admin
//! ```

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use mff_core::PrincipalType;

use crate::db::AdminRepository;
use crate::error::{ApiJson, AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::RequireAdmin;
use crate::middleware::auth::{credential_cookie, removal_cookie};
use crate::models::Admin;
use crate::services::AuthService;
use crate::state::AppState;

/// Body for creating an admin account.
#[derive(Debug, Deserialize)]
pub struct NewAdminRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Admin login body.
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

/// Issue an admin credential cookie for `admin`.
///
/// # Errors
///
/// Returns `AppError::Credential` if signing fails.
pub fn admin_cookie(state: &AppState, admin: &Admin) -> Result<String> {
    let issued = state
        .credentials()
        .issue(PrincipalType::Admin, admin.id.as_i32(), &admin.email)?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));
    Ok(credential_cookie(&issued, state.config().secure_cookies()))
}

/// Bootstrap the first admin account and sign it in.
#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewAdminRequest>,
) -> Result<Response> {
    let admin = AuthService::new(state.pool())
        .bootstrap_admin(&body.email, &body.password, &body.name)
        .await?;
    tracing::info!(admin_id = %admin.id, "First admin registered");

    let cookie = admin_cookie(&state, &admin)?;
    Ok((
        StatusCode::CREATED,
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(json!({ "success": true, "admin": admin })),
    )
        .into_response())
}

/// Sign an admin in.
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AdminLoginRequest>,
) -> Result<Response> {
    let admin = AuthService::new(state.pool())
        .login_admin(&body.email, &body.password)
        .await?;
    tracing::info!(admin_id = %admin.id, "Admin logged in");

    let cookie = admin_cookie(&state, &admin)?;
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(json!({ "success": true, "admin": admin })),
    )
        .into_response())
}

/// Sign the admin out.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    clear_sentry_user();
    (
        AppendHeaders([(
            SET_COOKIE,
            removal_cookie(
                PrincipalType::Admin.cookie_name(),
                state.config().secure_cookies(),
            ),
        )]),
        Json(json!({ "success": true })),
    )
}

/// The signed-in admin.
#[instrument(skip(state, current), fields(admin_id = %current.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAdmin(current): RequireAdmin,
) -> Result<Json<Value>> {
    let admin = AdminRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Admin account no longer exists".to_string()))?;

    Ok(Json(json!({ "success": true, "admin": admin })))
}

/// All admin accounts.
#[instrument(skip(state, _admin))]
pub async fn list_admins(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Value>> {
    let admins = AdminRepository::new(state.pool()).list().await?;
    Ok(Json(json!({ "success": true, "admins": admins })))
}

/// Add another admin account.
#[instrument(skip(state, current, body), fields(admin_id = %current.id))]
pub async fn create_admin(
    State(state): State<AppState>,
    RequireAdmin(current): RequireAdmin,
    ApiJson(body): ApiJson<NewAdminRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let admin = AuthService::new(state.pool())
        .create_admin(&body.email, &body.password, &body.name)
        .await?;
    tracing::info!(created_by = %current.id, new_admin_id = %admin.id, "Admin created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "admin": admin })),
    ))
}
