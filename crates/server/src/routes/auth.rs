//! Customer authentication routes.
//!
//! Registration and login issue an end-user credential in the
//! `session_token` cookie and claim the order this browser session placed
//! before login, if any. Password reset never reveals whether an address has an account.

use axum::{
    Json,
    extract::State,
    http::{HeaderName, StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use mff_core::PrincipalType;

use crate::db::{OrderRepository, UserRepository};
use crate::error::{ApiJson, AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::auth::{
    CURRENT_ORDER_COOKIE, PendingOrder, RequireUser, credential_cookie, removal_cookie,
};
use crate::models::User;
use crate::services::AuthService;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Forgot-password request body.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset-password request body.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Create a customer account and sign it in.
#[instrument(skip(state, session, body))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<Response> {
    let user = AuthService::new(state.pool())
        .register_user(&body.email, &body.password, body.name.as_deref())
        .await?;

    tracing::info!(user_id = %user.id, "Customer registered");
    sign_in(&state, &session, user, StatusCode::CREATED).await
}

/// Sign a customer in.
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Response> {
    let user = AuthService::new(state.pool())
        .login_user(&body.email, &body.password)
        .await?;

    tracing::info!(user_id = %user.id, "Customer logged in");
    sign_in(&state, &session, user, StatusCode::OK).await
}

/// Issue the credential cookie, claim the session's pending order and
/// rotate the session id.
async fn sign_in(
    state: &AppState,
    session: &Session,
    user: User,
    status: StatusCode,
) -> Result<Response> {
    let pending = PendingOrder::take(session).await?;
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;

    let secure = state.config().secure_cookies();
    let issued = state
        .credentials()
        .issue(PrincipalType::EndUser, user.id.as_i32(), &user.email)?;

    let mut cookies: Vec<(HeaderName, String)> =
        vec![(SET_COOKIE, credential_cookie(&issued, secure))];
    let mut claimed = None;

    if let Some(order_id) = pending {
        if OrderRepository::new(state.pool())
            .claim(&order_id, user.id)
            .await?
        {
            tracing::info!(order_id = %order_id, user_id = %user.id, "Order claimed");
            claimed = Some(order_id);
        }
        cookies.push((SET_COOKIE, removal_cookie(CURRENT_ORDER_COOKIE, secure)));
    }

    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok((
        status,
        AppendHeaders(cookies),
        Json(json!({
            "success": true,
            "user": user,
            "claimedOrderId": claimed,
        })),
    )
        .into_response())
}

/// Sign the customer out.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    clear_sentry_user();
    (
        AppendHeaders([(
            SET_COOKIE,
            removal_cookie(
                PrincipalType::EndUser.cookie_name(),
                state.config().secure_cookies(),
            ),
        )]),
        Json(json!({ "success": true })),
    )
}

/// The signed-in customer.
#[instrument(skip(state, current), fields(user_id = %current.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
) -> Result<Json<Value>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(Json(json!({ "success": true, "user": user })))
}

/// Email a password-reset link. Always reports success.
#[instrument(skip(state, body))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<Value>> {
    let ttl = state.config().tokens.reset_ttl;
    let issued = AuthService::new(state.pool())
        .start_password_reset(&body.email, ttl)
        .await?;

    if let Some((email, token)) = issued {
        let reset_url = format!(
            "{}/reset-password?token={}",
            state.config().base_url,
            urlencoding::encode(&token)
        );
        if let Err(e) = state
            .email()
            .send_password_reset(&email, &reset_url, ttl.num_minutes())
            .await
        {
            tracing::error!(error = %e, "Failed to send password reset email");
        }
    }

    Ok(Json(json!({
        "success": true,
        "message": "If an account exists for that address, a reset link has been sent.",
    })))
}

/// Set a new password with a reset token.
#[instrument(skip(state, body))]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> Result<Json<Value>> {
    AuthService::new(state.pool())
        .complete_password_reset(&body.token, &body.password)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password updated. You can now log in.",
    })))
}
