//! Authentication extractors, page guards and credential cookies.
//!
//! Customers and admins each carry a signed credential in their own cookie
//! (`session_token` / `admin_token`). A missing, expired, wrongly signed or
//! wrong-principal token is treated as no token at all.
//!
//! An order placed before login is remembered in the server-side session.
//! The `currentOrderId` cookie only tells the browser which order to resume
//! and never grants access by itself.

use axum::{
    extract::{FromRequestParts, OriginalUri, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use mff_core::{AdminId, OrderNumber, PrincipalType, UserId};

use crate::error::AppError;
use crate::models::session::keys;
use crate::services::{Claims, IssuedCredential};
use crate::state::AppState;

/// Cookie holding the number of an order placed before login.
pub const CURRENT_ORDER_COOKIE: &str = "currentOrderId";

/// Where unauthenticated admin page requests are sent.
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

/// Lifetime of the `currentOrderId` cookie.
const CURRENT_ORDER_MAX_AGE_DAYS: i64 = 7;

/// An authenticated customer.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
}

/// An authenticated admin.
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub id: AdminId,
    pub email: String,
}

/// Extractor that requires a customer credential; 401 JSON otherwise.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        current_user(&parts.headers, state)
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extractor that optionally gets the current customer.
///
/// Unlike `RequireUser`, this does not reject the request if the customer is
/// not logged in.
pub struct OptionalUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(&parts.headers, state)))
    }
}

/// Extractor that requires an admin credential; 401 JSON otherwise.
pub struct RequireAdmin(pub CurrentAdmin);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        current_admin(&parts.headers, state)
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Admin authentication required".to_string()))
    }
}

/// Extractor that optionally gets the current admin.
pub struct OptionalAdmin(pub Option<CurrentAdmin>);

impl FromRequestParts<AppState> for OptionalAdmin {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(current_admin(&parts.headers, state)))
    }
}

/// The unclaimed order this browser session created, if any.
///
/// Read from the session store, so only the session that placed the order
/// can reach it.
pub struct PendingOrder(pub Option<OrderNumber>);

impl PendingOrder {
    /// Remember `id` as this session's unclaimed order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the session store fails.
    pub async fn remember(session: &Session, id: &OrderNumber) -> Result<(), AppError> {
        session
            .insert(keys::PENDING_ORDER, id)
            .await
            .map_err(|e| AppError::Internal(format!("session write failed: {e}")))
    }

    /// Forget and return this session's unclaimed order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the session store fails.
    pub async fn take(session: &Session) -> Result<Option<OrderNumber>, AppError> {
        session
            .remove::<OrderNumber>(keys::PENDING_ORDER)
            .await
            .map_err(|e| AppError::Internal(format!("session write failed: {e}")))
    }
}

impl<S> FromRequestParts<S> for PendingOrder
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(msg.to_string()))?;
        let pending = session
            .get::<OrderNumber>(keys::PENDING_ORDER)
            .await
            .map_err(|e| AppError::Internal(format!("session read failed: {e}")))?;
        Ok(Self(pending))
    }
}

/// Middleware for admin HTML pages: redirect to the login page unless a
/// valid admin credential is present.
pub async fn require_admin_page(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if current_admin(request.headers(), &state).is_some() {
        return next.run(request).await;
    }
    Redirect::to(ADMIN_LOGIN_PATH).into_response()
}

/// Middleware for customer pages: redirect to `/login?callbackUrl=...`
/// unless a valid customer credential is present.
pub async fn require_user_page(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if current_user(request.headers(), &state).is_some() {
        return next.run(request).await;
    }

    // Nested services see a stripped URI; the original one is what the
    // browser should come back to.
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().clone(), |original| original.0.clone());
    let target = uri.path_and_query().map_or("/", |pq| pq.as_str());

    Redirect::to(&login_redirect(target)).into_response()
}

/// Login URL that returns to `path` afterwards.
#[must_use]
pub fn login_redirect(path: &str) -> String {
    format!("/login?callbackUrl={}", urlencoding::encode(path))
}

fn current_user(headers: &HeaderMap, state: &AppState) -> Option<CurrentUser> {
    let claims = verified_claims(headers, state, PrincipalType::EndUser)?;
    Some(CurrentUser {
        id: claims.user_id()?,
        email: claims.email,
    })
}

fn current_admin(headers: &HeaderMap, state: &AppState) -> Option<CurrentAdmin> {
    let claims = verified_claims(headers, state, PrincipalType::Admin)?;
    Some(CurrentAdmin {
        id: claims.admin_id()?,
        email: claims.email,
    })
}

fn verified_claims(
    headers: &HeaderMap,
    state: &AppState,
    principal: PrincipalType,
) -> Option<Claims> {
    let token = read_cookie(headers, principal.cookie_name())?;
    state
        .credentials()
        .verify(&token, principal)
        .inspect_err(|e| tracing::debug!(error = %e, ?principal, "Rejected credential"))
        .ok()
}

// =============================================================================
// Cookies
// =============================================================================

/// Value of the cookie `name` in the request, if present.
#[must_use]
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

/// `Set-Cookie` value carrying a freshly issued credential.
#[must_use]
pub fn credential_cookie(issued: &IssuedCredential, secure: bool) -> String {
    base_cookie(issued.principal.cookie_name(), issued.token.clone(), secure)
        .max_age(Duration::seconds(issued.max_age_seconds()))
        .build()
        .to_string()
}

/// `Set-Cookie` value telling the browser which unclaimed order to resume.
///
/// Readable by scripts; access is decided by [`PendingOrder`].
#[must_use]
pub fn current_order_cookie(id: &OrderNumber, secure: bool) -> String {
    base_cookie(CURRENT_ORDER_COOKIE, id.to_string(), secure)
        .http_only(false)
        .max_age(Duration::days(CURRENT_ORDER_MAX_AGE_DAYS))
        .build()
        .to_string()
}

/// `Set-Cookie` value deleting cookie `name`.
#[must_use]
pub fn removal_cookie(name: &'static str, secure: bool) -> String {
    let mut cookie = base_cookie(name, String::new(), secure).build();
    cookie.make_removal();
    cookie.to_string()
}

fn base_cookie(
    name: &'static str,
    value: String,
    secure: bool,
) -> tower_sessions::cookie::CookieBuilder<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
}
