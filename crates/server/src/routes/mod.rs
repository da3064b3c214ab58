//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness
//! GET  /health/ready                   - Readiness (database)
//!
//! # Customer accounts
//! POST /api/auth/register              - Create account, sign in, claim order
//! POST /api/auth/login                 - Sign in, claim order
//! POST /api/auth/logout
//! GET  /api/auth/me
//! POST /api/auth/forgot-password       - Email a reset link (always succeeds)
//! POST /api/auth/reset-password
//!
//! # Orders (owner, or the session that placed an unclaimed order)
//! POST   /api/orders
//! GET    /api/orders                   - Caller's orders, newest first
//! GET    /api/orders/{id}
//! PUT    /api/orders/{id}
//! DELETE /api/orders/{id}
//! GET    /api/orders/{id}/progress     - `?step=` for a single step
//! PUT    /api/orders/{id}/progress
//!
//! # Wizard (session)
//! GET    /api/wizard
//! POST   /api/wizard/actions
//! DELETE /api/wizard
//!
//! # Public content
//! GET  /api/content/{collection}
//!
//! # Admin
//! /api/admin/*                         - see `admin`
//! GET  /admin, /admin/login            - server-rendered pages
//!
//! # Static
//! /uploads/*                           - admin uploads
//! /dashboard/*                         - customer dashboard (login required)
//! /*                                   - built customer site
//! ```

pub mod admin;
pub mod auth;
pub mod content;
pub mod form_progress;
pub mod orders;
pub mod wizard;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower_http::services::{ServeDir, ServeFile};

use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, require_user_page};
use crate::services::uploads::PUBLIC_PREFIX;
use crate::state::AppState;

/// Customer account routes, nested under `/api/auth`.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(limited)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Order and form-progress routes, nested under `/api/orders`.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route(
            "/{id}",
            get(orders::show).put(orders::update).delete(orders::delete),
        )
        .route(
            "/{id}/progress",
            get(form_progress::show).put(form_progress::save),
        )
}

/// Wizard state routes, nested under `/api/wizard`.
pub fn wizard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wizard::show).delete(wizard::clear))
        .route("/actions", post(wizard::apply))
}

/// Static files: uploads, the guarded customer dashboard and the rest of
/// the built site.
pub fn static_routes(state: &AppState) -> Router<AppState> {
    let public = &state.config().public_dir;
    let index = ServeFile::new(public.join("index.html"));

    let dashboard = Router::new()
        .nest_service(
            "/dashboard",
            ServeDir::new(public.join("dashboard")).fallback(index.clone()),
        )
        .route_layer(from_fn_with_state(state.clone(), require_user_page));

    Router::new()
        .nest_service(PUBLIC_PREFIX, ServeDir::new(state.uploads().dir()))
        .merge(dashboard)
        .fallback_service(ServeDir::new(public).fallback(index))
}

/// JSON API routes, nested under `/api`.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/orders", order_routes())
        .nest("/wizard", wizard_routes())
        .route("/content/{collection}", get(content::list))
        .nest("/admin", admin::api_routes(state))
        .fallback(api_not_found)
}

async fn api_not_found() -> AppError {
    AppError::NotFound("No such endpoint".to_string())
}

/// Create all routes for the server.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/api", api_routes(state))
        .nest("/admin", admin::page_routes(state))
        .merge(static_routes(state))
}
