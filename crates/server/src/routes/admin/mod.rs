//! Admin CMS: JSON API under `/api/admin` and HTML pages under `/admin`.
//!
//! Every API handler takes [`crate::middleware::RequireAdmin`], so requests
//! without a valid `admin_token` get 401 JSON. Pages sit behind
//! [`crate::middleware::require_admin_page`], which redirects to
//! `/admin/login` instead.

pub mod auth;
pub mod content;
pub mod orders;
pub mod pages;
pub mod uploads;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

use crate::middleware::{auth_rate_limiter, require_admin_page, upload_rate_limiter};
use crate::models::content::{
    Collection, ContentSection, DemoVideo, FaqItem, HowItWorksItem, PricingPlan, ServiceItem,
};
use crate::state::AppState;

/// JSON API routes, nested under `/api/admin`.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let sign_in = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .layer(auth_rate_limiter());

    let uploads = Router::new()
        .route("/uploads", post(uploads::upload))
        .layer(DefaultBodyLimit::max(state.config().max_upload_bytes))
        .layer(upload_rate_limiter());

    let mut router = Router::new()
        .merge(sign_in)
        .merge(uploads)
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/admins", get(auth::list_admins).post(auth::create_admin))
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", put(orders::update_status));

    for collection in Collection::ALL {
        let routes = match collection {
            Collection::Services => content::collection_routes::<ServiceItem>(),
            Collection::Pricing => content::collection_routes::<PricingPlan>(),
            Collection::Faqs => content::collection_routes::<FaqItem>(),
            Collection::HowItWorks => content::collection_routes::<HowItWorksItem>(),
            Collection::Sections => content::collection_routes::<ContentSection>(),
            Collection::Videos => content::collection_routes::<DemoVideo>(),
        };
        router = router.nest(&format!("/{}", collection.slug()), routes);
    }

    router
}

/// HTML pages, nested under `/admin`.
pub fn page_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(pages::dashboard))
        .route("/logout", post(pages::logout))
        .route_layer(from_fn_with_state(state.clone(), require_admin_page))
        .route(
            "/login",
            get(pages::login_page).merge(post(pages::login).layer(auth_rate_limiter())),
        )
}
