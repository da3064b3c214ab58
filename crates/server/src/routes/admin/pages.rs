//! Server-rendered admin pages.
//!
//! ```text
//! GET  /admin/login   - login form (public)
//! POST /admin/login   - form login, redirects to /admin
//! POST /admin/logout  - clears the admin cookie
//! GET  /admin         - dashboard (guarded)
//! ```

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use mff_core::PrincipalType;

use super::auth::admin_cookie;
use crate::db::{AdminRepository, ContentRepository, OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::auth::{ADMIN_LOGIN_PATH, OptionalAdmin, RequireAdmin, removal_cookie};
use crate::models::content::{
    Collection, ContentSection, DemoVideo, FaqItem, HowItWorksItem, PricingPlan, ServiceItem,
};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Orders shown on the dashboard.
const RECENT_ORDER_LIMIT: usize = 10;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub email: String,
}

/// One collection count on the dashboard.
#[derive(Debug, Clone)]
pub struct CollectionCount {
    pub label: &'static str,
    pub slug: &'static str,
    pub count: i64,
}

/// Recent order view for the dashboard.
#[derive(Debug, Clone)]
pub struct RecentOrderView {
    pub id: String,
    pub deceased_name: String,
    pub service_plan: String,
    pub status: String,
    pub created: String,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub admin_name: String,
    pub order_count: i64,
    pub admin_count: i64,
    pub collections: Vec<CollectionCount>,
    pub recent_orders: Vec<RecentOrderView>,
}

/// Display the login page, or go straight to the dashboard when signed in.
pub async fn login_page(OptionalAdmin(admin): OptionalAdmin) -> Response {
    if admin.is_some() {
        return Redirect::to("/admin").into_response();
    }
    LoginTemplate {
        error: None,
        email: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, form))]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Response> {
    let admin = match AuthService::new(state.pool())
        .login_admin(&form.email, &form.password)
        .await
    {
        Ok(admin) => admin,
        Err(AuthError::InvalidCredentials) => {
            let page = LoginTemplate {
                error: Some("Invalid email or password".to_string()),
                email: form.email,
            };
            return Ok((StatusCode::UNAUTHORIZED, page).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(admin_id = %admin.id, "Admin logged in via form");
    let cookie = admin_cookie(&state, &admin)?;
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Redirect::to("/admin"),
    )
        .into_response())
}

/// Clear the admin cookie and return to the login page.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        AppendHeaders([(
            SET_COOKIE,
            removal_cookie(
                PrincipalType::Admin.cookie_name(),
                state.config().secure_cookies(),
            ),
        )]),
        Redirect::to(ADMIN_LOGIN_PATH),
    )
}

/// Dashboard page handler.
#[instrument(skip(state, current), fields(admin_id = %current.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(current): RequireAdmin,
) -> Result<DashboardTemplate> {
    let pool = state.pool();
    let admins = AdminRepository::new(pool);
    let orders = OrderRepository::new(pool);

    let admin = admins
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Admin account no longer exists".to_string()))?;

    let mut collections = Vec::with_capacity(Collection::ALL.len());
    for collection in Collection::ALL {
        collections.push(CollectionCount {
            label: collection.label(),
            slug: collection.slug(),
            count: collection_count(pool, collection).await?,
        });
    }

    let recent_orders = orders
        .list_all(None)
        .await?
        .into_iter()
        .take(RECENT_ORDER_LIMIT)
        .map(|o| RecentOrderView {
            id: o.id.to_string(),
            deceased_name: o.deceased_name,
            service_plan: o.service_plan,
            status: o.status.to_string(),
            created: o.created_at.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    Ok(DashboardTemplate {
        admin_name: admin.name,
        order_count: orders.count().await?,
        admin_count: admins.count().await?,
        collections,
        recent_orders,
    })
}

async fn collection_count(
    pool: &PgPool,
    collection: Collection,
) -> std::result::Result<i64, RepositoryError> {
    match collection {
        Collection::Services => ContentRepository::<ServiceItem>::new(pool).count().await,
        Collection::Pricing => ContentRepository::<PricingPlan>::new(pool).count().await,
        Collection::Faqs => ContentRepository::<FaqItem>::new(pool).count().await,
        Collection::HowItWorks => ContentRepository::<HowItWorksItem>::new(pool).count().await,
        Collection::Sections => ContentRepository::<ContentSection>::new(pool).count().await,
        Collection::Videos => ContentRepository::<DemoVideo>::new(pool).count().await,
    }
}
