//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. Rate-limit rejections rewritten as JSON
//! 6. Session layer (tower-sessions with `PostgreSQL` store, wizard state and
//!    the unclaimed order)
//! 7. Per-route: rate limiting on auth/upload endpoints, page guards

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    CurrentAdmin, CurrentUser, OptionalAdmin, OptionalUser, PendingOrder, RequireAdmin,
    RequireUser, require_admin_page, require_user_page,
};
pub use rate_limit::{auth_rate_limiter, rate_limit_json, upload_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, create_session_store};
