//! Customer order routes.
//!
//! Orders belong to one customer. An order created before the customer had
//! an account is unclaimed and reachable only from the session that created
//! it until login or registration claims it.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use mff_core::{OrderNumber, UserId};

use crate::db::{FormProgressRepository, OrderRepository};
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::auth::{
    CURRENT_ORDER_COOKIE, OptionalUser, PendingOrder, RequireUser, current_order_cookie,
    removal_cookie,
};
use crate::models::{Order, OrderDetails};
use crate::state::AppState;

/// Who is asking for an order.
#[derive(Debug, Clone, Copy)]
pub struct OrderCaller<'a> {
    pub user: Option<UserId>,
    pub pending: Option<&'a OrderNumber>,
}

impl OrderCaller<'_> {
    const fn is_anonymous(&self) -> bool {
        self.user.is_none() && self.pending.is_none()
    }
}

/// Decide whether `caller` may read or change `order`.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` when the caller has no identity that
/// could grant access, `AppError::Forbidden` when it has one that does not.
pub fn check_access(order: &Order, caller: OrderCaller<'_>) -> Result<()> {
    let allowed = match order.user_id {
        Some(_) => caller.user.is_some_and(|user| order.is_owned_by(user)),
        None => caller.pending == Some(&order.id),
    };

    if allowed {
        Ok(())
    } else if caller.user.is_none() {
        Err(AppError::Unauthorized("Authentication required".to_string()))
    } else {
        Err(AppError::Forbidden(
            "You do not have access to this order".to_string(),
        ))
    }
}

/// Load an order and check the caller may access it.
///
/// # Errors
///
/// 401 without any identity, 404 if the order does not exist, 403 if it
/// belongs to someone else.
pub async fn load_for_caller(
    state: &AppState,
    raw_id: &str,
    caller: OrderCaller<'_>,
) -> Result<Order> {
    if caller.is_anonymous() {
        return Err(AppError::Unauthorized("Authentication required".to_string()));
    }

    let not_found = || AppError::NotFound("Order not found".to_string());
    let id = OrderNumber::parse(raw_id).map_err(|_| not_found())?;
    let order = OrderRepository::new(state.pool())
        .get(&id)
        .await?
        .ok_or_else(not_found)?;

    check_access(&order, caller)?;
    Ok(order)
}

/// Create an order at checkout.
///
/// Anonymous callers get an unclaimed order, remembered in their session,
/// and a `currentOrderId` cookie naming it.
#[instrument(skip(state, user, session, details))]
pub async fn create(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    session: Session,
    ApiJson(details): ApiJson<OrderDetails>,
) -> Result<Response> {
    let details = details.validate().map_err(AppError::BadRequest)?;
    let owner = user.as_ref().map(|u| u.id);

    let order = OrderRepository::new(state.pool())
        .create(owner, &details)
        .await?;

    let cookies: Vec<(axum::http::HeaderName, String)> = if owner.is_none() {
        PendingOrder::remember(&session, &order.id).await?;
        vec![(
            SET_COOKIE,
            current_order_cookie(&order.id, state.config().secure_cookies()),
        )]
    } else {
        Vec::new()
    };

    Ok((
        StatusCode::CREATED,
        AppendHeaders(cookies),
        Json(json!({ "success": true, "order": order })),
    )
        .into_response())
}

/// Dashboard list of the caller's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<serde_json::Value>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(Json(json!({ "success": true, "orders": orders })))
}

/// An order together with its saved form progress.
#[instrument(skip(state, user, pending))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    PendingOrder(pending): PendingOrder,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let caller = OrderCaller {
        user: user.as_ref().map(|u| u.id),
        pending: pending.as_ref(),
    };
    let order = load_for_caller(&state, &id, caller).await?;
    let progress = FormProgressRepository::new(state.pool())
        .get(&order.id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "order": order,
        "progress": progress.data,
        "revision": progress.revision,
    })))
}

/// Replace the customer-editable details of an order. Status is untouched.
#[instrument(skip(state, user, pending, details))]
pub async fn update(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    PendingOrder(pending): PendingOrder,
    Path(id): Path<String>,
    ApiJson(details): ApiJson<OrderDetails>,
) -> Result<Json<serde_json::Value>> {
    let caller = OrderCaller {
        user: user.as_ref().map(|u| u.id),
        pending: pending.as_ref(),
    };
    let order = load_for_caller(&state, &id, caller).await?;
    if order.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Order is {} and can no longer be changed",
            order.status
        )));
    }

    let details = details.validate().map_err(AppError::BadRequest)?;
    let order = OrderRepository::new(state.pool())
        .update_details(&order.id, &details)
        .await?;

    Ok(Json(json!({ "success": true, "order": order })))
}

/// Delete an order and its form progress.
#[instrument(skip(state, user, pending, session))]
pub async fn delete(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    PendingOrder(pending): PendingOrder,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response> {
    let caller = OrderCaller {
        user: user.as_ref().map(|u| u.id),
        pending: pending.as_ref(),
    };
    let order = load_for_caller(&state, &id, caller).await?;

    OrderRepository::new(state.pool()).delete(&order.id).await?;

    let cookies: Vec<(axum::http::HeaderName, String)> = if pending.as_ref() == Some(&order.id) {
        PendingOrder::take(&session).await?;
        vec![(
            SET_COOKIE,
            removal_cookie(CURRENT_ORDER_COOKIE, state.config().secure_cookies()),
        )]
    } else {
        Vec::new()
    };

    Ok((
        AppendHeaders(cookies),
        Json(json!({ "success": true, "message": "Order deleted" })),
    )
        .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use mff_core::OrderStatus;

    use super::*;

    fn order(id: &str, owner: Option<i32>) -> Order {
        Order {
            id: OrderNumber::parse(id).unwrap(),
            user_id: owner.map(UserId::new),
            service_plan: "Standard".to_string(),
            plan_price: None,
            deceased_name: "Margaret Ellis".to_string(),
            deceased_date_of_birth: None,
            deceased_date_of_death: None,
            director_name: None,
            director_email: None,
            director_phone: None,
            special_requests: None,
            status: OrderStatus::Pending,
            service_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_has_access() {
        let caller = OrderCaller {
            user: Some(UserId::new(1)),
            pending: None,
        };
        assert!(check_access(&order("MFF0001", Some(1)), caller).is_ok());
    }

    #[test]
    fn test_other_user_is_forbidden() {
        let caller = OrderCaller {
            user: Some(UserId::new(2)),
            pending: None,
        };
        assert!(matches!(
            check_access(&order("MFF0001", Some(1)), caller),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_anonymous_caller_is_unauthorized_for_owned_order() {
        let pending = OrderNumber::parse("MFF0001").unwrap();
        let caller = OrderCaller {
            user: None,
            pending: Some(&pending),
        };
        assert!(matches!(
            check_access(&order("MFF0001", Some(1)), caller),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_unclaimed_order_needs_matching_session() {
        let unclaimed = order("MFF0003", None);

        let matching = OrderNumber::parse("MFF0003").unwrap();
        let caller = OrderCaller {
            user: None,
            pending: Some(&matching),
        };
        assert!(check_access(&unclaimed, caller).is_ok());

        let other = OrderNumber::parse("MFF0004").unwrap();
        let caller = OrderCaller {
            user: Some(UserId::new(9)),
            pending: Some(&other),
        };
        assert!(matches!(
            check_access(&unclaimed, caller),
            Err(AppError::Forbidden(_))
        ));
    }
}
