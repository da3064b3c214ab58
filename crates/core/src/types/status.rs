//! Status and principal enums.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// Checkout always creates orders as `Pending`; only staff move them on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "mff.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Whether the order can no longer change status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// The two kinds of authenticated caller.
///
/// Customers and admins live in separate tables and carry separate
/// credentials; a credential issued for one kind never authenticates the
/// other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalType {
    /// A customer placing and managing orders.
    EndUser,
    /// Staff managing site content.
    Admin,
}

impl PrincipalType {
    /// Name of the cookie that carries this principal's credential.
    #[must_use]
    pub const fn cookie_name(self) -> &'static str {
        match self {
            Self::EndUser => "session_token",
            Self::Admin => "admin_token",
        }
    }

    /// Token audience claim for this principal.
    #[must_use]
    pub const fn audience(self) -> &'static str {
        match self {
            Self::EndUser => "mff:end-user",
            Self::Admin => "mff:admin",
        }
    }
}

impl std::fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndUser => write!(f, "end_user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Confirmed.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_principal_types_never_share_cookie_or_audience() {
        assert_ne!(
            PrincipalType::EndUser.cookie_name(),
            PrincipalType::Admin.cookie_name()
        );
        assert_ne!(
            PrincipalType::EndUser.audience(),
            PrincipalType::Admin.audience()
        );
        assert_eq!(PrincipalType::Admin.cookie_name(), "admin_token");
    }
}
