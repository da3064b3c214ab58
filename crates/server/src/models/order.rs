//! Order types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use mff_core::{OrderNumber, OrderStatus, UserId};

const MAX_TEXT_LENGTH: usize = 500;
const MAX_SPECIAL_REQUESTS_LENGTH: usize = 5000;

/// A funeral-music order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Sequential identifier (`MFF0001`).
    pub id: OrderNumber,
    /// Owning customer; `None` while the order is unclaimed.
    pub user_id: Option<UserId>,
    pub service_plan: String,
    pub plan_price: Option<Decimal>,
    pub deceased_name: String,
    pub deceased_date_of_birth: Option<NaiveDate>,
    pub deceased_date_of_death: Option<NaiveDate>,
    pub director_name: Option<String>,
    pub director_email: Option<String>,
    pub director_phone: Option<String>,
    pub special_requests: Option<String>,
    pub status: OrderStatus,
    pub service_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether `user` may read or change this order.
    ///
    /// Unclaimed orders are reachable only from the session that placed
    /// them, which the caller checks separately.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user_id == Some(user)
    }
}

/// Customer-editable order fields, used for both creation and update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub service_plan: Option<String>,
    pub plan_price: Option<Decimal>,
    pub deceased_name: Option<String>,
    pub deceased_date_of_birth: Option<NaiveDate>,
    pub deceased_date_of_death: Option<NaiveDate>,
    pub director_name: Option<String>,
    pub director_email: Option<String>,
    pub director_phone: Option<String>,
    pub special_requests: Option<String>,
    pub service_date: Option<NaiveDate>,
}

/// Order fields after validation, ready to be written.
#[derive(Debug, Clone)]
pub struct ValidOrderDetails {
    pub service_plan: String,
    pub plan_price: Option<Decimal>,
    pub deceased_name: String,
    pub deceased_date_of_birth: Option<NaiveDate>,
    pub deceased_date_of_death: Option<NaiveDate>,
    pub director_name: Option<String>,
    pub director_email: Option<String>,
    pub director_phone: Option<String>,
    pub special_requests: Option<String>,
    pub service_date: Option<NaiveDate>,
}

impl OrderDetails {
    /// Check required fields and basic consistency.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(self) -> Result<ValidOrderDetails, String> {
        let service_plan = required(self.service_plan, "servicePlan")?;
        let deceased_name = required(self.deceased_name, "deceasedName")?;

        let plan_price = self
            .plan_price
            .map(|p| super::check_price(p, "planPrice"))
            .transpose()?;

        if let (Some(born), Some(died)) = (self.deceased_date_of_birth, self.deceased_date_of_death)
            && died < born
        {
            return Err("deceasedDateOfDeath cannot be before deceasedDateOfBirth".to_string());
        }

        let director_email = optional(self.director_email);
        if let Some(email) = &director_email {
            mff_core::Email::parse(email)
                .map_err(|e| format!("directorEmail is invalid: {e}"))?;
        }

        let special_requests = optional(self.special_requests);
        if special_requests
            .as_ref()
            .is_some_and(|s| s.len() > MAX_SPECIAL_REQUESTS_LENGTH)
        {
            return Err(format!(
                "specialRequests must be at most {MAX_SPECIAL_REQUESTS_LENGTH} characters"
            ));
        }

        Ok(ValidOrderDetails {
            service_plan,
            plan_price,
            deceased_name,
            deceased_date_of_birth: self.deceased_date_of_birth,
            deceased_date_of_death: self.deceased_date_of_death,
            director_name: optional(self.director_name),
            director_email,
            director_phone: optional(self.director_phone),
            special_requests,
            service_date: self.service_date,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, String> {
    let value = optional(value).ok_or_else(|| format!("{field} is required"))?;
    if value.len() > MAX_TEXT_LENGTH {
        return Err(format!("{field} must be at most {MAX_TEXT_LENGTH} characters"));
    }
    Ok(value)
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Admin request to move an order to a new status.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}
