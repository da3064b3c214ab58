//! Domain models for the server.
//!
//! Row types decoded from Postgres and the request payloads that create or
//! update them.

pub mod admin;
pub mod content;
pub mod order;
pub mod session;
pub mod user;

use rust_decimal::Decimal;

pub use admin::Admin;
pub use order::{Order, OrderDetails};
pub use user::User;

/// Largest amount a `NUMERIC(10, 2)` price column holds.
fn max_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Check that `price` fits a `NUMERIC(10, 2)` column.
///
/// # Errors
///
/// Returns a message naming `field` when the price is negative, has more
/// than two decimal places or is too large.
pub fn check_price(price: Decimal, field: &str) -> Result<Decimal, String> {
    if price.is_sign_negative() {
        return Err(format!("{field} cannot be negative"));
    }
    if price.normalize().scale() > 2 {
        return Err(format!("{field} must have at most two decimal places"));
    }
    let max = max_price();
    if price > max {
        return Err(format!("{field} must be at most {max}"));
    }
    Ok(price)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_check_price_bounds() {
        assert!(check_price(Decimal::new(14900, 2), "price").is_ok());
        assert!(check_price(max_price(), "price").is_ok());
        assert!(check_price(Decimal::new(-1, 0), "price").is_err());

        let too_large = Decimal::new(12_345_678_901_250, 2);
        assert_eq!(
            check_price(too_large, "planPrice").unwrap_err(),
            "planPrice must be at most 99999999.99"
        );

        let too_precise = Decimal::new(1_999, 3);
        assert!(check_price(too_precise, "price").is_err());
        // Trailing zeros are not extra precision
        assert!(check_price(Decimal::new(1_500, 3), "price").is_ok());
    }
}
