//! Human-readable sequential order identifiers (`MFF0001`, `MFF0002`, ...).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    /// The value does not start with [`OrderNumber::PREFIX`].
    #[error("order number must start with {}", OrderNumber::PREFIX)]
    MissingPrefix,
    /// The suffix is not a positive decimal number.
    #[error("order number suffix must be a positive number")]
    InvalidSequence,
}

/// An order identifier: the `MFF` prefix followed by a zero-padded sequence.
///
/// The sequence is padded to [`OrderNumber::WIDTH`] digits and simply grows
/// wider once it passes `9999`.
///
/// ```
/// use mff_core::OrderNumber;
///
/// let next = OrderNumber::next_after(Some("MFF0007"));
/// assert_eq!(next.as_str(), "MFF0008");
///
/// // No prior order, or a suffix that does not parse, restarts at 1.
/// assert_eq!(OrderNumber::next_after(None).as_str(), "MFF0001");
/// assert_eq!(OrderNumber::next_after(Some("MFFabc")).as_str(), "MFF0001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Prefix shared by every order number.
    pub const PREFIX: &'static str = "MFF";

    /// Minimum number of digits in the sequence part.
    pub const WIDTH: usize = 4;

    /// Build the order number for a given sequence value.
    #[must_use]
    pub fn from_sequence(sequence: u32) -> Self {
        Self(format!(
            "{}{:0width$}",
            Self::PREFIX,
            sequence,
            width = Self::WIDTH
        ))
    }

    /// Parse an existing order number.
    ///
    /// # Errors
    ///
    /// Returns [`OrderNumberError`] if the prefix is missing or the suffix is
    /// not a positive number.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let sequence = Self::sequence_of(s)?;
        Ok(Self::from_sequence(sequence))
    }

    /// Compute the number that follows the most recently issued one.
    ///
    /// `previous` is the latest order identifier in the store, if any.
    #[must_use]
    pub fn next_after(previous: Option<&str>) -> Self {
        let next = previous
            .and_then(|p| Self::sequence_of(p).ok())
            .and_then(|n| n.checked_add(1))
            .unwrap_or(1);
        Self::from_sequence(next)
    }

    /// The numeric part of this order number.
    #[must_use]
    pub fn sequence(&self) -> u32 {
        // Constructors only ever build well-formed values
        Self::sequence_of(&self.0).unwrap_or(0)
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn sequence_of(s: &str) -> Result<u32, OrderNumberError> {
        let digits = s
            .strip_prefix(Self::PREFIX)
            .ok_or(OrderNumberError::MissingPrefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderNumberError::InvalidSequence);
        }
        match digits.parse::<u32>() {
            Ok(0) | Err(_) => Err(OrderNumberError::InvalidSequence),
            Ok(n) => Ok(n),
        }
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.0
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_next_after_increments_by_one() {
        assert_eq!(OrderNumber::next_after(Some("MFF0007")).as_str(), "MFF0008");
        assert_eq!(OrderNumber::next_after(Some("MFF0099")).as_str(), "MFF0100");
    }

    #[test]
    fn test_sequential_numbers_stay_padded_and_strictly_increase() {
        let mut previous: Option<OrderNumber> = None;
        for expected in 1..=120_u32 {
            let next = OrderNumber::next_after(previous.as_ref().map(OrderNumber::as_str));
            assert_eq!(next.sequence(), expected);
            assert_eq!(next.as_str().len(), OrderNumber::PREFIX.len() + 4);
            previous = Some(next);
        }
    }

    #[test]
    fn test_next_after_starts_at_one() {
        assert_eq!(OrderNumber::next_after(None).as_str(), "MFF0001");
        assert_eq!(OrderNumber::next_after(Some("MFF")).as_str(), "MFF0001");
        assert_eq!(OrderNumber::next_after(Some("MFF12x4")).as_str(), "MFF0001");
        assert_eq!(OrderNumber::next_after(Some("ORD0042")).as_str(), "MFF0001");
    }

    #[test]
    fn test_width_grows_past_four_digits() {
        assert_eq!(OrderNumber::next_after(Some("MFF9999")).as_str(), "MFF10000");
    }

    #[test]
    fn test_parse() {
        assert_eq!(OrderNumber::parse("MFF0042").unwrap().sequence(), 42);
        assert_eq!(
            OrderNumber::parse("mff0042"),
            Err(OrderNumberError::MissingPrefix)
        );
        assert_eq!(
            OrderNumber::parse("MFF0000"),
            Err(OrderNumberError::InvalidSequence)
        );
        assert_eq!(
            OrderNumber::parse("MFF-12"),
            Err(OrderNumberError::InvalidSequence)
        );
    }

    #[test]
    fn test_serde_uses_plain_string() {
        let number = OrderNumber::from_sequence(3);
        assert_eq!(serde_json::to_string(&number).unwrap(), "\"MFF0003\"");
        assert!(serde_json::from_str::<OrderNumber>("\"XYZ1\"").is_err());
    }
}
