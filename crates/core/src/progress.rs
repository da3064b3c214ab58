//! The form-progress document.
//!
//! While a customer works through the wizard, every step they save lands in a
//! sparse JSON object keyed by step name. The only structural rule is that the
//! five denomination-specific preference steps are mutually exclusive: saving
//! one drops the others.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Step names of the denomination-specific music preference forms.
pub const PREFERENCE_STEPS: [&str; 5] = [
    "catholicPreference",
    "baptistPreference",
    "secularOrCivilPreference",
    "anglicanPreference",
    "unitingPreference",
];

/// Longest step name accepted.
pub const MAX_STEP_NAME_LENGTH: usize = 64;

/// Whether `step` is one of the mutually exclusive preference steps.
#[must_use]
pub fn is_preference_step(step: &str) -> bool {
    PREFERENCE_STEPS.contains(&step)
}

/// Errors from validating a step name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StepNameError {
    #[error("step name cannot be empty")]
    Empty,
    #[error("step name must be at most {MAX_STEP_NAME_LENGTH} characters")]
    TooLong,
    #[error("step name may only contain letters, digits, '_' and '-'")]
    InvalidCharacter,
}

/// Check that a step name is usable as a document key.
///
/// # Errors
///
/// Returns [`StepNameError`] for empty, overlong, or non-identifier names.
pub fn validate_step_name(step: &str) -> Result<(), StepNameError> {
    if step.is_empty() {
        return Err(StepNameError::Empty);
    }
    if step.len() > MAX_STEP_NAME_LENGTH {
        return Err(StepNameError::TooLong);
    }
    if !step
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(StepNameError::InvalidCharacter);
    }
    Ok(())
}

/// Step-name to payload mapping for one order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormProgress(Map<String, Value>);

impl FormProgress {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from a stored JSON value.
    ///
    /// Anything other than an object is treated as an empty document.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Save `payload` under `step`.
    ///
    /// If `step` is a preference step, every other preference step is removed
    /// first. Returns the names of the steps that were dropped.
    pub fn set_step(&mut self, step: &str, payload: Value) -> Vec<String> {
        let mut dropped = Vec::new();
        if is_preference_step(step) {
            for other in PREFERENCE_STEPS.iter().filter(|s| **s != step) {
                if self.0.remove(*other).is_some() {
                    dropped.push((*other).to_owned());
                }
            }
        }
        self.0.insert(step.to_owned(), payload);
        dropped
    }

    /// Payload saved under `step`, if any.
    #[must_use]
    pub fn step(&self, step: &str) -> Option<&Value> {
        self.0.get(step)
    }

    /// Remove a step, returning its payload.
    pub fn remove_step(&mut self, step: &str) -> Option<Value> {
        self.0.remove(step)
    }

    /// The preference step currently present, if any.
    #[must_use]
    pub fn active_preference(&self) -> Option<&'static str> {
        PREFERENCE_STEPS
            .iter()
            .copied()
            .find(|s| self.0.contains_key(*s))
    }

    /// Names of all saved steps.
    pub fn steps(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Borrow the underlying JSON object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert into a JSON value for storage or responses.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_preference_step_replaces_other_preference() {
        let mut progress = FormProgress::new();
        progress.set_step("serviceSelection", json!({"plan": "premium"}));
        progress.set_step("baptistPreference", json!({"hymns": ["Amazing Grace"]}));

        let dropped = progress.set_step("catholicPreference", json!({"mass": true}));

        assert_eq!(dropped, vec!["baptistPreference".to_owned()]);
        assert!(progress.step("baptistPreference").is_none());
        assert_eq!(progress.step("catholicPreference"), Some(&json!({"mass": true})));
        assert_eq!(progress.active_preference(), Some("catholicPreference"));
        // Non-preference steps are untouched
        assert_eq!(
            progress.step("serviceSelection"),
            Some(&json!({"plan": "premium"}))
        );
        assert_eq!(progress.len(), 2);
    }

    #[test]
    fn test_resaving_same_preference_drops_nothing() {
        let mut progress = FormProgress::new();
        progress.set_step("anglicanPreference", json!({"v": 1}));
        let dropped = progress.set_step("anglicanPreference", json!({"v": 2}));
        assert!(dropped.is_empty());
        assert_eq!(progress.step("anglicanPreference"), Some(&json!({"v": 2})));
    }

    #[test]
    fn test_non_preference_step_keeps_preferences() {
        let mut progress = FormProgress::new();
        progress.set_step("unitingPreference", json!({}));
        let dropped = progress.set_step("payment", json!({"paid": true}));
        assert!(dropped.is_empty());
        assert_eq!(progress.active_preference(), Some("unitingPreference"));
    }

    #[test]
    fn test_from_value_ignores_non_objects() {
        assert!(FormProgress::from_value(json!([1, 2])).is_empty());
        assert!(FormProgress::from_value(Value::Null).is_empty());
        let progress = FormProgress::from_value(json!({"a": 1}));
        assert_eq!(progress.into_value(), json!({"a": 1}));
    }

    #[test]
    fn test_validate_step_name() {
        assert!(validate_step_name("secularOrCivilPreference").is_ok());
        assert!(validate_step_name("step-2_a").is_ok());
        assert_eq!(validate_step_name(""), Err(StepNameError::Empty));
        assert_eq!(
            validate_step_name("has space"),
            Err(StepNameError::InvalidCharacter)
        );
        assert_eq!(
            validate_step_name(&"x".repeat(65)),
            Err(StepNameError::TooLong)
        );
    }
}
