//! In-progress wizard selections.
//!
//! The consumer wizard keeps a handful of choices (music format, preferred
//! service, secular ceremony type) plus unsaved step drafts between page
//! loads. [`WizardState`] is that object; it only changes through
//! [`WizardState::apply`], one [`WizardAction`] at a time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::progress::{FormProgress, StepNameError, validate_step_name};

/// Selections made so far in the consumer wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub music_format: Option<String>,
    pub preferred_service: Option<String>,
    pub sec_type: Option<String>,
    /// Unsaved step payloads, subject to the same preference exclusivity as
    /// persisted form progress.
    #[serde(default)]
    pub drafts: FormProgress,
}

/// A single change to [`WizardState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WizardAction {
    /// Set or clear (`null`) the chosen music format.
    SetMusicFormat { value: Option<String> },
    /// Set or clear the preferred service denomination.
    SetPreferredService { value: Option<String> },
    /// Set or clear the secular/civil ceremony type.
    SetSecType { value: Option<String> },
    /// Store a draft payload for a step.
    SaveDraft { step: String, data: Value },
    /// Drop the draft for a step.
    ClearDraft { step: String },
    /// Start over.
    Reset,
}

impl WizardState {
    /// Apply `action` in place.
    ///
    /// # Errors
    ///
    /// Returns [`StepNameError`] if a draft action names an invalid step; the
    /// state is left untouched in that case.
    pub fn apply(&mut self, action: WizardAction) -> Result<(), StepNameError> {
        match action {
            WizardAction::SetMusicFormat { value } => self.music_format = normalise(value),
            WizardAction::SetPreferredService { value } => {
                self.preferred_service = normalise(value);
            }
            WizardAction::SetSecType { value } => self.sec_type = normalise(value),
            WizardAction::SaveDraft { step, data } => {
                validate_step_name(&step)?;
                self.drafts.set_step(&step, data);
            }
            WizardAction::ClearDraft { step } => {
                validate_step_name(&step)?;
                self.drafts.remove_step(&step);
            }
            WizardAction::Reset => *self = Self::default(),
        }
        Ok(())
    }

    /// Whether nothing has been chosen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.music_format.is_none()
            && self.preferred_service.is_none()
            && self.sec_type.is_none()
            && self.drafts.is_empty()
    }
}

// Blank selections count as cleared
fn normalise(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
