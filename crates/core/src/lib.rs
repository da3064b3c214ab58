//! Music For Funerals core - shared domain types.
//!
//! This crate holds the types every other crate in the workspace agrees on:
//! - `mff-server` - HTTP API, admin content management, persistence
//! - `mff-cli` - migrations, admin bootstrap, content seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP. Everything here can be tested without a
//! running Postgres.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, order numbers and statuses
//! - [`progress`] - The step-keyed form-progress document and its merge rules
//! - [`wizard`] - The in-progress wizard selections and their reducer

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod progress;
pub mod types;
pub mod wizard;

pub use progress::{
    FormProgress, PREFERENCE_STEPS, StepNameError, is_preference_step, validate_step_name,
};
pub use types::*;
pub use wizard::{WizardAction, WizardState};
