//! Keys for data kept in the server-side session store.
//!
//! Credentials travel in their own cookies; the session store carries the
//! wizard's in-progress selections and the order placed before login.

/// Session keys.
pub mod keys {
    /// Key for the serialized [`mff_core::WizardState`].
    pub const WIZARD: &str = "wizard";

    /// Key for the [`mff_core::OrderNumber`] of an order placed before login.
    pub const PENDING_ORDER: &str = "pending_order";
}
