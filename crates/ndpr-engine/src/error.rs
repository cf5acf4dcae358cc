//! Error taxonomy for the engine.
//!
//! Calculators and the store raise errors to the caller immediately; there
//! is no recovery or retry inside the core. Retry/backoff belongs to the
//! layer that persists data or talks to the regulator's submission portal.

use ndpr_types::{BreachId, NotificationId};
use thiserror::Error;

use crate::report::BreachStatus;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or out-of-range input. Never silently corrected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The referenced breach does not exist in the store.
    #[error("breach not found: {0}")]
    BreachNotFound(BreachId),

    /// The referenced notification does not exist on that breach.
    #[error("notification not found: {0}")]
    NotificationNotFound(NotificationId),

    /// Breach status may only move forward (ongoing -> contained -> resolved).
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: BreachStatus,
        to: BreachStatus,
    },

    /// A store lock was poisoned by a panicking writer. The store's
    /// contents can no longer be trusted; the host process should rebuild
    /// from its last persisted snapshot.
    #[error("store lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, EngineError>;
