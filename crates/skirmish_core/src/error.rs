//! Error types for the skirmish simulation.
//!
//! Every variant is an invariant violation: the core has no recoverable
//! error path and no IO. Lookups report misses instead of defaulting so
//! that index drift surfaces at the first stale access.

use thiserror::Error;

use crate::units::UnitId;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// Unit identifier not live in the registry or slot index.
    #[error("Unknown unit ID: {0}")]
    UnknownUnit(UnitId),

    /// Oracle slot not occupied.
    #[error("Unknown oracle slot: {0}")]
    UnknownSlot(usize),

    /// Identity-slot mappings disagree with each other or with the oracle.
    #[error("Slot index corrupted: {0}")]
    SlotIndexCorrupted(String),

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
