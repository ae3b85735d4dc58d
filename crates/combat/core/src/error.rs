//! Error types surfaced by engine operations.

use crate::state::EntityId;

/// Why a block activation was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivationError {
    #[error("activation rejected: {entity} is guardbroken")]
    Guardbroken { entity: EntityId },

    #[error("activation rejected: {entity} is knocked down")]
    KnockedDown { entity: EntityId },

    #[error("activation rejected: {entity} already has an active defensive sequence")]
    AlreadyEngaged { entity: EntityId },

    #[error("activation rejected: {entity} is cooling down")]
    CoolingDown { entity: EntityId },

    #[error("unknown combatant {entity}")]
    UnknownEntity { entity: EntityId },
}

/// Errors surfaced by combatant lifecycle and state operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EngineError {
    #[error("unknown combatant {entity}")]
    UnknownEntity { entity: EntityId },

    #[error("combatant {entity} already joined")]
    AlreadyJoined { entity: EntityId },
}
