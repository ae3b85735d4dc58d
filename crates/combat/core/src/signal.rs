//! Signals emitted by engine operations.
//!
//! The engine never performs I/O; every externally visible consequence of a
//! mutation — replication facts, verdicts, collaborator notifications — is
//! returned as a signal for the hosting runtime to publish. Storage stays
//! decoupled from notification.

use crate::resolve::Verdict;
use crate::state::{EntityId, PhaseFact, Seconds, StatusKind, SwingId, Timestamp};

/// An externally visible consequence of an engine operation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Signal {
    /// A defensive phase transition happened; replicate the fact to peers.
    Phase { entity: EntityId, fact: PhaseFact },

    /// Posture value changed; replicate to peers.
    Posture {
        entity: EntityId,
        current: f32,
        max: f32,
    },

    /// A status effect was applied.
    StatusApplied {
        entity: EntityId,
        kind: StatusKind,
        started_at: Timestamp,
        until: Option<Timestamp>,
    },

    /// A status effect expired or was removed.
    StatusEnded { entity: EntityId, kind: StatusKind },

    /// Knockdown-immunity expiry changed; replicate to peers.
    Immunity {
        entity: EntityId,
        until: Option<Timestamp>,
    },

    /// Combat tag update pushed to the UI collaborator.
    TagRemaining {
        entity: EntityId,
        remaining: Seconds,
    },

    /// Final resolution of a swing.
    Verdict(Verdict),

    /// Posture saturated: movement and block activation are disabled until
    /// the given moment. Movement collaborator acts on this.
    Guardbroken { entity: EntityId, until: Timestamp },

    /// Knockdown began: enable ragdoll, disable movement.
    KnockdownStarted {
        entity: EntityId,
        recover_at: Timestamp,
    },

    /// Knockdown recovery completed: restore movement, immunity granted.
    KnockdownRecovered {
        entity: EntityId,
        immune_until: Timestamp,
    },

    /// Health collaborator must clamp the entity's health to the knockdown
    /// floor.
    ClampHealthToFloor { entity: EntityId },

    /// A combat-tagged entity left the match; award the kill.
    KillCredit {
        victim: EntityId,
        attacker: EntityId,
    },

    /// A peer's declared outcome failed validation and was downgraded.
    /// Observability collaborators log this; it is never fatal.
    SuspiciousClaim {
        swing_id: SwingId,
        attacker: EntityId,
        declared_parry_start: Option<Timestamp>,
        authoritative_parry_start: Option<Timestamp>,
    },
}
