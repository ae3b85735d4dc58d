//! Event payloads published by the authority.

use serde::{Deserialize, Serialize};

use combat_core::resolve::Verdict;
use combat_core::state::{EntityId, PhaseFact, Seconds, StatusKind, SwingId, Timestamp};

/// Replicated entity facts, pushed to predicting peers.
///
/// Explicit `{entity, field, value, timestamp}` sync messages: storage on the
/// authority is decoupled from notification, and peers rebuild a
/// [`crate::replication::ReplicaView`] purely from this stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReplicationEvent {
    /// A defensive phase transition, carrying its scheduled interval.
    Phase { entity: EntityId, fact: PhaseFact },
    /// Posture meter value.
    Posture {
        entity: EntityId,
        current: f32,
        max: f32,
    },
    StatusApplied {
        entity: EntityId,
        kind: StatusKind,
        started_at: Timestamp,
        until: Option<Timestamp>,
    },
    StatusEnded { entity: EntityId, kind: StatusKind },
    /// Knockdown-immunity expiry.
    Immunity {
        entity: EntityId,
        until: Option<Timestamp>,
    },
}

/// Combat outcomes and collaborator notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// Final resolution of a swing. Predicting peers reconcile against this.
    VerdictReached { verdict: Verdict },
    /// Movement collaborator: disable movement and blocking until `until`.
    Guardbroken { entity: EntityId, until: Timestamp },
    /// Ragdoll on, movement off.
    KnockdownStarted {
        entity: EntityId,
        recover_at: Timestamp,
    },
    /// Movement restored, immunity running.
    KnockdownRecovered {
        entity: EntityId,
        immune_until: Timestamp,
    },
    /// Health collaborator: clamp this entity's health to the knockdown
    /// floor.
    HealthClampRequired { entity: EntityId },
    /// A tagged entity left mid-fight; the kill goes to the last attacker.
    KillCredit {
        victim: EntityId,
        attacker: EntityId,
    },
    /// A peer's declared outcome failed validation and was downgraded.
    SuspiciousClaim {
        swing_id: SwingId,
        attacker: EntityId,
    },
}

/// Combat-tag countdown pushed to the UI collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatTagUpdate {
    pub entity: EntityId,
    pub remaining: Seconds,
}
