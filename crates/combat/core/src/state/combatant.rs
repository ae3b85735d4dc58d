//! Per-combatant authoritative state.

use crate::posture::PostureMeter;
use crate::state::status::{StatusEffects, StatusKind};
use crate::state::timeline::{DefensivePhase, Timeline};
use crate::state::{EntityId, Timestamp};

/// Complete defensive-combat state for one combatant.
///
/// Owned exclusively by the authoritative process; predicting peers only ever
/// see replicated facts derived from it. The status set is the single source
/// of truth for override states (shakyblock, guardbreak); the knockdown
/// fields are controller state with their own lifecycle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantState {
    pub id: EntityId,

    /// Replicable sequence of `(phase, entered_at)` facts.
    pub timeline: Timeline,

    /// Active status effects, each a tagged variant with `(started_at, until)`.
    pub statuses: StatusEffects,

    pub posture: PostureMeter,

    /// Whether the defensive hold is still down. Decides Block vs Cooldown
    /// when the block-entry deadline fires.
    pub block_held: bool,

    // === knockdown / immunity controller state ===
    pub knocked_down: bool,
    /// Set when a knockdown recovery completes; cleared when a new knockdown
    /// begins.
    pub recovery_timestamp: Option<Timestamp>,
    /// Further knockdown triggers are suppressed until this moment.
    pub immunity_until: Option<Timestamp>,

    // === combat tagging ===
    pub combat_tag_until: Option<Timestamp>,
    /// Weak reference by id only; the attacker may have left the match.
    pub last_attacker: Option<EntityId>,

    /// External execution flag: a finisher is in progress and real death is
    /// permitted, bypassing the knockdown substitution.
    pub executing: bool,
}

impl CombatantState {
    pub fn new(id: EntityId, posture_max: f32) -> Self {
        Self {
            id,
            timeline: Timeline::new(),
            statuses: StatusEffects::empty(),
            posture: PostureMeter::new(posture_max),
            block_held: false,
            knocked_down: false,
            recovery_timestamp: None,
            immunity_until: None,
            combat_tag_until: None,
            last_attacker: None,
            executing: false,
        }
    }

    /// The phase the combatant is currently in.
    pub fn phase(&self) -> DefensivePhase {
        self.timeline.latest().phase
    }

    pub fn is_guardbroken(&self, at: Timestamp) -> bool {
        self.statuses.has(StatusKind::Guardbroken, at)
    }

    pub fn shakyblock_active(&self, at: Timestamp) -> bool {
        self.statuses.has(StatusKind::Shakyblock, at)
    }

    /// Whether a knockdown trigger at `now` falls inside an immunity window.
    pub fn knockdown_immune(&self, now: Timestamp) -> bool {
        self.immunity_until.is_some_and(|until| now < until)
    }

    pub fn combat_tagged(&self, now: Timestamp) -> bool {
        self.combat_tag_until.is_some_and(|until| now < until)
    }
}
