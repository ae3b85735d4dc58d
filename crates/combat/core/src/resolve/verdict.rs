//! Verdicts and their side-effect instructions.

use std::collections::HashMap;

use crate::state::{EntityId, Seconds, StatusKind, SwingId, Timestamp};

/// Defensive outcome of one swing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    Miss,
    Hit,
    Blocked,
    Parried,
}

/// A side effect mandated by a verdict.
///
/// This core decides *what* follows from an outcome, not the numbers: damage
/// carries no amount (stat formulas are external), and status effects carry
/// durations from config. Consumed by damage/VFX collaborators and applied to
/// posture by the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Effect {
    /// Full weapon damage to the target.
    Damage { target: EntityId },
    /// Apply a status effect for `duration` seconds.
    Status {
        target: EntityId,
        kind: StatusKind,
        duration: Seconds,
    },
    /// Add posture. The capped path can never trigger a guardbreak.
    PostureDamage {
        target: EntityId,
        amount: f32,
        capped: bool,
    },
    /// Remove posture.
    PostureReward { target: EntityId, amount: f32 },
}

/// Resolution of one swing: provisional (peer prediction) or final
/// (authoritative). Never persisted.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Verdict {
    pub swing_id: SwingId,
    pub outcome: Outcome,
    /// False for a peer's optimistic prediction, true once the authority has
    /// resolved the swing. Provisional verdicts never carry effects.
    pub authoritative: bool,
    pub effects: Vec<Effect>,
}

impl Verdict {
    pub fn provisional(swing_id: SwingId, outcome: Outcome) -> Self {
        Self {
            swing_id,
            outcome,
            authoritative: false,
            effects: Vec::new(),
        }
    }

    pub fn authoritative(swing_id: SwingId, outcome: Outcome, effects: Vec<Effect>) -> Self {
        Self {
            swing_id,
            outcome,
            authoritative: true,
            effects,
        }
    }
}

/// Ledger of already-resolved swings, keyed by swing id.
///
/// Re-delivery of a resolved swing returns the cached verdict and applies
/// nothing. Entries are pruned by age during the periodic sweep; retention
/// comfortably exceeds any transport retry horizon.
#[derive(Debug, Default)]
pub struct SwingLedger {
    resolved: HashMap<SwingId, (Timestamp, Verdict)>,
}

impl SwingLedger {
    /// How long a resolved swing stays replay-protected.
    pub const RETENTION: Seconds = 60.0;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, swing_id: SwingId) -> Option<&Verdict> {
        self.resolved.get(&swing_id).map(|(_, verdict)| verdict)
    }

    pub fn record(&mut self, verdict: Verdict, resolved_at: Timestamp) {
        self.resolved
            .insert(verdict.swing_id, (resolved_at, verdict));
    }

    /// Drops entries older than the retention horizon.
    pub fn prune(&mut self, now: Timestamp) {
        self.resolved
            .retain(|_, (resolved_at, _)| now.since(*resolved_at) < Self::RETENTION);
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}
