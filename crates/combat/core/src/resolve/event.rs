//! Attack event submitted by a peer for authoritative resolution.

use crate::resolve::Outcome;
use crate::state::{EntityId, SwingId, Timestamp};

/// One attack swing, as declared by the attacking peer.
///
/// Ephemeral: lives for one round trip and is discarded once a verdict is
/// produced. The declared fields are the attacker's local prediction and are
/// only ever used as hints for the tolerance check, never as ground truth.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitEvent {
    pub swing_id: SwingId,
    pub attacker: EntityId,
    pub target: EntityId,
    pub attack_timestamp: Timestamp,
    /// The attacker-side predicted outcome.
    pub declared_outcome: Outcome,
    /// Echo of the defender's parry-start fact the prediction was based on.
    /// Present only when the declared outcome is a parry.
    pub declared_parry_start: Option<Timestamp>,
}
